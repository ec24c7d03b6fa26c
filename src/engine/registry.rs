//! Creation and lookup of banks, cards and cashback rules

use super::unit_of_work::UnitOfWork;
use crate::core::error::CashbackError;
use crate::core::model::{Bank, Card, CashbackRule, CategoryRate, Period, RuleKey};
use chrono::NaiveDate;
use rust_decimal::Decimal;
use std::collections::BTreeMap;
use tracing::info;

fn require_name(what: &str, value: &str) -> Result<(), CashbackError> {
    if value.trim().is_empty() {
        return Err(CashbackError::invalid(format!("{what} must not be empty")));
    }
    Ok(())
}

pub fn add_bank(
    uow: &mut UnitOfWork,
    name: &str,
    limit: Option<Decimal>,
    today: NaiveDate,
) -> Result<(), CashbackError> {
    require_name("Bank name", name)?;
    if let Some(limit) = limit
        && limit < Decimal::ZERO
    {
        return Err(CashbackError::invalid(format!(
            "Pay limit must not be negative, got {limit}"
        )));
    }

    uow.create(Bank::new(name, limit, today))?;
    info!(bank = name, ?limit, "Added bank");
    Ok(())
}

pub fn add_card(
    uow: &mut UnitOfWork,
    bank_name: &str,
    card_name: &str,
    today: NaiveDate,
) -> Result<(), CashbackError> {
    require_name("Card name", card_name)?;
    if find_bank(uow, bank_name).is_none() {
        return Err(CashbackError::UnknownBank(bank_name.to_string()));
    }

    uow.create(Card::new(card_name, bank_name, today))?;
    info!(bank = bank_name, card = card_name, "Added card");
    Ok(())
}

/// Adds a rule, or refreshes the existing one for the same period, card and category.
pub fn add_cashback_rule(
    uow: &mut UnitOfWork,
    key: RuleKey,
    percent: Decimal,
    permanent: bool,
    today: NaiveDate,
) -> Result<(), CashbackError> {
    require_name("Category", &key.category)?;
    if percent < Decimal::ZERO || percent > Decimal::ONE_HUNDRED {
        return Err(CashbackError::invalid(format!(
            "Cashback percent must be between 0 and 100, got {percent}"
        )));
    }
    if find_card(uow, &key.card).is_none() {
        return Err(CashbackError::UnknownCard(key.card));
    }

    let refreshed = uow.update::<CashbackRule>(&key, |rule| {
        rule.percent = percent;
        rule.permanent = permanent;
        rule.period_anchor = today;
    });
    if !refreshed {
        uow.put(CashbackRule {
            period: key.period,
            card: key.card.clone(),
            category: key.category.clone(),
            percent,
            permanent,
            period_anchor: today,
        });
    }
    info!(rule = %key, %percent, permanent, refreshed, "Saved cashback");
    Ok(())
}

pub fn remove_cashback_rule(uow: &mut UnitOfWork, key: &RuleKey) -> Result<(), CashbackError> {
    uow.delete::<CashbackRule>(key)
        .ok_or_else(|| CashbackError::NotFound(key.to_string()))?;
    info!(rule = %key, "Removed cashback");
    Ok(())
}

pub fn find_bank<'a>(uow: &'a UnitOfWork, name: &str) -> Option<&'a Bank> {
    uow.find::<Bank>(&name.to_string())
}

pub fn find_card<'a>(uow: &'a UnitOfWork, name: &str) -> Option<&'a Card> {
    uow.find::<Card>(&name.to_string())
}

/// Current rules for `category`, across all cards.
pub fn current_rules_for_category(uow: &UnitOfWork, category: &str) -> Vec<CashbackRule> {
    uow.find_all::<CashbackRule>(|rule| {
        rule.period == Period::Current && rule.category == category
    })
}

/// Current rules grouped by card, cards and categories in name order.
pub fn list_current_rules_by_card(uow: &UnitOfWork) -> BTreeMap<String, Vec<CategoryRate>> {
    let mut by_card: BTreeMap<String, Vec<CategoryRate>> = BTreeMap::new();
    for rule in uow.find_all::<CashbackRule>(|rule| rule.period == Period::Current) {
        by_card.entry(rule.card).or_default().push(CategoryRate {
            category: rule.category,
            percent: rule.percent,
        });
    }
    by_card
}
