//! Booking purchases against cashback rules

use super::{ledger, registry, unit_of_work::UnitOfWork};
use crate::core::error::CashbackError;
use crate::core::model::{Bank, Card, CashbackRule, Period, RuleKey};
use rust_decimal::Decimal;
use tracing::{debug, info};

/// Books a purchase of `value` made with `card_name` in `category`.
///
/// Returns the cashback credited to the card, or `None` when the card has no
/// current cashback for the category. A purchase without a matching rule is
/// still valid, it just earns nothing.
pub fn apply_transaction(
    uow: &mut UnitOfWork,
    card_name: &str,
    category: &str,
    value: Decimal,
) -> Result<Option<Decimal>, CashbackError> {
    if value < Decimal::ZERO {
        return Err(CashbackError::invalid(format!(
            "Transaction value must not be negative, got {value}"
        )));
    }

    let mut card = registry::find_card(uow, card_name)
        .cloned()
        .ok_or_else(|| CashbackError::UnknownCard(card_name.to_string()))?;

    let key = RuleKey::new(Period::Current, card_name, category);
    let Some(percent) = uow.find::<CashbackRule>(&key).map(|rule| rule.percent) else {
        debug!(card = card_name, category, "No current cashback, nothing to award");
        return Ok(None);
    };

    // Cards are only created for known banks and banks are never deleted.
    let mut bank = registry::find_bank(uow, &card.bank)
        .cloned()
        .ok_or_else(|| CashbackError::UnknownBank(card.bank.clone()))?;

    let raw = ledger::raw_cashback(value, percent);
    let award = ledger::credit(&mut bank, &mut card, raw)?;
    info!(
        card = card_name,
        category,
        %value,
        %raw,
        %award,
        bank_pay = %bank.pay,
        "Booked transaction"
    );

    uow.put::<Bank>(bank);
    uow.put::<Card>(card);
    Ok(Some(award))
}
