//! Records tracked by the cashback engine

use crate::core::error::CashbackError;
use chrono::{Datelike, NaiveDate};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use std::fmt::Display;
use std::str::FromStr;

/// Month a cashback rule applies to.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Ord, PartialOrd, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Period {
    Current,
    Future,
}

impl Display for Period {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(
            f,
            "{}",
            match self {
                Period::Current => "current",
                Period::Future => "future",
            }
        )
    }
}

impl FromStr for Period {
    type Err = CashbackError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "current" => Ok(Period::Current),
            "future" => Ok(Period::Future),
            _ => Err(CashbackError::InvalidInput(format!(
                "Invalid period: {s}, cashback period can only be current or future"
            ))),
        }
    }
}

/// True when `anchor` falls in a different calendar month than `today`.
pub fn is_out_of_period(anchor: NaiveDate, today: NaiveDate) -> bool {
    anchor.year() != today.year() || anchor.month() != today.month()
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Bank {
    pub name: String,
    /// Monthly rebate pool. `None` means the bank pays out without a cap.
    pub limit: Option<Decimal>,
    /// Cashback already paid out in the anchored month.
    pub pay: Decimal,
    pub period_anchor: NaiveDate,
}

impl Bank {
    pub fn new(name: impl Into<String>, limit: Option<Decimal>, today: NaiveDate) -> Self {
        Self {
            name: name.into(),
            limit,
            pay: Decimal::ZERO,
            period_anchor: today,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Card {
    pub name: String,
    /// Name of the issuing bank.
    pub bank: String,
    pub cashback: Decimal,
    pub period_anchor: NaiveDate,
}

impl Card {
    pub fn new(name: impl Into<String>, bank: impl Into<String>, today: NaiveDate) -> Self {
        Self {
            name: name.into(),
            bank: bank.into(),
            cashback: Decimal::ZERO,
            period_anchor: today,
        }
    }
}

/// Identity of a cashback rule. At most one rule exists per key.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Ord, PartialOrd, Serialize, Deserialize)]
pub struct RuleKey {
    pub period: Period,
    pub card: String,
    pub category: String,
}

impl RuleKey {
    pub fn new(period: Period, card: impl Into<String>, category: impl Into<String>) -> Self {
        Self {
            period,
            card: card.into(),
            category: category.into(),
        }
    }
}

impl Display for RuleKey {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}/{}/{}", self.period, self.card, self.category)
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CashbackRule {
    pub period: Period,
    pub card: String,
    pub category: String,
    pub percent: Decimal,
    /// Permanent rules are kept when their month ends.
    pub permanent: bool,
    pub period_anchor: NaiveDate,
}

impl CashbackRule {
    pub fn key(&self) -> RuleKey {
        RuleKey::new(self.period, self.card.clone(), self.category.clone())
    }
}

/// One cashback category of a card, as reported by the rule listing.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct CategoryRate {
    pub category: String,
    pub percent: Decimal,
}

/// Cashback accrued on a card in the current month.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct CardCashback {
    pub card: String,
    pub cashback: Decimal,
}
