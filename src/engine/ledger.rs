//! Rebate pool bookkeeping

use crate::core::error::CashbackError;
use crate::core::model::{Bank, Card};
use rust_decimal::Decimal;

/// Cashback a purchase of `value` earns at `percent`, before any bank limit.
pub fn raw_cashback(value: Decimal, percent: Decimal) -> Decimal {
    value / Decimal::ONE_HUNDRED * percent
}

/// Outcome of charging `raw` cashback against a bank's rebate pool.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Allocation {
    /// Amount the card actually receives.
    pub award: Decimal,
    /// Bank pay after the award.
    pub pay: Decimal,
}

/// Part of `raw` a bank with `limit` can still pay after paying out `pay`.
fn award_for(raw: Decimal, limit: Option<Decimal>, pay: Decimal) -> Decimal {
    match limit {
        None => raw,
        Some(limit) if pay >= limit => Decimal::ZERO,
        Some(limit) => raw.min(limit - pay),
    }
}

/// Clips `raw` to what is left of `limit` given what was already paid.
///
/// Without a limit the full amount is awarded. Once `pay` reaches the limit
/// nothing more is awarded, and an award never takes `pay` past it. Returns
/// `None` when the new pay does not fit in a `Decimal`.
pub fn allocate(raw: Decimal, limit: Option<Decimal>, pay: Decimal) -> Option<Allocation> {
    let award = award_for(raw, limit, pay);
    Some(Allocation {
        award,
        pay: pay.checked_add(award)?,
    })
}

/// Award a purchase would earn from `bank` right now, without booking it.
pub fn projected_award(bank: &Bank, raw: Decimal) -> Decimal {
    award_for(raw, bank.limit, bank.pay)
}

/// Books `raw` cashback against `bank` and credits the award to `card`.
///
/// Neither record is touched if the new totals would overflow.
pub fn credit(bank: &mut Bank, card: &mut Card, raw: Decimal) -> Result<Decimal, CashbackError> {
    let out_of_range = || CashbackError::invalid("amount out of range");
    let allocation = allocate(raw, bank.limit, bank.pay).ok_or_else(out_of_range)?;
    let cashback = card
        .cashback
        .checked_add(allocation.award)
        .ok_or_else(out_of_range)?;

    bank.pay = allocation.pay;
    card.cashback = cashback;
    Ok(allocation.award)
}
