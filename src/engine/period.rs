//! Monthly rollover of banks, cards and cashback rules

use super::unit_of_work::UnitOfWork;
use crate::core::model::{Bank, Card, CashbackRule, Period, is_out_of_period};
use chrono::NaiveDate;
use rust_decimal::Decimal;
use tracing::debug;

/// Brings every record into the month of `today`.
///
/// Banks and cards from an earlier month start over with nothing paid or
/// accrued. Stale rules are dropped unless permanent, and rules booked for
/// the future month become current. Permanent current rules keep their old
/// anchor, so they are revisited (and left alone) on every call.
pub fn rollover(uow: &mut UnitOfWork, today: NaiveDate) {
    let stale = |anchor: NaiveDate| is_out_of_period(anchor, today);

    for bank in uow.find_all::<Bank>(|bank| stale(bank.period_anchor)) {
        debug!(bank = %bank.name, "Resetting bank pay for new period");
        uow.update::<Bank>(&bank.name, |bank| {
            bank.pay = Decimal::ZERO;
            bank.period_anchor = today;
        });
    }

    for card in uow.find_all::<Card>(|card| stale(card.period_anchor)) {
        debug!(card = %card.name, "Resetting card cashback for new period");
        uow.update::<Card>(&card.name, |card| {
            card.cashback = Decimal::ZERO;
            card.period_anchor = today;
        });
    }

    for rule in uow.find_all::<CashbackRule>(|rule| stale(rule.period_anchor)) {
        match (rule.period, rule.permanent) {
            (Period::Current, false) => {
                debug!(rule = %rule.key(), "Dropping expired cashback");
                uow.delete::<CashbackRule>(&rule.key());
            }
            (Period::Current, true) => {}
            (Period::Future, _) => {
                debug!(rule = %rule.key(), "Promoting future cashback to current");
                uow.delete::<CashbackRule>(&rule.key());
                // Replaces any current rule for the same card and category.
                uow.put(CashbackRule {
                    period: Period::Current,
                    period_anchor: today,
                    ..rule
                });
            }
        }
    }
}
