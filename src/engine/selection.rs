//! Picking the card with the best cashback for a purchase

use super::{ledger, registry, unit_of_work::UnitOfWork};
use crate::core::error::CashbackError;
use rust_decimal::Decimal;
use tracing::debug;

/// Card whose current rule for `category` pays the most.
///
/// Without a `value` rules are ranked by percent. With a value they are
/// ranked by the award the purchase would earn, which accounts for banks
/// whose rebate pool is partly or fully spent. Ties go to the card whose
/// name sorts first.
pub fn choose_best_card(
    uow: &UnitOfWork,
    category: &str,
    value: Option<Decimal>,
) -> Result<Option<String>, CashbackError> {
    if let Some(value) = value
        && value < Decimal::ZERO
    {
        return Err(CashbackError::invalid(format!(
            "Purchase value must not be negative, got {value}"
        )));
    }

    let mut candidates = Vec::new();
    for rule in registry::current_rules_for_category(uow, category) {
        let score = match value {
            None => rule.percent,
            Some(value) => {
                let raw = ledger::raw_cashback(value, rule.percent);
                let bank = registry::find_card(uow, &rule.card)
                    .and_then(|card| registry::find_bank(uow, &card.bank));
                match bank {
                    Some(bank) => ledger::projected_award(bank, raw),
                    None => {
                        debug!(card = %rule.card, "Skipping cashback of a card without a bank");
                        continue;
                    }
                }
            }
        };
        debug!(card = %rule.card, %score, "Candidate card");
        candidates.push((rule.card, score));
    }

    Ok(candidates
        .into_iter()
        .max_by(|(card_a, score_a), (card_b, score_b)| {
            // Reversed name order so the smallest name wins a tie.
            score_a.cmp(score_b).then_with(|| card_b.cmp(card_a))
        })
        .map(|(card, _)| card))
}
