use super::ui::{self, StyleType};
use crate::core::model::{CardCashback, CategoryRate, Period};
use crate::engine::CashbackService;
use anyhow::{Context, Result};
use clap::Subcommand;
use comfy_table::Cell;
use rust_decimal::Decimal;
use std::collections::BTreeMap;

#[derive(Subcommand, Debug, Clone, PartialEq)]
pub enum AppCommand {
    /// Add bank, card, transaction or cashback for current or future month
    #[command(subcommand)]
    Add(AddCommand),
    /// Remove cashback for current or future month
    #[command(subcommand)]
    Remove(RemoveCommand),
    /// List cards with cashback in current month
    List,
    /// Choose a card with highest cashback for given category
    Choose {
        /// Transaction category
        category: String,
        /// Transaction value (optional)
        #[arg(long)]
        value: Option<Decimal>,
    },
    /// Estimate cashback for current month
    Estimate,
}

#[derive(Subcommand, Debug, Clone, PartialEq)]
pub enum AddCommand {
    /// Add new bank
    Bank {
        /// Pay limit (optional)
        #[arg(short, long)]
        limit: Option<Decimal>,
        /// Bank name
        name: String,
    },
    /// Add new card
    Card {
        /// Bank name
        bank: String,
        /// Card name
        card: String,
    },
    /// Add cashback category for current or future month
    Cashback {
        /// Cashback period (current or future)
        #[arg(value_parser = parse_period)]
        period: Period,
        /// Card name
        card: String,
        /// Cashback category
        category: String,
        /// Cashback percent
        percent: Decimal,
        /// Flag that indicates that the category is permanent
        #[arg(short, long)]
        permanent: bool,
    },
    /// Add transaction
    Transaction {
        /// Card name
        card: String,
        /// Transaction category
        category: String,
        /// Transaction value
        value: Decimal,
    },
}

#[derive(Subcommand, Debug, Clone, PartialEq)]
pub enum RemoveCommand {
    /// Remove cashback for current or future month
    Cashback {
        /// Cashback period (current or future)
        #[arg(value_parser = parse_period)]
        period: Period,
        /// Card name
        card: String,
        /// Cashback category
        category: String,
    },
}

fn parse_period(value: &str) -> Result<Period, String> {
    value.parse::<Period>().map_err(|e| e.to_string())
}

/// Runs `command` against the service and renders the outcome for the terminal.
pub async fn execute(
    command: AppCommand,
    service: &CashbackService,
    currency: Option<&str>,
) -> Result<String> {
    let output = match command {
        AppCommand::Add(AddCommand::Bank { limit, name }) => {
            service.add_bank(&name, limit).await?;
            let mut message = format!("Added bank {}", ui::style_text(&name, StyleType::Bank));
            if let Some(limit) = limit {
                message.push_str(&format!(
                    " with pay limit {}",
                    ui::style_text(&ui::format_amount(limit, currency), StyleType::Amount)
                ));
            }
            message
        }
        AppCommand::Add(AddCommand::Card { bank, card }) => {
            service.add_card(&bank, &card).await?;
            format!(
                "Added card {} for bank {}",
                ui::style_text(&card, StyleType::Card),
                ui::style_text(&bank, StyleType::Bank)
            )
        }
        AppCommand::Add(AddCommand::Cashback {
            period,
            card,
            category,
            percent,
            permanent,
        }) => {
            service
                .add_cashback_rule(period, &card, &category, percent, permanent)
                .await?;
            format!(
                "Added category {} with {} cashback for card {} in {period} month{}",
                ui::style_text(&category, StyleType::Category),
                ui::style_text(&ui::format_percent(percent), StyleType::Amount),
                ui::style_text(&card, StyleType::Card),
                if permanent { " permanently" } else { "" }
            )
        }
        AppCommand::Add(AddCommand::Transaction {
            card,
            category,
            value,
        }) => {
            service.apply_transaction(&card, &category, value).await?;
            format!(
                "Added {} transaction from {} ({})",
                ui::style_text(&ui::format_amount(value, currency), StyleType::Amount),
                ui::style_text(&card, StyleType::Card),
                ui::style_text(&category, StyleType::Category)
            )
        }
        AppCommand::Remove(RemoveCommand::Cashback {
            period,
            card,
            category,
        }) => {
            service.remove_cashback_rule(period, &card, &category).await?;
            format!(
                "Removed cashback category {} for card {} in {period} month",
                ui::style_text(&category, StyleType::Category),
                ui::style_text(&card, StyleType::Card)
            )
        }
        AppCommand::List => render_rules(&service.list_current_rules().await?),
        AppCommand::Choose { category, value } => {
            match service.choose_best_card(&category, value).await? {
                Some(card) => format!(
                    "Use card {} for this purchase, it's the best one",
                    ui::style_text(&card, StyleType::Card)
                ),
                None => "Any card works for this purchase".to_string(),
            }
        }
        AppCommand::Estimate => render_estimate(&service.estimate_cashback().await?, currency)?,
    };
    Ok(output)
}

fn render_rules(rules: &BTreeMap<String, Vec<CategoryRate>>) -> String {
    if rules.is_empty() {
        return "There are no cards with active cashbacks at the moment. Try and add some!"
            .to_string();
    }

    let mut table = ui::new_styled_table();
    table.set_header(vec![ui::header_cell("Card"), ui::header_cell("Categories")]);
    for (card, rates) in rules {
        let categories = rates
            .iter()
            .map(|rate| {
                format!(
                    "{} ({})",
                    ui::style_text(&rate.category, StyleType::Category),
                    ui::style_text(&ui::format_percent(rate.percent), StyleType::Amount)
                )
            })
            .collect::<Vec<_>>()
            .join(", ");
        table.add_row(vec![
            Cell::new(ui::style_text(card, StyleType::Card)),
            Cell::new(categories),
        ]);
    }

    format!(
        "{}\n{table}",
        ui::style_text("Cards with active cashbacks:", StyleType::Title)
    )
}

fn render_estimate(estimate: &[CardCashback], currency: Option<&str>) -> Result<String> {
    if estimate.is_empty() {
        return Ok(
            "No cashback at the moment: add some cards, cashbacks or transactions!".to_string(),
        );
    }

    let mut table = ui::new_styled_table();
    table.set_header(vec![ui::header_cell("Card"), ui::header_cell("Cashback")]);
    for entry in estimate {
        table.add_row(vec![
            Cell::new(ui::style_text(&entry.card, StyleType::Card)),
            ui::amount_cell(entry.cashback, currency),
        ]);
    }
    let total = estimate
        .iter()
        .try_fold(Decimal::ZERO, |total, entry| total.checked_add(entry.cashback))
        .context("Total cashback is out of range")?;

    Ok(format!(
        "{}\n{table}\n{} {}",
        ui::style_text("Cashbacks for this month:", StyleType::Title),
        ui::style_text("Total:", StyleType::Subtle),
        ui::style_text(&ui::format_amount(total, currency), StyleType::Amount)
    ))
}
