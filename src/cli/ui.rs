use comfy_table::modifiers::UTF8_ROUND_CORNERS;
use comfy_table::presets::UTF8_FULL;
use comfy_table::{Attribute, Cell, CellAlignment, Color, ContentArrangement, Table};
use console::style;
use rust_decimal::Decimal;

/// Defines different styles for text elements.
pub enum StyleType {
    Title,
    Bank,
    Card,
    Category,
    Amount,
    Error,
    Subtle,
}

/// Applies a consistent style to a string.
pub fn style_text(text: &str, style_type: StyleType) -> String {
    let styled = match style_type {
        StyleType::Title => style(text).bold().underlined(),
        StyleType::Bank => style(text).magenta(),
        StyleType::Card => style(text).green().bright(),
        StyleType::Category => style(text).cyan().bright(),
        StyleType::Amount => style(text).yellow(),
        StyleType::Error => style(text).red().bright(),
        StyleType::Subtle => style(text).dim(),
    };
    styled.to_string()
}

/// Formats an amount without trailing zeros, with an optional currency suffix.
pub fn format_amount(amount: Decimal, currency: Option<&str>) -> String {
    let amount = amount.round_dp(2).normalize();
    match currency {
        Some(currency) => format!("{amount} {currency}"),
        None => amount.to_string(),
    }
}

pub fn format_percent(percent: Decimal) -> String {
    format!("{}%", percent.normalize())
}

/// Creates a new `comfy_table::Table` with standard styling.
pub fn new_styled_table() -> Table {
    let mut table = Table::new();
    table
        .load_preset(UTF8_FULL)
        .apply_modifier(UTF8_ROUND_CORNERS)
        .set_content_arrangement(ContentArrangement::Dynamic);
    table
}

/// Creates a styled header cell for a table.
pub fn header_cell(text: &str) -> Cell {
    Cell::new(text)
        .fg(Color::Cyan)
        .add_attribute(Attribute::Bold)
}

/// Right aligned cell for an amount.
pub fn amount_cell(amount: Decimal, currency: Option<&str>) -> Cell {
    Cell::new(format_amount(amount, currency))
        .fg(Color::Yellow)
        .set_alignment(CellAlignment::Right)
}

#[cfg(test)]
mod tests {
    use super::*;
    use rust_decimal_macros::dec;

    #[test]
    fn test_format_amount() {
        assert_eq!(format_amount(dec!(65.00), None), "65");
        assert_eq!(format_amount(dec!(32.5), Some("RUB")), "32.5 RUB");
        assert_eq!(format_amount(dec!(0.125), None), "0.12");
    }

    #[test]
    fn test_format_percent() {
        assert_eq!(format_percent(dec!(7.0)), "7%");
        assert_eq!(format_percent(dec!(1.5)), "1.5%");
    }
}
