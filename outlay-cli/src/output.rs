//! Output formatting utilities

use colored::Colorize;
use comfy_table::{presets::UTF8_FULL_CONDENSED, ContentArrangement, Table};
use rust_decimal::prelude::ToPrimitive;
use rust_decimal::{Decimal, RoundingStrategy};

use outlay_core::Expense;

const BAR_WIDTH: usize = 20;

/// Print a success message
pub fn success(msg: &str) {
    println!("{} {}", "✓".green(), msg.green());
}

/// Print an error message
pub fn error(msg: &str) {
    eprintln!("{}", msg.red());
}

/// Print a warning message
pub fn warning(msg: &str) {
    eprintln!("{}", msg.yellow());
}

/// Print an info message
pub fn info(msg: &str) {
    println!("{}", msg.cyan());
}

/// Create a styled table
pub fn create_table() -> Table {
    let mut table = Table::new();
    table.load_preset(UTF8_FULL_CONDENSED);
    table.set_content_arrangement(ContentArrangement::Dynamic);
    table
}

/// Format an amount as currency, e.g. `$1250.50`
pub fn format_amount(amount: Decimal) -> String {
    let rounded = amount.round_dp_with_strategy(2, RoundingStrategy::MidpointAwayFromZero);
    if rounded.is_sign_negative() && !rounded.is_zero() {
        format!("-${:.2}", rounded.abs())
    } else {
        format!("${:.2}", rounded)
    }
}

/// Format a percentage with one decimal place
pub fn format_percent(percent: Decimal) -> String {
    format!("{:.1}%", percent.round_dp(1))
}

/// Horizontal bar for a 0-100 percentage
pub fn bar(percent: Decimal) -> String {
    let clamped = percent.clamp(Decimal::ZERO, Decimal::ONE_HUNDRED);
    let filled = (clamped * Decimal::from(BAR_WIDTH) / Decimal::ONE_HUNDRED)
        .round()
        .to_usize()
        .unwrap_or(0)
        .min(BAR_WIDTH);
    format!("{}{}", "█".repeat(filled), "░".repeat(BAR_WIDTH - filled))
}

/// Table of expenses, one row each
pub fn expense_table<'a>(expenses: impl IntoIterator<Item = &'a Expense>) -> Table {
    let mut table = create_table();
    table.set_header(vec!["ID", "Date", "Description", "Category", "Amount"]);
    for expense in expenses {
        table.add_row(vec![
            expense.id.to_string(),
            expense.date.format("%Y-%m-%d").to_string(),
            expense.description.clone(),
            expense.category.clone(),
            format_amount(expense.amount),
        ]);
    }
    table
}
