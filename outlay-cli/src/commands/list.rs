//! List command - filtered, newest-first expense listing

use anyhow::Result;
use colored::Colorize;

use outlay_core::services::{aggregation, sorted_by_date, ExpenseFilter};
use outlay_core::Expense;

use crate::output;

use super::get_user_context;

pub fn run(
    search: Option<String>,
    category: Option<String>,
    limit: Option<usize>,
    json: bool,
) -> Result<()> {
    let ctx = get_user_context()?;
    let snapshot = ctx.store.snapshot();

    let mut filter = ExpenseFilter::new();
    if let Some(term) = search {
        filter = filter.search(term);
    }
    if let Some(category) = category {
        filter = filter.category(category);
    }

    let mut matching: Vec<&Expense> = sorted_by_date(&snapshot)
        .into_iter()
        .filter(|e| filter.matches(e))
        .collect();
    if let Some(limit) = limit {
        matching.truncate(limit);
    }

    if json {
        println!("{}", serde_json::to_string_pretty(&matching)?);
        return Ok(());
    }

    if matching.is_empty() {
        println!("{}", "No expenses found".dimmed());
        return Ok(());
    }

    println!("{}", output::expense_table(matching.iter().copied()));
    let shown_total: rust_decimal::Decimal = matching.iter().map(|e| e.amount).sum();
    println!(
        "{} of {} expenses, {} (all: {})",
        matching.len(),
        snapshot.len(),
        output::format_amount(shown_total).bold(),
        output::format_amount(aggregation::total(&snapshot))
    );
    Ok(())
}
