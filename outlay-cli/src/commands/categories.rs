//! Categories command - known categories and their usage

use anyhow::Result;
use colored::Colorize;
use serde::Serialize;

use outlay_core::domain::all_categories;
use outlay_core::services::aggregation;

use crate::output;

use super::get_user_context;

#[derive(Serialize)]
struct CategoryRow {
    name: String,
    count: usize,
    #[serde(with = "rust_decimal::serde::float")]
    amount: rust_decimal::Decimal,
}

pub fn run(json: bool) -> Result<()> {
    let ctx = get_user_context()?;
    let snapshot = ctx.store.snapshot();

    let in_use = ctx.store.categories_in_use()?;
    let summaries = aggregation::category_summary(&snapshot);
    let names = all_categories(&in_use, &ctx.config.category_choices());

    let rows: Vec<CategoryRow> = names
        .into_iter()
        .map(|name| {
            let summary = summaries.iter().find(|s| s.name == name);
            CategoryRow {
                count: summary.map_or(0, |s| s.count),
                amount: summary.map_or(rust_decimal::Decimal::ZERO, |s| s.amount),
                name,
            }
        })
        .collect();

    if json {
        println!("{}", serde_json::to_string_pretty(&rows)?);
        return Ok(());
    }

    let mut table = output::create_table();
    table.set_header(vec!["Category", "Expenses", "Total"]);
    for row in &rows {
        let name = if row.count > 0 {
            row.name.bold().to_string()
        } else {
            row.name.dimmed().to_string()
        };
        table.add_row(vec![name, row.count.to_string(), output::format_amount(row.amount)]);
    }
    println!("{}", table);
    Ok(())
}
