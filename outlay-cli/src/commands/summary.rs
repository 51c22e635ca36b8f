//! Summary command - dashboard statistics in the terminal

use anyhow::Result;
use colored::Colorize;
use comfy_table::{ContentArrangement, Table};
use rust_decimal::Decimal;

use outlay_core::services::aggregation::{self, percent_of_max};

use crate::output;

use super::{get_user_context, parse_date_arg};

pub fn run(as_of: Option<String>, daily: bool, history: bool, json: bool) -> Result<()> {
    let ctx = get_user_context()?;
    let today = parse_date_arg(as_of.as_deref())?;
    let insights = ctx.insights(today);

    if json {
        println!("{}", serde_json::to_string_pretty(&insights)?);
        return Ok(());
    }

    println!("{}", format!("Spending Summary as of {}", today).bold());
    println!();

    // Key-value overview
    let mut table = Table::new();
    table.set_content_arrangement(ContentArrangement::Dynamic);
    table.add_row(vec!["Expenses".to_string(), insights.expense_count.to_string()]);
    table.add_row(vec!["Total".to_string(), output::format_amount(insights.total)]);
    table.add_row(vec![
        "This month".to_string(),
        format!(
            "{} ({} expenses)",
            output::format_amount(insights.current_month_total),
            insights.current_month_count
        ),
    ]);
    table.add_row(vec!["vs last month".to_string(), trend_label(insights.month_over_month_percent)]);
    table.add_row(vec![
        format!("Last {} days", insights.recent_activity.window_days),
        format!(
            "{} ({} expenses)",
            output::format_amount(insights.recent_activity.total),
            insights.recent_activity.count
        ),
    ]);
    if let Some(top) = &insights.top_category {
        table.add_row(vec![
            "Top category".to_string(),
            format!("{} ({})", top.name, output::format_amount(top.amount)),
        ]);
    }
    if let Some(largest) = &insights.largest_expense {
        table.add_row(vec![
            "Largest expense".to_string(),
            format!("{} ({})", largest.description, output::format_amount(largest.amount)),
        ]);
    }
    println!("{}", table);
    println!();

    if !insights.categories.is_empty() {
        println!("{}", "By Category".bold());
        let max = insights.categories.first().map_or(Decimal::ZERO, |c| c.amount);
        let mut table = output::create_table();
        table.set_header(vec!["Category", "Count", "Amount", "Share", ""]);
        for summary in &insights.categories {
            table.add_row(vec![
                summary.name.clone(),
                summary.count.to_string(),
                output::format_amount(summary.amount),
                output::format_percent(summary.percentage),
                output::bar(percent_of_max(summary.amount, max)),
            ]);
        }
        println!("{}", table);
        println!();
    }

    let months = if history {
        println!("{}", "Monthly History".bold());
        aggregation::monthly_history(&ctx.store.snapshot())
    } else {
        println!("{}", "Last 6 Months".bold());
        insights.monthly.clone()
    };
    let max = months.iter().map(|m| m.amount).max().unwrap_or(Decimal::ZERO);
    let mut table = output::create_table();
    table.set_header(vec!["Month", "Amount", ""]);
    for month in &months {
        table.add_row(vec![
            format!("{} {}", month.label(), month.year),
            output::format_amount(month.amount),
            output::bar(percent_of_max(month.amount, max)),
        ]);
    }
    println!("{}", table);

    if daily {
        println!();
        println!("{}", "Last 30 Days".bold());
        let mut table = output::create_table();
        table.set_header(vec!["Date", "Amount", "Cumulative"]);
        for day in insights.daily.iter().filter(|d| !d.amount.is_zero()) {
            table.add_row(vec![
                day.date.format("%Y-%m-%d").to_string(),
                output::format_amount(day.amount),
                output::format_amount(day.cumulative),
            ]);
        }
        println!("{}", table);
    }

    if !insights.recent_expenses.is_empty() {
        println!();
        println!("{}", "Recent Expenses".bold());
        println!("{}", output::expense_table(&insights.recent_expenses));
    }

    Ok(())
}

fn trend_label(percent: Decimal) -> String {
    let sign = if percent > Decimal::ZERO { "+" } else { "" };
    let text = format!("{}{:.1}%", sign, percent.round_dp(1));
    if percent > Decimal::ZERO {
        text.red().to_string()
    } else if percent < Decimal::ZERO {
        text.green().to_string()
    } else {
        text
    }
}
