//! Expense commands - add, edit, remove, show

use anyhow::Result;
use colored::Colorize;
use dialoguer::{Confirm, Input, Select};

use outlay_core::{Expense, ExpenseId, NewExpense, OutlayContext};

use crate::output;

use super::{get_user_context, parse_amount, parse_date_arg};

/// Fields for a new expense; anything missing is prompted for
pub struct AddArgs {
    pub description: Option<String>,
    pub amount: Option<String>,
    pub date: Option<String>,
    pub category: Option<String>,
    pub json: bool,
}

/// Fields to change on an existing expense; anything missing is kept
pub struct EditArgs {
    pub id: ExpenseId,
    pub description: Option<String>,
    pub amount: Option<String>,
    pub date: Option<String>,
    pub category: Option<String>,
    pub json: bool,
}

pub fn run_add(args: AddArgs) -> Result<()> {
    let mut ctx = get_user_context()?;

    let description = match args.description {
        Some(d) => d,
        None => Input::new().with_prompt("Description").interact_text()?,
    };
    let amount_str = match args.amount {
        Some(a) => a,
        None => Input::new().with_prompt("Amount").interact_text()?,
    };
    let amount = parse_amount(&amount_str)?;
    let date = parse_date_arg(args.date.as_deref())?;

    let category = match args.category {
        Some(c) => c,
        None => {
            let choices = ctx.config.category_choices();
            let selection = Select::new()
                .with_prompt("Category")
                .items(&choices)
                .default(0)
                .interact()?;
            choices[selection].clone()
        }
    };

    let new_expense = NewExpense::new(description.trim(), amount, date, category.trim());
    new_expense.validate()?;

    let expense = ctx.store.add(new_expense)?;
    if !ctx.store.saves_bound() {
        output::warning("Storage is unavailable; this expense is not saved");
    }

    if args.json {
        println!("{}", serde_json::to_string_pretty(&expense)?);
    } else {
        output::success(&format!(
            "Added expense {}: {} {}",
            expense.id,
            expense.description,
            output::format_amount(expense.amount)
        ));
    }
    Ok(())
}

pub fn run_edit(args: EditArgs) -> Result<()> {
    let mut ctx = get_user_context()?;

    let existing = find(&ctx, args.id)?;

    let amount = match args.amount.as_deref() {
        Some(a) => parse_amount(a)?,
        None => existing.amount,
    };
    let date = match args.date.as_deref() {
        Some(d) => parse_date_arg(Some(d))?,
        None => existing.date,
    };
    let draft = NewExpense::new(
        args.description.unwrap_or_else(|| existing.description.clone()).trim(),
        amount,
        date,
        args.category.unwrap_or_else(|| existing.category.clone()).trim(),
    );
    draft.validate()?;

    let edited = Expense::new(existing.id, draft.description, draft.amount, draft.date, draft.category);
    if edited == existing {
        output::info("No changes");
        return Ok(());
    }

    let updated = ctx
        .store
        .update(edited)?
        .ok_or_else(|| anyhow::anyhow!("Expense {} not found", args.id))?;

    if args.json {
        println!("{}", serde_json::to_string_pretty(&updated)?);
    } else {
        output::success(&format!("Updated expense {}", updated.id));
    }
    Ok(())
}

pub fn run_remove(id: ExpenseId, yes: bool) -> Result<()> {
    let mut ctx = get_user_context()?;

    let existing = find(&ctx, id)?;

    // Confirm removal unless --yes
    if !yes {
        println!(
            "\n{}",
            format!(
                "This will remove expense {} ({}, {}).",
                existing.id,
                existing.description,
                output::format_amount(existing.amount)
            )
            .yellow()
        );
        if !Confirm::new()
            .with_prompt("Are you sure?")
            .default(false)
            .interact()?
        {
            println!("{}\n", "Cancelled".dimmed());
            return Ok(());
        }
    }

    if ctx.store.delete(id)? {
        output::success(&format!("Removed expense {}", id));
    }
    Ok(())
}

pub fn run_show(id: ExpenseId, json: bool) -> Result<()> {
    let ctx = get_user_context()?;
    let expense = find(&ctx, id)?;

    if json {
        println!("{}", serde_json::to_string_pretty(&expense)?);
        return Ok(());
    }

    let mut table = output::create_table();
    table.add_row(vec!["ID".to_string(), expense.id.to_string()]);
    table.add_row(vec!["Description".to_string(), expense.description.clone()]);
    table.add_row(vec!["Amount".to_string(), output::format_amount(expense.amount)]);
    table.add_row(vec!["Date".to_string(), expense.date.format("%Y-%m-%d").to_string()]);
    table.add_row(vec!["Category".to_string(), expense.category.clone()]);
    println!("{}", table);
    Ok(())
}

fn find(ctx: &OutlayContext, id: ExpenseId) -> Result<Expense> {
    ctx.store
        .get_by_id(id)?
        .ok_or_else(|| anyhow::anyhow!("Expense {} not found", id))
}
