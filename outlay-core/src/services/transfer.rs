//! Transfer service - JSON/CSV export and validated JSON import
//!
//! The export format is the persisted format: a JSON array of
//! `{id, description, amount, date, category}`. Imports are checked
//! element by element and rejected as a whole on the first violation.

use std::collections::HashSet;
use std::str::FromStr;

use rust_decimal::Decimal;
use serde_json::{Map, Value};

use crate::domain::result::{Error, Result};
use crate::domain::{parse_date, Expense};

/// Pretty-printed JSON array of expenses
pub fn export_json(expenses: &[Expense]) -> Result<String> {
    Ok(serde_json::to_string_pretty(expenses)?)
}

/// CSV with header `id,description,amount,date,category`
pub fn export_csv(expenses: &[Expense]) -> Result<String> {
    let mut writer = csv::Writer::from_writer(Vec::new());
    writer
        .write_record(["id", "description", "amount", "date", "category"])
        .map_err(csv_error)?;

    for expense in expenses {
        writer
            .write_record([
                expense.id.to_string(),
                expense.description.clone(),
                expense.amount.normalize().to_string(),
                expense.date.format("%Y-%m-%d").to_string(),
                expense.category.clone(),
            ])
            .map_err(csv_error)?;
    }

    let bytes = writer
        .into_inner()
        .map_err(|e| Error::validation(format!("Failed to finish CSV: {}", e)))?;
    String::from_utf8(bytes).map_err(|e| Error::validation(format!("CSV is not UTF-8: {}", e)))
}

/// Parse and validate an import payload.
///
/// Requirements: a JSON array whose elements are objects with a numeric
/// integral `id`, string `description`, numeric `amount`, string `date`
/// holding a calendar date, and string `category`; ids must be unique.
pub fn parse_import(payload: &str) -> Result<Vec<Expense>> {
    let value: Value = serde_json::from_str(payload)
        .map_err(|e| Error::import_shape(format!("not valid JSON: {}", e)))?;

    let Value::Array(items) = value else {
        return Err(Error::import_shape("expected a JSON array"));
    };

    let expenses = items
        .iter()
        .enumerate()
        .map(|(index, item)| parse_element(index, item))
        .collect::<Result<Vec<_>>>()?;

    ensure_unique_ids(&expenses)?;
    Ok(expenses)
}

/// Reject collections in which two records share an id
pub fn ensure_unique_ids(expenses: &[Expense]) -> Result<()> {
    let mut seen = HashSet::new();
    for expense in expenses {
        if !seen.insert(expense.id) {
            return Err(Error::import_shape(format!("duplicate id {}", expense.id)));
        }
    }
    Ok(())
}

fn parse_element(index: usize, item: &Value) -> Result<Expense> {
    let Value::Object(fields) = item else {
        return Err(Error::import_shape(format!("element {} is not an object", index)));
    };

    let id = integral(field(index, fields, "id")?)
        .ok_or_else(|| invalid(index, "id", "an integer number"))?;

    let description = string_field(index, fields, "description")?;

    let amount_value = field(index, fields, "amount")?;
    let amount = match amount_value {
        Value::Number(n) => Decimal::from_str(&n.to_string())
            .or_else(|_| Decimal::from_scientific(&n.to_string()))
            .map_err(|_| invalid(index, "amount", "a representable number"))?,
        _ => return Err(invalid(index, "amount", "a number")),
    };

    let raw_date = string_field(index, fields, "date")?;
    let date = parse_date(&raw_date).ok_or_else(|| invalid(index, "date", "an ISO-8601 date"))?;

    let category = string_field(index, fields, "category")?;

    Ok(Expense {
        id,
        description,
        amount,
        date,
        category,
    })
}

fn field<'a>(index: usize, fields: &'a Map<String, Value>, name: &str) -> Result<&'a Value> {
    fields
        .get(name)
        .ok_or_else(|| Error::import_shape(format!("element {} is missing `{}`", index, name)))
}

fn string_field(index: usize, fields: &Map<String, Value>, name: &str) -> Result<String> {
    field(index, fields, name)?
        .as_str()
        .map(str::to_string)
        .ok_or_else(|| invalid(index, name, "a string"))
}

/// Accept `7` and `7.0`, reject `7.5` and non-numbers
fn integral(value: &Value) -> Option<i64> {
    if let Some(id) = value.as_i64() {
        return Some(id);
    }
    let float = value.as_f64()?;
    if float.fract() == 0.0 && float.abs() < i64::MAX as f64 {
        Some(float as i64)
    } else {
        None
    }
}

fn invalid(index: usize, name: &str, expected: &str) -> Error {
    Error::import_shape(format!("element {}: `{}` must be {}", index, name, expected))
}

fn csv_error(e: csv::Error) -> Error {
    Error::validation(format!("Failed to write CSV: {}", e))
}
