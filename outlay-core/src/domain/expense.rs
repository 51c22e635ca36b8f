//! Expense domain model

use chrono::{DateTime, Datelike, NaiveDate, NaiveDateTime};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

use crate::domain::result::{Error, Result};

/// Expense identifier, unique within one user's collection
pub type ExpenseId = i64;

/// A single recorded expense
///
/// Serialises to the persisted/export shape:
/// `{id, description, amount, date, category}` with `amount` as a JSON number
/// and `date` as an ISO-8601 string.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Expense {
    pub id: ExpenseId,
    pub description: String,
    #[serde(with = "rust_decimal::serde::float")]
    pub amount: Decimal,
    #[serde(with = "iso_date")]
    pub date: NaiveDate,
    /// Free-form; the default category list is advisory only
    pub category: String,
}

impl Expense {
    pub fn new(
        id: ExpenseId,
        description: impl Into<String>,
        amount: Decimal,
        date: NaiveDate,
        category: impl Into<String>,
    ) -> Self {
        Self {
            id,
            description: description.into(),
            amount,
            date,
            category: category.into(),
        }
    }

    /// Calendar month key used by the monthly aggregations
    pub fn year_month(&self) -> (i32, u32) {
        (self.date.year(), self.date.month())
    }
}

/// An expense that has not been assigned an id yet
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct NewExpense {
    pub description: String,
    #[serde(with = "rust_decimal::serde::float")]
    pub amount: Decimal,
    #[serde(with = "iso_date")]
    pub date: NaiveDate,
    pub category: String,
}

impl NewExpense {
    pub fn new(
        description: impl Into<String>,
        amount: Decimal,
        date: NaiveDate,
        category: impl Into<String>,
    ) -> Self {
        Self {
            description: description.into(),
            amount,
            date,
            category: category.into(),
        }
    }

    /// Producer-side checks: non-blank description, positive amount.
    ///
    /// The store accepts records without calling this.
    pub fn validate(&self) -> Result<()> {
        if self.description.trim().is_empty() {
            return Err(Error::validation("description must not be empty"));
        }
        if self.amount <= Decimal::ZERO {
            return Err(Error::validation("amount must be greater than zero"));
        }
        if self.category.trim().is_empty() {
            return Err(Error::validation("category must not be empty"));
        }
        Ok(())
    }

    pub(crate) fn with_id(self, id: ExpenseId) -> Expense {
        Expense {
            id,
            description: self.description,
            amount: self.amount,
            date: self.date,
            category: self.category,
        }
    }
}

impl From<Expense> for NewExpense {
    fn from(expense: Expense) -> Self {
        Self {
            description: expense.description,
            amount: expense.amount,
            date: expense.date,
            category: expense.category,
        }
    }
}

/// Parse a calendar date from the formats found in persisted and exported data.
///
/// Time components are dropped; RFC 3339 timestamps are normalised to their UTC date.
pub fn parse_date(s: &str) -> Option<NaiveDate> {
    let s = s.trim();

    if let Ok(date) = NaiveDate::parse_from_str(s, "%Y-%m-%d") {
        return Some(date);
    }
    if let Ok(dt) = DateTime::parse_from_rfc3339(s) {
        return Some(dt.naive_utc().date());
    }

    let naive_formats = ["%Y-%m-%dT%H:%M:%S%.f", "%Y-%m-%d %H:%M:%S%.f"];
    naive_formats
        .iter()
        .find_map(|fmt| NaiveDateTime::parse_from_str(s, fmt).ok())
        .map(|dt| dt.date())
}

/// `NaiveDate` as `YYYY-MM-DD`, lenient on input
mod iso_date {
    use chrono::NaiveDate;
    use serde::{de, Deserialize, Deserializer, Serializer};

    pub fn serialize<S: Serializer>(date: &NaiveDate, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_str(&date.format("%Y-%m-%d").to_string())
    }

    pub fn deserialize<'de, D: Deserializer<'de>>(deserializer: D) -> Result<NaiveDate, D::Error> {
        let raw = String::deserialize(deserializer)?;
        super::parse_date(&raw)
            .ok_or_else(|| de::Error::custom(format!("invalid date: {}", raw)))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn date(y: i32, m: u32, d: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(y, m, d).unwrap()
    }

    #[test]
    fn test_serialized_shape() {
        let expense = Expense::new(1, "Coffee", Decimal::new(45, 1), date(2024, 1, 10), "Food");
        let value = serde_json::to_value(&expense).unwrap();
        assert_eq!(
            value,
            json!({
                "id": 1,
                "description": "Coffee",
                "amount": 4.5,
                "date": "2024-01-10",
                "category": "Food"
            })
        );
    }

    #[test]
    fn test_deserialize_timestamp_date() {
        let raw = r#"{"id":3,"description":"Taxi","amount":12,"date":"2024-03-05T00:00:00.000Z","category":"Travel"}"#;
        let expense: Expense = serde_json::from_str(raw).unwrap();
        assert_eq!(expense.date, date(2024, 3, 5));
        assert_eq!(expense.amount, Decimal::new(12, 0));
    }

    #[test]
    fn test_parse_date_formats() {
        assert_eq!(parse_date("2024-02-29"), Some(date(2024, 2, 29)));
        assert_eq!(parse_date("2024-02-29T23:59:59+00:00"), Some(date(2024, 2, 29)));
        assert_eq!(parse_date("2024-02-29T10:15:00"), Some(date(2024, 2, 29)));
        assert_eq!(parse_date("2024-02-29 10:15:00.250"), Some(date(2024, 2, 29)));
        assert_eq!(parse_date("29/02/2024"), None);
        assert_eq!(parse_date("not a date"), None);
    }

    #[test]
    fn test_validate_new_expense() {
        let ok = NewExpense::new("Lunch", Decimal::new(1250, 2), date(2024, 5, 1), "Food & Dining");
        assert!(ok.validate().is_ok());

        let blank = NewExpense::new("   ", Decimal::ONE, date(2024, 5, 1), "Other");
        assert!(matches!(blank.validate(), Err(Error::Validation(_))));

        let zero = NewExpense::new("Refund", Decimal::ZERO, date(2024, 5, 1), "Other");
        assert!(matches!(zero.validate(), Err(Error::Validation(_))));
    }

    #[test]
    fn test_year_month() {
        let expense = Expense::new(7, "Rent", Decimal::new(900, 0), date(2023, 12, 31), "Housing");
        assert_eq!(expense.year_month(), (2023, 12));
    }
}
