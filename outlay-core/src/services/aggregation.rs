//! Aggregation engine - derived views over a snapshot
//!
//! Every function here is pure: it takes the expenses (usually a
//! [`Snapshot`](crate::domain::Snapshot), which derefs to a slice) and a
//! reference date, and returns a fresh value. Nothing is cached or persisted.
//!
//! All windows compare calendar dates only. Callers holding a timestamp pass
//! its date (`now.date_naive()`), never the timestamp itself.
//!
//! Sums saturate at the `Decimal` bounds instead of overflowing, so any
//! collection the store accepts can be summarized.

use std::collections::HashMap;

use chrono::{Datelike, Days, NaiveDate};
use rust_decimal::Decimal;
use serde::Serialize;

use crate::domain::Expense;
use crate::services::query;

/// Number of calendar months in the monthly series, current month included
pub const MONTHLY_SERIES_LEN: u32 = 6;

/// Number of days in the daily trend, today included
pub const DAILY_TREND_DAYS: u64 = 30;

const MONTH_ABBREVIATIONS: [&str; 12] = [
    "Jan", "Feb", "Mar", "Apr", "May", "Jun", "Jul", "Aug", "Sep", "Oct", "Nov", "Dec",
];

/// Per-category totals
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct CategorySummary {
    pub name: String,
    #[serde(with = "rust_decimal::serde::float")]
    pub amount: Decimal,
    pub count: usize,
    /// Share of the overall total, 0-100; 0 when the total is 0
    #[serde(with = "rust_decimal::serde::float")]
    pub percentage: Decimal,
}

/// One calendar month bucket
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct MonthBucket {
    pub year: i32,
    pub month: u32,
    #[serde(with = "rust_decimal::serde::float")]
    pub amount: Decimal,
}

impl MonthBucket {
    /// Short month name, e.g. `Jan`
    pub fn label(&self) -> &'static str {
        self.month
            .checked_sub(1)
            .and_then(|i| MONTH_ABBREVIATIONS.get(i as usize))
            .copied()
            .unwrap_or("???")
    }
}

/// One day of the daily trend with its running total
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct DayBucket {
    pub date: NaiveDate,
    #[serde(with = "rust_decimal::serde::float")]
    pub amount: Decimal,
    #[serde(with = "rust_decimal::serde::float")]
    pub cumulative: Decimal,
}

/// Count and sum of expenses inside a trailing window
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct RecentActivity {
    pub window_days: u32,
    pub count: usize,
    #[serde(with = "rust_decimal::serde::float")]
    pub total: Decimal,
}

/// Sum of all amounts
pub fn total(expenses: &[Expense]) -> Decimal {
    saturating_sum(expenses.iter().map(|e| e.amount))
}

/// Totals per category, largest first.
///
/// Categories with equal totals keep the order in which each category first
/// appears in `expenses`.
pub fn category_summary(expenses: &[Expense]) -> Vec<CategorySummary> {
    let mut summaries: Vec<CategorySummary> = Vec::new();
    let mut index_of: HashMap<&str, usize> = HashMap::new();

    for expense in expenses {
        match index_of.get(expense.category.as_str()) {
            Some(&i) => {
                summaries[i].amount = summaries[i].amount.saturating_add(expense.amount);
                summaries[i].count += 1;
            }
            None => {
                index_of.insert(expense.category.as_str(), summaries.len());
                summaries.push(CategorySummary {
                    name: expense.category.clone(),
                    amount: expense.amount,
                    count: 1,
                    percentage: Decimal::ZERO,
                });
            }
        }
    }

    let grand_total = total(expenses);
    for summary in &mut summaries {
        summary.percentage = percent_of(summary.amount, grand_total);
    }

    // Stable sort keeps first-seen order among ties
    summaries.sort_by(|a, b| b.amount.cmp(&a.amount));
    summaries
}

/// Highest-total category, `None` for an empty snapshot
pub fn top_category(expenses: &[Expense]) -> Option<CategorySummary> {
    category_summary(expenses).into_iter().next()
}

/// Largest single expense; the first one wins a tie
pub fn largest_expense(expenses: &[Expense]) -> Option<&Expense> {
    expenses.iter().fold(None, |best: Option<&Expense>, e| match best {
        Some(b) if b.amount >= e.amount => Some(b),
        _ => Some(e),
    })
}

/// The six calendar months ending with `today`'s month, oldest first,
/// zero-filled.
pub fn monthly_series(expenses: &[Expense], today: NaiveDate) -> Vec<MonthBucket> {
    let current_month0 = today.month0();

    let mut buckets: Vec<MonthBucket> = (0..MONTHLY_SERIES_LEN)
        .rev()
        .map(|i| {
            let month0 = (current_month0 + 12 - i) % 12;
            let year = if i > current_month0 {
                today.year() - 1
            } else {
                today.year()
            };
            MonthBucket {
                year,
                month: month0 + 1,
                amount: Decimal::ZERO,
            }
        })
        .collect();

    for expense in expenses {
        let (year, month) = expense.year_month();
        if let Some(bucket) = buckets
            .iter_mut()
            .find(|b| b.year == year && b.month == month)
        {
            bucket.amount = bucket.amount.saturating_add(expense.amount);
        }
    }

    buckets
}

/// Every month that has expenses, chronologically, without a window
pub fn monthly_history(expenses: &[Expense]) -> Vec<MonthBucket> {
    let mut totals: HashMap<(i32, u32), Decimal> = HashMap::new();
    for expense in expenses {
        let amount = totals.entry(expense.year_month()).or_insert(Decimal::ZERO);
        *amount = amount.saturating_add(expense.amount);
    }

    let mut history: Vec<MonthBucket> = totals
        .into_iter()
        .map(|((year, month), amount)| MonthBucket { year, month, amount })
        .collect();
    history.sort_by_key(|b| (b.year, b.month));
    history
}

/// The 30 days ending with `today`, oldest first, zero-filled, with a running
/// total.
pub fn daily_trend(expenses: &[Expense], today: NaiveDate) -> Vec<DayBucket> {
    let start = days_before(today, DAILY_TREND_DAYS - 1);

    let mut per_day: HashMap<NaiveDate, Decimal> = HashMap::new();
    for expense in expenses.iter().filter(|e| e.date >= start && e.date <= today) {
        let amount = per_day.entry(expense.date).or_insert(Decimal::ZERO);
        *amount = amount.saturating_add(expense.amount);
    }

    let mut running = Decimal::ZERO;
    (0..DAILY_TREND_DAYS)
        .map_while(|offset| start.checked_add_days(Days::new(offset)))
        .map(|date| {
            let amount = per_day.get(&date).copied().unwrap_or(Decimal::ZERO);
            running = running.saturating_add(amount);
            DayBucket {
                date,
                amount,
                cumulative: running,
            }
        })
        .collect()
}

/// Expenses in `today`'s calendar month
pub fn current_month(expenses: &[Expense], today: NaiveDate) -> Vec<&Expense> {
    expenses
        .iter()
        .filter(|e| e.year_month() == (today.year(), today.month()))
        .collect()
}

/// Change of this month's total against last month's, in percent.
///
/// Saturates to 0 when last month's total is 0.
pub fn month_over_month_trend(expenses: &[Expense], today: NaiveDate) -> Decimal {
    let current = (today.year(), today.month());
    let previous = if today.month() == 1 {
        (today.year() - 1, 12)
    } else {
        (today.year(), today.month() - 1)
    };

    let month_total = |key: (i32, u32)| -> Decimal {
        saturating_sum(
            expenses
                .iter()
                .filter(|e| e.year_month() == key)
                .map(|e| e.amount),
        )
    };

    let current_total = month_total(current);
    let previous_total = month_total(previous);
    if previous_total.is_zero() {
        return Decimal::ZERO;
    }
    percent_of(current_total.saturating_sub(previous_total), previous_total)
}

/// Expenses dated within `[today - window_days, today]`.
///
/// A window reaching past the earliest representable date covers everything
/// up to `today`.
pub fn recent_activity(expenses: &[Expense], today: NaiveDate, window_days: u32) -> RecentActivity {
    let start = days_before(today, u64::from(window_days));
    let in_window: Vec<&Expense> = expenses
        .iter()
        .filter(|e| e.date >= start && e.date <= today)
        .collect();

    RecentActivity {
        window_days,
        count: in_window.len(),
        total: saturating_sum(in_window.iter().map(|e| e.amount)),
    }
}

/// `amount / max * 100`, 0 when `max` is not positive
pub fn percent_of_max(amount: Decimal, max: Decimal) -> Decimal {
    if max <= Decimal::ZERO {
        return Decimal::ZERO;
    }
    percent_of(amount, max)
}

/// `part / whole * 100`, 0 when `whole` is 0, clamped to the `Decimal` range
fn percent_of(part: Decimal, whole: Decimal) -> Decimal {
    if whole.is_zero() {
        return Decimal::ZERO;
    }
    match part.checked_div(whole) {
        Some(ratio) => ratio.saturating_mul(Decimal::ONE_HUNDRED),
        None if part.is_sign_negative() != whole.is_sign_negative() => Decimal::MIN,
        None => Decimal::MAX,
    }
}

fn saturating_sum(amounts: impl IntoIterator<Item = Decimal>) -> Decimal {
    amounts.into_iter().fold(Decimal::ZERO, Decimal::saturating_add)
}

fn days_before(today: NaiveDate, days: u64) -> NaiveDate {
    today.checked_sub_days(Days::new(days)).unwrap_or(NaiveDate::MIN)
}

/// Everything a dashboard needs, computed in one pass over a snapshot
#[derive(Debug, Clone, Serialize)]
pub struct Insights {
    pub as_of: NaiveDate,
    pub expense_count: usize,
    #[serde(with = "rust_decimal::serde::float")]
    pub total: Decimal,
    pub categories: Vec<CategorySummary>,
    pub top_category: Option<CategorySummary>,
    pub largest_expense: Option<Expense>,
    pub monthly: Vec<MonthBucket>,
    pub daily: Vec<DayBucket>,
    #[serde(with = "rust_decimal::serde::float")]
    pub month_over_month_percent: Decimal,
    pub current_month_count: usize,
    #[serde(with = "rust_decimal::serde::float")]
    pub current_month_total: Decimal,
    pub recent_activity: RecentActivity,
    pub recent_expenses: Vec<Expense>,
}

impl Insights {
    pub fn compute(
        expenses: &[Expense],
        today: NaiveDate,
        recent_window_days: u32,
        recent_limit: usize,
    ) -> Self {
        let categories = category_summary(expenses);
        let this_month = current_month(expenses, today);

        Self {
            as_of: today,
            expense_count: expenses.len(),
            total: total(expenses),
            top_category: categories.first().cloned(),
            categories,
            largest_expense: largest_expense(expenses).cloned(),
            monthly: monthly_series(expenses, today),
            daily: daily_trend(expenses, today),
            month_over_month_percent: month_over_month_trend(expenses, today),
            current_month_count: this_month.len(),
            current_month_total: saturating_sum(this_month.iter().map(|e| e.amount)),
            recent_activity: recent_activity(expenses, today, recent_window_days),
            recent_expenses: query::recent_expenses(expenses, recent_limit)
                .into_iter()
                .cloned()
                .collect(),
        }
    }
}
