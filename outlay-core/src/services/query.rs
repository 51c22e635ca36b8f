//! Query helpers - filtering and ordering for list views

use std::cmp::Reverse;

use crate::domain::Expense;

/// List filter: case-insensitive description search plus exact category match.
///
/// An empty filter matches everything.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ExpenseFilter {
    pub search: Option<String>,
    pub category: Option<String>,
}

impl ExpenseFilter {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn search(mut self, term: impl Into<String>) -> Self {
        let term = term.into();
        self.search = if term.trim().is_empty() { None } else { Some(term) };
        self
    }

    pub fn category(mut self, category: impl Into<String>) -> Self {
        let category = category.into();
        self.category = if category.is_empty() { None } else { Some(category) };
        self
    }

    pub fn matches(&self, expense: &Expense) -> bool {
        if let Some(term) = &self.search {
            let needle = term.trim().to_lowercase();
            if !expense.description.to_lowercase().contains(&needle) {
                return false;
            }
        }
        match &self.category {
            Some(category) => expense.category == *category,
            None => true,
        }
    }

    /// Matching expenses in snapshot order
    pub fn apply<'a>(&self, expenses: &'a [Expense]) -> Vec<&'a Expense> {
        expenses.iter().filter(|e| self.matches(e)).collect()
    }
}

/// Newest first; equal dates keep snapshot order
pub fn sorted_by_date(expenses: &[Expense]) -> Vec<&Expense> {
    let mut sorted: Vec<&Expense> = expenses.iter().collect();
    sorted.sort_by_key(|e| Reverse(e.date));
    sorted
}

/// The `limit` most recent expenses by date
pub fn recent_expenses(expenses: &[Expense], limit: usize) -> Vec<&Expense> {
    let mut sorted = sorted_by_date(expenses);
    sorted.truncate(limit);
    sorted
}
