//! Immutable view of the active expense collection

use std::ops::Deref;
use std::sync::Arc;

use crate::domain::{Expense, ExpenseId, UserId};

/// An immutable, insertion-ordered copy of the active collection.
///
/// Cloning is cheap; every clone shares the same backing records. Derefs to
/// `[Expense]` so aggregation functions accept it directly.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Snapshot {
    user_id: Option<UserId>,
    expenses: Arc<Vec<Expense>>,
}

impl Snapshot {
    pub fn new(user_id: Option<UserId>, expenses: Vec<Expense>) -> Self {
        Self {
            user_id,
            expenses: Arc::new(expenses),
        }
    }

    /// Snapshot emitted while no user is bound
    pub fn unbound() -> Self {
        Self::default()
    }

    /// The user this snapshot belongs to, `None` when unbound
    pub fn user_id(&self) -> Option<UserId> {
        self.user_id
    }

    pub fn expenses(&self) -> &[Expense] {
        &self.expenses
    }

    pub fn get(&self, id: ExpenseId) -> Option<&Expense> {
        self.expenses.iter().find(|e| e.id == id)
    }

    pub fn to_vec(&self) -> Vec<Expense> {
        self.expenses.as_ref().clone()
    }
}

impl Deref for Snapshot {
    type Target = [Expense];

    fn deref(&self) -> &Self::Target {
        &self.expenses
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::NaiveDate;
    use rust_decimal::Decimal;

    #[test]
    fn test_snapshot_clones_share_records() {
        let date = NaiveDate::from_ymd_opt(2024, 1, 1).unwrap();
        let snapshot = Snapshot::new(
            Some(UserId(1)),
            vec![Expense::new(1, "Bus", Decimal::new(250, 2), date, "Transportation")],
        );
        let copy = snapshot.clone();

        assert_eq!(copy, snapshot);
        assert_eq!(copy.len(), 1);
        assert_eq!(copy.get(1).map(|e| e.description.as_str()), Some("Bus"));
        assert!(copy.get(2).is_none());
        assert_eq!(copy.user_id(), Some(UserId(1)));
    }

    #[test]
    fn test_unbound_snapshot_is_empty() {
        let snapshot = Snapshot::unbound();
        assert!(snapshot.is_empty());
        assert!(snapshot.user_id().is_none());
    }
}
