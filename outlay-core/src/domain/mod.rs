//! Core domain entities
//!
//! Pure data structures with validation logic - no I/O or external dependencies.

pub mod category;
mod expense;
pub mod result;
mod snapshot;
mod user;

pub use category::{all_categories, DEFAULT_CATEGORIES};
pub use expense::{parse_date, Expense, ExpenseId, NewExpense};
pub use snapshot::Snapshot;
pub use user::{User, UserId};
