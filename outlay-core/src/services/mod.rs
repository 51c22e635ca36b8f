//! Service layer - business logic orchestration
//!
//! The store owns the active collection; everything else is a pure function
//! over a snapshot of it.

pub mod aggregation;
mod logging;
pub mod query;
mod store;
pub mod transfer;

pub use aggregation::{CategorySummary, DayBucket, Insights, MonthBucket, RecentActivity};
pub use logging::{init_logging, LOG_ENV_VAR};
pub use query::{recent_expenses, sorted_by_date, ExpenseFilter};
pub use store::{storage_key, ExpenseStore, SubscriptionId};
