//! Outlay Core - Business logic for personal expense tracking
//!
//! This crate implements the core domain logic following hexagonal architecture:
//!
//! - **domain**: Core business entities (Expense, Snapshot, User)
//! - **ports**: Trait definitions for external dependencies (KeyValueStore, SessionProvider)
//! - **services**: The expense store plus pure aggregation, query and transfer functions
//! - **adapters**: Concrete implementations (file and in-memory storage, local session)

pub mod adapters;
pub mod config;
pub mod domain;
pub mod ports;
pub mod services;

use std::path::{Path, PathBuf};
use std::sync::Arc;

use anyhow::Result;
use chrono::NaiveDate;

use adapters::{FileKeyValueStore, LocalSession, PasswordParams};
use config::Config;
use ports::KeyValueStore;
use services::{ExpenseStore, Insights};

// Re-export commonly used types at crate root
pub use domain::result::Error;
pub use domain::{Expense, ExpenseId, NewExpense, Snapshot, User, UserId};

/// Main context for Outlay operations
///
/// This is the primary entry point for all business logic. It holds the
/// configuration, the session and the store bound to the session's user.
pub struct OutlayContext {
    pub config: Config,
    pub session: LocalSession,
    pub store: ExpenseStore,
    data_dir: PathBuf,
}

impl OutlayContext {
    /// Create a new Outlay context rooted at `data_dir`
    pub fn new(data_dir: &Path) -> Result<Self> {
        Self::with_password_params(data_dir, PasswordParams::default())
    }

    /// Same as [`OutlayContext::new`] with explicit password hashing cost
    pub fn with_password_params(data_dir: &Path, params: PasswordParams) -> Result<Self> {
        let config = Config::load(data_dir)?;

        let storage: Arc<dyn KeyValueStore> = Arc::new(FileKeyValueStore::new(data_dir));
        let session = LocalSession::with_params(Arc::clone(&storage), params);

        let mut store = if config.memory_only {
            tracing::info!("memory-only mode: expenses will not be persisted");
            ExpenseStore::memory_only()
        } else {
            ExpenseStore::new(Some(storage))
        };
        store.sync_session(&session);

        Ok(Self {
            config,
            session,
            store,
            data_dir: data_dir.to_path_buf(),
        })
    }

    pub fn data_dir(&self) -> &Path {
        &self.data_dir
    }

    /// Register a user, give them an empty collection and bind to it
    pub fn register(&mut self, email: &str, username: &str, password: &str) -> Result<User> {
        let user = self.session.register(email, username, password)?;
        self.store.initialize(user.id);
        self.store.sync_session(&self.session);
        Ok(user)
    }

    /// Log in and bind the store to the user's collection
    pub fn login(&mut self, email_or_username: &str, password: &str) -> Result<User> {
        let user = self.session.login(email_or_username, password)?;
        self.store.sync_session(&self.session);
        Ok(user)
    }

    /// Log out and clear the active collection
    pub fn logout(&mut self) -> Result<()> {
        self.session.logout()?;
        self.store.sync_session(&self.session);
        Ok(())
    }

    /// The logged-in user, or an error telling the caller to log in
    pub fn require_user(&self) -> Result<User> {
        self.session
            .current_user()?
            .ok_or_else(|| Error::NotBound.into())
    }

    /// Dashboard statistics for the bound collection as of `today`
    pub fn insights(&self, today: NaiveDate) -> Insights {
        Insights::compute(
            &self.store.snapshot(),
            today,
            self.config.recent_activity_days,
            self.config.recent_expenses,
        )
    }
}
