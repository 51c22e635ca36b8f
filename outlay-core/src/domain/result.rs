//! Result and error types for the core library

use thiserror::Error;

/// Core library error type
///
/// Expected "missing" outcomes (an unknown expense id, an absent persisted
/// blob) are modelled as `Option`/`bool` return values, not as errors.
#[derive(Error, Debug)]
pub enum Error {
    /// A store read or mutation was attempted while no user is active
    #[error("No active user: log in first")]
    NotBound,

    #[error("Invalid import: {0}")]
    InvalidImportShape(String),

    #[error("Persistence unavailable: {0}")]
    PersistenceUnavailable(String),

    #[error("User already exists: {0}")]
    DuplicateUser(String),

    #[error("Invalid credentials")]
    InvalidCredentials,

    #[error("Validation error: {0}")]
    Validation(String),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),
}

impl Error {
    /// Create an import shape error
    pub fn import_shape(msg: impl Into<String>) -> Self {
        Self::InvalidImportShape(msg.into())
    }

    /// Create a persistence error
    pub fn persistence(msg: impl Into<String>) -> Self {
        Self::PersistenceUnavailable(msg.into())
    }

    /// Create a validation error
    pub fn validation(msg: impl Into<String>) -> Self {
        Self::Validation(msg.into())
    }
}

/// Core library result type
pub type Result<T> = std::result::Result<T, Error>;
