//! Key-value persistence port

use crate::domain::result::Result;

/// Opaque string-keyed storage for JSON payloads
///
/// Implementations report any failure to reach the backing storage as
/// `Error::PersistenceUnavailable`; a missing key is `Ok(None)`, not an error.
pub trait KeyValueStore: Send + Sync {
    /// Read the value stored under `key`
    fn get(&self, key: &str) -> Result<Option<String>>;

    /// Store `value` under `key`, replacing any previous value
    fn set(&self, key: &str, value: &str) -> Result<()>;

    /// Delete `key`; removing an absent key succeeds
    fn remove(&self, key: &str) -> Result<()>;
}
