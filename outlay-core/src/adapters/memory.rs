//! In-process key-value storage

use std::collections::HashMap;
use std::sync::Mutex;

use crate::domain::result::{Error, Result};
use crate::ports::KeyValueStore;

/// Key-value storage that lives only as long as the process
#[derive(Debug, Default)]
pub struct MemoryKeyValueStore {
    entries: Mutex<HashMap<String, String>>,
}

impl MemoryKeyValueStore {
    pub fn new() -> Self {
        Self::default()
    }

    fn lock(&self) -> Result<std::sync::MutexGuard<'_, HashMap<String, String>>> {
        self.entries
            .lock()
            .map_err(|e| Error::persistence(format!("Lock poisoned: {}", e)))
    }
}

impl KeyValueStore for MemoryKeyValueStore {
    fn get(&self, key: &str) -> Result<Option<String>> {
        Ok(self.lock()?.get(key).cloned())
    }

    fn set(&self, key: &str, value: &str) -> Result<()> {
        self.lock()?.insert(key.to_string(), value.to_string());
        Ok(())
    }

    fn remove(&self, key: &str) -> Result<()> {
        self.lock()?.remove(key);
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_set_get_remove() {
        let store = MemoryKeyValueStore::new();
        assert_eq!(store.get("expenses_1").unwrap(), None);

        store.set("expenses_1", "[]").unwrap();
        assert_eq!(store.get("expenses_1").unwrap().as_deref(), Some("[]"));

        store.set("expenses_1", "[1]").unwrap();
        assert_eq!(store.get("expenses_1").unwrap().as_deref(), Some("[1]"));

        store.remove("expenses_1").unwrap();
        store.remove("expenses_1").unwrap();
        assert_eq!(store.get("expenses_1").unwrap(), None);
    }
}
