//! Directory-backed key-value storage
//!
//! Each key is stored as `<dir>/<key>.json`. Writes go to a temporary sibling
//! file that is renamed into place, so a crash never leaves a half-written blob.

use std::fs;
use std::io::ErrorKind;
use std::path::{Path, PathBuf};

use crate::domain::result::{Error, Result};
use crate::ports::KeyValueStore;

/// Key-value storage persisted as one JSON file per key
#[derive(Debug, Clone)]
pub struct FileKeyValueStore {
    dir: PathBuf,
}

impl FileKeyValueStore {
    pub fn new(dir: impl Into<PathBuf>) -> Self {
        Self { dir: dir.into() }
    }

    pub fn dir(&self) -> &Path {
        &self.dir
    }

    fn path_for(&self, key: &str) -> Result<PathBuf> {
        let valid = !key.is_empty()
            && key
                .chars()
                .all(|c| c.is_ascii_alphanumeric() || c == '_' || c == '-');
        if !valid {
            return Err(Error::validation(format!("Invalid storage key: {:?}", key)));
        }
        Ok(self.dir.join(format!("{}.json", key)))
    }
}

impl KeyValueStore for FileKeyValueStore {
    fn get(&self, key: &str) -> Result<Option<String>> {
        let path = self.path_for(key)?;
        match fs::read_to_string(&path) {
            Ok(content) => Ok(Some(content)),
            Err(e) if e.kind() == ErrorKind::NotFound => Ok(None),
            Err(e) => Err(Error::persistence(format!("Failed to read {:?}: {}", path, e))),
        }
    }

    fn set(&self, key: &str, value: &str) -> Result<()> {
        let path = self.path_for(key)?;
        fs::create_dir_all(&self.dir).map_err(|e| {
            Error::persistence(format!("Failed to create {:?}: {}", self.dir, e))
        })?;

        let tmp_path = path.with_extension("json.tmp");
        fs::write(&tmp_path, value)
            .and_then(|_| fs::rename(&tmp_path, &path))
            .map_err(|e| Error::persistence(format!("Failed to write {:?}: {}", path, e)))
    }

    fn remove(&self, key: &str) -> Result<()> {
        let path = self.path_for(key)?;
        match fs::remove_file(&path) {
            Ok(()) => Ok(()),
            Err(e) if e.kind() == ErrorKind::NotFound => Ok(()),
            Err(e) => Err(Error::persistence(format!("Failed to remove {:?}: {}", path, e))),
        }
    }
}
