//! Synchronous string key-value stores backing the session record.
//!
//! # File Format
//!
//! ```json
//! { "manveer_session": "{\"startTime\":1760000000000,\"isActive\":true}" }
//! ```
//!
//! Values are opaque strings; the gate owns their encoding. Writes go through
//! a temp file + rename so a crash mid-write never leaves a truncated store.
//! A store file that fails to parse is reported on read and replaced on the
//! next write.

use std::collections::BTreeMap;
use std::io::Write;
use std::path::{Path, PathBuf};

use fs_err as fs;
use tempfile::NamedTempFile;

use crate::error::{GateError, Result};

pub trait KvStore {
    fn get(&self, key: &str) -> Result<Option<String>>;
    fn set(&mut self, key: &str, value: &str) -> Result<()>;
    /// Removing an absent key is not an error.
    fn remove(&mut self, key: &str) -> Result<()>;
}

#[derive(Debug, Clone, Default)]
pub struct MemoryKvStore {
    entries: BTreeMap<String, String>,
}

impl MemoryKvStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn contains(&self, key: &str) -> bool {
        self.entries.contains_key(key)
    }
}

impl KvStore for MemoryKvStore {
    fn get(&self, key: &str) -> Result<Option<String>> {
        Ok(self.entries.get(key).cloned())
    }

    fn set(&mut self, key: &str, value: &str) -> Result<()> {
        self.entries.insert(key.to_string(), value.to_string());
        Ok(())
    }

    fn remove(&mut self, key: &str) -> Result<()> {
        self.entries.remove(key);
        Ok(())
    }
}

/// JSON-file store, re-read on every access so external edits are seen.
#[derive(Debug, Clone)]
pub struct FileKvStore {
    path: PathBuf,
}

impl FileKvStore {
    pub fn new(path: PathBuf) -> Self {
        Self { path }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    fn read_entries(&self) -> Result<BTreeMap<String, String>> {
        let content = match fs::read_to_string(&self.path) {
            Ok(content) => content,
            Err(err) if err.kind() == std::io::ErrorKind::NotFound => {
                return Ok(BTreeMap::new())
            }
            Err(err) => return Err(GateError::StorageUnavailable(err.to_string())),
        };

        if content.trim().is_empty() {
            return Ok(BTreeMap::new());
        }

        serde_json::from_str(&content).map_err(|err| GateError::StoreMalformed {
            path: self.path.clone(),
            details: err.to_string(),
        })
    }

    /// Entries to rewrite from. A malformed file is discarded and reported
    /// as needing a rewrite.
    fn entries_for_write(&self) -> Result<(BTreeMap<String, String>, bool)> {
        match self.read_entries() {
            Ok(entries) => Ok((entries, false)),
            Err(GateError::StoreMalformed { details, .. }) => {
                tracing::warn!(
                    path = %self.path.display(),
                    details = %details,
                    "Discarding malformed key-value store"
                );
                Ok((BTreeMap::new(), true))
            }
            Err(err) => Err(err),
        }
    }

    fn write_entries(&self, entries: &BTreeMap<String, String>) -> Result<()> {
        let parent_dir = self.path.parent().ok_or_else(|| {
            GateError::StorageUnavailable(format!(
                "store path has no parent directory: {}",
                self.path.display()
            ))
        })?;
        fs::create_dir_all(parent_dir)
            .map_err(|err| GateError::StorageUnavailable(err.to_string()))?;

        let content = serde_json::to_string_pretty(entries).map_err(|source| GateError::Json {
            context: "serializing key-value store".to_string(),
            source,
        })?;

        let mut temp_file = NamedTempFile::new_in(parent_dir)
            .map_err(|err| GateError::StorageUnavailable(err.to_string()))?;
        temp_file
            .write_all(content.as_bytes())
            .and_then(|()| temp_file.flush())
            .map_err(|err| GateError::StorageUnavailable(err.to_string()))?;
        temp_file
            .persist(&self.path)
            .map_err(|err| GateError::StorageUnavailable(err.error.to_string()))?;
        Ok(())
    }
}

impl KvStore for FileKvStore {
    fn get(&self, key: &str) -> Result<Option<String>> {
        Ok(self.read_entries()?.remove(key))
    }

    fn set(&mut self, key: &str, value: &str) -> Result<()> {
        let (mut entries, _) = self.entries_for_write()?;
        entries.insert(key.to_string(), value.to_string());
        self.write_entries(&entries)
    }

    fn remove(&mut self, key: &str) -> Result<()> {
        let (mut entries, discarded) = self.entries_for_write()?;
        if entries.remove(key).is_none() && !discarded {
            return Ok(());
        }
        self.write_entries(&entries)
    }
}
