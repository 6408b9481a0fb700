//! Storage configuration and path management for kidgate.
//!
//! All on-disk locations are resolved here so the CLI and tests agree on
//! where things live. Production code uses [`StorageConfig::from_home`],
//! which points at `~/.kidgate/`; tests use [`StorageConfig::with_root`]
//! with a temp directory.

use std::path::PathBuf;

use crate::error::{GateError, Result};

const ROOT_DIR_NAME: &str = ".kidgate";

/// Central configuration for all kidgate storage paths.
#[derive(Debug, Clone)]
pub struct StorageConfig {
    root: PathBuf,
}

impl StorageConfig {
    /// Resolves the default root (`~/.kidgate`).
    pub fn from_home() -> Result<Self> {
        let home = dirs::home_dir().ok_or(GateError::HomeDirNotFound)?;
        Ok(Self {
            root: home.join(ROOT_DIR_NAME),
        })
    }

    /// Creates a StorageConfig with a custom root directory.
    pub fn with_root(root: PathBuf) -> Self {
        Self { root }
    }

    /// Key-value file holding the session record.
    pub fn session_store_file(&self) -> PathBuf {
        self.root.join("session.json")
    }

    /// SQLite database for categories and flash cards.
    pub fn catalog_db_file(&self) -> PathBuf {
        self.root.join("catalog.db")
    }

    pub fn config_file(&self) -> PathBuf {
        self.root.join("config.toml")
    }

    pub fn logs_dir(&self) -> PathBuf {
        self.root.join("logs")
    }
}
