//! Runtime configuration loaded from `config.toml`.
//!
//! A missing file yields defaults. A file that exists but fails to parse is
//! an error: silently falling back would change the unlock word under the
//! user's feet.
//!
//! ```toml
//! [puzzle]
//! word = "MANVEER"
//! min_blanks = 2
//! max_blanks = 4
//! ```

use std::path::Path;

use serde::Deserialize;

use crate::error::{GateError, Result};

#[derive(Debug, Clone, Deserialize, Default, PartialEq, Eq)]
pub struct GateConfig {
    #[serde(default)]
    pub puzzle: PuzzleConfig,
}

#[derive(Debug, Clone, Deserialize, PartialEq, Eq)]
#[serde(default)]
pub struct PuzzleConfig {
    /// Name the child spells to unlock the app.
    pub word: String,
    pub min_blanks: usize,
    pub max_blanks: usize,
}

impl Default for PuzzleConfig {
    fn default() -> Self {
        Self {
            word: "MANVEER".to_string(),
            min_blanks: 2,
            max_blanks: 4,
        }
    }
}

impl GateConfig {
    pub fn validate(&self) -> Result<()> {
        let word = self.puzzle.word.trim();
        if word.is_empty() {
            return Err(GateError::InvalidConfig(
                "puzzle.word must not be empty".to_string(),
            ));
        }
        if !word.chars().all(|c| c.is_ascii_alphabetic()) {
            return Err(GateError::InvalidConfig(format!(
                "puzzle.word must contain only A-Z letters, got {word:?}"
            )));
        }
        if self.puzzle.min_blanks == 0 || self.puzzle.min_blanks > self.puzzle.max_blanks {
            return Err(GateError::InvalidConfig(format!(
                "puzzle blanks range {}..={} is invalid",
                self.puzzle.min_blanks, self.puzzle.max_blanks
            )));
        }
        Ok(())
    }
}

pub fn load_config(path: &Path) -> Result<GateConfig> {
    if !path.exists() {
        tracing::debug!(path = %path.display(), "No config file; using defaults");
        return Ok(GateConfig::default());
    }

    let content = fs_err::read_to_string(path)
        .map_err(|err| GateError::io(format!("reading {}", path.display()), err))?;
    let config = toml::from_str::<GateConfig>(&content).map_err(|err| {
        GateError::ConfigMalformed {
            path: path.to_path_buf(),
            details: err.to_string(),
        }
    })?;
    config.validate()?;
    Ok(config)
}
