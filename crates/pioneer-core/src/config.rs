//! Persistent configuration for Pioneer.
//!
//! Loads an optional TOML config at `.pioneer.toml` in the working
//! directory. Everything has a sensible default so the tool works with no
//! config file at all.

use crate::PioneerError;
use serde::{Deserialize, Serialize};
use std::path::Path;

/// Default name of the persisted index file.
pub const DEFAULT_INDEX_FILE: &str = ".pioneer.json";

/// Default name of the optional configuration file.
pub const CONFIG_FILE: &str = ".pioneer.toml";

/// Top-level Pioneer configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct PioneerConfig {
    /// Name of the index file written in the working directory.
    pub index_file: String,
    /// Worker threads for indexing and grep. `0` auto-detects.
    pub threads: usize,
    /// Directory names skipped during discovery, in addition to hidden
    /// entries.
    pub ignore_patterns: Vec<String>,
}

impl Default for PioneerConfig {
    fn default() -> Self {
        Self {
            index_file: DEFAULT_INDEX_FILE.to_string(),
            threads: 0,
            ignore_patterns: [
                "build",
                "node_modules",
                "__pycache__",
                ".git",
                ".venv",
                "venv",
                "dist",
                "target",
                ".cache",
                "CMakeFiles",
            ]
            .into_iter()
            .map(String::from)
            .collect(),
        }
    }
}

impl PioneerConfig {
    /// Load configuration from the given path.
    pub fn load(path: &Path) -> Result<Self, PioneerError> {
        let content = std::fs::read_to_string(path)?;
        toml::from_str(&content).map_err(|e| PioneerError::Config(e.to_string()))
    }

    /// Load from `.pioneer.toml` in the working directory, or return
    /// defaults if the file doesn't exist or fails to parse.
    pub fn load_or_default() -> Self {
        let path = Path::new(CONFIG_FILE);
        if path.exists() {
            Self::load(path).unwrap_or_default()
        } else {
            Self::default()
        }
    }
}
