use serde::{Deserialize, Serialize};
use std::{
    fs::{read_to_string, write},
    path::{Path, PathBuf},
};

use crate::{error::HierarchyError, forest::SiblingOrder};

pub const DEFAULT_DATABASE: &str = "notes.db";
pub const DEFAULT_LOG_FILTER: &str = "info";

/// Engine and CLI settings, read from a TOML file.
///
/// ```toml
/// database = "/var/lib/notes/notes.db"
/// sibling_order = "label"
/// log_filter = "noteforest=debug"
/// ```
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct HierarchyConfig {
    /// SQLite file backing the graph store.
    pub database: PathBuf,
    pub sibling_order: SiblingOrder,
    /// `tracing-subscriber` env filter used when `RUST_LOG` is unset.
    pub log_filter: String,
}

impl Default for HierarchyConfig {
    fn default() -> Self {
        HierarchyConfig {
            database: PathBuf::from(DEFAULT_DATABASE),
            sibling_order: SiblingOrder::default(),
            log_filter: DEFAULT_LOG_FILTER.to_string(),
        }
    }
}

impl HierarchyConfig {
    /// Reads `path`, falling back to defaults when the file does not exist.
    pub fn load<P: AsRef<Path>>(path: P) -> Result<Self, HierarchyError> {
        let path = path.as_ref();
        tracing::debug!("Attempting to read config from: {:?}", path);
        if !path.exists() {
            tracing::debug!("Config file not found, using defaults.");
            return Ok(HierarchyConfig::default());
        }
        let content = read_to_string(path)?;
        Ok(toml::from_str(&content)?)
    }

    pub fn save<P: AsRef<Path>>(&self, path: P) -> Result<(), HierarchyError> {
        tracing::debug!("Attempting to write config to: {:?}", path.as_ref());
        let toml_string = toml::to_string(self)?;
        write(path, toml_string)?;
        Ok(())
    }
}
