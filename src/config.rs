//! Configuration loading and management
//!
//! Handles parsing of the `kanban.toml` file kept in the data directory.

use serde::Deserialize;
use std::path::{Path, PathBuf};

use crate::error::{Error, Result};
use crate::storage::{self, TASKS_KEY, THEME_KEY};

/// File name of the configuration inside the data directory
pub const CONFIG_FILE: &str = "kanban.toml";

/// Environment variable overriding the data directory
pub const DATA_DIR_ENV: &str = "KANBAN_DATA_DIR";

/// Main configuration structure
#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize)]
pub struct Config {
    /// Storage configuration
    #[serde(default)]
    pub storage: StorageConfig,

    /// Auto-save configuration
    #[serde(default)]
    pub autosave: AutoSaveConfig,

    /// Sample data configuration
    #[serde(default)]
    pub seed: SeedConfig,

    /// Export configuration
    #[serde(default)]
    pub export: ExportConfig,
}

#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct StorageConfig {
    /// Key the task collection is stored under
    #[serde(default = "default_tasks_key")]
    pub tasks_key: String,
}

fn default_tasks_key() -> String {
    TASKS_KEY.to_string()
}

impl Default for StorageConfig {
    fn default() -> Self {
        Self {
            tasks_key: default_tasks_key(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct AutoSaveConfig {
    /// Seconds between periodic saves in the interactive shell
    #[serde(default = "default_interval_secs")]
    pub interval_secs: u64,
}

fn default_interval_secs() -> u64 {
    30
}

impl Default for AutoSaveConfig {
    fn default() -> Self {
        Self {
            interval_secs: default_interval_secs(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct SeedConfig {
    /// Populate an empty board with sample tasks on startup
    #[serde(default = "default_true")]
    pub enabled: bool,
}

fn default_true() -> bool {
    true
}

impl Default for SeedConfig {
    fn default() -> Self {
        Self {
            enabled: default_true(),
        }
    }
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize)]
pub struct ExportConfig {
    /// Directory for export files; the working directory when unset
    #[serde(default)]
    pub dir: Option<PathBuf>,
}

impl ExportConfig {
    pub fn dir_or_current(&self) -> PathBuf {
        self.dir.clone().unwrap_or_else(|| PathBuf::from("."))
    }
}

impl Config {
    /// Load configuration from a `kanban.toml` file
    pub fn load(path: &Path) -> Result<Self> {
        let content = std::fs::read_to_string(path)?;
        let config: Config = toml::from_str(&content)?;
        config.validate()?;
        Ok(config)
    }

    /// Load `kanban.toml` from a data directory if present.
    ///
    /// A missing file yields defaults; a present but invalid one is an error.
    pub fn find(data_dir: &Path) -> Result<Self> {
        let config_path = data_dir.join(CONFIG_FILE);
        if config_path.exists() {
            Self::load(&config_path)
        } else {
            Ok(Self::default())
        }
    }

    fn validate(&self) -> Result<()> {
        let key = self.storage.tasks_key.trim();
        if key != self.storage.tasks_key {
            return Err(Error::InvalidConfig(
                "storage.tasks_key cannot have surrounding whitespace".to_string(),
            ));
        }
        storage::validate_key(key)
            .map_err(|_| Error::InvalidConfig(format!("storage.tasks_key '{key}' is not a valid key")))?;
        if key == THEME_KEY {
            return Err(Error::InvalidConfig(format!(
                "storage.tasks_key cannot be '{THEME_KEY}'"
            )));
        }

        if self.autosave.interval_secs < 1 {
            return Err(Error::InvalidConfig(
                "autosave.interval_secs must be >= 1".to_string(),
            ));
        }

        if let Some(dir) = &self.export.dir {
            if dir.as_os_str().is_empty() {
                return Err(Error::InvalidConfig(
                    "export.dir cannot be empty".to_string(),
                ));
            }
        }

        Ok(())
    }
}

/// Resolve the data directory.
///
/// An explicit directory (flag or `KANBAN_DATA_DIR`) wins, then the
/// platform data directory, then `.kanban` under the working directory.
pub fn resolve_data_dir(explicit: Option<&Path>) -> PathBuf {
    if let Some(dir) = explicit {
        return dir.to_path_buf();
    }
    directories::ProjectDirs::from("", "", "kanban")
        .map(|dirs| dirs.data_dir().to_path_buf())
        .unwrap_or_else(|| PathBuf::from(".kanban"))
}
