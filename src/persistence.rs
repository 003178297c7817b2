//! Persistence adapter between the task store and the key-value store.
//!
//! This is the only code that reads or writes the tasks key. Reads fail
//! soft: a missing, unreadable, or corrupt value loads as an empty board,
//! and corrupt bytes are kept under a backup key.

use std::fmt;
use std::str::FromStr;

use chrono::{DateTime, Utc};
use tracing::{debug, warn};

use crate::error::{Error, Result};
use crate::storage::{KeyValueStore, TASKS_KEY, THEME_KEY};
use crate::task::Task;

/// Board colour scheme, owned by the theme layer
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Theme {
    Light,
    Dark,
}

impl fmt::Display for Theme {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            Theme::Light => "light",
            Theme::Dark => "dark",
        })
    }
}

impl FromStr for Theme {
    type Err = Error;

    fn from_str(value: &str) -> Result<Self> {
        match value.trim() {
            "light" => Ok(Theme::Light),
            "dark" => Ok(Theme::Dark),
            other => Err(Error::InvalidArgument(format!("unknown theme '{other}'"))),
        }
    }
}

/// Result of a soft load
#[derive(Debug, Default, PartialEq)]
pub struct Loaded {
    pub tasks: Vec<Task>,
    /// Why the board started empty despite stored data
    pub warning: Option<String>,
}

impl Loaded {
    fn empty_with(warning: String) -> Self {
        Self {
            tasks: Vec::new(),
            warning: Some(warning),
        }
    }
}

#[derive(Debug)]
pub struct TaskPersistence {
    store: Box<dyn KeyValueStore>,
    key: String,
}

impl TaskPersistence {
    /// Adapter over `store` using the default tasks key
    pub fn new(store: impl KeyValueStore + 'static) -> Self {
        Self::with_key(store, TASKS_KEY)
    }

    pub fn with_key(store: impl KeyValueStore + 'static, key: impl Into<String>) -> Self {
        Self {
            store: Box::new(store),
            key: key.into(),
        }
    }

    pub fn key(&self) -> &str {
        &self.key
    }

    /// Load the stored collection, degrading to empty on any failure.
    ///
    /// Bytes that fail to parse are copied to `<key>.corrupt` first, so the
    /// next save cannot destroy the only copy.
    pub fn load(&self) -> Loaded {
        let bytes = match self.store.get(&self.key) {
            Ok(Some(bytes)) => bytes,
            Ok(None) => {
                debug!(key = %self.key, "no stored tasks");
                return Loaded::default();
            }
            Err(err) => {
                warn!(key = %self.key, error = %err, "stored tasks unreadable; starting empty");
                return Loaded::empty_with(format!("stored tasks unreadable ({err}); starting empty"));
            }
        };

        match parse_tasks(&bytes) {
            Ok(tasks) => {
                debug!(key = %self.key, count = tasks.len(), "loaded tasks");
                Loaded {
                    tasks,
                    warning: None,
                }
            }
            Err(err) => {
                let backup = self.backup_key();
                let warning = match self.store.set(&backup, &bytes) {
                    Ok(()) => format!(
                        "stored tasks could not be parsed ({err}); starting empty, original data kept in '{backup}'"
                    ),
                    Err(copy_err) => format!(
                        "stored tasks could not be parsed ({err}) and could not be copied to '{backup}': {copy_err}"
                    ),
                };
                warn!(key = %self.key, backup = %backup, error = %err, "stored tasks corrupt; starting empty");
                Loaded::empty_with(warning)
            }
        }
    }

    /// Key that receives unparseable task data
    pub fn backup_key(&self) -> String {
        format!("{}.corrupt", self.key)
    }

    /// When the stored collection was last written, if known
    pub fn last_modified(&self) -> Option<DateTime<Utc>> {
        match self.store.modified(&self.key) {
            Ok(time) => time,
            Err(err) => {
                debug!(key = %self.key, error = %err, "could not read last write time");
                None
            }
        }
    }

    /// Overwrite the stored collection with `tasks`
    pub fn save(&self, tasks: &[Task]) -> Result<()> {
        let json = serde_json::to_vec(tasks)?;
        self.store.set(&self.key, &json)?;
        debug!(key = %self.key, count = tasks.len(), bytes = json.len(), "saved tasks");
        Ok(())
    }

    /// Current theme preference, if one is stored and recognizable
    pub fn read_theme(&self) -> Option<Theme> {
        let bytes = self.store.get(THEME_KEY).ok()??;
        let text = String::from_utf8(bytes).ok()?;
        text.parse().ok()
    }
}

fn parse_tasks(bytes: &[u8]) -> Result<Vec<Task>> {
    // `null` is what the browser board wrote for a never-initialized list.
    let tasks: Option<Vec<Task>> = serde_json::from_slice(bytes)?;
    Ok(tasks.unwrap_or_default())
}
