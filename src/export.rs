//! JSON export of the task collection.

use std::path::{Path, PathBuf};

use chrono::{DateTime, NaiveDate, Utc};
use tracing::debug;

use crate::error::Result;
use crate::lock;
use crate::task::Task;

/// `kanban-tasks-YYYY-MM-DD.json`
pub fn export_file_name(date: NaiveDate) -> String {
    format!("kanban-tasks-{}.json", date.format("%Y-%m-%d"))
}

/// Pretty-printed JSON array in the stored task format
pub fn render(tasks: &[Task]) -> Result<String> {
    Ok(serde_json::to_string_pretty(tasks)?)
}

/// Write an export file into `dir`, named for `now`'s UTC date.
///
/// An export from the same day replaces the earlier one.
pub fn write_export(dir: &Path, tasks: &[Task], now: DateTime<Utc>) -> Result<PathBuf> {
    let path = dir.join(export_file_name(now.date_naive()));
    let mut body = render(tasks)?;
    body.push('\n');
    lock::write_atomic(&path, body.as_bytes())?;
    debug!(path = %path.display(), count = tasks.len(), "exported tasks");
    Ok(path)
}
