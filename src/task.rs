//! Task model and the in-memory task store.
//!
//! The store owns the ordered task collection. Every successful mutation is
//! written through to [`TaskPersistence`]; a failed write never rolls back
//! memory, it is handed back to the caller as a warning on the [`Mutation`].

use std::fmt;
use std::str::FromStr;

use chrono::{DateTime, NaiveDate, Utc};
use serde::{Deserialize, Serialize};
use tracing::{debug, warn};
use ulid::Ulid;

use crate::error::{Error, Result};
use crate::persistence::TaskPersistence;
use crate::storage::MemoryStore;

/// Workflow column a task sits in.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum TaskStatus {
    #[default]
    Todo,
    Progress,
    Review,
    Done,
}

impl TaskStatus {
    /// All statuses in board column order
    pub const ALL: [TaskStatus; 4] = [
        TaskStatus::Todo,
        TaskStatus::Progress,
        TaskStatus::Review,
        TaskStatus::Done,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            TaskStatus::Todo => "todo",
            TaskStatus::Progress => "progress",
            TaskStatus::Review => "review",
            TaskStatus::Done => "done",
        }
    }

    /// Column heading
    pub fn title(&self) -> &'static str {
        match self {
            TaskStatus::Todo => "To Do",
            TaskStatus::Progress => "In Progress",
            TaskStatus::Review => "In Review",
            TaskStatus::Done => "Done",
        }
    }
}

impl fmt::Display for TaskStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for TaskStatus {
    type Err = Error;

    fn from_str(value: &str) -> Result<Self> {
        let trimmed = value.trim();
        TaskStatus::ALL
            .into_iter()
            .find(|status| status.as_str().eq_ignore_ascii_case(trimmed))
            .ok_or_else(|| {
                Error::Validation(format!(
                    "unknown task status '{trimmed}' (expected todo|progress|review|done)"
                ))
            })
    }
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum TaskPriority {
    Low,
    #[default]
    Medium,
    High,
    Critical,
}

impl TaskPriority {
    /// All priorities from lowest to highest
    pub const ALL: [TaskPriority; 4] = [
        TaskPriority::Low,
        TaskPriority::Medium,
        TaskPriority::High,
        TaskPriority::Critical,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            TaskPriority::Low => "low",
            TaskPriority::Medium => "medium",
            TaskPriority::High => "high",
            TaskPriority::Critical => "critical",
        }
    }

    pub fn label(&self) -> &'static str {
        match self {
            TaskPriority::Low => "Low",
            TaskPriority::Medium => "Medium",
            TaskPriority::High => "High",
            TaskPriority::Critical => "Critical",
        }
    }
}

impl fmt::Display for TaskPriority {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for TaskPriority {
    type Err = Error;

    fn from_str(value: &str) -> Result<Self> {
        let trimmed = value.trim();
        TaskPriority::ALL
            .into_iter()
            .find(|priority| priority.as_str().eq_ignore_ascii_case(trimmed))
            .ok_or_else(|| {
                Error::Validation(format!(
                    "unknown task priority '{trimmed}' (expected low|medium|high|critical)"
                ))
            })
    }
}

/// A single work item on the board.
///
/// Serialized with camelCase field names; this is the stored format under
/// the `kanbanTasks` key and the export format.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Task {
    pub id: String,
    pub title: String,
    #[serde(default)]
    pub description: String,
    #[serde(default)]
    pub status: TaskStatus,
    #[serde(default)]
    pub priority: TaskPriority,
    #[serde(default)]
    pub due_date: Option<NaiveDate>,
    #[serde(default, with = "blank_as_none")]
    pub assignee: Option<String>,
    #[serde(default)]
    pub labels: Vec<String>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

/// `None` is stored as `""`; both `""` and `null` read back as `None`.
mod blank_as_none {
    use serde::{Deserialize, Deserializer, Serializer};

    pub fn serialize<S: Serializer>(value: &Option<String>, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_str(value.as_deref().unwrap_or(""))
    }

    pub fn deserialize<'de, D: Deserializer<'de>>(deserializer: D) -> Result<Option<String>, D::Error> {
        let value: Option<String> = Option::deserialize(deserializer)?;
        Ok(value.filter(|text| !text.trim().is_empty()))
    }
}

/// Input for [`TaskStore::create`].
///
/// `labels` is the raw comma-delimited text as typed by the user.
#[derive(Debug, Clone, Default)]
pub struct NewTask {
    pub title: String,
    pub description: Option<String>,
    pub status: Option<TaskStatus>,
    pub priority: Option<TaskPriority>,
    pub due_date: Option<NaiveDate>,
    pub assignee: Option<String>,
    pub labels: Option<String>,
}

impl NewTask {
    pub fn new(title: impl Into<String>) -> Self {
        Self {
            title: title.into(),
            ..Self::default()
        }
    }
}

/// Update for an optional attribute.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum FieldUpdate<T> {
    Keep,
    Clear,
    Set(T),
}

impl<T> Default for FieldUpdate<T> {
    fn default() -> Self {
        FieldUpdate::Keep
    }
}

impl<T> FieldUpdate<T> {
    fn is_keep(&self) -> bool {
        matches!(self, FieldUpdate::Keep)
    }

    fn apply(self, current: &mut Option<T>) {
        match self {
            FieldUpdate::Keep => {}
            FieldUpdate::Clear => *current = None,
            FieldUpdate::Set(value) => *current = Some(value),
        }
    }
}

/// Partial update for [`TaskStore::update`].
///
/// Supplied fields overwrite, absent fields are retained.
#[derive(Debug, Clone, Default)]
pub struct TaskPatch {
    pub title: Option<String>,
    pub description: Option<String>,
    pub status: Option<TaskStatus>,
    pub priority: Option<TaskPriority>,
    pub due_date: FieldUpdate<NaiveDate>,
    pub assignee: FieldUpdate<String>,
    pub labels: Option<String>,
}

impl TaskPatch {
    /// Patch that only moves the task to another column
    pub fn status(status: TaskStatus) -> Self {
        Self {
            status: Some(status),
            ..Self::default()
        }
    }

    pub fn is_empty(&self) -> bool {
        self.title.is_none()
            && self.description.is_none()
            && self.status.is_none()
            && self.priority.is_none()
            && self.due_date.is_keep()
            && self.assignee.is_keep()
            && self.labels.is_none()
    }
}

/// Result of a store mutation.
///
/// `save_warning` is set when the in-memory change succeeded but the
/// write-through to durable storage did not.
#[derive(Debug, Clone)]
#[must_use]
pub struct Mutation<T> {
    pub value: T,
    pub save_warning: Option<String>,
}

impl<T> Mutation<T> {
    pub fn into_value(self) -> T {
        self.value
    }
}

/// Split comma-delimited label input, trimming entries and dropping empties.
pub fn parse_labels(input: &str) -> Vec<String> {
    input
        .split(',')
        .map(str::trim)
        .filter(|label| !label.is_empty())
        .map(str::to_string)
        .collect()
}

fn normalize_title(title: &str) -> Result<String> {
    let trimmed = title.trim();
    if trimmed.is_empty() {
        return Err(Error::Validation("title cannot be empty".to_string()));
    }
    Ok(trimmed.to_string())
}

fn normalize_assignee(assignee: &str) -> Option<String> {
    let trimmed = assignee.trim();
    if trimmed.is_empty() {
        None
    } else {
        Some(trimmed.to_string())
    }
}

/// Owner of the board's task collection.
#[derive(Debug)]
pub struct TaskStore {
    tasks: Vec<Task>,
    persistence: TaskPersistence,
    last_id: Option<Ulid>,
    last_saved: Option<DateTime<Utc>>,
    load_warning: Option<String>,
}

impl TaskStore {
    /// Open the store, loading whatever the persistence layer holds.
    ///
    /// Unreadable or corrupt data yields an empty board. `last_saved` starts
    /// at the last write time of usable stored data.
    pub fn open(persistence: TaskPersistence) -> Self {
        let loaded = persistence.load();
        let last_saved = if loaded.warning.is_none() {
            persistence.last_modified()
        } else {
            None
        };
        debug!(count = loaded.tasks.len(), key = persistence.key(), "opened task store");
        Self {
            tasks: loaded.tasks,
            persistence,
            last_id: None,
            last_saved,
            load_warning: loaded.warning,
        }
    }

    /// Warning from opening, if stored data could not be used
    pub fn take_load_warning(&mut self) -> Option<String> {
        self.load_warning.take()
    }

    /// A store backed by a fresh [`MemoryStore`]
    pub fn in_memory() -> Self {
        Self::open(TaskPersistence::new(MemoryStore::new()))
    }

    pub fn persistence(&self) -> &TaskPersistence {
        &self.persistence
    }

    /// Snapshot of the collection in insertion order
    pub fn list(&self) -> &[Task] {
        &self.tasks
    }

    pub fn len(&self) -> usize {
        self.tasks.len()
    }

    pub fn is_empty(&self) -> bool {
        self.tasks.is_empty()
    }

    pub fn get(&self, id: &str) -> Result<&Task> {
        self.tasks
            .iter()
            .find(|task| task.id == id)
            .ok_or_else(|| Error::NotFound(id.to_string()))
    }

    /// Time of the last successful write to durable storage
    pub fn last_saved(&self) -> Option<DateTime<Utc>> {
        self.last_saved
    }

    pub fn create(&mut self, input: NewTask) -> Result<Mutation<Task>> {
        let title = normalize_title(&input.title)?;
        let id = self.next_id()?;
        let now = Utc::now();

        let task = Task {
            id,
            title,
            description: input
                .description
                .as_deref()
                .map(str::trim)
                .unwrap_or_default()
                .to_string(),
            status: input.status.unwrap_or_default(),
            priority: input.priority.unwrap_or_default(),
            due_date: input.due_date,
            assignee: input.assignee.as_deref().and_then(normalize_assignee),
            labels: input.labels.as_deref().map(parse_labels).unwrap_or_default(),
            created_at: now,
            updated_at: now,
        };

        self.tasks.push(task.clone());
        debug!(id = %task.id, status = %task.status, "task created");
        let save_warning = self.write_through();
        Ok(Mutation {
            value: task,
            save_warning,
        })
    }

    pub fn update(&mut self, id: &str, patch: TaskPatch) -> Result<Mutation<Task>> {
        let index = self.index_of(id)?;
        let title = patch.title.as_deref().map(normalize_title).transpose()?;

        let task = &mut self.tasks[index];
        if let Some(title) = title {
            task.title = title;
        }
        if let Some(description) = patch.description {
            task.description = description.trim().to_string();
        }
        if let Some(status) = patch.status {
            task.status = status;
        }
        if let Some(priority) = patch.priority {
            task.priority = priority;
        }
        patch.due_date.apply(&mut task.due_date);
        let assignee = match patch.assignee {
            FieldUpdate::Set(value) => match normalize_assignee(&value) {
                Some(value) => FieldUpdate::Set(value),
                None => FieldUpdate::Clear,
            },
            other => other,
        };
        assignee.apply(&mut task.assignee);
        if let Some(labels) = patch.labels {
            task.labels = parse_labels(&labels);
        }
        task.updated_at = Utc::now().max(task.updated_at).max(task.created_at);

        let task = task.clone();
        debug!(id = %task.id, status = %task.status, "task updated");
        let save_warning = self.write_through();
        Ok(Mutation {
            value: task,
            save_warning,
        })
    }

    /// Move a task to another column
    pub fn move_to(&mut self, id: &str, status: TaskStatus) -> Result<Mutation<Task>> {
        self.update(id, TaskPatch::status(status))
    }

    /// Remove a task. Unknown ids fail with [`Error::NotFound`].
    pub fn delete(&mut self, id: &str) -> Result<Mutation<Task>> {
        let index = self.index_of(id)?;
        let removed = self.tasks.remove(index);
        debug!(id = %removed.id, "task deleted");
        let save_warning = self.write_through();
        Ok(Mutation {
            value: removed,
            save_warning,
        })
    }

    /// Remove every task, returning how many were dropped
    pub fn clear(&mut self) -> Mutation<usize> {
        let removed = self.tasks.len();
        self.tasks.clear();
        debug!(removed, "board cleared");
        let save_warning = self.write_through();
        Mutation {
            value: removed,
            save_warning,
        }
    }

    /// Write the full collection now, propagating failures
    pub fn save(&mut self) -> Result<()> {
        self.persistence.save(&self.tasks)?;
        self.last_saved = Some(Utc::now());
        Ok(())
    }

    /// Fill an empty board with prepared tasks.
    pub(crate) fn populate(&mut self, tasks: Vec<Task>) -> Result<Mutation<usize>> {
        if !self.tasks.is_empty() {
            return Err(Error::OperationFailed(
                "board already has tasks".to_string(),
            ));
        }
        let count = tasks.len();
        self.tasks = tasks;
        let save_warning = self.write_through();
        Ok(Mutation {
            value: count,
            save_warning,
        })
    }

    /// Fresh id: lowercase ULID, monotonic within this store and distinct
    /// from every id already in the collection.
    pub(crate) fn next_id(&mut self) -> Result<String> {
        let mut candidate = Ulid::new();
        if let Some(previous) = self.last_id {
            if candidate <= previous {
                candidate = increment(previous)?;
            }
        }
        loop {
            let id = candidate.to_string().to_ascii_lowercase();
            if !self.tasks.iter().any(|task| task.id == id) {
                self.last_id = Some(candidate);
                return Ok(id);
            }
            candidate = increment(candidate)?;
        }
    }

    fn index_of(&self, id: &str) -> Result<usize> {
        self.tasks
            .iter()
            .position(|task| task.id == id)
            .ok_or_else(|| Error::NotFound(id.to_string()))
    }

    fn write_through(&mut self) -> Option<String> {
        match self.persistence.save(&self.tasks) {
            Ok(()) => {
                self.last_saved = Some(Utc::now());
                None
            }
            Err(err) => {
                warn!(error = %err, "write-through failed; keeping in-memory state");
                Some(format!("changes not saved: {err}"))
            }
        }
    }
}

fn increment(ulid: Ulid) -> Result<Ulid> {
    ulid.increment()
        .ok_or_else(|| Error::OperationFailed("task id space exhausted".to_string()))
}
