//! Board statistics derived from a task snapshot.
//!
//! Everything here is recomputed from scratch on each call; `now` is passed
//! in so callers (and tests) control the clock.

use chrono::{DateTime, Utc};
use serde::Serialize;

use crate::task::{Task, TaskPriority, TaskStatus};

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct StatusCount {
    pub status: TaskStatus,
    pub title: &'static str,
    pub count: usize,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct PriorityCount {
    pub priority: TaskPriority,
    pub label: &'static str,
    pub count: usize,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct BoardStats {
    pub generated_at: DateTime<Utc>,
    pub total: usize,
    pub completed: usize,
    pub in_progress: usize,
    pub today: usize,
    pub overdue: usize,
    /// Whole percent of tasks in `done`; 0 for an empty board
    pub completion_rate: u32,
    /// Column counts in board order
    pub by_status: Vec<StatusCount>,
    /// Counts from lowest to highest priority
    pub by_priority: Vec<PriorityCount>,
}

pub fn compute(tasks: &[Task], now: DateTime<Utc>) -> BoardStats {
    let total = tasks.len();
    let completed = count_status(tasks, TaskStatus::Done);
    let in_progress = count_status(tasks, TaskStatus::Progress);
    let today_date = now.date_naive();
    let today = tasks
        .iter()
        .filter(|task| task.created_at.date_naive() == today_date)
        .count();
    let overdue = tasks.iter().filter(|task| is_overdue(task, now)).count();

    let by_status = TaskStatus::ALL
        .into_iter()
        .map(|status| StatusCount {
            status,
            title: status.title(),
            count: count_status(tasks, status),
        })
        .collect();
    let by_priority = TaskPriority::ALL
        .into_iter()
        .map(|priority| PriorityCount {
            priority,
            label: priority.label(),
            count: tasks.iter().filter(|task| task.priority == priority).count(),
        })
        .collect();

    BoardStats {
        generated_at: now,
        total,
        completed,
        in_progress,
        today,
        overdue,
        completion_rate: completion_rate(completed, total),
        by_status,
        by_priority,
    }
}

/// A task is overdue once its due date (taken as midnight UTC) has passed
/// and it is not done.
pub fn is_overdue(task: &Task, now: DateTime<Utc>) -> bool {
    if task.status == TaskStatus::Done {
        return false;
    }
    task.due_date
        .and_then(|due| due.and_hms_opt(0, 0, 0))
        .is_some_and(|due| due.and_utc() < now)
}

pub fn completion_rate(completed: usize, total: usize) -> u32 {
    if total == 0 {
        return 0;
    }
    ((completed as f64 / total as f64) * 100.0).round() as u32
}

/// "Just now", "N minutes ago" or "N hours ago" for the last save time.
pub fn last_saved_label(last_saved: Option<DateTime<Utc>>, now: DateTime<Utc>) -> String {
    let Some(last_saved) = last_saved else {
        return "Not saved yet".to_string();
    };
    let minutes = (now - last_saved).num_minutes().max(0);
    if minutes < 1 {
        "Just now".to_string()
    } else if minutes < 60 {
        format!("{minutes} minute{} ago", plural(minutes))
    } else {
        let hours = minutes / 60;
        format!("{hours} hour{} ago", plural(hours))
    }
}

fn plural(count: i64) -> &'static str {
    if count == 1 {
        ""
    } else {
        "s"
    }
}

fn count_status(tasks: &[Task], status: TaskStatus) -> usize {
    tasks.iter().filter(|task| task.status == status).count()
}
