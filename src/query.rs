//! Filtering and free-text search over a task snapshot.
//!
//! Filters never mutate anything and keep the snapshot's relative order.

use std::fmt;
use std::str::FromStr;

use serde::Serialize;

use crate::error::{Error, Result};
use crate::task::{Task, TaskPriority, TaskStatus};

/// Wildcard used by status and priority filters
pub const ALL: &str = "all";

/// Either every value or one specific value.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum Selection<T> {
    #[default]
    All,
    Only(T),
}

impl<T: PartialEq> Selection<T> {
    pub fn matches(&self, value: &T) -> bool {
        match self {
            Selection::All => true,
            Selection::Only(expected) => expected == value,
        }
    }

    pub fn is_all(&self) -> bool {
        matches!(self, Selection::All)
    }
}

impl<T: FromStr<Err = Error>> FromStr for Selection<T> {
    type Err = Error;

    fn from_str(value: &str) -> Result<Self> {
        if value.trim().eq_ignore_ascii_case(ALL) {
            Ok(Selection::All)
        } else {
            value.parse().map(Selection::Only)
        }
    }
}

impl<T: fmt::Display> fmt::Display for Selection<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Selection::All => f.write_str(ALL),
            Selection::Only(value) => value.fmt(f),
        }
    }
}

impl<T: fmt::Display> Serialize for Selection<T> {
    fn serialize<S: serde::Serializer>(&self, serializer: S) -> std::result::Result<S::Ok, S::Error> {
        serializer.collect_str(self)
    }
}

/// Status, priority and search criteria, combined with AND.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct TaskFilter {
    pub status: Selection<TaskStatus>,
    pub priority: Selection<TaskPriority>,
    pub search: String,
}

impl TaskFilter {
    /// Build a filter from raw text, as typed into filter controls
    pub fn parse(status: &str, priority: &str, search: &str) -> Result<Self> {
        Ok(Self {
            status: status.parse()?,
            priority: priority.parse()?,
            search: search.to_string(),
        })
    }

    /// True when the filter lets every task through
    pub fn is_empty(&self) -> bool {
        self.status.is_all() && self.priority.is_all() && self.search.is_empty()
    }

    pub fn matches(&self, task: &Task) -> bool {
        self.status.matches(&task.status)
            && self.priority.matches(&task.priority)
            && matches_search(task, &self.search.to_lowercase())
    }
}

fn matches_search(task: &Task, needle: &str) -> bool {
    if needle.is_empty() {
        return true;
    }
    task.title.to_lowercase().contains(needle)
        || task.description.to_lowercase().contains(needle)
        || task
            .assignee
            .as_deref()
            .is_some_and(|assignee| assignee.to_lowercase().contains(needle))
        || task
            .labels
            .iter()
            .any(|label| label.to_lowercase().contains(needle))
}

/// Tasks matching `filter`, in snapshot order
pub fn filter<'a>(tasks: &'a [Task], filter: &TaskFilter) -> Vec<&'a Task> {
    let needle = filter.search.to_lowercase();
    tasks
        .iter()
        .filter(|task| filter.status.matches(&task.status))
        .filter(|task| filter.priority.matches(&task.priority))
        .filter(|task| matches_search(task, &needle))
        .collect()
}

/// One board column
pub fn column<'a>(tasks: &'a [Task], status: TaskStatus) -> Vec<&'a Task> {
    tasks.iter().filter(|task| task.status == status).collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::task::{NewTask, TaskStore};

    fn board() -> Vec<Task> {
        let mut store = TaskStore::in_memory();
        let inputs = [
            ("Design Homepage", TaskStatus::Todo, TaskPriority::High, "Akshu", "design, ui"),
            ("Auth flow", TaskStatus::Progress, TaskPriority::Critical, "Isha", "backend"),
            ("Unit tests", TaskStatus::Review, TaskPriority::Medium, "", "testing"),
            ("Deploy", TaskStatus::Done, TaskPriority::High, "Reva", "devops"),
            ("Mobile nav bug", TaskStatus::Todo, TaskPriority::Medium, "Rudra", "bug, UI"),
        ];
        for (title, status, priority, assignee, labels) in inputs {
            let _ = store
                .create(NewTask {
                    title: title.to_string(),
                    description: Some(format!("{title} details")),
                    status: Some(status),
                    priority: Some(priority),
                    assignee: Some(assignee.to_string()),
                    labels: Some(labels.to_string()),
                    ..NewTask::default()
                })
                .expect("create");
        }
        store.list().to_vec()
    }

    fn titles(tasks: &[&Task]) -> Vec<String> {
        tasks.iter().map(|task| task.title.clone()).collect()
    }

    #[test]
    fn wildcard_filter_returns_everything_in_order() {
        let tasks = board();
        let filter_all = TaskFilter::parse("all", "all", "").unwrap();
        assert!(filter_all.is_empty());

        let result = filter(&tasks, &filter_all);
        let expected: Vec<&Task> = tasks.iter().collect();
        assert_eq!(result, expected);
    }

    #[test]
    fn status_filter_only_keeps_that_status() {
        let tasks = board();
        for status in TaskStatus::ALL {
            let criteria = TaskFilter {
                status: Selection::Only(status),
                ..TaskFilter::default()
            };
            let result = filter(&tasks, &criteria);
            assert!(result.iter().all(|task| task.status == status));
            assert_eq!(result, column(&tasks, status));
        }
    }

    #[test]
    fn filters_compose_with_and() {
        let tasks = board();
        let criteria = TaskFilter::parse("todo", "medium", "").unwrap();
        assert_eq!(titles(&filter(&tasks, &criteria)), vec!["Mobile nav bug"]);
    }

    #[test]
    fn search_is_case_insensitive_across_fields() {
        let tasks = board();

        let by_label = TaskFilter::parse("all", "all", "ui").unwrap();
        assert_eq!(
            titles(&filter(&tasks, &by_label)),
            vec!["Design Homepage", "Mobile nav bug"]
        );

        let by_assignee = TaskFilter::parse("all", "all", "REVA").unwrap();
        assert_eq!(titles(&filter(&tasks, &by_assignee)), vec!["Deploy"]);

        let by_description = TaskFilter::parse("all", "all", "flow DETAILS").unwrap();
        assert_eq!(titles(&filter(&tasks, &by_description)), vec!["Auth flow"]);

        let nothing = TaskFilter::parse("all", "all", "zzz").unwrap();
        assert!(filter(&tasks, &nothing).is_empty());
    }

    #[test]
    fn matches_agrees_with_filter() {
        let tasks = board();
        let criteria = TaskFilter::parse("all", "high", "de").unwrap();
        let expected: Vec<&Task> = tasks.iter().filter(|task| criteria.matches(task)).collect();
        assert_eq!(filter(&tasks, &criteria), expected);
    }

    #[test]
    fn unknown_filter_values_are_rejected() {
        assert!(matches!(
            TaskFilter::parse("archived", "all", ""),
            Err(Error::Validation(_))
        ));
        assert!(matches!(
            TaskFilter::parse("all", "p0", ""),
            Err(Error::Validation(_))
        ));
    }

    #[test]
    fn selection_displays_wildcard() {
        assert_eq!(Selection::<TaskStatus>::All.to_string(), "all");
        assert_eq!(Selection::Only(TaskPriority::Low).to_string(), "low");
    }
}
