//! First-run demonstration data.

use chrono::{DateTime, Duration, Utc};
use tracing::info;

use crate::error::Result;
use crate::task::{parse_labels, Mutation, Task, TaskPriority, TaskStatus, TaskStore};

struct SampleTask {
    title: &'static str,
    description: &'static str,
    status: TaskStatus,
    priority: TaskPriority,
    due_in_days: i64,
    assignee: &'static str,
    labels: &'static str,
    created_days_ago: i64,
    updated_days_ago: i64,
}

const SAMPLES: [SampleTask; 5] = [
    SampleTask {
        title: "Design Homepage Layout",
        description: "Create responsive design for homepage with modern UI components",
        status: TaskStatus::Todo,
        priority: TaskPriority::High,
        due_in_days: 7,
        assignee: "Akshu",
        labels: "design, ui, responsive",
        created_days_ago: 2,
        updated_days_ago: 2,
    },
    SampleTask {
        title: "Implement User Authentication",
        description: "Setup JWT-based authentication with refresh tokens",
        status: TaskStatus::Progress,
        priority: TaskPriority::Critical,
        due_in_days: 3,
        assignee: "Isha",
        labels: "backend, security, api",
        created_days_ago: 5,
        updated_days_ago: 1,
    },
    SampleTask {
        title: "Write Unit Tests",
        description: "Cover core functionality with Jest unit tests",
        status: TaskStatus::Review,
        priority: TaskPriority::Medium,
        due_in_days: 2,
        assignee: "Nupur",
        labels: "testing, quality",
        created_days_ago: 3,
        updated_days_ago: 1,
    },
    SampleTask {
        title: "Deploy to Production",
        description: "Setup CI/CD pipeline and deploy to AWS",
        status: TaskStatus::Done,
        priority: TaskPriority::High,
        due_in_days: -1,
        assignee: "Reva",
        labels: "devops, deployment, aws",
        created_days_ago: 10,
        updated_days_ago: 2,
    },
    SampleTask {
        title: "Fix Mobile Navigation Bug",
        description: "Hamburger menu not opening on iOS devices",
        status: TaskStatus::Todo,
        priority: TaskPriority::Medium,
        due_in_days: 1,
        assignee: "Rudra",
        labels: "bug, mobile, ios",
        created_days_ago: 1,
        updated_days_ago: 1,
    },
];

/// Number of tasks [`seed_if_empty`] adds
pub const SAMPLE_COUNT: usize = SAMPLES.len();

/// Populate an empty board with the demonstration tasks.
///
/// Returns `None` without touching the store when any task already exists.
pub fn seed_if_empty(store: &mut TaskStore, now: DateTime<Utc>) -> Result<Option<Mutation<usize>>> {
    if !store.is_empty() {
        return Ok(None);
    }

    let mut tasks = Vec::with_capacity(SAMPLES.len());
    for sample in &SAMPLES {
        tasks.push(Task {
            id: store.next_id()?,
            title: sample.title.to_string(),
            description: sample.description.to_string(),
            status: sample.status,
            priority: sample.priority,
            due_date: Some((now + Duration::days(sample.due_in_days)).date_naive()),
            assignee: Some(sample.assignee.to_string()),
            labels: parse_labels(sample.labels),
            created_at: now - Duration::days(sample.created_days_ago),
            updated_at: now - Duration::days(sample.updated_days_ago),
        });
    }

    let mutation = store.populate(tasks)?;
    info!(count = mutation.value, "seeded sample tasks");
    Ok(Some(mutation))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::stats;
    use crate::task::NewTask;

    #[test]
    fn seeds_an_empty_board_once() {
        let mut store = TaskStore::in_memory();
        let now = Utc::now();

        let seeded = seed_if_empty(&mut store, now).unwrap().expect("seeded");
        assert_eq!(seeded.value, SAMPLE_COUNT);
        assert!(seeded.save_warning.is_none());
        let snapshot = store.list().to_vec();

        assert!(seed_if_empty(&mut store, now).unwrap().is_none());
        assert_eq!(store.list(), snapshot.as_slice());
    }

    #[test]
    fn never_seeds_over_existing_tasks() {
        let mut store = TaskStore::in_memory();
        let _ = store.create(NewTask::new("mine")).unwrap();

        assert!(seed_if_empty(&mut store, Utc::now()).unwrap().is_none());
        assert_eq!(store.len(), 1);
    }

    #[test]
    fn sample_tasks_hold_the_store_invariants() {
        let mut store = TaskStore::in_memory();
        let now = Utc::now();
        let _ = seed_if_empty(&mut store, now).unwrap();

        let tasks = store.list();
        let mut ids: Vec<&str> = tasks.iter().map(|task| task.id.as_str()).collect();
        ids.sort_unstable();
        ids.dedup();
        assert_eq!(ids.len(), SAMPLE_COUNT);
        assert!(tasks.iter().all(|task| task.updated_at >= task.created_at));
        assert_eq!(tasks[0].labels, vec!["design", "ui", "responsive"]);
        assert_eq!(tasks[3].status, TaskStatus::Done);

        let board = stats::compute(tasks, now);
        assert_eq!(board.total, 5);
        assert_eq!(board.completed, 1);
        assert_eq!(board.in_progress, 1);
        assert_eq!(board.completion_rate, 20);
        // The only past-due sample is already done.
        assert_eq!(board.overdue, 0);
    }
}
