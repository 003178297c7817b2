use chrono::{Duration, Utc};

use kanban::persistence::TaskPersistence;
use kanban::query::{self, TaskFilter};
use kanban::seed;
use kanban::stats;
use kanban::storage::{FileStore, KeyValueStore, TASKS_KEY};
use kanban::task::{NewTask, TaskPatch, TaskStatus, TaskStore};
use kanban::Error;

fn open(dir: &std::path::Path) -> TaskStore {
    TaskStore::open(TaskPersistence::new(FileStore::new(dir)))
}

#[test]
fn board_survives_reopen() {
    let dir = tempfile::tempdir().expect("tempdir");
    let mut store = open(dir.path());
    let first = store.create(NewTask::new("First")).unwrap().into_value();
    let second = store.create(NewTask::new("Second")).unwrap().into_value();
    let _ = store.move_to(&second.id, TaskStatus::Done).unwrap();
    let snapshot = store.list().to_vec();
    drop(store);

    let reopened = open(dir.path());
    assert_eq!(reopened.list(), snapshot.as_slice());
    assert_eq!(reopened.get(&first.id).unwrap().status, TaskStatus::Todo);
}

#[test]
fn reopened_board_remembers_when_it_was_saved() {
    let dir = tempfile::tempdir().expect("tempdir");
    assert!(open(dir.path()).last_saved().is_none());

    let mut store = open(dir.path());
    let _ = store.create(NewTask::new("Saved earlier")).unwrap();
    let saved = store.last_saved().expect("saved in this session");
    drop(store);

    let reopened = open(dir.path());
    let remembered = reopened.last_saved().expect("saved before reopen");
    assert!((remembered - saved).num_seconds().abs() <= 5);
}

#[test]
fn new_ids_never_collide_with_loaded_ones() {
    let dir = tempfile::tempdir().expect("tempdir");
    let mut store = open(dir.path());
    for idx in 0..20 {
        let _ = store.create(NewTask::new(format!("t{idx}"))).unwrap();
    }
    drop(store);

    let mut reopened = open(dir.path());
    let task = reopened.create(NewTask::new("after reopen")).unwrap().into_value();
    let matching = reopened.list().iter().filter(|t| t.id == task.id).count();
    assert_eq!(matching, 1);
}

#[test]
fn delete_of_missing_id_keeps_stored_board() {
    let dir = tempfile::tempdir().expect("tempdir");
    let mut store = open(dir.path());
    let _ = store.create(NewTask::new("stay")).unwrap();
    let before = FileStore::new(dir.path()).get(TASKS_KEY).unwrap();

    assert!(matches!(store.delete("ghost"), Err(Error::NotFound(_))));
    assert!(matches!(
        store.update("ghost", TaskPatch::status(TaskStatus::Done)),
        Err(Error::NotFound(_))
    ));
    assert_eq!(store.len(), 1);
    assert_eq!(FileStore::new(dir.path()).get(TASKS_KEY).unwrap(), before);
}

#[test]
fn seeded_board_reopens_with_the_same_stats() {
    let dir = tempfile::tempdir().expect("tempdir");
    let now = Utc::now();
    let mut store = open(dir.path());
    let _ = seed::seed_if_empty(&mut store, now).unwrap().expect("seeded");
    drop(store);

    let mut reopened = open(dir.path());
    assert!(seed::seed_if_empty(&mut reopened, now).unwrap().is_none());

    let board = stats::compute(reopened.list(), now);
    assert_eq!(board.total, seed::SAMPLE_COUNT);
    assert_eq!(board.completion_rate, 20);

    // A day past every sample due date, only open tasks count as overdue.
    let later = stats::compute(reopened.list(), now + Duration::days(9));
    assert_eq!(later.overdue, 4);

    let todo = query::filter(reopened.list(), &TaskFilter::parse("todo", "all", "").unwrap());
    assert_eq!(todo.len(), 2);
}
