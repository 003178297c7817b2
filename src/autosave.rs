//! Periodic safety-net save for long-running sessions.
//!
//! Every mutation already writes through; the timer only covers writes that
//! failed earlier and state the store has not flushed since.

use std::time::Duration;

use tokio::time::{self, Instant, Interval, MissedTickBehavior};
use tracing::{debug, warn};

use crate::task::TaskStore;

/// Shortest interval the timer will run at
pub const MIN_INTERVAL: Duration = Duration::from_secs(1);

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct AutoSave {
    interval: Duration,
}

impl AutoSave {
    pub fn new(interval: Duration) -> Self {
        Self {
            interval: interval.max(Duration::from_millis(1)),
        }
    }

    /// Timer from configured seconds, raised to [`MIN_INTERVAL`]
    pub fn from_secs(secs: u64) -> Self {
        Self::new(Duration::from_secs(secs).max(MIN_INTERVAL))
    }

    pub fn interval(&self) -> Duration {
        self.interval
    }

    /// Tick stream whose first tick fires one full interval from now.
    ///
    /// Must be called inside a tokio runtime.
    pub fn ticker(&self) -> Interval {
        let mut ticker = time::interval_at(Instant::now() + self.interval, self.interval);
        ticker.set_missed_tick_behavior(MissedTickBehavior::Delay);
        ticker
    }

    /// Write the current snapshot. Failures are logged and returned as a
    /// warning; the in-memory board is never touched.
    pub fn run_once(&self, store: &mut TaskStore) -> Option<String> {
        match store.save() {
            Ok(()) => {
                debug!(count = store.len(), "auto-saved tasks");
                None
            }
            Err(err) => {
                warn!(error = %err, "auto-save failed");
                Some(format!("auto-save failed: {err}"))
            }
        }
    }
}

impl Default for AutoSave {
    fn default() -> Self {
        Self::from_secs(30)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::persistence::TaskPersistence;
    use crate::storage::{KeyValueStore, MemoryStore, TASKS_KEY};
    use crate::task::{NewTask, Task};

    #[test]
    fn interval_is_clamped_to_one_second() {
        assert_eq!(AutoSave::from_secs(0).interval(), MIN_INTERVAL);
        assert_eq!(AutoSave::from_secs(45).interval(), Duration::from_secs(45));
        assert_eq!(AutoSave::default().interval(), Duration::from_secs(30));
    }

    #[test]
    fn run_once_flushes_the_snapshot() {
        let backing = MemoryStore::new();
        let mut store = TaskStore::open(TaskPersistence::new(backing.clone()));
        let _ = store.create(NewTask::new("flush me")).unwrap();
        backing.remove(TASKS_KEY).unwrap();

        assert!(AutoSave::default().run_once(&mut store).is_none());
        let stored: Vec<Task> =
            serde_json::from_slice(&backing.get(TASKS_KEY).unwrap().expect("stored")).unwrap();
        assert_eq!(stored, store.list());
    }

    #[tokio::test]
    async fn first_tick_waits_a_full_interval() {
        let autosave = AutoSave::new(Duration::from_millis(200));
        let mut ticker = autosave.ticker();

        let early = time::timeout(Duration::from_millis(20), ticker.tick()).await;
        assert!(early.is_err(), "ticker fired immediately");

        let started = Instant::now();
        ticker.tick().await;
        assert!(started.elapsed() <= Duration::from_millis(400));
    }
}
