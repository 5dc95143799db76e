//! # In-flight task registry.
//!
//! Tracks task records between admission and terminal outcome. This is
//! the authority for abandonment: when a shutdown grace period elapses
//! or a substrate is lost, every record still in the registry is marked
//! `Aborted` and gets its terminal event, so no admitted task ever ends
//! without an outcome.
//!
//! Runners remove their own record when they fix a terminal outcome;
//! the registry holds nothing for completed tasks.

use std::collections::HashMap;
use std::sync::Arc;

use parking_lot::Mutex;

use crate::events::{Bus, Event, EventKind};
use crate::tasks::{TaskCell, TaskId, TaskOutcome};

/// Map of admitted-but-unfinished task records.
pub(crate) struct InflightRegistry {
    tasks: Mutex<HashMap<TaskId, Arc<TaskCell>>>,
}

impl InflightRegistry {
    pub(crate) fn new() -> Arc<Self> {
        Arc::new(Self {
            tasks: Mutex::new(HashMap::new()),
        })
    }

    /// Records an admitted task.
    pub(crate) fn insert(&self, cell: Arc<TaskCell>) {
        self.tasks.lock().insert(cell.id(), cell);
    }

    /// Removes a task that reached a terminal outcome.
    pub(crate) fn remove(&self, id: &TaskId) {
        self.tasks.lock().remove(id);
    }

    /// Number of records currently tracked.
    #[cfg(test)]
    pub(crate) fn len(&self) -> usize {
        self.tasks.lock().len()
    }

    /// Marks every remaining record `Aborted` and publishes its terminal
    /// event. Returns the ids that were actually abandoned (records that
    /// raced to a terminal outcome are skipped).
    pub(crate) fn abandon_all(
        &self,
        detail: &str,
        bus: &Bus,
        worker: &Option<Arc<str>>,
    ) -> Vec<TaskId> {
        let drained: Vec<(TaskId, Arc<TaskCell>)> = self.tasks.lock().drain().collect();

        let mut abandoned = Vec::new();
        for (id, cell) in drained {
            if cell.resolve(TaskOutcome::Aborted, Some(detail.to_string())) {
                bus.publish(
                    Event::new(EventKind::TaskAborted)
                        .with_task(id.as_arc())
                        .with_detail(detail.to_string())
                        .with_worker(worker.clone()),
                );
                abandoned.push(id);
            }
        }
        abandoned
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn abandon_marks_and_reports_pending_records() {
        let bus = Bus::new(16);
        let mut rx = bus.subscribe();
        let registry = InflightRegistry::new();

        let cell = TaskCell::new(TaskId::new("stuck"), None);
        registry.insert(Arc::clone(&cell));

        let abandoned = registry.abandon_all("grace period exceeded", &bus, &None);
        assert_eq!(abandoned.len(), 1);
        assert_eq!(cell.outcome(), TaskOutcome::Aborted);
        assert_eq!(registry.len(), 0);

        let ev = rx.try_recv().unwrap();
        assert_eq!(ev.kind, EventKind::TaskAborted);
        assert_eq!(ev.task.as_deref(), Some("stuck"));
    }

    #[test]
    fn abandon_skips_records_that_already_finished() {
        let bus = Bus::new(16);
        let registry = InflightRegistry::new();

        let cell = TaskCell::new(TaskId::new("done"), None);
        cell.resolve(TaskOutcome::Succeeded, None);
        registry.insert(Arc::clone(&cell));

        let abandoned = registry.abandon_all("shutdown", &bus, &None);
        assert!(abandoned.is_empty());
        assert_eq!(cell.outcome(), TaskOutcome::Succeeded);
    }
}
