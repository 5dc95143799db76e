//! # Submission acknowledgment handle.
//!
//! [`TaskHandle`] is what `submit` returns: the submission's identity
//! plus best-effort status polling. The scheduler makes no promise to
//! retain results after completion — once the handle is dropped and the
//! outcome is terminal, the record is gone.

use std::sync::Arc;

use crate::tasks::context::{TaskCell, TaskContext, TaskId, TaskOutcome};

/// Handle to a submitted task.
///
/// Polling only: there is no blocking or async wait on a handle. Hosts
/// that need completion notifications subscribe to the event stream.
#[derive(Clone)]
pub struct TaskHandle {
    id: TaskId,
    cell: Arc<TaskCell>,
}

impl TaskHandle {
    pub(crate) fn new(id: TaskId, cell: Arc<TaskCell>) -> Self {
        Self { id, cell }
    }

    /// Returns the submission's id.
    pub fn id(&self) -> &TaskId {
        &self.id
    }

    /// Returns the current outcome.
    pub fn outcome(&self) -> TaskOutcome {
        self.cell.outcome()
    }

    /// Returns true once the outcome is terminal.
    pub fn is_terminal(&self) -> bool {
        self.cell.outcome().is_terminal()
    }

    /// Returns a snapshot of the full record (timing, payload, detail).
    pub fn snapshot(&self) -> TaskContext {
        self.cell.snapshot()
    }
}

impl std::fmt::Debug for TaskHandle {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("TaskHandle")
            .field("id", &self.id)
            .field("outcome", &self.outcome())
            .finish()
    }
}
