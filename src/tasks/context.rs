//! # Task identity, outcome, and execution record.
//!
//! [`TaskContext`] is the record the scheduler keeps per submission:
//! identity, opaque payload, timing, and outcome. Observers and handles
//! only ever receive cloned snapshots; the live record ([`TaskCell`])
//! stays inside the scheduler and is dropped once the outcome is
//! terminal and every handle has gone away — there is no task history.
//!
//! Outcome transitions are enforced terminal-once: a record that
//! reached `TimedOut` keeps it even if the abandoned body later
//! completes its cleanup.

use std::sync::Arc;
use std::time::SystemTime;

use parking_lot::RwLock;
use serde::Serialize;
use uuid::Uuid;

/// Opaque task identifier; unique per submission within this process.
///
/// Cheap to clone. Generated (uuid v4) when the caller does not supply one.
#[derive(Clone, Debug, PartialEq, Eq, Hash)]
pub struct TaskId(Arc<str>);

impl TaskId {
    /// Wraps a caller-supplied id.
    pub fn new(id: impl Into<Arc<str>>) -> Self {
        Self(id.into())
    }

    /// Generates a fresh random id.
    pub fn generate() -> Self {
        Self(Arc::from(Uuid::new_v4().to_string()))
    }

    /// Returns the id as a string slice.
    pub fn as_str(&self) -> &str {
        &self.0
    }

    /// Returns the id as a shared string, for event tagging.
    pub(crate) fn as_arc(&self) -> Arc<str> {
        Arc::clone(&self.0)
    }
}

impl std::fmt::Display for TaskId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(&self.0)
    }
}

impl Serialize for TaskId {
    fn serialize<S: serde::Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_str(&self.0)
    }
}

/// State of a submission, from admission to its terminal outcome.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum TaskOutcome {
    /// Admitted, not yet started.
    Pending,
    /// Body is executing on the substrate.
    Running,
    /// Body completed successfully.
    Succeeded,
    /// Body returned an error or panicked.
    Failed,
    /// Deadline exceeded; any remaining execution is cleanup only.
    TimedOut,
    /// Refused at admission (gate saturated, or scheduler stopping).
    Rejected,
    /// Abandoned: shutdown grace exceeded, substrate lost, or the body
    /// acknowledged cancellation.
    Aborted,
}

impl TaskOutcome {
    /// Returns true once no further transitions can occur.
    #[inline]
    pub fn is_terminal(&self) -> bool {
        !matches!(self, TaskOutcome::Pending | TaskOutcome::Running)
    }
}

/// Immutable snapshot of a submission's record.
#[derive(Clone, Debug, Serialize)]
pub struct TaskContext {
    /// Submission identity.
    pub id: TaskId,
    /// Opaque caller data; never interpreted by the scheduler.
    pub payload: Option<serde_json::Value>,
    /// When the submission was admitted.
    pub submitted_at: SystemTime,
    /// When the body began executing; absent until then.
    pub started_at: Option<SystemTime>,
    /// When the outcome became terminal; absent until then.
    pub finished_at: Option<SystemTime>,
    /// Current state.
    pub outcome: TaskOutcome,
    /// Failure or abandonment detail, when the outcome carries one.
    pub detail: Option<String>,
}

/// Live, shared record behind a lock. Crate-internal; the public surface
/// only ever exposes [`TaskContext`] snapshots.
pub(crate) struct TaskCell {
    state: RwLock<TaskContext>,
}

impl TaskCell {
    pub(crate) fn new(id: TaskId, payload: Option<serde_json::Value>) -> Arc<Self> {
        Arc::new(Self {
            state: RwLock::new(TaskContext {
                id,
                payload,
                submitted_at: SystemTime::now(),
                started_at: None,
                finished_at: None,
                outcome: TaskOutcome::Pending,
                detail: None,
            }),
        })
    }

    pub(crate) fn id(&self) -> TaskId {
        self.state.read().id.clone()
    }

    pub(crate) fn snapshot(&self) -> TaskContext {
        self.state.read().clone()
    }

    pub(crate) fn outcome(&self) -> TaskOutcome {
        self.state.read().outcome
    }

    /// Marks the body as running. No-op if the record already left `Pending`.
    pub(crate) fn mark_running(&self) {
        let mut st = self.state.write();
        if st.outcome == TaskOutcome::Pending {
            st.outcome = TaskOutcome::Running;
            st.started_at = Some(SystemTime::now());
        }
    }

    /// Fixes a terminal outcome. Returns false (and changes nothing) if
    /// the record is already terminal.
    pub(crate) fn resolve(&self, outcome: TaskOutcome, detail: Option<String>) -> bool {
        debug_assert!(outcome.is_terminal());
        let mut st = self.state.write();
        if st.outcome.is_terminal() {
            return false;
        }
        st.outcome = outcome;
        st.finished_at = Some(SystemTime::now());
        st.detail = detail;
        true
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn generated_ids_are_unique() {
        assert_ne!(TaskId::generate(), TaskId::generate());
    }

    #[test]
    fn terminal_outcome_is_sticky() {
        let cell = TaskCell::new(TaskId::new("t"), None);
        cell.mark_running();
        assert!(cell.resolve(TaskOutcome::TimedOut, None));
        // A late completion must not overwrite the fixed outcome.
        assert!(!cell.resolve(TaskOutcome::Succeeded, None));
        assert_eq!(cell.outcome(), TaskOutcome::TimedOut);
    }

    #[test]
    fn running_is_only_reachable_from_pending() {
        let cell = TaskCell::new(TaskId::new("t"), None);
        assert!(cell.resolve(TaskOutcome::Rejected, Some("full".into())));
        cell.mark_running();
        assert_eq!(cell.outcome(), TaskOutcome::Rejected);
        assert!(cell.snapshot().started_at.is_none());
    }
}
