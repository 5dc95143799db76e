//! Error types used by the taskloom scheduler and task bodies.
//!
//! Two enums, following the runtime/task split:
//!
//! - [`SchedulerError`] — failures of the scheduler itself (startup,
//!   availability, shutdown, internal bookkeeping).
//! - [`TaskError`] — failures of an individual task body.
//!
//! Scheduler errors are returned synchronously from `start`/`submit`/
//! `shutdown`. Task errors never cross the submission boundary: they are
//! recorded on the task's outcome and surfaced through events only.

use std::time::Duration;
use thiserror::Error;

use crate::tasks::TaskId;

/// Errors returned by [`Scheduler`](crate::Scheduler) operations.
#[non_exhaustive]
#[derive(Error, Debug)]
pub enum SchedulerError {
    /// The substrate could not be initialized.
    #[error("substrate failed to start: {detail}")]
    Startup {
        /// Underlying initialization error.
        detail: String,
    },

    /// The scheduler could not be brought to `Running` for this submission.
    ///
    /// Either the restart policy is [`Disabled`](crate::RestartPolicy::Disabled),
    /// the restart backoff floor has not elapsed, or the restart attempt failed.
    #[error("scheduler unavailable: {detail}")]
    Unavailable {
        /// Why the scheduler could not accept the submission.
        detail: String,
    },

    /// `submit` was called after shutdown began.
    #[error("scheduler is shutting down")]
    ShuttingDown,

    /// The submission was refused by the concurrency gate.
    ///
    /// The task's outcome is fixed at [`Rejected`](crate::TaskOutcome::Rejected)
    /// and a `TaskRejected` event was emitted.
    #[error("submission {id} rejected: concurrency capacity exhausted")]
    Rejected {
        /// Id of the refused submission.
        id: TaskId,
    },

    /// Shutdown completed, but tasks remained active past the grace period
    /// and were abandoned.
    #[error("grace period {grace:?} exceeded; abandoned: {abandoned:?}")]
    GraceExceeded {
        /// The grace period that elapsed.
        grace: Duration,
        /// Ids of the tasks that were abandoned.
        abandoned: Vec<TaskId>,
    },

    /// Internal bookkeeping violation (e.g. a permit released twice).
    ///
    /// Fatal to the scheduler instance: the gate is poisoned and the
    /// scheduler refuses further work until restarted.
    #[error("invariant violation: {detail}")]
    Invariant {
        /// What was violated.
        detail: String,
    },
}

impl SchedulerError {
    /// Returns a short stable label (snake_case) for logs/metrics.
    pub fn as_label(&self) -> &'static str {
        match self {
            SchedulerError::Startup { .. } => "scheduler_startup",
            SchedulerError::Unavailable { .. } => "scheduler_unavailable",
            SchedulerError::ShuttingDown => "scheduler_shutting_down",
            SchedulerError::Rejected { .. } => "submission_rejected",
            SchedulerError::GraceExceeded { .. } => "grace_exceeded",
            SchedulerError::Invariant { .. } => "invariant_violation",
        }
    }
}

/// Errors produced by task bodies.
///
/// Always recovered at the task boundary: a failing body marks its own
/// outcome and emits an event, and never affects the substrate or other
/// tasks.
#[non_exhaustive]
#[derive(Error, Debug)]
pub enum TaskError {
    /// The body failed.
    #[error("task failed: {error}")]
    Fail {
        /// The underlying error message.
        error: String,
    },

    /// The body exceeded its configured deadline.
    ///
    /// Produced by the runner, not by bodies themselves; the outcome is
    /// fixed at `TimedOut` even if the body later finishes cleanup.
    #[error("timed out after {timeout:?}")]
    Timeout {
        /// The deadline that was exceeded.
        timeout: Duration,
    },

    /// The body observed its cancellation token and stopped early.
    #[error("cancelled")]
    Canceled,
}

impl TaskError {
    /// Convenience constructor for [`TaskError::Fail`].
    pub fn fail(error: impl Into<String>) -> Self {
        TaskError::Fail {
            error: error.into(),
        }
    }

    /// Returns a short stable label (snake_case) for logs/metrics.
    pub fn as_label(&self) -> &'static str {
        match self {
            TaskError::Fail { .. } => "task_failed",
            TaskError::Timeout { .. } => "task_timeout",
            TaskError::Canceled => "task_canceled",
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn labels_are_stable() {
        let e = SchedulerError::ShuttingDown;
        assert_eq!(e.as_label(), "scheduler_shutting_down");
        assert_eq!(TaskError::Canceled.as_label(), "task_canceled");
        assert_eq!(TaskError::fail("boom").as_label(), "task_failed");
    }
}
