//! # Built-in logging subscriber.
//!
//! [`LogWriter`] renders every scheduler event as a `tracing` record, so
//! a host gets structured log output without writing a subscriber of its
//! own. Severity follows the event: terminal successes and lifecycle
//! milestones log at `info`, refusals and abandonments at `warn`,
//! scheduler failures and subscriber panics at `error`.
//!
//! ## Example
//! ```rust
//! use std::sync::Arc;
//! use taskloom::{LogWriter, Scheduler, SchedulerConfig};
//!
//! let scheduler = Scheduler::builder(SchedulerConfig::default())
//!     .with_subscriber(Arc::new(LogWriter::new()))
//!     .build();
//! ```

use async_trait::async_trait;

use crate::events::{Event, EventKind};
use crate::subscribers::Subscribe;

/// Subscriber that forwards events to the `tracing` ecosystem.
///
/// The host picks the actual sink by installing its own
/// `tracing-subscriber` layer; this type only maps events to records.
#[derive(Clone, Copy, Debug, Default)]
pub struct LogWriter;

impl LogWriter {
    /// Creates a new logging subscriber.
    pub fn new() -> Self {
        Self
    }
}

#[async_trait]
impl Subscribe for LogWriter {
    async fn on_event(&self, e: &Event) {
        let task = e.task.as_deref().unwrap_or("-");
        let worker = e.worker.as_deref().unwrap_or("-");

        match e.kind {
            EventKind::TaskAdmitted => {
                tracing::debug!(task, worker, seq = e.seq, "task admitted");
            }
            EventKind::TaskStarted => {
                tracing::debug!(task, worker, seq = e.seq, "task started");
            }
            EventKind::TaskSucceeded => {
                tracing::info!(task, worker, elapsed_ms = e.elapsed_ms, "task succeeded");
            }
            EventKind::TaskFailed => {
                tracing::warn!(
                    task,
                    worker,
                    detail = e.detail.as_deref(),
                    elapsed_ms = e.elapsed_ms,
                    "task failed"
                );
            }
            EventKind::TaskTimedOut => {
                tracing::warn!(task, worker, timeout_ms = e.timeout_ms, "task timed out");
            }
            EventKind::TaskAborted => {
                tracing::warn!(task, worker, detail = e.detail.as_deref(), "task aborted");
            }
            EventKind::TaskRejected => {
                tracing::warn!(task, worker, detail = e.detail.as_deref(), "task rejected");
            }
            EventKind::SchedulerStarted => {
                tracing::info!(worker, "scheduler running");
            }
            EventKind::SchedulerFailed => {
                tracing::error!(worker, detail = e.detail.as_deref(), "scheduler failed");
            }
            EventKind::ShutdownRequested => {
                tracing::info!(worker, "shutdown requested");
            }
            EventKind::DrainedWithinGrace => {
                tracing::info!(worker, "all tasks drained within grace");
            }
            EventKind::GraceExceeded => {
                tracing::warn!(worker, "grace period exceeded");
            }
            EventKind::SubscriberOverflow => {
                tracing::warn!(
                    subscriber = task,
                    detail = e.detail.as_deref(),
                    "subscriber queue overflowed"
                );
            }
            EventKind::SubscriberPanicked => {
                tracing::error!(
                    subscriber = task,
                    detail = e.detail.as_deref(),
                    "subscriber panicked"
                );
            }
        }
    }

    fn name(&self) -> &'static str {
        "log"
    }
}
