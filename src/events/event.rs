//! # Events emitted by the scheduler and the runner.
//!
//! [`EventKind`] classifies events into three groups:
//! - **Task lifecycle**: admission through terminal outcome.
//! - **Scheduler lifecycle**: substrate start/failure and the shutdown drain.
//! - **Subscriber health**: overflow and panic reports from the fan-out.
//!
//! [`Event`] carries the metadata for a kind: timestamps, task id, the
//! host-supplied worker identity, failure detail, and durations.
//!
//! ## Ordering
//! Every event gets a process-global, monotonically increasing sequence
//! number (`seq`); use it to restore order when events are observed from
//! independent queues.
//!
//! ## Example
//! ```rust
//! use taskloom::{Event, EventKind};
//!
//! let ev = Event::new(EventKind::TaskFailed)
//!     .with_task("job-42")
//!     .with_detail("connection refused");
//!
//! assert_eq!(ev.kind, EventKind::TaskFailed);
//! assert_eq!(ev.task.as_deref(), Some("job-42"));
//! ```

use std::sync::atomic::{AtomicU64, Ordering as AtomicOrdering};
use std::sync::Arc;
use std::time::{Duration, SystemTime};

/// Process-global sequence counter for event ordering.
static EVENT_SEQ: AtomicU64 = AtomicU64::new(0);

/// Classification of scheduler events.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum EventKind {
    // === Task lifecycle ===
    /// Task passed the concurrency gate and was handed to the substrate.
    ///
    /// Sets: `task`, `at`, `seq`, `worker` (if configured).
    TaskAdmitted,

    /// Task body began executing on the substrate.
    ///
    /// Sets: `task`, `at`, `seq`, `worker`.
    TaskStarted,

    /// Task body completed successfully.
    ///
    /// Sets: `task`, `elapsed_ms`, `at`, `seq`, `worker`.
    TaskSucceeded,

    /// Task body returned an error or panicked.
    ///
    /// Sets: `task`, `detail` (failure message), `elapsed_ms`, `at`, `seq`, `worker`.
    TaskFailed,

    /// Task exceeded its deadline; outcome fixed at `TimedOut`.
    ///
    /// Sets: `task`, `timeout_ms`, `at`, `seq`, `worker`.
    TaskTimedOut,

    /// Task was abandoned (shutdown grace exceeded, substrate loss, or
    /// acknowledged cancellation).
    ///
    /// Sets: `task`, `detail` (reason), `at`, `seq`, `worker`.
    TaskAborted,

    /// Submission refused by the concurrency gate or by a stopping scheduler.
    ///
    /// Sets: `task`, `detail` (reason), `at`, `seq`, `worker`.
    TaskRejected,

    // === Scheduler lifecycle ===
    /// Substrate is up and the scheduler entered `Running`.
    ///
    /// Sets: `at`, `seq`, `worker`.
    SchedulerStarted,

    /// Substrate reported an unrecoverable error; scheduler is `Failed`.
    ///
    /// Sets: `detail` (reason), `at`, `seq`, `worker`.
    SchedulerFailed,

    /// Shutdown began; no further submissions are admitted.
    ///
    /// Sets: `at`, `seq`, `worker`.
    ShutdownRequested,

    /// All in-flight tasks drained within the grace period.
    ///
    /// Sets: `at`, `seq`, `worker`.
    DrainedWithinGrace,

    /// Grace period elapsed with tasks still active; they were abandoned.
    ///
    /// Sets: `at`, `seq`, `worker`.
    GraceExceeded,

    // === Subscriber health ===
    /// A subscriber's queue was full or closed; the event was dropped
    /// for that subscriber only.
    ///
    /// Sets: `task` (subscriber name), `detail` (reason), `at`, `seq`.
    SubscriberOverflow,

    /// A subscriber panicked while processing an event.
    ///
    /// Sets: `task` (subscriber name), `detail` (panic info), `at`, `seq`.
    SubscriberPanicked,
}

/// Scheduler event with optional metadata.
///
/// - `seq`: monotonic process-global sequence for ordering
/// - `at`: wall-clock timestamp (for logs)
/// - remaining fields are set depending on [`EventKind`]
#[derive(Clone, Debug)]
pub struct Event {
    /// Monotonically increasing sequence number.
    pub seq: u64,
    /// Wall-clock timestamp.
    pub at: SystemTime,
    /// Event classification.
    pub kind: EventKind,

    /// Task id (or subscriber name for subscriber-health events).
    pub task: Option<Arc<str>>,
    /// Host-supplied worker/process identity.
    pub worker: Option<Arc<str>>,
    /// Human-readable detail (failure message, abandonment reason).
    pub detail: Option<Arc<str>>,
    /// Configured deadline, for `TaskTimedOut` (ms).
    pub timeout_ms: Option<u64>,
    /// Wall time from start to terminal outcome (ms).
    pub elapsed_ms: Option<u64>,
}

impl Event {
    /// Creates an event of the given kind with the current timestamp and
    /// the next sequence number.
    pub fn new(kind: EventKind) -> Self {
        Self {
            seq: EVENT_SEQ.fetch_add(1, AtomicOrdering::Relaxed),
            at: SystemTime::now(),
            kind,
            task: None,
            worker: None,
            detail: None,
            timeout_ms: None,
            elapsed_ms: None,
        }
    }

    /// Attaches a task id (or subscriber name).
    #[inline]
    pub fn with_task(mut self, task: impl Into<Arc<str>>) -> Self {
        self.task = Some(task.into());
        self
    }

    /// Attaches the worker identity, if the host configured one.
    #[inline]
    pub fn with_worker(mut self, worker: Option<Arc<str>>) -> Self {
        self.worker = worker;
        self
    }

    /// Attaches a human-readable detail.
    #[inline]
    pub fn with_detail(mut self, detail: impl Into<Arc<str>>) -> Self {
        self.detail = Some(detail.into());
        self
    }

    /// Attaches the exceeded deadline (stored as milliseconds).
    #[inline]
    pub fn with_timeout(mut self, d: Duration) -> Self {
        self.timeout_ms = Some(d.as_millis().min(u128::from(u64::MAX)) as u64);
        self
    }

    /// Attaches the execution duration (stored as milliseconds).
    #[inline]
    pub fn with_elapsed(mut self, d: Duration) -> Self {
        self.elapsed_ms = Some(d.as_millis().min(u128::from(u64::MAX)) as u64);
        self
    }

    /// Creates a subscriber overflow event.
    #[inline]
    pub(crate) fn subscriber_overflow(subscriber: &'static str, reason: &'static str) -> Self {
        Event::new(EventKind::SubscriberOverflow)
            .with_task(subscriber)
            .with_detail(reason)
    }

    /// Creates a subscriber panic event.
    #[inline]
    pub(crate) fn subscriber_panicked(subscriber: &'static str, info: String) -> Self {
        Event::new(EventKind::SubscriberPanicked)
            .with_task(subscriber)
            .with_detail(info)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn seq_is_monotonic() {
        let a = Event::new(EventKind::TaskAdmitted);
        let b = Event::new(EventKind::TaskStarted);
        assert!(b.seq > a.seq);
    }

    #[test]
    fn builders_set_fields() {
        let ev = Event::new(EventKind::TaskTimedOut)
            .with_task("t-1")
            .with_timeout(Duration::from_secs(2))
            .with_worker(Some(Arc::from("worker-7")));
        assert_eq!(ev.task.as_deref(), Some("t-1"));
        assert_eq!(ev.timeout_ms, Some(2000));
        assert_eq!(ev.worker.as_deref(), Some("worker-7"));
    }
}
