//! # taskloom
//!
//! **Taskloom** is an in-process background task manager: callers hand it
//! opaque async work and get an acknowledgment back immediately, while
//! execution happens on a supervised single-run-loop substrate with
//! bounded concurrency, lazy failure recovery, and bounded graceful
//! shutdown.
//!
//! The manager is per-process and best-effort by design: nothing is
//! persisted, and pending or in-flight work is lost if the owning
//! process terminates. Hosts that need durability put a queue in front
//! of it; taskloom solves the lifecycle of the execution substrate
//! itself — starting it, keeping it alive across internal failures, and
//! tearing it down without leaking threads or losing task accounting.
//!
//! ## Architecture
//! ```text
//! caller thread(s)                        substrate (dedicated thread,
//! ────────────────                        current-thread run loop)
//! submit(Submission)                      ─────────────────────────────
//!     │
//!     ├─► LifecycleController ─ ensure Running (lazy restart, backoff floor)
//!     ├─► ConcurrencyGate ───── acquire permit (Block | Reject | Wait)
//!     ├─► InflightRegistry ──── record the admitted task
//!     ├─► Bus ◄──────────────── publish TaskAdmitted
//!     └─► spawn ──────────────► runner::execute(task)
//!              │                     ├─ publish TaskStarted
//!  TaskHandle ◄┘ (returns            ├─ body runs: panic-isolated,
//!                immediately)        │  deadline-bounded, cancellable
//!                                    ├─ publish terminal event
//!                                    └─ release the permit
//!
//! Bus ──► fan-out listener ──► [queue sub1] ─► worker ─► sub1.on_event()
//!  │                           [queue subN] ─► worker ─► subN.on_event()
//!  └────► raw receivers from Scheduler::subscribe()
//! ```
//!
//! ### Lifecycle
//! ```text
//! Stopped ──start()──► Starting ──ready──► Running ──shutdown(grace)──► Stopping
//!                                             │                            │
//!                                  (loop thread died)         drained, or grace elapsed
//!                                             ▼                  + abandon leftovers
//!                                          Failed                         ▼
//!                                             └──start()/lazy restart─► Stopped
//! ```
//!
//! A dead substrate is noticed at the next submission, never by
//! background polling; recovery cleans up stale permits and records
//! before booting a fresh incarnation, and a configurable backoff floor
//! keeps sustained failure from turning into a restart loop.
//!
//! ## Features
//! | Area              | Description                                                      | Key types                                  |
//! |-------------------|------------------------------------------------------------------|--------------------------------------------|
//! | **Scheduling**    | Non-blocking submission onto a supervised run loop.              | [`Scheduler`], [`Submission`], [`TaskHandle`] |
//! | **Tasks**         | Define bodies as trait impls or async closures.                  | [`Task`], [`TaskFn`], [`TaskRef`]          |
//! | **Admission**     | Bound concurrent execution; pick the behavior at saturation.     | [`AdmissionPolicy`]                        |
//! | **Recovery**      | Lazy restart of a failed substrate with a delay floor.           | [`RestartPolicy`], [`RestartBackoff`]      |
//! | **Events**        | Fire-and-forget lifecycle/completion stream.                     | [`Event`], [`EventKind`], [`Bus`]          |
//! | **Subscribers**   | Queued, panic-isolated observers (logging, metrics).             | [`Subscribe`], [`LogWriter`]               |
//! | **Errors**        | Typed failures for the scheduler and for task bodies.            | [`SchedulerError`], [`TaskError`]          |
//! | **Configuration** | Capacity, deadlines, policies, worker identity.                  | [`SchedulerConfig`]                        |
//!
//! ## Example
//! ```rust
//! use std::time::Duration;
//! use tokio_util::sync::CancellationToken;
//! use taskloom::{Scheduler, SchedulerConfig, Submission, TaskError};
//!
//! fn main() -> Result<(), taskloom::SchedulerError> {
//!     let scheduler = Scheduler::builder(SchedulerConfig::default()).build();
//!     scheduler.start()?;
//!
//!     let handle = scheduler.submit(
//!         Submission::builder()
//!             .id("hello")
//!             .payload(serde_json::json!({ "source": "readme" }))
//!             .build(|ctx: CancellationToken| async move {
//!                 if ctx.is_cancelled() {
//!                     return Err(TaskError::Canceled);
//!                 }
//!                 println!("hello from the loom");
//!                 Ok(())
//!             }),
//!     )?;
//!     println!("submitted {}", handle.id());
//!
//!     scheduler.shutdown(Duration::from_secs(2))?;
//!     Ok(())
//! }
//! ```

mod core;
mod error;
mod events;
mod policies;
mod subscribers;
mod tasks;

// ---- Public re-exports ----

pub use crate::core::{
    shutdown_signal, Phase, Scheduler, SchedulerBuilder, SchedulerConfig, SchedulerStatus,
};
pub use error::{SchedulerError, TaskError};
pub use events::{Bus, Event, EventKind};
pub use policies::{AdmissionPolicy, Jitter, RestartBackoff, RestartPolicy};
pub use subscribers::{LogWriter, Subscribe};
pub use tasks::{
    Submission, SubmissionBuilder, Task, TaskContext, TaskFn, TaskHandle, TaskId, TaskOutcome,
    TaskRef,
};
