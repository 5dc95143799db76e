//! # Scheduler: the public surface of the task manager.
//!
//! [`Scheduler`] accepts submissions from any thread, keeps the
//! execution substrate alive, and reports everything it does through the
//! event bus. All methods take `&self`; the scheduler is built once (see
//! [`SchedulerBuilder`]) and shared behind an `Arc`.
//!
//! ## Submission pipeline
//! ```text
//! submit(Submission)
//!     │
//!     ├─► LifecycleController::ensure_running()   (lazy restart if dead,
//!     │                                            at most once, backoff floor)
//!     ├─► ConcurrencyGate::acquire(admission)     (Block | Reject | Wait)
//!     │        └─ refusal ─► TaskRejected event + typed error
//!     ├─► InflightRegistry::insert(record)
//!     ├─► publish TaskAdmitted
//!     └─► substrate.spawn(runner::execute(...))
//!              │
//!  TaskHandle ◄┘ returns immediately; the runner publishes TaskStarted,
//!               runs the body, publishes the terminal event, and
//!               releases the permit
//! ```
//!
//! The non-blocking guarantee is the core contract: caller latency is
//! bounded by admission time (the gate wait, under the configured
//! policy), never by execution time.
//!
//! When capacity allows immediate admission, tasks submitted in order
//! are handed to the loop in order and start in that order; completion
//! order depends on each body's own duration.
//!
//! ## Shutdown
//! [`Scheduler::shutdown`] runs the bounded drain protocol: stop
//! admissions, signal cooperative cancellation, wait up to the grace
//! period, abandon whatever remains, tear the substrate down. It blocks
//! the calling thread while draining — call it from host teardown code,
//! never from inside a task body.

use std::sync::Arc;
use std::time::Duration;

use serde::Serialize;
use tokio::sync::broadcast;

use crate::core::builder::SchedulerBuilder;
use crate::core::config::SchedulerConfig;
use crate::core::gate::{ConcurrencyGate, GateError};
use crate::core::lifecycle::{LifecycleController, Phase};
use crate::core::registry::InflightRegistry;
use crate::core::runner::{self, RunnerContext};
use crate::error::SchedulerError;
use crate::events::{Bus, Event, EventKind};
use crate::tasks::{Submission, TaskCell, TaskHandle, TaskId, TaskOutcome};

/// In-process background task manager.
///
/// ## Example
/// ```rust
/// use std::time::Duration;
/// use tokio_util::sync::CancellationToken;
/// use taskloom::{Scheduler, SchedulerConfig, Submission, TaskError};
///
/// fn main() -> Result<(), taskloom::SchedulerError> {
///     let scheduler = Scheduler::builder(SchedulerConfig::default()).build();
///     scheduler.start()?;
///
///     let handle = scheduler.submit(Submission::builder().id("greet").build(
///         |ctx: CancellationToken| async move {
///             if ctx.is_cancelled() {
///                 return Err(TaskError::Canceled);
///             }
///             Ok(())
///         },
///     ))?;
///     assert_eq!(handle.id().as_str(), "greet");
///
///     scheduler.shutdown(Duration::from_secs(2))?;
///     Ok(())
/// }
/// ```
pub struct Scheduler {
    cfg: SchedulerConfig,
    bus: Bus,
    gate: Arc<ConcurrencyGate>,
    registry: Arc<InflightRegistry>,
    lifecycle: LifecycleController,
    worker: Option<Arc<str>>,
}

/// Point-in-time scheduler snapshot, serializable for host surfaces
/// (health endpoints, status pages).
#[derive(Clone, Debug, Serialize)]
pub struct SchedulerStatus {
    /// Current lifecycle phase.
    pub phase: Phase,
    /// Tasks currently admitted through the gate.
    pub active: usize,
    /// Configured concurrency capacity.
    pub capacity: usize,
    /// Host-supplied worker identity, if any.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub worker: Option<String>,
}

impl Scheduler {
    /// Starts a [`SchedulerBuilder`] with the given configuration.
    pub fn builder(cfg: SchedulerConfig) -> SchedulerBuilder {
        SchedulerBuilder::new(cfg)
    }

    pub(crate) fn new_internal(
        cfg: SchedulerConfig,
        bus: Bus,
        gate: Arc<ConcurrencyGate>,
        registry: Arc<InflightRegistry>,
        lifecycle: LifecycleController,
    ) -> Self {
        let worker = cfg.worker_tag();
        Self {
            cfg,
            bus,
            gate,
            registry,
            lifecycle,
            worker,
        }
    }

    /// Boots the substrate, returning once it reports ready.
    ///
    /// Idempotent while `Running`. From `Stopped` or `Failed` a fresh
    /// incarnation is booted (stale state is cleaned up first). Fails
    /// with [`SchedulerError::Startup`] if the runtime cannot be built,
    /// or [`SchedulerError::ShuttingDown`] while a shutdown is draining.
    pub fn start(&self) -> Result<(), SchedulerError> {
        self.lifecycle.start()
    }

    /// Submits a task for asynchronous execution.
    ///
    /// Returns a [`TaskHandle`] as soon as the task is admitted, without
    /// waiting for execution. If the substrate is not running, a lazy
    /// restart is attempted first (at most once, policy and backoff
    /// permitting).
    ///
    /// Refusals are immediate and typed:
    /// - [`SchedulerError::Rejected`] — gate saturated under the
    ///   `Reject` policy or the `Wait` bound elapsed; a `TaskRejected`
    ///   event is emitted so the submission still has a terminal record.
    /// - [`SchedulerError::ShuttingDown`] — shutdown began before the
    ///   task could be admitted.
    /// - [`SchedulerError::Unavailable`] — the substrate could not be
    ///   brought to `Running`.
    /// - [`SchedulerError::Invariant`] — the gate was poisoned by an
    ///   earlier bookkeeping violation.
    pub fn submit(&self, submission: Submission) -> Result<TaskHandle, SchedulerError> {
        let Submission {
            id,
            payload,
            timeout,
            task,
        } = submission;
        let id = match id {
            Some(id) => TaskId::new(id),
            None => TaskId::generate(),
        };

        let client = self.lifecycle.ensure_running()?;

        let permit = match self.gate.acquire(self.cfg.admission) {
            Ok(permit) => permit,
            Err(GateError::Saturated) => {
                let cell = TaskCell::new(id.clone(), payload);
                cell.resolve(
                    TaskOutcome::Rejected,
                    Some("concurrency capacity exhausted".into()),
                );
                self.publish(
                    Event::new(EventKind::TaskRejected)
                        .with_task(id.as_arc())
                        .with_detail("concurrency capacity exhausted"),
                );
                return Err(SchedulerError::Rejected { id });
            }
            Err(GateError::Closed) => {
                self.publish(
                    Event::new(EventKind::TaskRejected)
                        .with_task(id.as_arc())
                        .with_detail("scheduler shutting down"),
                );
                return Err(SchedulerError::ShuttingDown);
            }
            Err(GateError::Poisoned) => {
                return Err(SchedulerError::Invariant {
                    detail: "concurrency gate poisoned by an earlier bookkeeping violation".into(),
                });
            }
        };

        let cell = TaskCell::new(id.clone(), payload);
        self.registry.insert(Arc::clone(&cell));
        self.publish(Event::new(EventKind::TaskAdmitted).with_task(id.as_arc()));

        client.handle.spawn(runner::execute(RunnerContext {
            cell: Arc::clone(&cell),
            task,
            timeout: timeout.or(self.cfg.default_timeout()),
            permit,
            bus: self.bus.clone(),
            worker: self.worker.clone(),
            registry: Arc::clone(&self.registry),
            cancel: client.tasks.child_token(),
        }));

        Ok(TaskHandle::new(id, cell))
    }

    /// Drains and stops the scheduler; see the module docs.
    ///
    /// Safe to call from any thread, including one racing with `submit`
    /// (late submissions resolve deterministically to `ShuttingDown`),
    /// and safe to call concurrently with itself — late callers wait for
    /// the first drain to finish. Returns
    /// [`SchedulerError::GraceExceeded`] when in-flight tasks outlived
    /// the grace period and were abandoned; the scheduler is fully
    /// stopped either way.
    pub fn shutdown(&self, grace: Duration) -> Result<(), SchedulerError> {
        self.lifecycle.shutdown(grace)
    }

    /// Current lifecycle phase.
    pub fn phase(&self) -> Phase {
        self.lifecycle.phase()
    }

    /// Snapshot of phase, active count, capacity, and worker identity.
    pub fn status(&self) -> SchedulerStatus {
        SchedulerStatus {
            phase: self.lifecycle.phase(),
            active: self.gate.active(),
            capacity: self.gate.capacity(),
            worker: self.cfg.worker_id.clone(),
        }
    }

    /// Subscribes to the raw event stream.
    ///
    /// The receiver outlives substrate restarts. For the queued,
    /// panic-isolated observer surface, register a
    /// [`Subscribe`](crate::Subscribe) on the builder instead.
    pub fn subscribe(&self) -> broadcast::Receiver<Event> {
        self.bus.subscribe()
    }

    fn publish(&self, ev: Event) {
        self.bus.publish(ev.with_worker(self.worker.clone()));
    }
}
