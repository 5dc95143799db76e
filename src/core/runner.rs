//! # Run one admitted task on the substrate.
//!
//! Executes a single task body with deadline enforcement and panic
//! isolation, fixes exactly one terminal outcome, publishes the matching
//! event, and releases the admission permit.
//!
//! ## Outcome mapping
//! ```text
//! body → Ok(())                     → Succeeded
//! body → Err(Fail/Timeout)          → Failed
//! body → Err(Canceled)              → Aborted   (acknowledged cancellation)
//! body panicked                     → Failed    (panic captured at the boundary)
//! deadline elapsed                  → TimedOut  (child token cancelled;
//!                                                body detaches for cleanup)
//! spawned after shutdown began      → Aborted   (never ran)
//! ```
//!
//! ## Rules
//! - The body runs as its own task on the loop; a panic is caught by its
//!   join handle and never unwinds into the substrate or other tasks.
//! - On timeout the outcome is fixed immediately and the permit freed;
//!   the body keeps its cancelled token and may finish cleanup in the
//!   background without changing the outcome.
//! - The permit is released exactly when the outcome resolves, whatever
//!   the path.

use std::sync::Arc;
use std::time::{Duration, Instant};

use tokio::time;
use tokio_util::sync::CancellationToken;

use crate::core::gate::Permit;
use crate::core::registry::InflightRegistry;
use crate::error::TaskError;
use crate::events::{Bus, Event, EventKind};
use crate::tasks::{TaskCell, TaskOutcome, TaskRef};

/// Everything a single execution needs, bundled at admission time.
pub(crate) struct RunnerContext {
    pub cell: Arc<TaskCell>,
    pub task: TaskRef,
    pub timeout: Option<Duration>,
    pub permit: Permit,
    pub bus: Bus,
    pub worker: Option<Arc<str>>,
    pub registry: Arc<InflightRegistry>,
    /// Per-task token, child of the substrate's root token.
    pub cancel: CancellationToken,
}

enum Verdict {
    Finished(Result<Result<(), TaskError>, tokio::task::JoinError>),
    DeadlineElapsed(Duration),
}

/// Executes one admitted task to its terminal outcome.
pub(crate) async fn execute(ctx: RunnerContext) {
    let RunnerContext {
        cell,
        task,
        timeout,
        permit,
        bus,
        worker,
        registry,
        cancel,
    } = ctx;
    let id = cell.id();

    // A submission that raced with shutdown may reach the loop after
    // cancellation; it must still end with a terminal outcome.
    if cancel.is_cancelled() {
        if cell.resolve(TaskOutcome::Aborted, Some("scheduler stopped".into())) {
            registry.remove(&id);
            bus.publish(
                Event::new(EventKind::TaskAborted)
                    .with_task(id.as_arc())
                    .with_detail("scheduler stopped")
                    .with_worker(worker.clone()),
            );
        }
        drop(permit);
        return;
    }

    cell.mark_running();
    bus.publish(
        Event::new(EventKind::TaskStarted)
            .with_task(id.as_arc())
            .with_worker(worker.clone()),
    );
    let started = Instant::now();

    let body_token = cancel.child_token();
    let mut body = tokio::spawn({
        let task = Arc::clone(&task);
        let token = body_token.clone();
        async move { task.run(token).await }
    });

    let verdict = match timeout.filter(|d| *d > Duration::ZERO) {
        Some(deadline) => {
            tokio::select! {
                res = &mut body => Verdict::Finished(res),
                _ = time::sleep(deadline) => {
                    body_token.cancel();
                    Verdict::DeadlineElapsed(deadline)
                }
            }
        }
        None => Verdict::Finished(body.await),
    };
    let elapsed = started.elapsed();

    match verdict {
        Verdict::DeadlineElapsed(deadline) => {
            if cell.resolve(
                TaskOutcome::TimedOut,
                Some(format!("timed out after {deadline:?}")),
            ) {
                registry.remove(&id);
                bus.publish(
                    Event::new(EventKind::TaskTimedOut)
                        .with_task(id.as_arc())
                        .with_timeout(deadline)
                        .with_worker(worker),
                );
            }
            // `body` stays detached: it holds a cancelled token and may
            // finish cleanup without touching the fixed outcome.
        }
        Verdict::Finished(Ok(Ok(()))) => {
            if cell.resolve(TaskOutcome::Succeeded, None) {
                registry.remove(&id);
                bus.publish(
                    Event::new(EventKind::TaskSucceeded)
                        .with_task(id.as_arc())
                        .with_elapsed(elapsed)
                        .with_worker(worker),
                );
            }
        }
        Verdict::Finished(Ok(Err(TaskError::Canceled))) => {
            if cell.resolve(TaskOutcome::Aborted, Some("cancelled".into())) {
                registry.remove(&id);
                bus.publish(
                    Event::new(EventKind::TaskAborted)
                        .with_task(id.as_arc())
                        .with_detail("cancelled")
                        .with_worker(worker),
                );
            }
        }
        Verdict::Finished(Ok(Err(err))) => {
            let detail = err.to_string();
            if cell.resolve(TaskOutcome::Failed, Some(detail.clone())) {
                registry.remove(&id);
                bus.publish(
                    Event::new(EventKind::TaskFailed)
                        .with_task(id.as_arc())
                        .with_detail(detail)
                        .with_elapsed(elapsed)
                        .with_worker(worker),
                );
            }
        }
        Verdict::Finished(Err(join_err)) => {
            if join_err.is_panic() {
                let detail = format!("panic: {}", panic_message(join_err.into_panic()));
                if cell.resolve(TaskOutcome::Failed, Some(detail.clone())) {
                    registry.remove(&id);
                    bus.publish(
                        Event::new(EventKind::TaskFailed)
                            .with_task(id.as_arc())
                            .with_detail(detail)
                            .with_elapsed(elapsed)
                            .with_worker(worker),
                    );
                }
            } else if cell.resolve(TaskOutcome::Aborted, Some("substrate stopped".into())) {
                registry.remove(&id);
                bus.publish(
                    Event::new(EventKind::TaskAborted)
                        .with_task(id.as_arc())
                        .with_detail("substrate stopped")
                        .with_worker(worker),
                );
            }
        }
    }

    drop(permit);
}

fn panic_message(payload: Box<dyn std::any::Any + Send>) -> String {
    if let Some(msg) = payload.downcast_ref::<&'static str>() {
        (*msg).to_string()
    } else if let Some(msg) = payload.downcast_ref::<String>() {
        msg.clone()
    } else {
        "unknown panic".to_string()
    }
}
