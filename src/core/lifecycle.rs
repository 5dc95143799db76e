//! # Lifecycle controller: the substrate's state machine.
//!
//! Owns the scheduler phase and the current substrate incarnation, and
//! implements the start, recovery, and shutdown protocols.
//!
//! ## State machine
//! ```text
//! Stopped ──start()──► Starting ──(loop ready)──► Running
//!                                                    │
//!                      ┌──(substrate thread died)────┘
//!                      ▼
//!                   Failed ──start()/lazy restart──► Starting ──► Running
//!                                                    (cleanup first:
//!                                                     abandon stale records,
//!                                                     reset the gate)
//!
//! Running ──shutdown(grace)──► Stopping ──(drained | grace over)──► Stopped
//! ```
//!
//! ## Recovery rules
//! - Recovery is lazy: a dead substrate is noticed at the next
//!   submission, never by background polling.
//! - A lazy restart is attempted at most once per submission; the
//!   backoff floor ([`RestartBackoff`](crate::RestartBackoff)) bounds
//!   how often consecutive attempts may fire under sustained failure.
//! - An explicit `start()` is never gated by the backoff floor.
//!
//! ## Shutdown rules
//! - Admission stops first (the gate closes, waking blocked callers),
//!   then in-flight tasks get the grace period to drain cooperatively.
//! - Whatever remains after the grace period is abandoned with a
//!   terminal `Aborted` outcome; teardown is bounded in time.
//! - Concurrent `shutdown` callers converge: late callers wait for the
//!   first one to reach `Stopped`.

use std::sync::Arc;
use std::time::{Duration, Instant};

use parking_lot::{Condvar, Mutex};
use serde::Serialize;

use crate::core::config::SchedulerConfig;
use crate::core::gate::ConcurrencyGate;
use crate::core::registry::InflightRegistry;
use crate::core::substrate::{Substrate, SubstrateClient};
use crate::error::SchedulerError;
use crate::events::{Bus, Event, EventKind};
use crate::subscribers::{Subscribe, SubscriberSet};

/// How long teardown waits for the loop thread before abandoning it.
const TEARDOWN_JOIN_WAIT: Duration = Duration::from_millis(500);

/// Scheduler phase.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum Phase {
    /// No substrate; nothing is admitted.
    Stopped,
    /// Substrate initialization in progress.
    Starting,
    /// Substrate alive; submissions are admitted.
    Running,
    /// Shutdown in progress; submissions are refused.
    Stopping,
    /// Substrate reported an unrecoverable error; recovery required.
    Failed,
}

struct Inner {
    phase: Phase,
    substrate: Option<Substrate>,
    next_epoch: u64,
    /// When the last restart attempt fired (successful or not).
    last_attempt: Option<Instant>,
    /// Consecutive failed boot attempts; indexes the backoff curve.
    failed_attempts: u32,
}

/// Starts, monitors, and tears down the substrate.
pub(crate) struct LifecycleController {
    cfg: SchedulerConfig,
    worker: Option<Arc<str>>,
    bus: Bus,
    gate: Arc<ConcurrencyGate>,
    registry: Arc<InflightRegistry>,
    subscribers: Vec<Arc<dyn Subscribe>>,
    inner: Mutex<Inner>,
    phase_changed: Condvar,
}

impl LifecycleController {
    pub(crate) fn new(
        cfg: SchedulerConfig,
        bus: Bus,
        gate: Arc<ConcurrencyGate>,
        registry: Arc<InflightRegistry>,
        subscribers: Vec<Arc<dyn Subscribe>>,
    ) -> Self {
        let worker = cfg.worker_tag();
        Self {
            cfg,
            worker,
            bus,
            gate,
            registry,
            subscribers,
            inner: Mutex::new(Inner {
                phase: Phase::Stopped,
                substrate: None,
                next_epoch: 0,
                last_attempt: None,
                failed_attempts: 0,
            }),
            phase_changed: Condvar::new(),
        }
    }

    pub(crate) fn phase(&self) -> Phase {
        self.inner.lock().phase
    }

    /// Current substrate epoch, if one is running.
    #[cfg(test)]
    pub(crate) fn substrate_epoch(&self) -> Option<u64> {
        self.inner.lock().substrate.as_ref().map(|s| s.epoch())
    }

    /// Starts the substrate. Idempotent while `Running`; from `Failed`
    /// or `Stopped` it performs cleanup and boots a fresh incarnation.
    pub(crate) fn start(&self) -> Result<(), SchedulerError> {
        let mut inner = self.inner.lock();
        match inner.phase {
            Phase::Running => {
                if inner.substrate.as_ref().is_some_and(|s| s.is_alive()) {
                    return Ok(());
                }
                self.note_failure(&mut inner, "substrate thread terminated unexpectedly");
            }
            Phase::Stopping => return Err(SchedulerError::ShuttingDown),
            _ => {}
        }
        self.boot(&mut inner)
    }

    /// Returns a client for a running substrate, lazily recovering a
    /// dead one when the restart policy allows it.
    ///
    /// At most one restart attempt per call; the backoff floor turns
    /// too-frequent attempts into `Unavailable`.
    pub(crate) fn ensure_running(&self) -> Result<SubstrateClient, SchedulerError> {
        let mut inner = self.inner.lock();
        match inner.phase {
            Phase::Running => {
                if let Some(sub) = inner.substrate.as_ref() {
                    if sub.is_alive() {
                        return Ok(sub.client());
                    }
                }
                self.note_failure(&mut inner, "substrate thread terminated unexpectedly");
            }
            Phase::Stopping => return Err(SchedulerError::ShuttingDown),
            _ => {}
        }

        // Phase is Stopped or Failed here.
        if !self.cfg.restart.allows_lazy_restart() {
            return Err(SchedulerError::Unavailable {
                detail: format!(
                    "substrate is {:?} and lazy restart is disabled",
                    inner.phase
                ),
            });
        }
        if let Some(remaining) = self.restart_floor_remaining(&inner) {
            return Err(SchedulerError::Unavailable {
                detail: format!("restart backoff in effect; retry in {remaining:?}"),
            });
        }

        tracing::warn!(phase = ?inner.phase, "substrate not running; attempting restart");
        self.boot(&mut inner)
            .map_err(|e| SchedulerError::Unavailable {
                detail: e.to_string(),
            })?;

        match inner.substrate.as_ref() {
            Some(sub) => Ok(sub.client()),
            None => Err(SchedulerError::Unavailable {
                detail: "substrate missing after restart".into(),
            }),
        }
    }

    /// Records an unrecoverable substrate error. The next submission (or
    /// an explicit `start`) drives recovery.
    pub(crate) fn mark_failed(&self, reason: &str) {
        let mut inner = self.inner.lock();
        if matches!(inner.phase, Phase::Stopping | Phase::Stopped) {
            return;
        }
        self.note_failure(&mut inner, reason);
    }

    /// Runs the shutdown protocol; see the module docs.
    pub(crate) fn shutdown(&self, grace: Duration) -> Result<(), SchedulerError> {
        let substrate = {
            let mut inner = self.inner.lock();
            loop {
                match inner.phase {
                    Phase::Stopped => return Ok(()),
                    Phase::Stopping => {
                        // Another caller is draining; converge on Stopped.
                        self.phase_changed.wait(&mut inner);
                    }
                    Phase::Failed => {
                        inner.phase = Phase::Stopped;
                        self.phase_changed.notify_all();
                        let sub = inner.substrate.take();
                        drop(inner);

                        self.gate.close();
                        let _ = self
                            .registry
                            .abandon_all("scheduler stopped", &self.bus, &self.worker);
                        self.gate.force_reset();
                        if let Some(sub) = sub {
                            sub.teardown(TEARDOWN_JOIN_WAIT);
                        }
                        return Ok(());
                    }
                    Phase::Running | Phase::Starting => {
                        inner.phase = Phase::Stopping;
                        self.phase_changed.notify_all();
                        break inner.substrate.take();
                    }
                }
            }
        };

        self.publish(Event::new(EventKind::ShutdownRequested));
        tracing::info!(?grace, "shutdown requested");

        // Stop admitting, then ask in-flight work to stop cooperatively.
        self.gate.close();
        if let Some(sub) = &substrate {
            sub.cancel_tasks();
        }

        let drained = self.gate.wait_idle(grace);
        let abandoned = if drained {
            self.publish(Event::new(EventKind::DrainedWithinGrace));
            Vec::new()
        } else {
            let abandoned =
                self.registry
                    .abandon_all("shutdown grace period exceeded", &self.bus, &self.worker);
            self.publish(Event::new(EventKind::GraceExceeded));
            tracing::warn!(abandoned = abandoned.len(), "grace period exceeded");
            abandoned
        };
        self.gate.force_reset();

        {
            let mut inner = self.inner.lock();
            inner.phase = Phase::Stopped;
            self.phase_changed.notify_all();
        }
        if let Some(sub) = substrate {
            sub.teardown(TEARDOWN_JOIN_WAIT);
        }

        if abandoned.is_empty() {
            Ok(())
        } else {
            Err(SchedulerError::GraceExceeded { grace, abandoned })
        }
    }

    /// Boots a fresh substrate incarnation, cleaning up any previous one.
    ///
    /// Caller holds the state lock; `Starting` is only ever observed by
    /// the thread performing the boot.
    fn boot(&self, inner: &mut Inner) -> Result<(), SchedulerError> {
        inner.phase = Phase::Starting;

        if let Some(old) = inner.substrate.take() {
            old.teardown(TEARDOWN_JOIN_WAIT);
        }
        // Records and permits stranded by the previous incarnation.
        let _ = self
            .registry
            .abandon_all("substrate lost", &self.bus, &self.worker);
        self.gate.reset_for_start();

        let epoch = inner.next_epoch;
        inner.next_epoch += 1;
        inner.last_attempt = Some(Instant::now());

        match Substrate::start(self.cfg.blocking_threads, epoch) {
            Ok(sub) => {
                self.wire_fanout(&sub);
                inner.substrate = Some(sub);
                inner.phase = Phase::Running;
                inner.failed_attempts = 0;
                self.phase_changed.notify_all();
                self.publish(Event::new(EventKind::SchedulerStarted));
                Ok(())
            }
            Err(e) => {
                inner.phase = Phase::Failed;
                inner.failed_attempts = inner.failed_attempts.saturating_add(1);
                self.phase_changed.notify_all();
                self.publish(Event::new(EventKind::SchedulerFailed).with_detail(e.to_string()));
                tracing::error!(error = %e, "substrate failed to start");
                Err(e)
            }
        }
    }

    /// Time left until the backoff floor permits another lazy restart.
    fn restart_floor_remaining(&self, inner: &Inner) -> Option<Duration> {
        let last = inner.last_attempt?;
        if inner.failed_attempts == 0 {
            return None;
        }
        let floor = self
            .cfg
            .restart_backoff
            .delay_for(inner.failed_attempts - 1);
        floor.checked_sub(last.elapsed()).filter(|d| *d > Duration::ZERO)
    }

    fn note_failure(&self, inner: &mut Inner, reason: &str) {
        inner.phase = Phase::Failed;
        self.phase_changed.notify_all();
        self.publish(Event::new(EventKind::SchedulerFailed).with_detail(reason.to_string()));
        tracing::warn!(reason, "substrate marked failed");
    }

    /// Wires the per-subscriber fan-out for a fresh incarnation. The
    /// workers live on the substrate and die with it; the bus itself
    /// persists across incarnations.
    fn wire_fanout(&self, sub: &Substrate) {
        if self.subscribers.is_empty() {
            return;
        }
        let client = sub.client();
        let set = SubscriberSet::spawn(self.subscribers.clone(), self.bus.clone(), &client.handle);
        let mut rx = self.bus.subscribe();
        client.handle.spawn(async move {
            loop {
                match rx.recv().await {
                    Ok(ev) => set.emit(&ev),
                    Err(tokio::sync::broadcast::error::RecvError::Closed) => break,
                    Err(tokio::sync::broadcast::error::RecvError::Lagged(_)) => continue,
                }
            }
        });
    }

    fn publish(&self, ev: Event) {
        self.bus.publish(ev.with_worker(self.worker.clone()));
    }
}
