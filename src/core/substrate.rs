//! # Execution substrate: one dedicated thread, one run loop.
//!
//! The substrate is a single OS thread hosting a current-thread tokio
//! runtime. All task bodies execute on that one loop: switching happens
//! only at await points, and a body that never suspends cannot be
//! preempted, only abandoned. Work is injected from any caller via the
//! runtime handle; the loop thread itself never waits on admission.
//!
//! Blocking work must not run on the loop. Bodies delegate it with
//! `tokio::task::spawn_blocking`, which lands on the runtime's bounded
//! auxiliary pool (`blocking_threads` in the config, independent of the
//! concurrency capacity).
//!
//! ## Teardown
//! Teardown is bounded: the stop token ends the loop's `block_on`, the
//! runtime drops pending work within a short drain window, and the
//! thread is joined with a deadline. A loop wedged by a non-yielding
//! body is abandoned to the process rather than joined forever.

use std::sync::mpsc;
use std::thread;
use std::time::{Duration, Instant};

use tokio_util::sync::CancellationToken;

use crate::error::SchedulerError;

/// How long `start` waits for the loop thread to report ready.
const READY_TIMEOUT: Duration = Duration::from_secs(5);

/// How long the runtime drains spawned work after the loop stops.
const RUNTIME_DRAIN: Duration = Duration::from_millis(250);

/// Cheap handle for injecting work into a running substrate.
#[derive(Clone)]
pub(crate) struct SubstrateClient {
    /// Runtime handle; `spawn` places the future on the loop.
    pub handle: tokio::runtime::Handle,
    /// Root cancellation token shared by every task of this incarnation.
    pub tasks: CancellationToken,
}

/// A running substrate incarnation.
pub(crate) struct Substrate {
    handle: tokio::runtime::Handle,
    tasks: CancellationToken,
    stop: CancellationToken,
    thread: thread::JoinHandle<()>,
    epoch: u64,
}

impl Substrate {
    /// Spawns the loop thread and blocks until it reports ready.
    pub(crate) fn start(blocking_threads: usize, epoch: u64) -> Result<Self, SchedulerError> {
        let stop = CancellationToken::new();
        let tasks = CancellationToken::new();
        let (ready_tx, ready_rx) = mpsc::channel::<Result<tokio::runtime::Handle, String>>();

        let loop_stop = stop.clone();
        let thread = thread::Builder::new()
            .name(format!("taskloom-loop-{epoch}"))
            .spawn(move || {
                let rt = match tokio::runtime::Builder::new_current_thread()
                    .enable_all()
                    .max_blocking_threads(blocking_threads.max(1))
                    .build()
                {
                    Ok(rt) => rt,
                    Err(e) => {
                        let _ = ready_tx.send(Err(e.to_string()));
                        return;
                    }
                };
                let _ = ready_tx.send(Ok(rt.handle().clone()));

                // The loop parks here; spawned tasks run until stop fires.
                rt.block_on(loop_stop.cancelled());
                rt.shutdown_timeout(RUNTIME_DRAIN);
                tracing::debug!(epoch, "substrate loop exited");
            })
            .map_err(|e| SchedulerError::Startup {
                detail: format!("failed to spawn substrate thread: {e}"),
            })?;

        match ready_rx.recv_timeout(READY_TIMEOUT) {
            Ok(Ok(handle)) => {
                tracing::info!(epoch, "substrate ready");
                Ok(Self {
                    handle,
                    tasks,
                    stop,
                    thread,
                    epoch,
                })
            }
            Ok(Err(detail)) => {
                let _ = thread.join();
                Err(SchedulerError::Startup { detail })
            }
            Err(_) => Err(SchedulerError::Startup {
                detail: "substrate thread did not report ready".into(),
            }),
        }
    }

    pub(crate) fn client(&self) -> SubstrateClient {
        SubstrateClient {
            handle: self.handle.clone(),
            tasks: self.tasks.clone(),
        }
    }

    /// Incarnation counter, for thread naming and diagnostics.
    pub(crate) fn epoch(&self) -> u64 {
        self.epoch
    }

    /// True while the loop thread is running.
    pub(crate) fn is_alive(&self) -> bool {
        !self.thread.is_finished()
    }

    /// Signals cooperative cancellation to every task of this incarnation.
    pub(crate) fn cancel_tasks(&self) {
        self.tasks.cancel();
    }

    /// Stops the loop and joins the thread with a deadline.
    ///
    /// A thread that does not exit in time (a body that never yields is
    /// starving the loop) is abandoned; teardown never waits forever.
    pub(crate) fn teardown(self, join_wait: Duration) {
        self.tasks.cancel();
        self.stop.cancel();

        let deadline = Instant::now() + join_wait;
        while !self.thread.is_finished() && Instant::now() < deadline {
            thread::sleep(Duration::from_millis(5));
        }
        if self.thread.is_finished() {
            let _ = self.thread.join();
        } else {
            tracing::warn!(epoch = self.epoch, "substrate thread wedged; abandoning it");
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::atomic::{AtomicBool, Ordering};
    use std::sync::Arc;

    #[test]
    fn spawned_work_runs_on_the_loop() {
        let sub = Substrate::start(1, 0).unwrap();
        let ran = Arc::new(AtomicBool::new(false));
        let flag = Arc::clone(&ran);
        sub.client().handle.spawn(async move {
            flag.store(true, Ordering::SeqCst);
        });
        let deadline = Instant::now() + Duration::from_secs(5);
        while !ran.load(Ordering::SeqCst) && Instant::now() < deadline {
            thread::sleep(Duration::from_millis(5));
        }
        assert!(ran.load(Ordering::SeqCst));
        sub.teardown(Duration::from_secs(1));
    }

    #[test]
    fn teardown_stops_the_loop_thread() {
        let sub = Substrate::start(1, 1).unwrap();
        assert!(sub.is_alive());
        sub.teardown(Duration::from_secs(1));
    }

    #[test]
    fn blocking_delegation_does_not_wedge_the_loop() {
        let sub = Substrate::start(2, 2).unwrap();
        let done = Arc::new(AtomicBool::new(false));
        let flag = Arc::clone(&done);
        sub.client().handle.spawn(async move {
            // Blocking work goes to the auxiliary pool, not the loop.
            let res = tokio::task::spawn_blocking(|| {
                thread::sleep(Duration::from_millis(50));
                7
            })
            .await;
            if matches!(res, Ok(7)) {
                flag.store(true, Ordering::SeqCst);
            }
        });
        let deadline = Instant::now() + Duration::from_secs(5);
        while !done.load(Ordering::SeqCst) && Instant::now() < deadline {
            thread::sleep(Duration::from_millis(5));
        }
        assert!(done.load(Ordering::SeqCst));
        sub.teardown(Duration::from_secs(1));
    }
}
