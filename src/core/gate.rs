//! # Concurrency gate: bounds simultaneous task execution.
//!
//! The gate admits at most `capacity` tasks at a time. Admission happens
//! on the submitting thread (per [`AdmissionPolicy`]); release happens
//! wherever the task reaches its terminal outcome. Waiting never occurs
//! on the substrate's run loop.
//!
//! ## Permits and epochs
//! [`Permit`] is an RAII guard: dropping it frees the slot. Every permit
//! is stamped with the gate's epoch; [`force_reset`](ConcurrencyGate::force_reset)
//! bumps the epoch and zeroes the count, so permits that survived a
//! substrate loss or a forced shutdown become no-ops on drop instead of
//! corrupting the count.
//!
//! Releasing a **current-epoch** permit when the count is already zero
//! cannot happen through the RAII surface; if it does, the gate poisons
//! itself and the scheduler fails loudly rather than continuing with a
//! corrupted counter.

use std::sync::Arc;
use std::time::Instant;

use parking_lot::{Condvar, Mutex};

use crate::policies::AdmissionPolicy;

/// Why an acquire was refused.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) enum GateError {
    /// Capacity exhausted under `Reject`, or `Wait` deadline elapsed.
    Saturated,
    /// The gate was closed (shutdown began) before a slot freed.
    Closed,
    /// Bookkeeping was violated earlier; the gate refuses all work.
    Poisoned,
}

struct GateState {
    active: usize,
    epoch: u64,
    closed: bool,
    poisoned: bool,
}

/// Counting admission gate with epoch-stamped RAII permits.
pub(crate) struct ConcurrencyGate {
    capacity: usize,
    state: Mutex<GateState>,
    changed: Condvar,
}

impl ConcurrencyGate {
    /// Creates a gate with the given capacity (min 1, clamped).
    pub(crate) fn new(capacity: usize) -> Arc<Self> {
        Arc::new(Self {
            capacity: capacity.max(1),
            state: Mutex::new(GateState {
                active: 0,
                epoch: 0,
                closed: false,
                poisoned: false,
            }),
            changed: Condvar::new(),
        })
    }

    /// Acquires a slot per the given admission policy.
    ///
    /// Blocking variants wait on the calling thread and are woken by
    /// releases and by [`close`](Self::close); no caller can stay
    /// blocked across a shutdown.
    pub(crate) fn acquire(
        self: &Arc<Self>,
        policy: AdmissionPolicy,
    ) -> Result<Permit, GateError> {
        let deadline = match policy {
            AdmissionPolicy::Wait(d) => Some(Instant::now() + d),
            _ => None,
        };

        let mut st = self.state.lock();
        loop {
            if st.poisoned {
                return Err(GateError::Poisoned);
            }
            if st.closed {
                return Err(GateError::Closed);
            }
            if st.active < self.capacity {
                st.active += 1;
                return Ok(Permit {
                    gate: Arc::clone(self),
                    epoch: st.epoch,
                });
            }
            match policy {
                AdmissionPolicy::Reject => return Err(GateError::Saturated),
                AdmissionPolicy::Block => {
                    self.changed.wait(&mut st);
                }
                AdmissionPolicy::Wait(_) => {
                    if let Some(deadline) = deadline {
                        let timed_out = self.changed.wait_until(&mut st, deadline).timed_out();
                        if timed_out && st.active >= self.capacity && !st.closed {
                            return Err(GateError::Saturated);
                        }
                    }
                }
            }
        }
    }

    /// Refuses all further acquires and wakes every waiter.
    pub(crate) fn close(&self) {
        let mut st = self.state.lock();
        st.closed = true;
        self.changed.notify_all();
    }

    /// Invalidates all outstanding permits and zeroes the count.
    ///
    /// Used by shutdown finalization and failed-substrate cleanup; stale
    /// permits from before the reset release nothing on drop.
    pub(crate) fn force_reset(&self) {
        let mut st = self.state.lock();
        st.epoch += 1;
        st.active = 0;
        self.changed.notify_all();
    }

    /// Reopens the gate for a fresh substrate incarnation.
    ///
    /// Implies [`force_reset`](Self::force_reset); also clears `closed`
    /// and any poison from the previous incarnation.
    pub(crate) fn reset_for_start(&self) {
        let mut st = self.state.lock();
        st.epoch += 1;
        st.active = 0;
        st.closed = false;
        st.poisoned = false;
        self.changed.notify_all();
    }

    /// Waits until the active count reaches zero or `grace` elapses.
    ///
    /// Returns true if the gate drained in time.
    pub(crate) fn wait_idle(&self, grace: std::time::Duration) -> bool {
        let deadline = Instant::now() + grace;
        let mut st = self.state.lock();
        while st.active > 0 {
            if self.changed.wait_until(&mut st, deadline).timed_out() {
                return st.active == 0;
            }
        }
        true
    }

    /// Current number of admitted, unreleased permits.
    pub(crate) fn active(&self) -> usize {
        self.state.lock().active
    }

    /// Configured capacity.
    pub(crate) fn capacity(&self) -> usize {
        self.capacity
    }

    fn release(&self, epoch: u64) {
        let mut st = self.state.lock();
        if st.epoch != epoch {
            // Permit outlived a reset; the slot it held no longer exists.
            return;
        }
        if st.active == 0 {
            st.poisoned = true;
            tracing::error!("concurrency gate released more permits than it issued");
            self.changed.notify_all();
            return;
        }
        st.active -= 1;
        self.changed.notify_all();
    }
}

/// RAII admission slot; dropping it frees the slot.
pub(crate) struct Permit {
    gate: Arc<ConcurrencyGate>,
    epoch: u64,
}

impl std::fmt::Debug for Permit {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Permit").field("epoch", &self.epoch).finish()
    }
}

impl Drop for Permit {
    fn drop(&mut self) {
        self.gate.release(self.epoch);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::time::Duration;

    #[test]
    fn capacity_is_clamped_to_one() {
        let gate = ConcurrencyGate::new(0);
        assert_eq!(gate.capacity(), 1);
    }

    #[test]
    fn reject_policy_refuses_when_saturated() {
        let gate = ConcurrencyGate::new(1);
        let _held = gate.acquire(AdmissionPolicy::Reject).unwrap();
        assert_eq!(
            gate.acquire(AdmissionPolicy::Reject).unwrap_err(),
            GateError::Saturated
        );
    }

    #[test]
    fn dropping_a_permit_frees_the_slot() {
        let gate = ConcurrencyGate::new(1);
        let held = gate.acquire(AdmissionPolicy::Reject).unwrap();
        assert_eq!(gate.active(), 1);
        drop(held);
        assert_eq!(gate.active(), 0);
        assert!(gate.acquire(AdmissionPolicy::Reject).is_ok());
    }

    #[test]
    fn wait_policy_returns_within_the_bound() {
        let gate = ConcurrencyGate::new(1);
        let _held = gate.acquire(AdmissionPolicy::Reject).unwrap();
        let started = Instant::now();
        let res = gate.acquire(AdmissionPolicy::Wait(Duration::from_millis(50)));
        assert_eq!(res.unwrap_err(), GateError::Saturated);
        assert!(started.elapsed() < Duration::from_secs(2));
    }

    #[test]
    fn close_wakes_a_blocked_acquirer() {
        let gate = ConcurrencyGate::new(1);
        let _held = gate.acquire(AdmissionPolicy::Reject).unwrap();

        let waiter = {
            let gate = Arc::clone(&gate);
            std::thread::spawn(move || gate.acquire(AdmissionPolicy::Block))
        };
        std::thread::sleep(Duration::from_millis(50));
        gate.close();
        let res = waiter.join().unwrap();
        assert_eq!(res.unwrap_err(), GateError::Closed);
    }

    #[test]
    fn blocked_acquirer_gets_the_freed_slot() {
        let gate = ConcurrencyGate::new(1);
        let held = gate.acquire(AdmissionPolicy::Reject).unwrap();

        let waiter = {
            let gate = Arc::clone(&gate);
            std::thread::spawn(move || gate.acquire(AdmissionPolicy::Block))
        };
        std::thread::sleep(Duration::from_millis(50));
        drop(held);
        assert!(waiter.join().unwrap().is_ok());
    }

    #[test]
    fn stale_permits_release_nothing_after_reset() {
        let gate = ConcurrencyGate::new(2);
        let stale = gate.acquire(AdmissionPolicy::Reject).unwrap();
        gate.force_reset();
        assert_eq!(gate.active(), 0);
        drop(stale);
        assert_eq!(gate.active(), 0);
        // Count did not go negative and the gate still works.
        gate.reset_for_start();
        assert!(gate.acquire(AdmissionPolicy::Reject).is_ok());
    }

    #[test]
    fn over_release_poisons_the_gate() {
        let gate = ConcurrencyGate::new(1);
        let epoch = {
            let p = gate.acquire(AdmissionPolicy::Reject).unwrap();
            let epoch = p.epoch;
            drop(p);
            epoch
        };
        // A second release for the same epoch is a bookkeeping violation.
        gate.release(epoch);
        assert_eq!(
            gate.acquire(AdmissionPolicy::Reject).unwrap_err(),
            GateError::Poisoned
        );
        // A fresh incarnation clears the poison.
        gate.reset_for_start();
        assert!(gate.acquire(AdmissionPolicy::Reject).is_ok());
    }

    #[test]
    fn wait_idle_observes_drain_and_timeout() {
        let gate = ConcurrencyGate::new(1);
        assert!(gate.wait_idle(Duration::ZERO));

        let held = gate.acquire(AdmissionPolicy::Reject).unwrap();
        assert!(!gate.wait_idle(Duration::from_millis(30)));

        let waiter = {
            let gate = Arc::clone(&gate);
            std::thread::spawn(move || gate.wait_idle(Duration::from_secs(5)))
        };
        std::thread::sleep(Duration::from_millis(50));
        drop(held);
        assert!(waiter.join().unwrap());
    }
}
