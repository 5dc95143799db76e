//! # Scheduler configuration.
//!
//! [`SchedulerConfig`] centralizes the runtime knobs: concurrency
//! capacity, admission behavior at saturation, recovery policy, and the
//! substrate's auxiliary blocking pool.
//!
//! ## Sentinel values
//! - `timeout = 0s` → no default per-task deadline
//! - `capacity` and `bus_capacity` are clamped to a minimum of 1

use std::sync::Arc;
use std::time::Duration;

use crate::policies::{AdmissionPolicy, RestartBackoff, RestartPolicy};

/// Global configuration for a [`Scheduler`](crate::Scheduler).
#[derive(Clone, Debug)]
pub struct SchedulerConfig {
    /// Maximum number of tasks executing simultaneously (min 1, clamped).
    pub capacity: usize,

    /// What `submit` does when `capacity` tasks are already active.
    pub admission: AdmissionPolicy,

    /// Default per-task deadline; `Duration::ZERO` means none.
    /// A submission's own timeout always wins.
    pub timeout: Duration,

    /// Ring-buffer size of the event bus (min 1, clamped). Receivers
    /// lagging further than this skip old events.
    pub bus_capacity: usize,

    /// Whether `submit` lazily restarts a non-running substrate.
    pub restart: RestartPolicy,

    /// Delay floor between consecutive restart attempts.
    pub restart_backoff: RestartBackoff,

    /// Size of the substrate's auxiliary pool for delegated blocking
    /// work. Independent of `capacity`.
    pub blocking_threads: usize,

    /// Host-supplied worker/process identity, attached to every event.
    /// The scheduler never computes one itself.
    pub worker_id: Option<String>,
}

impl SchedulerConfig {
    /// Concurrency capacity, clamped to a minimum of 1.
    #[inline]
    pub fn capacity_clamped(&self) -> usize {
        self.capacity.max(1)
    }

    /// Default deadline as an `Option` (`0s` → `None`).
    #[inline]
    pub fn default_timeout(&self) -> Option<Duration> {
        if self.timeout == Duration::ZERO {
            None
        } else {
            Some(self.timeout)
        }
    }

    /// Bus capacity, clamped to a minimum of 1.
    #[inline]
    pub fn bus_capacity_clamped(&self) -> usize {
        self.bus_capacity.max(1)
    }

    /// Worker identity as a shared string for event tagging.
    #[inline]
    pub(crate) fn worker_tag(&self) -> Option<Arc<str>> {
        self.worker_id.as_deref().map(Arc::from)
    }
}

impl Default for SchedulerConfig {
    /// Defaults:
    /// - `capacity = 4`
    /// - `admission = Block`
    /// - `timeout = 0s` (no deadline)
    /// - `bus_capacity = 1024`
    /// - `restart = Lazy`, backoff base 100ms / factor 2.0 / cap 5s
    /// - `blocking_threads = 4`
    /// - `worker_id = None`
    fn default() -> Self {
        Self {
            capacity: 4,
            admission: AdmissionPolicy::default(),
            timeout: Duration::ZERO,
            bus_capacity: 1024,
            restart: RestartPolicy::default(),
            restart_backoff: RestartBackoff::default(),
            blocking_threads: 4,
            worker_id: None,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn zero_timeout_means_no_deadline() {
        let cfg = SchedulerConfig::default();
        assert!(cfg.default_timeout().is_none());

        let cfg = SchedulerConfig {
            timeout: Duration::from_secs(3),
            ..SchedulerConfig::default()
        };
        assert_eq!(cfg.default_timeout(), Some(Duration::from_secs(3)));
    }

    #[test]
    fn capacities_are_clamped() {
        let cfg = SchedulerConfig {
            capacity: 0,
            bus_capacity: 0,
            ..SchedulerConfig::default()
        };
        assert_eq!(cfg.capacity_clamped(), 1);
        assert_eq!(cfg.bus_capacity_clamped(), 1);
    }
}
