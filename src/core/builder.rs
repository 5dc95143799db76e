//! # Scheduler construction.
//!
//! [`SchedulerBuilder`] wires the scheduler's parts — event bus,
//! concurrency gate, in-flight registry, lifecycle controller — and
//! returns the assembled [`Scheduler`] behind an `Arc`.
//!
//! There is no global instance and no ambient lookup: whoever calls
//! `build()` owns the scheduler and passes the handle to anyone who
//! needs to submit work.
//!
//! `build()` does not boot the substrate. Call
//! [`Scheduler::start`](crate::Scheduler::start) for an eager boot, or
//! just submit: under the default [`Lazy`](crate::RestartPolicy::Lazy)
//! restart policy the first submission brings the substrate up.

use std::sync::Arc;

use crate::core::config::SchedulerConfig;
use crate::core::gate::ConcurrencyGate;
use crate::core::lifecycle::LifecycleController;
use crate::core::registry::InflightRegistry;
use crate::core::scheduler::Scheduler;
use crate::events::Bus;
use crate::subscribers::Subscribe;

/// Builder for a [`Scheduler`].
pub struct SchedulerBuilder {
    cfg: SchedulerConfig,
    subscribers: Vec<Arc<dyn Subscribe>>,
}

impl SchedulerBuilder {
    /// Creates a builder with the given configuration.
    pub fn new(cfg: SchedulerConfig) -> Self {
        Self {
            cfg,
            subscribers: Vec::new(),
        }
    }

    /// Replaces the subscriber list.
    ///
    /// Subscribers receive lifecycle and completion events through
    /// dedicated workers with bounded queues; see
    /// [`Subscribe`](crate::Subscribe).
    pub fn with_subscribers(mut self, subscribers: Vec<Arc<dyn Subscribe>>) -> Self {
        self.subscribers = subscribers;
        self
    }

    /// Appends one subscriber.
    pub fn with_subscriber(mut self, subscriber: Arc<dyn Subscribe>) -> Self {
        self.subscribers.push(subscriber);
        self
    }

    /// Assembles the scheduler.
    pub fn build(self) -> Arc<Scheduler> {
        let bus = Bus::new(self.cfg.bus_capacity_clamped());
        let gate = ConcurrencyGate::new(self.cfg.capacity_clamped());
        let registry = InflightRegistry::new();
        let lifecycle = LifecycleController::new(
            self.cfg.clone(),
            bus.clone(),
            Arc::clone(&gate),
            Arc::clone(&registry),
            self.subscribers,
        );

        Arc::new(Scheduler::new_internal(
            self.cfg, bus, gate, registry, lifecycle,
        ))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::lifecycle::Phase;

    #[test]
    fn built_scheduler_is_stopped_until_started() {
        let sched = SchedulerBuilder::new(SchedulerConfig {
            capacity: 0,
            ..SchedulerConfig::default()
        })
        .build();

        assert_eq!(sched.phase(), Phase::Stopped);
        let status = sched.status();
        assert_eq!(status.capacity, 1);
        assert_eq!(status.active, 0);
    }
}
