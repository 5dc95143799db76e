//! # Broadcast bus for lifecycle events.
//!
//! [`Bus`] is a thin wrapper around [`tokio::sync::broadcast`] providing
//! non-blocking publishing from multiple sources (submission callers,
//! the substrate, subscriber workers).
//!
//! ## Rules
//! - **Non-blocking publish**: `publish()` never blocks or awaits.
//! - **Bounded**: one ring buffer of recent events shared by all receivers.
//! - **Lag**: a slow receiver observes `RecvError::Lagged(n)` and skips
//!   the `n` oldest items.
//! - **No persistence**: events sent while no receiver exists are dropped.
//!
//! The bus itself has no lifecycle: it outlives substrate restarts, so
//! receivers obtained from [`Scheduler::subscribe`](crate::Scheduler::subscribe)
//! keep observing events across a recovery.

use tokio::sync::broadcast;

use super::event::Event;

/// Broadcast channel for scheduler events.
///
/// Cheap to clone (the sender is internally reference-counted); every
/// receiver gets its own cursor into the shared ring buffer.
#[derive(Clone, Debug)]
pub struct Bus {
    tx: broadcast::Sender<Event>,
}

impl Bus {
    /// Creates a new bus with the given ring-buffer capacity (min 1, clamped).
    pub fn new(capacity: usize) -> Self {
        let (tx, _rx) = broadcast::channel::<Event>(capacity.max(1));
        Self { tx }
    }

    /// Publishes an event to all active receivers.
    ///
    /// Returns immediately; if there are no receivers the event is dropped.
    pub fn publish(&self, ev: Event) {
        let _ = self.tx.send(ev);
    }

    /// Creates a new receiver observing events published after this call.
    pub fn subscribe(&self) -> broadcast::Receiver<Event> {
        self.tx.subscribe()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::events::EventKind;

    #[test]
    fn receiver_sees_events_published_after_subscribe() {
        let bus = Bus::new(8);
        let mut rx = bus.subscribe();
        bus.publish(Event::new(EventKind::SchedulerStarted));
        let ev = rx.try_recv().expect("event buffered");
        assert_eq!(ev.kind, EventKind::SchedulerStarted);
    }

    #[test]
    fn publish_without_receivers_is_a_noop() {
        let bus = Bus::new(8);
        bus.publish(Event::new(EventKind::ShutdownRequested));
    }
}
