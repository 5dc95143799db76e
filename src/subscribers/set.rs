//! # Non-blocking event fan-out to subscribers.
//!
//! [`SubscriberSet`] gives every subscriber a bounded queue and a
//! dedicated worker task on the substrate:
//!
//! ```text
//! emit(event)
//!     ├──► [queue 1] ──► worker 1 ──► subscriber1.on_event()
//!     │    (bounded)         └──────► panic → SubscriberPanicked
//!     ├──► [queue 2] ──► worker 2 ──► subscriber2.on_event()
//!     └──► [queue N] ──► worker N ──► subscriberN.on_event()
//! ```
//!
//! ## Rules
//! - **Non-blocking**: `emit()` uses `try_send` and returns immediately.
//! - **Overflow**: a full or closed queue drops the event for that
//!   subscriber only and publishes `SubscriberOverflow`.
//! - **Isolation**: a slow or panicking subscriber never affects other
//!   subscribers or task execution.
//! - **Per-subscriber FIFO**: each subscriber sees events in order; there
//!   is no cross-subscriber ordering.
//!
//! Workers live on the substrate runtime and end with it; the set is
//! rebuilt for each substrate incarnation. `SubscriberOverflow` events
//! are never re-reported when they themselves overflow.

use std::sync::Arc;

use futures::FutureExt;
use tokio::sync::mpsc;

use crate::events::{Bus, Event, EventKind};
use crate::subscribers::Subscribe;

/// Per-subscriber queue metadata.
struct SubscriberChannel {
    name: &'static str,
    sender: mpsc::Sender<Arc<Event>>,
}

/// Fan-out coordinator for event subscribers.
pub(crate) struct SubscriberSet {
    channels: Vec<SubscriberChannel>,
    bus: Bus,
}

impl SubscriberSet {
    /// Creates the set and spawns one worker per subscriber onto the
    /// given runtime.
    ///
    /// Each worker drains its queue until the queue closes or the
    /// runtime is torn down. Panics inside `on_event` are caught with
    /// `catch_unwind`, reported as `SubscriberPanicked`, and the worker
    /// keeps processing.
    pub(crate) fn spawn(
        subs: Vec<Arc<dyn Subscribe>>,
        bus: Bus,
        handle: &tokio::runtime::Handle,
    ) -> Self {
        let mut channels = Vec::with_capacity(subs.len());

        for sub in subs {
            let name = sub.name();
            let (tx, mut rx) = mpsc::channel::<Arc<Event>>(sub.queue_capacity().max(1));
            let worker_bus = bus.clone();

            handle.spawn(async move {
                while let Some(ev) = rx.recv().await {
                    let fut = sub.on_event(ev.as_ref());
                    if let Err(panic_err) = std::panic::AssertUnwindSafe(fut).catch_unwind().await {
                        worker_bus
                            .publish(Event::subscriber_panicked(sub.name(), panic_info(&*panic_err)));
                    }
                }
            });
            channels.push(SubscriberChannel { name, sender: tx });
        }
        Self { channels, bus }
    }

    /// Emits an event to every subscriber (clones it once).
    pub(crate) fn emit(&self, event: &Event) {
        self.emit_arc(Arc::new(event.clone()));
    }

    /// Emits a pre-allocated event without cloning.
    pub(crate) fn emit_arc(&self, event: Arc<Event>) {
        let is_overflow_evt = matches!(event.kind, EventKind::SubscriberOverflow);

        for channel in &self.channels {
            match channel.sender.try_send(Arc::clone(&event)) {
                Ok(()) => {}
                Err(mpsc::error::TrySendError::Full(_)) => {
                    if !is_overflow_evt {
                        self.bus
                            .publish(Event::subscriber_overflow(channel.name, "full"));
                    }
                }
                Err(mpsc::error::TrySendError::Closed(_)) => {
                    if !is_overflow_evt {
                        self.bus
                            .publish(Event::subscriber_overflow(channel.name, "closed"));
                    }
                }
            }
        }
    }
}

fn panic_info(any: &(dyn std::any::Any + Send)) -> String {
    if let Some(msg) = any.downcast_ref::<&'static str>() {
        (*msg).to_string()
    } else if let Some(msg) = any.downcast_ref::<String>() {
        msg.clone()
    } else {
        "unknown panic".to_string()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::time::Duration;

    use async_trait::async_trait;
    use parking_lot::Mutex;

    struct Recorder {
        seen: Mutex<Vec<u64>>,
    }

    #[async_trait]
    impl Subscribe for Recorder {
        async fn on_event(&self, event: &Event) {
            self.seen.lock().push(event.seq);
        }
        fn name(&self) -> &'static str {
            "recorder"
        }
    }

    struct Panicky;

    #[async_trait]
    impl Subscribe for Panicky {
        async fn on_event(&self, event: &Event) {
            if event.task.as_deref() == Some("bad") {
                panic!("subscriber blew up");
            }
        }
        fn name(&self) -> &'static str {
            "panicky"
        }
    }

    struct Slow;

    #[async_trait]
    impl Subscribe for Slow {
        async fn on_event(&self, _event: &Event) {
            tokio::time::sleep(Duration::from_secs(1)).await;
        }
        fn name(&self) -> &'static str {
            "slow"
        }
        fn queue_capacity(&self) -> usize {
            1
        }
    }

    #[tokio::test]
    async fn events_reach_subscribers_in_order() {
        let bus = Bus::new(16);
        let recorder = Arc::new(Recorder {
            seen: Mutex::new(Vec::new()),
        });
        let set = SubscriberSet::spawn(
            vec![Arc::clone(&recorder) as Arc<dyn Subscribe>],
            bus.clone(),
            &tokio::runtime::Handle::current(),
        );

        let first = Event::new(EventKind::SchedulerStarted);
        let second = Event::new(EventKind::ShutdownRequested);
        let (a, b) = (first.seq, second.seq);
        set.emit(&first);
        set.emit(&second);

        tokio::time::sleep(Duration::from_millis(100)).await;
        assert_eq!(*recorder.seen.lock(), vec![a, b]);
    }

    #[tokio::test]
    async fn a_panicking_subscriber_is_reported_and_keeps_running() {
        let bus = Bus::new(16);
        let mut rx = bus.subscribe();
        let recorder = Arc::new(Recorder {
            seen: Mutex::new(Vec::new()),
        });
        let set = SubscriberSet::spawn(
            vec![
                Arc::new(Panicky) as Arc<dyn Subscribe>,
                Arc::clone(&recorder) as Arc<dyn Subscribe>,
            ],
            bus.clone(),
            &tokio::runtime::Handle::current(),
        );

        set.emit(&Event::new(EventKind::TaskStarted).with_task("bad"));
        set.emit(&Event::new(EventKind::TaskStarted).with_task("fine"));
        tokio::time::sleep(Duration::from_millis(100)).await;

        // The panic was reported on the bus...
        let mut reported = false;
        while let Ok(ev) = rx.try_recv() {
            if ev.kind == EventKind::SubscriberPanicked && ev.task.as_deref() == Some("panicky") {
                reported = true;
            }
        }
        assert!(reported);
        // ...and the other subscriber saw both events.
        assert_eq!(recorder.seen.lock().len(), 2);
    }

    #[tokio::test]
    async fn overflow_is_reported_and_emit_never_blocks() {
        let bus = Bus::new(64);
        let mut rx = bus.subscribe();
        let set = SubscriberSet::spawn(
            vec![Arc::new(Slow) as Arc<dyn Subscribe>],
            bus.clone(),
            &tokio::runtime::Handle::current(),
        );

        for _ in 0..8 {
            set.emit(&Event::new(EventKind::TaskStarted).with_task("burst"));
        }

        let mut overflows = 0;
        while let Ok(ev) = rx.try_recv() {
            if ev.kind == EventKind::SubscriberOverflow {
                overflows += 1;
            }
        }
        assert!(overflows >= 1);
    }
}
