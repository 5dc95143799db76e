//! # Event subscriber trait.
//!
//! [`Subscribe`] is the extension point for plugging event handlers into
//! the scheduler.
//!
//! Each subscriber gets a dedicated worker and a bounded queue:
//! - A slow subscriber only affects its own queue.
//! - Queue overflow drops the event **for that subscriber only** and
//!   publishes `SubscriberOverflow`.
//! - Panics are caught and published as `SubscriberPanicked`; the worker
//!   keeps processing.
//! - Events arrive in FIFO order per subscriber.

use async_trait::async_trait;

use crate::events::Event;

/// Event subscriber for scheduler observability.
///
/// ### Implementation requirements
/// - Use async I/O; never block the worker.
/// - Handle errors internally; do not panic.
#[async_trait]
pub trait Subscribe: Send + Sync + 'static {
    /// Processes a single event.
    ///
    /// Called from the subscriber's dedicated worker, never from the
    /// publisher's context.
    async fn on_event(&self, event: &Event);

    /// Subscriber name used in overflow/panic events and logs.
    ///
    /// Prefer short, descriptive names ("metrics", "audit"). The default
    /// is `type_name::<Self>()`, which can be verbose.
    fn name(&self) -> &'static str {
        std::any::type_name::<Self>()
    }

    /// Preferred queue capacity for this subscriber (min 1, clamped).
    ///
    /// Default: 1024.
    fn queue_capacity(&self) -> usize {
        1024
    }
}
