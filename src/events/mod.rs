//! Lifecycle events: types and broadcast bus.
//!
//! Groups the event **data model** and the **bus** used to publish and
//! subscribe to events emitted by the scheduler, the runner, and the
//! subscriber workers.
//!
//! ## Contents
//! - [`EventKind`], [`Event`] — classification and payload metadata
//! - [`Bus`] — thin wrapper over `tokio::sync::broadcast`
//!
//! ## Quick reference
//! - **Publishers**: `Scheduler::submit` (admitted/rejected),
//!   `core::runner` (started/terminal), `LifecycleController`
//!   (scheduler/shutdown events), `SubscriberSet` workers
//!   (overflow/panic).
//! - **Consumers**: the fan-out listener feeding [`SubscriberSet`]
//!   (rebuilt per substrate instance), plus any raw receiver from
//!   [`Scheduler::subscribe`](crate::Scheduler::subscribe).
//!
//! [`SubscriberSet`]: crate::subscribers::SubscriberSet

mod bus;
mod event;

pub use bus::Bus;
pub use event::{Event, EventKind};
