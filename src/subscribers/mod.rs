//! # Event subscribers.
//!
//! The observer seam: the scheduler emits [`Event`](crate::Event)s,
//! subscribers consume them. Delivery is fire-and-forget from the
//! scheduler's perspective — a slow, overflowing, or panicking
//! subscriber never affects task execution or other subscribers.
//!
//! ## Architecture
//! ```text
//! submit / runner / lifecycle ── publish(Event) ──► Bus
//!                                                    │
//!                                        fan-out listener (on substrate)
//!                                                    │
//!                                  ┌─────────────────┼─────────────────┐
//!                                  ▼                 ▼                 ▼
//!                            [queue sub1]      [queue sub2]      [queue subN]
//!                                  │                 │                 │
//!                             worker sub1       worker sub2       worker subN
//!                                  ▼                 ▼                 ▼
//!                            on_event(&ev)     on_event(&ev)     on_event(&ev)
//! ```
//!
//! - **Passive subscribers** observe and react (logging, metrics, alerts).
//! - Fan-out workers run on the substrate and are rebuilt when it
//!   restarts; raw [`Scheduler::subscribe`](crate::Scheduler::subscribe)
//!   receivers are independent of the substrate and survive restarts.

mod log;
mod set;
mod subscribe;

pub use log::LogWriter;
pub use subscribe::Subscribe;

pub(crate) use set::SubscriberSet;
