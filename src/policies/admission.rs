//! # Admission policy at full capacity.
//!
//! The concurrency gate bounds how many tasks run at once. When the gate
//! is saturated, the admission policy decides what `submit` does with the
//! excess submission.
//!
//! ## Variants
//! - `Block`: wait on the submitting thread until a slot frees (default).
//! - `Reject`: refuse immediately with a `Rejected` outcome.
//! - `Wait`: wait up to a bound, then refuse.
//!
//! ## Invariants
//! - Waiting happens on the **submitting** thread only, never on the
//!   substrate's run loop.
//! - A blocked submission is woken when shutdown begins; no policy can
//!   block a caller indefinitely across a shutdown.

use std::time::Duration;

/// Policy controlling how a submission is handled when `activeCount == capacity`.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum AdmissionPolicy {
    /// Block the submitting caller until a slot frees.
    ///
    /// Use when:
    /// - Every submission must eventually execute
    /// - Callers can tolerate admission latency
    /// - Example: batch ingestion from a worker queue
    Block,

    /// Refuse immediately; the submission gets a `Rejected` outcome.
    ///
    /// Use when:
    /// - Callers have their own retry/overflow handling
    /// - Bounded submit latency matters more than completeness
    /// - Example: per-request fire-and-forget side effects
    Reject,

    /// Wait up to the given bound for a slot, then refuse.
    ///
    /// Use when:
    /// - Short bursts should smooth out, sustained overload should shed
    /// - Example: webhook fan-out with a latency budget
    Wait(Duration),
}

impl Default for AdmissionPolicy {
    /// Returns [`AdmissionPolicy::Block`].
    fn default() -> Self {
        AdmissionPolicy::Block
    }
}
