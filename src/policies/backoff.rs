//! # Backoff between substrate restart attempts.
//!
//! [`RestartBackoff`] controls the delay floor between consecutive
//! restart attempts of a failed substrate, preventing tight restart
//! loops under sustained failure. The delay for attempt `n` is
//! `base × factor^n`, clamped to `cap`, with [`Jitter`] applied last.
//!
//! The base delay is derived purely from the attempt number, so jitter
//! output never feeds back into later delays.
//!
//! # Example
//! ```rust
//! use std::time::Duration;
//! use taskloom::{Jitter, RestartBackoff};
//!
//! let backoff = RestartBackoff {
//!     base: Duration::from_millis(100),
//!     cap: Duration::from_secs(5),
//!     factor: 2.0,
//!     jitter: Jitter::None,
//! };
//!
//! assert_eq!(backoff.delay_for(0), Duration::from_millis(100));
//! assert_eq!(backoff.delay_for(1), Duration::from_millis(200));
//! // 100ms × 2^10 overshoots the cap
//! assert_eq!(backoff.delay_for(10), Duration::from_secs(5));
//! ```

use std::time::Duration;

use rand::Rng;

/// Randomization applied to a restart delay.
///
/// When several worker processes hit the same broken dependency, their
/// schedulers fail and restart together; jitter spreads the retries.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub enum Jitter {
    /// Use the exact computed delay (default; predictable, test-friendly).
    #[default]
    None,

    /// Random delay in `[0, computed]`.
    Full,

    /// `computed/2 + random[0, computed/2]`; keeps at least half the floor.
    Equal,
}

impl Jitter {
    /// Applies this jitter to `delay`.
    pub fn apply(&self, delay: Duration) -> Duration {
        let ms = delay.as_millis().min(u128::from(u64::MAX)) as u64;
        if ms == 0 {
            return Duration::ZERO;
        }
        match self {
            Jitter::None => delay,
            Jitter::Full => Duration::from_millis(rand::rng().random_range(0..=ms)),
            Jitter::Equal => {
                let half = ms / 2;
                let spread = if half == 0 {
                    0
                } else {
                    rand::rng().random_range(0..=half)
                };
                Duration::from_millis(half + spread)
            }
        }
    }
}

/// Delay floor between consecutive substrate restart attempts.
#[derive(Clone, Copy, Debug)]
pub struct RestartBackoff {
    /// Delay before the first re-attempt. Minimum restart interval.
    pub base: Duration,
    /// Upper bound on any computed delay.
    pub cap: Duration,
    /// Multiplicative growth per consecutive failed attempt (`>= 1.0` recommended).
    pub factor: f64,
    /// Randomization applied to the clamped delay.
    pub jitter: Jitter,
}

impl Default for RestartBackoff {
    /// `base = 100ms`, `factor = 2.0`, `cap = 5s`, no jitter.
    fn default() -> Self {
        Self {
            base: Duration::from_millis(100),
            cap: Duration::from_secs(5),
            factor: 2.0,
            jitter: Jitter::None,
        }
    }
}

impl RestartBackoff {
    /// Computes the delay floor for the given attempt number (0-indexed).
    ///
    /// The base delay is `base × factor^attempt`, clamped to `cap`;
    /// jitter is applied to the clamped value and never fed back.
    pub fn delay_for(&self, attempt: u32) -> Duration {
        let cap_secs = self.cap.as_secs_f64();
        let exp = attempt.min(i32::MAX as u32) as i32;
        let raw_secs = self.base.as_secs_f64() * self.factor.powi(exp);

        let clamped = if !raw_secs.is_finite() || raw_secs < 0.0 || raw_secs > cap_secs {
            self.cap
        } else {
            Duration::from_secs_f64(raw_secs)
        };

        self.jitter.apply(clamped)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn attempt_zero_returns_base() {
        let b = RestartBackoff {
            base: Duration::from_millis(100),
            cap: Duration::from_secs(5),
            factor: 2.0,
            jitter: Jitter::None,
        };
        assert_eq!(b.delay_for(0), Duration::from_millis(100));
    }

    #[test]
    fn exponential_growth_without_jitter() {
        let b = RestartBackoff {
            base: Duration::from_millis(100),
            cap: Duration::from_secs(30),
            factor: 2.0,
            jitter: Jitter::None,
        };
        assert_eq!(b.delay_for(1), Duration::from_millis(200));
        assert_eq!(b.delay_for(2), Duration::from_millis(400));
        assert_eq!(b.delay_for(3), Duration::from_millis(800));
    }

    #[test]
    fn constant_factor_holds_base() {
        let b = RestartBackoff {
            base: Duration::from_millis(250),
            cap: Duration::from_secs(30),
            factor: 1.0,
            jitter: Jitter::None,
        };
        for attempt in 0..8 {
            assert_eq!(b.delay_for(attempt), Duration::from_millis(250));
        }
    }

    #[test]
    fn clamps_to_cap() {
        let b = RestartBackoff {
            base: Duration::from_millis(100),
            cap: Duration::from_secs(1),
            factor: 2.0,
            jitter: Jitter::None,
        };
        assert_eq!(b.delay_for(10), Duration::from_secs(1));
        assert_eq!(b.delay_for(u32::MAX), Duration::from_secs(1));
    }

    #[test]
    fn base_above_cap_is_capped() {
        let b = RestartBackoff {
            base: Duration::from_secs(10),
            cap: Duration::from_secs(2),
            factor: 2.0,
            jitter: Jitter::None,
        };
        assert_eq!(b.delay_for(0), Duration::from_secs(2));
    }

    #[test]
    fn full_jitter_stays_within_base_delay() {
        let b = RestartBackoff {
            base: Duration::from_millis(1000),
            cap: Duration::from_secs(30),
            factor: 1.0,
            jitter: Jitter::Full,
        };
        for _ in 0..50 {
            assert!(b.delay_for(0) <= Duration::from_millis(1000));
        }
    }

    #[test]
    fn equal_jitter_keeps_at_least_half() {
        let b = RestartBackoff {
            base: Duration::from_millis(1000),
            cap: Duration::from_secs(30),
            factor: 1.0,
            jitter: Jitter::Equal,
        };
        for _ in 0..50 {
            let d = b.delay_for(0);
            assert!(d >= Duration::from_millis(500));
            assert!(d <= Duration::from_millis(1000));
        }
    }
}
