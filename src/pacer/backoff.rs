//! Exponential backoff with jitter.
//!
//! Every attempt is followed by a wait. On a clean streak the wait is the
//! base delay; each consecutive non-fatal failure doubles it, capped at
//! 16x, with a small random jitter so synchronized retry storms cannot
//! form. There is deliberately no maximum streak length - the policy is
//! to keep retrying indefinitely at a capped rate.

use std::time::Duration;

use rand::Rng;

/// Hard floor on any computed wait.
pub const MIN_WAIT: Duration = Duration::from_millis(50);

/// Cap on the exponent, giving a maximum multiplier of 2^4 = 16.
const MAX_EXPONENT: u32 = 4;

/// Jitter spread: ±5% of the pre-jitter wait.
const JITTER_FACTOR: f64 = 0.1;

/// A computed backoff step: how long to wait and the multiplier that
/// produced it (kept for logging).
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Backoff {
    pub multiplier: u32,
    pub wait: Duration,
}

/// Backoff multiplier for a given consecutive-error streak.
///
/// 1 on a clean streak, then 1, 2, 4, 8, 16 and flat at 16 from the
/// fifth consecutive error on.
pub fn multiplier(consecutive_errors: u32) -> u32 {
    if consecutive_errors == 0 {
        return 1;
    }
    let exponent = consecutive_errors.saturating_sub(1).min(MAX_EXPONENT);
    2_u32.pow(exponent)
}

/// Compute the wait before the next attempt.
///
/// `wait = base * multiplier`, then jittered by ±5% and floor-clamped
/// to [`MIN_WAIT`]. The rng is injected so tests can pin it down.
pub fn compute<R: Rng>(base: Duration, consecutive_errors: u32, rng: &mut R) -> Backoff {
    let multiplier = multiplier(consecutive_errors);
    let wait_ms = base.as_millis() as u64 * multiplier as u64;

    let jitter_ms = (wait_ms as f64 * JITTER_FACTOR * (rng.random::<f64>() - 0.5)).round() as i64;
    let jittered_ms = (wait_ms as i64 + jitter_ms).max(MIN_WAIT.as_millis() as i64) as u64;

    Backoff {
        multiplier,
        wait: Duration::from_millis(jittered_ms),
    }
}
