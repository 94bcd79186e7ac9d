//! Cooperative stop token.
//!
//! The operator's interrupt handler trips the token; the pacer polls it
//! at the top of each backoff step and between sleep increments. One
//! writer, one reader, nothing instantaneous - the loop reacts at its
//! next observation point, within one poll increment.

use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};

/// Shared cancellation flag handed to both the signal handler side and
/// the pacer. Trips exactly once; never resets.
#[derive(Debug, Clone, Default)]
pub struct StopToken {
    stopped: Arc<AtomicBool>,
}

impl StopToken {
    pub fn new() -> Self {
        Self::default()
    }

    /// Request a stop. Idempotent; returns true only on the first trip.
    pub fn trigger(&self) -> bool {
        !self.stopped.swap(true, Ordering::SeqCst)
    }

    /// Has a stop been requested?
    pub fn is_stopped(&self) -> bool {
        self.stopped.load(Ordering::SeqCst)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_starts_untripped() {
        let token = StopToken::new();
        assert!(!token.is_stopped());
    }

    #[test]
    fn test_trigger_trips_once() {
        let token = StopToken::new();
        assert!(token.trigger());
        assert!(token.is_stopped());
        // Second trigger is a no-op
        assert!(!token.trigger());
        assert!(token.is_stopped());
    }

    #[test]
    fn test_clones_share_state() {
        let token = StopToken::new();
        let handle = token.clone();
        handle.trigger();
        assert!(token.is_stopped());
    }
}
