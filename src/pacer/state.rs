//! Loop state owned by the pacer.
//!
//! Explicit state threaded through the loop, never module globals:
//! the single-owner invariant is in the types, not a convention.

/// Counters the pacer updates after every attempt.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct LoopState {
    /// Successful sends so far. Monotonically increasing.
    pub sent_count: u64,
    /// Consecutive non-fatal failures since the last success.
    pub consecutive_errors: u32,
}

impl LoopState {
    pub fn new() -> Self {
        Self::default()
    }

    /// Record a successful send: count it and clear the error streak.
    pub fn record_success(&mut self) {
        self.sent_count += 1;
        self.consecutive_errors = 0;
    }

    /// Record a non-fatal failure: extend the error streak.
    pub fn record_failure(&mut self) {
        self.consecutive_errors += 1;
    }

    /// 1-based sequence number for the next attempt's message text.
    pub fn next_sequence(&self) -> u64 {
        self.sent_count + 1
    }

    /// True once the configured limit has been met. `None` means unlimited.
    pub fn limit_reached(&self, max_count: Option<u64>) -> bool {
        match max_count {
            Some(max) => self.sent_count >= max,
            None => false,
        }
    }
}
