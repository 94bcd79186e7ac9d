//! Pacer - the send/retry/backoff core
//!
//! This module provides:
//! - LoopState counters threaded through each iteration
//! - Backoff multiplier and jittered-wait computation
//! - StopToken for cooperative cancellation
//! - Pacer, the loop itself

pub mod backoff;
pub mod runner;
pub mod state;
pub mod stop;

pub use backoff::{Backoff, MIN_WAIT};
pub use runner::{POLL_GRANULARITY, Pacer, PacerConfig, PacerReport, StopReason};
pub use state::LoopState;
pub use stop::StopToken;
