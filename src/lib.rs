//! dmdrip - paced delivery of a message to one Discord recipient
//!
//! The core is the pacer: a send/retry/backoff loop that delivers a DM
//! at a controlled rate until a count limit is reached, the recipient
//! turns out to be unreachable, or the operator stops it.

pub mod cli;
pub mod config;
pub mod discord;
pub mod error;
pub mod pacer;

pub use error::{DripError, Result};
