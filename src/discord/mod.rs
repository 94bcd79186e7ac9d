//! Discord layer - recipient resolution and message delivery
//!
//! This module provides:
//! - Core types for users, DM channels, and send outcomes
//! - DmGateway trait abstracting the platform
//! - RestGateway implementation against the Discord REST API
//! - MockGateway for tests

pub mod client;
pub mod rest;
pub mod types;

pub use client::{DmGateway, MockGateway};
pub use rest::{RestGateway, RestGatewayConfig};
pub use types::{DmChannel, SendOutcome, UserId};
