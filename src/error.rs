//! Error types for dmdrip
//!
//! Centralized error handling using thiserror.

use thiserror::Error;

/// All error types that can occur in dmdrip
#[derive(Debug, Error)]
pub enum DripError {
    /// Missing or invalid startup configuration
    #[error("Config error: {0}")]
    Config(String),

    /// Target recipient could not be resolved into a DM channel
    #[error("Resolution error: {0}")]
    Resolution(String),

    /// Discord API error outside the send path
    #[error("Discord error: {0}")]
    Discord(String),

    /// IO error
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    /// JSON serialization/deserialization error
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),
}

/// Result type alias for dmdrip operations
pub type Result<T> = std::result::Result<T, DripError>;
