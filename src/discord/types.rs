//! Core Discord types shared by the gateway trait and its implementations.

use serde::{Deserialize, Serialize};

/// A Discord user snowflake, kept as the raw string Discord hands out.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct UserId(pub String);

impl UserId {
    pub fn new(id: impl Into<String>) -> Self {
        Self(id.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl std::fmt::Display for UserId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// An open direct-message channel with a specific recipient.
///
/// Obtained once at startup and reused for every send.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DmChannel {
    /// Channel snowflake
    pub channel_id: String,
    /// Display name of the recipient, for logging
    pub recipient_tag: String,
}

impl DmChannel {
    pub fn new(channel_id: impl Into<String>, recipient_tag: impl Into<String>) -> Self {
        Self {
            channel_id: channel_id.into(),
            recipient_tag: recipient_tag.into(),
        }
    }
}

/// Outcome of a single send attempt.
///
/// Expected platform failures are returned classified here, never as an
/// `Err` - retrying is the pacer's job, not the gateway's.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SendOutcome {
    /// Message delivered; Discord assigned it this id
    Sent { message_id: String },
    /// Delivery failed
    Failed {
        /// True when the recipient fundamentally cannot receive DMs
        /// (DMs disabled, bot blocked). Non-fatal covers everything
        /// else: transport errors, 5xx, rate limits.
        fatal: bool,
        description: String,
    },
}

impl SendOutcome {
    pub fn sent(message_id: impl Into<String>) -> Self {
        Self::Sent {
            message_id: message_id.into(),
        }
    }

    pub fn failed(fatal: bool, description: impl Into<String>) -> Self {
        Self::Failed {
            fatal,
            description: description.into(),
        }
    }

    pub fn is_sent(&self) -> bool {
        matches!(self, Self::Sent { .. })
    }

    pub fn is_fatal(&self) -> bool {
        matches!(self, Self::Failed { fatal: true, .. })
    }
}
