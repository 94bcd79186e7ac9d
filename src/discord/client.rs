//! Gateway trait for the two external collaborators the pacer needs:
//! resolving a recipient into a DM channel, and sending one message.

use async_trait::async_trait;
use std::sync::Mutex;

use crate::discord::types::{DmChannel, SendOutcome, UserId};
use crate::error::{DripError, Result};

/// Abstraction over the Discord side of the world.
///
/// `resolve_recipient` is called exactly once, before the loop starts.
/// `send_dm` performs exactly one attempt with no internal retry; the
/// pacer owns all retry and pacing decisions.
#[async_trait]
pub trait DmGateway: Send + Sync {
    /// Validate the user id and open (or reuse) the DM channel with them.
    async fn resolve_recipient(&self, user: &UserId) -> Result<DmChannel>;

    /// Attempt one send. Expected platform failures come back classified
    /// inside the outcome, never as an `Err`.
    async fn send_dm(&self, channel: &DmChannel, text: &str) -> SendOutcome;
}

/// Scripted gateway for tests.
///
/// Returns pre-loaded outcomes in order and records every text it was
/// asked to send. Once the script is exhausted, further sends succeed.
pub struct MockGateway {
    outcomes: Mutex<Vec<SendOutcome>>,
    sent_texts: Mutex<Vec<String>>,
    resolve_error: Option<String>,
}

impl MockGateway {
    /// Create a mock that plays back `outcomes` front to back.
    pub fn new(outcomes: Vec<SendOutcome>) -> Self {
        Self {
            outcomes: Mutex::new(outcomes),
            sent_texts: Mutex::new(Vec::new()),
            resolve_error: None,
        }
    }

    /// Create a mock whose resolution step fails.
    pub fn failing_resolution(description: impl Into<String>) -> Self {
        Self {
            outcomes: Mutex::new(Vec::new()),
            sent_texts: Mutex::new(Vec::new()),
            resolve_error: Some(description.into()),
        }
    }

    /// Texts passed to `send_dm`, in call order.
    pub fn sent_texts(&self) -> Vec<String> {
        self.sent_texts.lock().unwrap().clone()
    }

    /// Number of send attempts made so far.
    pub fn attempt_count(&self) -> usize {
        self.sent_texts.lock().unwrap().len()
    }
}

#[async_trait]
impl DmGateway for MockGateway {
    async fn resolve_recipient(&self, user: &UserId) -> Result<DmChannel> {
        if let Some(description) = &self.resolve_error {
            return Err(DripError::Resolution(description.clone()));
        }
        Ok(DmChannel::new(format!("dm-{}", user.as_str()), "mock-user"))
    }

    async fn send_dm(&self, _channel: &DmChannel, text: &str) -> SendOutcome {
        self.sent_texts.lock().unwrap().push(text.to_string());
        let mut outcomes = self.outcomes.lock().unwrap();
        if outcomes.is_empty() {
            SendOutcome::sent(format!("mock-msg-{}", self.sent_texts.lock().unwrap().len()))
        } else {
            outcomes.remove(0)
        }
    }
}
