//! Pacer - the send/retry/backoff control loop.
//!
//! Each iteration:
//! 1. Stops if the configured send limit has been reached
//! 2. Attempts one send with a 1-based sequence marker in the text
//! 3. Classifies the outcome (success / fatal / transient)
//! 4. Checks the stop token
//! 5. Computes a jittered backoff wait from the error streak
//! 6. Sleeps in small increments, re-checking the stop token each one
//!
//! A fatal outcome or a tripped stop token ends the loop without any
//! wait. Transient failures never end it - they only feed the backoff.

use std::sync::Arc;
use std::time::Duration;

use log::{error, info, warn};

use crate::discord::{DmGateway, SendOutcome, UserId};
use crate::error::Result;
use crate::pacer::backoff;
use crate::pacer::state::LoopState;
use crate::pacer::stop::StopToken;

/// Fixed granularity of stop-token polling inside a wait.
pub const POLL_GRANULARITY: Duration = Duration::from_millis(500);

/// Why the loop ended.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum StopReason {
    /// Configured max send count reached
    LimitReached,
    /// Operator requested shutdown
    Stopped,
    /// Fatal send failure - the recipient cannot receive DMs
    RecipientUnreachable(String),
}

/// Final accounting handed back to the caller.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PacerReport {
    pub reason: StopReason,
    pub sent: u64,
}

/// Configuration for one pacer run.
#[derive(Debug, Clone)]
pub struct PacerConfig {
    /// Base delay between sends. Clamped to at least 50 ms.
    pub base_delay: Duration,
    /// Maximum successful sends; `None` means unlimited.
    pub max_count: Option<u64>,
    /// Literal message text; the sequence marker is appended per attempt.
    pub message_text: String,
}

impl Default for PacerConfig {
    fn default() -> Self {
        Self {
            base_delay: Duration::from_millis(2000),
            max_count: None,
            message_text: format!("Test DM at {}", chrono::Utc::now().to_rfc3339()),
        }
    }
}

/// Drives the attempt/backoff/termination cycle against one recipient.
pub struct Pacer<G: DmGateway> {
    gateway: Arc<G>,
    config: PacerConfig,
    stop: StopToken,
}

impl<G: DmGateway> Pacer<G> {
    pub fn new(gateway: Arc<G>, config: PacerConfig, stop: StopToken) -> Self {
        let config = PacerConfig {
            base_delay: config.base_delay.max(backoff::MIN_WAIT),
            ..config
        };
        Self {
            gateway,
            config,
            stop,
        }
    }

    /// Resolve the recipient once, then run the loop to a terminal state.
    ///
    /// Errors escape only from resolution; everything the running loop
    /// encounters is absorbed into the state machine.
    pub async fn run(&self, target: &UserId) -> Result<PacerReport> {
        let channel = self.gateway.resolve_recipient(target).await?;
        info!(
            "Resolved {} -> DM channel {} ({})",
            target, channel.channel_id, channel.recipient_tag
        );

        let mut state = LoopState::new();

        let reason = loop {
            if state.limit_reached(self.config.max_count) {
                info!("Reached max count ({}). Exiting loop.", state.sent_count);
                break StopReason::LimitReached;
            }

            let text = format!("{} (#{})", self.config.message_text, state.next_sequence());
            match self.gateway.send_dm(&channel, &text).await {
                SendOutcome::Sent { message_id } => {
                    state.record_success();
                    info!("Sent DM #{} - id: {}", state.sent_count, message_id);
                }
                SendOutcome::Failed {
                    fatal: true,
                    description,
                } => {
                    error!("Cannot DM {}: {}. Exiting.", channel.recipient_tag, description);
                    break StopReason::RecipientUnreachable(description);
                }
                SendOutcome::Failed {
                    fatal: false,
                    description,
                } => {
                    state.record_failure();
                    warn!(
                        "DM failed (attempt {}): {}",
                        state.consecutive_errors, description
                    );
                }
            }

            if self.stop.is_stopped() {
                break StopReason::Stopped;
            }

            // A success that just hit the limit goes straight to the
            // terminal state; the wait would be pointless.
            if state.limit_reached(self.config.max_count) {
                info!("Reached max count ({}). Exiting loop.", state.sent_count);
                break StopReason::LimitReached;
            }

            let step = backoff::compute(
                self.config.base_delay,
                state.consecutive_errors,
                &mut rand::rng(),
            );
            info!(
                "Waiting {} ms before next DM (backoff x{}).",
                step.wait.as_millis(),
                step.multiplier
            );

            if !self.interruptible_wait(step.wait).await {
                break StopReason::Stopped;
            }
        };

        info!("Stopped. Sent {} DMs total.", state.sent_count);
        Ok(PacerReport {
            reason,
            sent: state.sent_count,
        })
    }

    /// Sleep for `wait`, in increments no larger than [`POLL_GRANULARITY`],
    /// re-checking the stop token each increment. Returns false if the
    /// token tripped before the wait elapsed.
    async fn interruptible_wait(&self, wait: Duration) -> bool {
        let mut waited = Duration::ZERO;
        while waited < wait {
            if self.stop.is_stopped() {
                return false;
            }
            let step = POLL_GRANULARITY.min(wait - waited);
            tokio::time::sleep(step).await;
            waited += step;
        }
        !self.stop.is_stopped()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::discord::MockGateway;
    use crate::error::DripError;

    fn config(base_ms: u64, max_count: Option<u64>, text: &str) -> PacerConfig {
        PacerConfig {
            base_delay: Duration::from_millis(base_ms),
            max_count,
            message_text: text.to_string(),
        }
    }

    #[tokio::test(start_paused = true)]
    async fn test_limit_reached_after_three_sends() {
        let gateway = Arc::new(MockGateway::new(vec![]));
        let pacer = Pacer::new(gateway.clone(), config(2000, Some(3), "hello"), StopToken::new());

        let report = pacer.run(&UserId::new("42")).await.unwrap();

        assert_eq!(report.reason, StopReason::LimitReached);
        assert_eq!(report.sent, 3);
        assert_eq!(
            gateway.sent_texts(),
            vec!["hello (#1)", "hello (#2)", "hello (#3)"]
        );
    }

    #[tokio::test(start_paused = true)]
    async fn test_no_wait_after_final_send() {
        let gateway = Arc::new(MockGateway::new(vec![]));
        let pacer = Pacer::new(gateway.clone(), config(2000, Some(3), "hello"), StopToken::new());

        let started = tokio::time::Instant::now();
        pacer.run(&UserId::new("42")).await.unwrap();
        let elapsed = started.elapsed();

        // Two waits (after #1 and #2) at multiplier 1, none after #3
        let upper = Duration::from_millis(2 * (2000 + 100));
        assert!(elapsed <= upper, "elapsed {:?} includes a third wait", elapsed);
        assert!(elapsed >= Duration::from_millis(2 * (2000 - 100)));
    }

    #[tokio::test(start_paused = true)]
    async fn test_fatal_failure_exits_immediately() {
        let gateway = Arc::new(MockGateway::new(vec![SendOutcome::failed(
            true,
            "Cannot send messages to this user",
        )]));
        let pacer = Pacer::new(gateway.clone(), config(2000, None, "hello"), StopToken::new());

        let started = tokio::time::Instant::now();
        let report = pacer.run(&UserId::new("42")).await.unwrap();

        assert_eq!(report.sent, 0);
        assert!(matches!(report.reason, StopReason::RecipientUnreachable(_)));
        assert_eq!(gateway.attempt_count(), 1);
        assert_eq!(started.elapsed(), Duration::ZERO);
    }

    #[tokio::test(start_paused = true)]
    async fn test_transient_failures_back_off_then_recover() {
        let gateway = Arc::new(MockGateway::new(vec![
            SendOutcome::failed(false, "gateway timeout"),
            SendOutcome::failed(false, "gateway timeout"),
            SendOutcome::failed(false, "gateway timeout"),
            SendOutcome::sent("m-1"),
        ]));
        let pacer = Pacer::new(gateway.clone(), config(1000, Some(1), "hello"), StopToken::new());

        let started = tokio::time::Instant::now();
        let report = pacer.run(&UserId::new("42")).await.unwrap();
        let elapsed = started.elapsed();

        assert_eq!(report.reason, StopReason::LimitReached);
        assert_eq!(report.sent, 1);
        assert_eq!(gateway.attempt_count(), 4);
        // Failed attempts keep trying with the same sequence number
        assert_eq!(
            gateway.sent_texts(),
            vec!["hello (#1)", "hello (#1)", "hello (#1)", "hello (#1)"]
        );

        // Waits at multipliers 1, 2, 4; no wait after the limiting success
        let expected = 1000 + 2000 + 4000;
        let slack = (expected as f64 * 0.05) as u64 + 3;
        assert!(elapsed >= Duration::from_millis(expected - slack));
        assert!(elapsed <= Duration::from_millis(expected + slack));
    }

    #[tokio::test(start_paused = true)]
    async fn test_indefinite_retry_has_no_streak_cutoff() {
        let mut script: Vec<SendOutcome> = (0..30)
            .map(|_| SendOutcome::failed(false, "still down"))
            .collect();
        script.push(SendOutcome::sent("m-1"));

        let gateway = Arc::new(MockGateway::new(script));
        let pacer = Pacer::new(gateway.clone(), config(50, Some(1), "hello"), StopToken::new());

        let report = pacer.run(&UserId::new("42")).await.unwrap();
        assert_eq!(report.reason, StopReason::LimitReached);
        assert_eq!(gateway.attempt_count(), 31);
    }

    #[tokio::test(start_paused = true)]
    async fn test_stop_during_wait_exits_within_poll_granularity() {
        let gateway = Arc::new(MockGateway::new(vec![]));
        let stop = StopToken::new();
        let pacer = Pacer::new(gateway.clone(), config(60_000, None, "hello"), stop.clone());

        let handle = tokio::spawn(async move { pacer.run(&UserId::new("42")).await });

        // Let the first send happen and the long wait begin, then stop
        let trip = tokio::spawn({
            let stop = stop.clone();
            async move {
                tokio::time::sleep(Duration::from_millis(1000)).await;
                stop.trigger();
            }
        });

        let started = tokio::time::Instant::now();
        let report = handle.await.unwrap().unwrap();
        trip.await.unwrap();

        assert_eq!(report.reason, StopReason::Stopped);
        assert_eq!(report.sent, 1);
        assert_eq!(gateway.attempt_count(), 1);
        // Observed at the next poll increment, not after the full minute
        assert!(started.elapsed() <= Duration::from_millis(1500));
    }

    #[tokio::test(start_paused = true)]
    async fn test_stop_before_wait_skips_backoff() {
        let gateway = Arc::new(MockGateway::new(vec![]));
        let stop = StopToken::new();
        stop.trigger();
        let pacer = Pacer::new(gateway.clone(), config(60_000, None, "hello"), stop);

        let started = tokio::time::Instant::now();
        let report = pacer.run(&UserId::new("42")).await.unwrap();

        assert_eq!(report.reason, StopReason::Stopped);
        assert_eq!(report.sent, 1);
        assert_eq!(started.elapsed(), Duration::ZERO);
    }

    #[tokio::test(start_paused = true)]
    async fn test_resolution_failure_never_starts_loop() {
        let gateway = Arc::new(MockGateway::failing_resolution("unknown user 42"));
        let pacer = Pacer::new(gateway.clone(), config(2000, None, "hello"), StopToken::new());

        let result = pacer.run(&UserId::new("42")).await;
        assert!(matches!(result, Err(DripError::Resolution(_))));
        assert_eq!(gateway.attempt_count(), 0);
    }

    #[tokio::test(start_paused = true)]
    async fn test_base_delay_clamped_to_minimum() {
        let gateway = Arc::new(MockGateway::new(vec![]));
        let pacer = Pacer::new(gateway, config(1, None, "hello"), StopToken::new());
        assert_eq!(pacer.config.base_delay, backoff::MIN_WAIT);
    }

    #[tokio::test(start_paused = true)]
    async fn test_zero_limit_sends_nothing() {
        let gateway = Arc::new(MockGateway::new(vec![]));
        let pacer = Pacer::new(gateway.clone(), config(2000, Some(0), "hello"), StopToken::new());

        let report = pacer.run(&UserId::new("42")).await.unwrap();
        assert_eq!(report.reason, StopReason::LimitReached);
        assert_eq!(report.sent, 0);
        assert_eq!(gateway.attempt_count(), 0);
    }
}
