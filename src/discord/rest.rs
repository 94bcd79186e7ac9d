//! Discord REST API gateway implementation
//!
//! This module implements the DmGateway trait against the Discord REST API.

use std::time::Duration;

use async_trait::async_trait;
use reqwest::Client;
use serde_json::{Value, json};

use crate::discord::client::DmGateway;
use crate::discord::types::{DmChannel, SendOutcome, UserId};
use crate::error::{DripError, Result};

/// Discord REST API base URL
const DISCORD_API_URL: &str = "https://discord.com/api/v10";

/// JSON error code Discord returns when the recipient cannot be DMed
const CANNOT_MESSAGE_USER: i64 = 50007;

/// Default per-request timeout
const DEFAULT_TIMEOUT: Duration = Duration::from_secs(30);

/// Configuration for the REST gateway
#[derive(Debug, Clone)]
pub struct RestGatewayConfig {
    pub timeout: Duration,
    pub api_url: String,
}

impl Default for RestGatewayConfig {
    fn default() -> Self {
        Self {
            timeout: DEFAULT_TIMEOUT,
            api_url: DISCORD_API_URL.to_string(),
        }
    }
}

/// Discord REST API client
pub struct RestGateway {
    client: Client,
    token: String,
    config: RestGatewayConfig,
}

impl RestGateway {
    /// Create a new gateway with a bot token
    pub fn new(token: String, config: RestGatewayConfig) -> Result<Self> {
        let client = Client::builder()
            .timeout(config.timeout)
            .build()
            .map_err(|e| DripError::Discord(format!("Failed to create HTTP client: {}", e)))?;

        Ok(Self {
            client,
            token,
            config,
        })
    }

    fn auth_header(&self) -> String {
        format!("Bot {}", self.token)
    }

    /// Fetch the identity of the authenticated bot, for the startup banner
    pub async fn current_user_tag(&self) -> Result<String> {
        let url = format!("{}/users/@me", self.config.api_url);
        let body = self.get_json(&url).await?;
        Ok(display_tag(&body))
    }

    async fn get_json(&self, url: &str) -> Result<Value> {
        let response = self
            .client
            .get(url)
            .header("Authorization", self.auth_header())
            .send()
            .await
            .map_err(|e| DripError::Discord(format!("Request failed: {}", e)))?;

        let status = response.status();
        if !status.is_success() {
            let error_body = response
                .text()
                .await
                .unwrap_or_else(|_| "Unknown error".to_string());
            return Err(DripError::Discord(format!(
                "API error {}: {}",
                status, error_body
            )));
        }

        response
            .json()
            .await
            .map_err(|e| DripError::Discord(format!("Failed to parse response: {}", e)))
    }

    async fn post_json(&self, url: &str, body: Value) -> Result<Value> {
        let response = self
            .client
            .post(url)
            .header("Authorization", self.auth_header())
            .header("content-type", "application/json")
            .json(&body)
            .send()
            .await
            .map_err(|e| DripError::Discord(format!("Request failed: {}", e)))?;

        let status = response.status();
        if !status.is_success() {
            let error_body = response
                .text()
                .await
                .unwrap_or_else(|_| "Unknown error".to_string());
            return Err(DripError::Discord(format!(
                "API error {}: {}",
                status, error_body
            )));
        }

        response
            .json()
            .await
            .map_err(|e| DripError::Discord(format!("Failed to parse response: {}", e)))
    }
}

/// Username#discriminator when the legacy discriminator is present,
/// plain username otherwise.
fn display_tag(user: &Value) -> String {
    let name = user["username"].as_str().unwrap_or("unknown");
    match user["discriminator"].as_str() {
        Some(d) if d != "0" => format!("{}#{}", name, d),
        _ => name.to_string(),
    }
}

/// Classify one failed send into the outcome the pacer acts on.
///
/// Error code 50007 (or its message text) means the recipient cannot be
/// DMed at all - DMs disabled or the bot is blocked - so retrying is
/// pointless. Everything else is treated as transient.
fn classify_failure(status: reqwest::StatusCode, error_body: &str) -> SendOutcome {
    let (code, message) = match serde_json::from_str::<Value>(error_body) {
        Ok(v) => (
            v["code"].as_i64(),
            v["message"].as_str().unwrap_or(error_body).to_string(),
        ),
        Err(_) => (None, error_body.to_string()),
    };

    let fatal = code == Some(CANNOT_MESSAGE_USER)
        || message.contains("Cannot send messages to this user")
        || message.contains("Cannot send messages to this recipient");

    SendOutcome::failed(fatal, format!("API error {}: {}", status, message))
}

#[async_trait]
impl DmGateway for RestGateway {
    async fn resolve_recipient(&self, user: &UserId) -> Result<DmChannel> {
        // Fetch the user first so a bad id fails with something readable
        let user_url = format!("{}/users/{}", self.config.api_url, user.as_str());
        let user_body = self
            .get_json(&user_url)
            .await
            .map_err(|e| DripError::Resolution(format!("failed to fetch user {}: {}", user, e)))?;
        let tag = display_tag(&user_body);

        let dm_url = format!("{}/users/@me/channels", self.config.api_url);
        let dm_body = self
            .post_json(&dm_url, json!({ "recipient_id": user.as_str() }))
            .await
            .map_err(|e| {
                DripError::Resolution(format!("failed to open DM with {}: {}", tag, e))
            })?;

        let channel_id = dm_body["id"]
            .as_str()
            .ok_or_else(|| DripError::Resolution("DM channel response missing id".to_string()))?
            .to_string();

        Ok(DmChannel::new(channel_id, tag))
    }

    async fn send_dm(&self, channel: &DmChannel, text: &str) -> SendOutcome {
        let url = format!(
            "{}/channels/{}/messages",
            self.config.api_url, channel.channel_id
        );

        let response = match self
            .client
            .post(&url)
            .header("Authorization", self.auth_header())
            .header("content-type", "application/json")
            .json(&json!({ "content": text }))
            .send()
            .await
        {
            Ok(r) => r,
            // Transport errors are always worth retrying
            Err(e) => return SendOutcome::failed(false, format!("request failed: {}", e)),
        };

        let status = response.status();
        if !status.is_success() {
            let error_body = response
                .text()
                .await
                .unwrap_or_else(|_| "Unknown error".to_string());
            return classify_failure(status, &error_body);
        }

        match response.json::<Value>().await {
            Ok(body) => match body["id"].as_str() {
                Some(id) => SendOutcome::sent(id),
                None => SendOutcome::failed(false, "message response missing id".to_string()),
            },
            Err(e) => SendOutcome::failed(false, format!("failed to parse response: {}", e)),
        }
    }
}

impl std::fmt::Debug for RestGateway {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("RestGateway")
            .field("api_url", &self.config.api_url)
            .field("timeout", &self.config.timeout)
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_config_default() {
        let config = RestGatewayConfig::default();
        assert_eq!(config.timeout, DEFAULT_TIMEOUT);
        assert_eq!(config.api_url, DISCORD_API_URL);
    }

    #[test]
    fn test_gateway_creation() {
        let gateway = RestGateway::new("test-token".to_string(), RestGatewayConfig::default());
        assert!(gateway.is_ok());
    }

    #[test]
    fn test_display_tag_legacy_discriminator() {
        let user = json!({ "username": "somebody", "discriminator": "0420" });
        assert_eq!(display_tag(&user), "somebody#0420");
    }

    #[test]
    fn test_display_tag_modern_username() {
        let user = json!({ "username": "somebody", "discriminator": "0" });
        assert_eq!(display_tag(&user), "somebody");
    }

    #[test]
    fn test_classify_failure_fatal_by_code() {
        let body = r#"{"message": "Cannot send messages to this user", "code": 50007}"#;
        let outcome = classify_failure(reqwest::StatusCode::FORBIDDEN, body);
        assert!(outcome.is_fatal());
    }

    #[test]
    fn test_classify_failure_fatal_by_message() {
        let body = r#"{"message": "Cannot send messages to this recipient", "code": 0}"#;
        let outcome = classify_failure(reqwest::StatusCode::FORBIDDEN, body);
        assert!(outcome.is_fatal());
    }

    #[test]
    fn test_classify_failure_rate_limit_is_transient() {
        let body = r#"{"message": "You are being rate limited.", "code": 0}"#;
        let outcome = classify_failure(reqwest::StatusCode::TOO_MANY_REQUESTS, body);
        assert!(!outcome.is_fatal());
        assert!(!outcome.is_sent());
    }

    #[test]
    fn test_classify_failure_unparseable_body() {
        let outcome = classify_failure(reqwest::StatusCode::BAD_GATEWAY, "<html>oops</html>");
        assert!(!outcome.is_fatal());
    }
}
