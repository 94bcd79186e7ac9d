use eyre::{Context, Result};
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::{Path, PathBuf};
use std::time::Duration;

use crate::cli::Cli;
use crate::discord::UserId;
use crate::error::DripError;
use crate::pacer::PacerConfig;

/// Environment variable holding the bot token
pub const TOKEN_ENV: &str = "DISCORD_TOKEN";

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct Config {
    pub log_level: Option<String>,
    /// Bot token; DISCORD_TOKEN in the environment takes precedence
    pub token: Option<String>,
    /// Target user snowflake
    pub target_user_id: Option<String>,
    /// Base delay between sends in milliseconds (minimum 50)
    pub base_delay_ms: u64,
    /// Maximum successful sends; 0 means unlimited
    pub max_count: u64,
    /// Message text; defaults to a timestamped string at startup
    pub message_text: Option<String>,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            log_level: Some("info".to_string()),
            token: None,
            target_user_id: None,
            base_delay_ms: 2000,
            max_count: 0,
            message_text: None,
        }
    }
}

impl Config {
    /// Load configuration with fallback chain
    pub fn load(config_path: Option<&PathBuf>) -> Result<Self> {
        // If explicit config path provided, try to load it
        if let Some(path) = config_path {
            return Self::load_from_file(path).context(format!("Failed to load config from {}", path.display()));
        }

        // Try primary location: ~/.config/<project>/<project>.yml
        if let Some(config_dir) = dirs::config_dir() {
            let project_name = env!("CARGO_PKG_NAME");
            let primary_config = config_dir.join(project_name).join(format!("{}.yml", project_name));
            if primary_config.exists() {
                match Self::load_from_file(&primary_config) {
                    Ok(config) => return Ok(config),
                    Err(e) => {
                        log::warn!("Failed to load config from {}: {}", primary_config.display(), e);
                    }
                }
            }
        }

        // Try fallback location: ./<project>.yml
        let project_name = env!("CARGO_PKG_NAME");
        let fallback_config = PathBuf::from(format!("{}.yml", project_name));
        if fallback_config.exists() {
            match Self::load_from_file(&fallback_config) {
                Ok(config) => return Ok(config),
                Err(e) => {
                    log::warn!("Failed to load config from {}: {}", fallback_config.display(), e);
                }
            }
        }

        // No config file found, use defaults
        log::info!("No config file found, using defaults");
        Ok(Self::default())
    }

    fn load_from_file<P: AsRef<Path>>(path: P) -> Result<Self> {
        let content = fs::read_to_string(&path).context("Failed to read config file")?;

        let config: Self = serde_yaml::from_str(&content).context("Failed to parse config file")?;

        log::info!("Loaded config from: {}", path.as_ref().display());
        Ok(config)
    }
}

/// Fully resolved startup settings: file config with CLI flags and the
/// environment layered on top, validated and ready to run with.
#[derive(Debug, Clone)]
pub struct RunSettings {
    pub token: String,
    pub target: UserId,
    pub pacer: PacerConfig,
}

impl RunSettings {
    /// Merge precedence: CLI flag > environment > config file > default.
    pub fn resolve(cli: &Cli, config: &Config) -> std::result::Result<Self, DripError> {
        let token = std::env::var(TOKEN_ENV)
            .ok()
            .filter(|t| !t.is_empty())
            .or_else(|| config.token.clone())
            .ok_or_else(|| {
                DripError::Config(format!("missing bot token ({} or config `token`)", TOKEN_ENV))
            })?;

        let target = cli
            .user_id
            .clone()
            .or_else(|| config.target_user_id.clone())
            .map(UserId::new)
            .ok_or_else(|| {
                DripError::Config("missing target user id (--user-id or config `target_user_id`)".to_string())
            })?;

        let base_delay_ms = cli.base_delay_ms.unwrap_or(config.base_delay_ms).max(50);

        let max_count = match cli.max_count.unwrap_or(config.max_count) {
            0 => None,
            n => Some(n),
        };

        let message_text = cli
            .message
            .clone()
            .or_else(|| config.message_text.clone())
            .unwrap_or_else(|| format!("Test DM at {}", chrono::Utc::now().to_rfc3339()));

        Ok(Self {
            token,
            target,
            pacer: PacerConfig {
                base_delay: Duration::from_millis(base_delay_ms),
                max_count,
                message_text,
            },
        })
    }
}
