use std::time::Duration;

use secrecy::SecretString;

use crate::config::helpers::{optional_env, parse_secs_env, required_env};
use crate::error::ConfigError;

pub const DEFAULT_API_URL: &str = "https://api.telegram.org";
const DEFAULT_POLL_TIMEOUT_SECS: u64 = 30;

/// Telegram Bot API connection settings.
#[derive(Debug, Clone)]
pub struct TelegramConfig {
    /// Bot token from BotFather.
    pub bot_token: SecretString,
    /// Bot API base URL, without the `/bot<token>` suffix.
    pub api_url: String,
    /// Long-poll timeout passed to `getUpdates`.
    pub poll_timeout: Duration,
}

impl TelegramConfig {
    pub(crate) fn resolve() -> Result<Self, ConfigError> {
        let bot_token = SecretString::from(required_env("TG_BOT")?);

        let api_url =
            optional_env("TELEGRAM_API_URL")?.unwrap_or_else(|| DEFAULT_API_URL.to_string());
        url::Url::parse(&api_url).map_err(|e| ConfigError::InvalidValue {
            key: "TELEGRAM_API_URL".to_string(),
            message: e.to_string(),
        })?;

        Ok(Self {
            bot_token,
            api_url,
            poll_timeout: parse_secs_env("TELEGRAM_POLL_TIMEOUT_SECS", DEFAULT_POLL_TIMEOUT_SECS)?,
        })
    }
}
