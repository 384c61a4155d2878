//! Configuration for Job Beacon.
//!
//! Everything comes from environment variables, optionally seeded from a
//! `.env` file in the working directory.

mod display;
pub(crate) mod helpers;
mod session;
mod sources;
mod telegram;

pub use self::display::DisplayConfig;
pub use self::session::SessionConfig;
pub use self::sources::{DEFAULT_UPWORK_API_URL, KNOWN_SOURCES, SourcesConfig};
pub use self::telegram::{DEFAULT_API_URL, TelegramConfig};

use crate::error::ConfigError;
use crate::observability::ObservabilityConfig;

/// Main configuration for the bot.
#[derive(Debug, Clone)]
pub struct Config {
    pub telegram: TelegramConfig,
    pub sources: SourcesConfig,
    pub display: DisplayConfig,
    pub session: SessionConfig,
    pub observability: ObservabilityConfig,
}

impl Config {
    /// Load configuration from environment variables.
    pub fn from_env() -> Result<Self, ConfigError> {
        // Load .env file if present (ignore errors if not found)
        let _ = dotenvy::dotenv();

        Ok(Self {
            telegram: TelegramConfig::resolve()?,
            sources: SourcesConfig::resolve()?,
            display: DisplayConfig::resolve()?,
            session: SessionConfig::resolve()?,
            observability: ObservabilityConfig::resolve()?,
        })
    }
}
