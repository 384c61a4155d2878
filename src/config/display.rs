use chrono_tz::Tz;

use crate::config::helpers::{optional_env, parse_positive_env};
use crate::error::ConfigError;
use crate::format::DEFAULT_MAX_FRAGMENT_SIZE;
use crate::selector::DEFAULT_SOURCES_PER_PAGE;

/// How results and the source picker are laid out.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DisplayConfig {
    /// Longest single message, in characters.
    pub max_fragment_size: usize,
    pub sources_per_page: usize,
    /// Zone posting dates are shown in.
    pub timezone: Tz,
}

impl Default for DisplayConfig {
    fn default() -> Self {
        Self {
            max_fragment_size: DEFAULT_MAX_FRAGMENT_SIZE,
            sources_per_page: DEFAULT_SOURCES_PER_PAGE,
            timezone: Tz::UTC,
        }
    }
}

impl DisplayConfig {
    pub(crate) fn resolve() -> Result<Self, ConfigError> {
        let max_fragment_size = parse_positive_env("MAX_FRAGMENT_SIZE", DEFAULT_MAX_FRAGMENT_SIZE)?;
        if max_fragment_size > DEFAULT_MAX_FRAGMENT_SIZE {
            return Err(ConfigError::InvalidValue {
                key: "MAX_FRAGMENT_SIZE".to_string(),
                message: format!("must not exceed {DEFAULT_MAX_FRAGMENT_SIZE}"),
            });
        }

        let timezone = match optional_env("DISPLAY_TIMEZONE")? {
            Some(name) => name.trim().parse::<Tz>().map_err(|e| ConfigError::InvalidValue {
                key: "DISPLAY_TIMEZONE".to_string(),
                message: e.to_string(),
            })?,
            None => Tz::UTC,
        };

        Ok(Self {
            max_fragment_size,
            sources_per_page: parse_positive_env("SOURCES_PER_PAGE", DEFAULT_SOURCES_PER_PAGE)?,
            timezone,
        })
    }
}
