use std::time::Duration;

use crate::config::helpers::{optional_env, parse_secs_env};
use crate::error::ConfigError;
use crate::sources::{DemoSource, SourceId, UpworkSource};

pub const DEFAULT_UPWORK_API_URL: &str = "http://localhost:9156/api/upwork/jobs";
const DEFAULT_REQUEST_TIMEOUT_SECS: u64 = 15;

/// Adapters this build knows how to construct.
pub const KNOWN_SOURCES: &[&str] = &[UpworkSource::ID, DemoSource::ID];

/// Job source adapter settings.
#[derive(Debug, Clone)]
pub struct SourcesConfig {
    /// Scraper endpoint queried by the `upwork` adapter.
    pub upwork_api_url: String,
    /// Upper bound on one source request.
    pub request_timeout: Duration,
    /// Sources offered to users, in picker order.
    pub enabled: Vec<SourceId>,
}

impl SourcesConfig {
    pub(crate) fn resolve() -> Result<Self, ConfigError> {
        let upwork_api_url = optional_env("UPWORK_API_URL")?
            .unwrap_or_else(|| DEFAULT_UPWORK_API_URL.to_string());
        url::Url::parse(&upwork_api_url).map_err(|e| ConfigError::InvalidValue {
            key: "UPWORK_API_URL".to_string(),
            message: e.to_string(),
        })?;

        let enabled = match optional_env("ENABLED_SOURCES")? {
            Some(raw) => parse_source_list(&raw)?,
            None => KNOWN_SOURCES.iter().map(SourceId::new).collect(),
        };

        Ok(Self {
            upwork_api_url,
            request_timeout: parse_secs_env(
                "SOURCE_REQUEST_TIMEOUT_SECS",
                DEFAULT_REQUEST_TIMEOUT_SECS,
            )?,
            enabled,
        })
    }
}

/// Parse a comma-separated source list, keeping first occurrences.
fn parse_source_list(raw: &str) -> Result<Vec<SourceId>, ConfigError> {
    let mut ids: Vec<SourceId> = Vec::new();
    for part in raw.split(',').filter(|p| !p.trim().is_empty()) {
        let id = SourceId::new(part);
        if !KNOWN_SOURCES.contains(&id.as_str()) {
            return Err(ConfigError::InvalidValue {
                key: "ENABLED_SOURCES".to_string(),
                message: format!(
                    "unknown source '{id}', expected one of: {}",
                    KNOWN_SOURCES.join(", ")
                ),
            });
        }
        if !ids.contains(&id) {
            ids.push(id);
        }
    }

    if ids.is_empty() {
        return Err(ConfigError::InvalidValue {
            key: "ENABLED_SOURCES".to_string(),
            message: "at least one source must be enabled".to_string(),
        });
    }
    Ok(ids)
}
