//! Observability subsystem: trait-based event and metric recording.
//!
//! Provides a pluggable [`Observer`] trait with two backends:
//!
//! | Backend | Description |
//! |---------|-------------|
//! | `noop`  | Zero overhead, discards everything (default) |
//! | `log`   | Emits structured events via `tracing` |
//!
//! The [`create_observer`] factory builds the right backend from
//! [`ObservabilityConfig`].

mod log;
mod noop;
pub mod traits;

#[cfg(test)]
pub mod recording;

pub use self::log::LogObserver;
pub use self::noop::NoopObserver;
pub use self::traits::{Observer, ObserverEvent, ObserverMetric};

/// Configuration for the observability backend.
#[derive(Debug, Clone)]
pub struct ObservabilityConfig {
    /// Backend name: "none", "noop" or "log".
    pub backend: String,
}

impl ObservabilityConfig {
    /// Build from `OBSERVABILITY_BACKEND`, defaulting to "none".
    pub fn resolve() -> Result<Self, crate::error::ConfigError> {
        use crate::config::helpers::optional_env;

        Ok(Self {
            backend: optional_env("OBSERVABILITY_BACKEND")?
                .map(|b| b.trim().to_lowercase())
                .unwrap_or_else(|| "none".to_string()),
        })
    }
}

impl Default for ObservabilityConfig {
    fn default() -> Self {
        Self {
            backend: "none".into(),
        }
    }
}

/// Create an observer from configuration.
///
/// Returns a [`LogObserver`] for "log" and a [`NoopObserver`] for anything
/// else, including unknown values.
pub fn create_observer(config: &ObservabilityConfig) -> Box<dyn Observer> {
    match config.backend.as_str() {
        "log" => Box::new(LogObserver),
        "none" | "noop" | "" => Box::new(NoopObserver),
        other => {
            tracing::warn!(backend = other, "Unknown observability backend, using noop");
            Box::new(NoopObserver)
        }
    }
}
