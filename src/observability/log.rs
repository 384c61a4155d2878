//! Tracing-based observer that emits structured log events.
//!
//! Uses the existing `tracing` infrastructure so events appear alongside
//! normal application logs.

use crate::observability::traits::{Observer, ObserverEvent, ObserverMetric};

/// Observer that logs events and metrics via `tracing`.
pub struct LogObserver;

impl Observer for LogObserver {
    fn record_event(&self, event: &ObserverEvent) {
        match event {
            ObserverEvent::IntentReceived { user, intent } => {
                tracing::info!(%user, intent, "observer: intent.received");
            }
            ObserverEvent::FetchStarted { user, source, page } => {
                tracing::info!(%user, %source, page, "observer: fetch.start");
            }
            ObserverEvent::FetchFinished {
                user,
                source,
                page,
                duration,
                listings,
                error_message,
            } => {
                tracing::info!(
                    %user,
                    %source,
                    page,
                    duration_ms = duration.as_millis() as u64,
                    listings,
                    success = error_message.is_none(),
                    error = error_message.as_deref().unwrap_or(""),
                    "observer: fetch.end"
                );
            }
            ObserverEvent::SessionBusy { user } => {
                tracing::info!(%user, "observer: session.busy");
            }
            ObserverEvent::OverflowCleanupFailed {
                user,
                message,
                error_message,
            } => {
                tracing::warn!(
                    %user,
                    %message,
                    error = error_message.as_str(),
                    "observer: overflow.cleanup_failed"
                );
            }
            ObserverEvent::SessionReset { user } => {
                tracing::info!(%user, "observer: session.reset");
            }
        }
    }

    fn record_metric(&self, metric: &ObserverMetric) {
        match metric {
            ObserverMetric::FetchLatency(d) => {
                tracing::debug!(
                    latency_ms = d.as_millis() as u64,
                    "observer: metric.fetch_latency"
                );
            }
            ObserverMetric::ActiveSessions(n) => {
                tracing::debug!(active_sessions = n, "observer: metric.active_sessions");
            }
        }
    }

    fn name(&self) -> &str {
        "log"
    }
}
