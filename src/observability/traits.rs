//! Core observer trait and event/metric types.

use std::time::Duration;

use crate::channels::{MessageId, UserId};
use crate::sources::SourceId;

/// Observer for navigation lifecycle events and metrics.
///
/// The engine records events at key points of handling an intent and the
/// observer decides what to do with them: log them, keep them for a test,
/// or drop them.
///
/// Thread-safe and cheaply cloneable behind `Arc<dyn Observer>`.
pub trait Observer: Send + Sync {
    /// Record a discrete lifecycle event.
    fn record_event(&self, event: &ObserverEvent);

    /// Record a numeric metric sample.
    fn record_metric(&self, metric: &ObserverMetric);

    /// Flush any buffered data. No-op by default.
    fn flush(&self) {}

    /// Human-readable backend name (e.g. "noop", "log").
    fn name(&self) -> &str;
}

/// Discrete lifecycle events the navigation engine can emit.
#[derive(Debug, Clone, PartialEq)]
pub enum ObserverEvent {
    /// An intent arrived for a user. `intent` is the variant name.
    IntentReceived { user: UserId, intent: &'static str },

    /// A page fetch is about to start.
    FetchStarted {
        user: UserId,
        source: SourceId,
        page: u32,
    },

    /// A page fetch finished.
    FetchFinished {
        user: UserId,
        source: SourceId,
        page: u32,
        duration: Duration,
        /// Listings returned. Zero on failure.
        listings: usize,
        /// Error description when the fetch failed.
        error_message: Option<String>,
    },

    /// An intent was turned away because another one is still running.
    SessionBusy { user: UserId },

    /// A stale overflow message could not be deleted.
    OverflowCleanupFailed {
        user: UserId,
        message: MessageId,
        error_message: String,
    },

    /// A session was cleared by `Exit`.
    SessionReset { user: UserId },
}

/// Numeric metric samples.
#[derive(Debug, Clone, PartialEq)]
pub enum ObserverMetric {
    /// Latency of a single source fetch (histogram-style).
    FetchLatency(Duration),
    /// Current number of sessions held in memory (gauge).
    ActiveSessions(u64),
}
