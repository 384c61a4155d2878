//! Observer that discards everything.

use crate::observability::traits::{Observer, ObserverEvent, ObserverMetric};

/// Zero-overhead observer. The default backend.
pub struct NoopObserver;

impl Observer for NoopObserver {
    fn record_event(&self, _event: &ObserverEvent) {}

    fn record_metric(&self, _metric: &ObserverMetric) {}

    fn name(&self) -> &str {
        "noop"
    }
}
