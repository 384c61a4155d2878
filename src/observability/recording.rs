//! Test-only observer that captures all events into a shared vector.

use std::sync::{Arc, Mutex};

use crate::observability::traits::{Observer, ObserverEvent, ObserverMetric};

/// Observer that records all events for test assertions.
pub struct RecordingObserver {
    events: Arc<Mutex<Vec<ObserverEvent>>>,
    metrics: Arc<Mutex<Vec<ObserverMetric>>>,
}

impl RecordingObserver {
    /// Create a new recording observer and return handles to the captured data.
    #[allow(clippy::type_complexity)]
    pub fn new() -> (
        Self,
        Arc<Mutex<Vec<ObserverEvent>>>,
        Arc<Mutex<Vec<ObserverMetric>>>,
    ) {
        let events = Arc::new(Mutex::new(Vec::new()));
        let metrics = Arc::new(Mutex::new(Vec::new()));
        (
            Self {
                events: Arc::clone(&events),
                metrics: Arc::clone(&metrics),
            },
            events,
            metrics,
        )
    }
}

impl Observer for RecordingObserver {
    fn record_event(&self, event: &ObserverEvent) {
        self.events.lock().unwrap().push(event.clone());
    }

    fn record_metric(&self, metric: &ObserverMetric) {
        self.metrics.lock().unwrap().push(metric.clone());
    }

    fn name(&self) -> &str {
        "recording"
    }
}

#[cfg(test)]
mod tests {
    use std::time::Duration;

    use super::*;
    use crate::channels::UserId;

    #[test]
    fn captures_events() {
        let (obs, events, _) = RecordingObserver::new();

        obs.record_event(&ObserverEvent::SessionBusy { user: UserId(1) });
        obs.record_event(&ObserverEvent::SessionReset { user: UserId(1) });

        let captured = events.lock().unwrap();
        assert_eq!(captured.len(), 2);
        assert!(matches!(captured[0], ObserverEvent::SessionBusy { .. }));
        assert!(matches!(captured[1], ObserverEvent::SessionReset { .. }));
    }

    #[test]
    fn captures_metrics() {
        let (obs, _, metrics) = RecordingObserver::new();

        obs.record_metric(&ObserverMetric::ActiveSessions(2));
        obs.record_metric(&ObserverMetric::FetchLatency(Duration::from_millis(100)));

        assert_eq!(metrics.lock().unwrap().len(), 2);
    }

    #[test]
    fn name_is_recording() {
        let (obs, _, _) = RecordingObserver::new();
        assert_eq!(obs.name(), "recording");
    }
}
