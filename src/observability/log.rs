use super::traits::{Observer, ObserverEvent};
use std::sync::atomic::{AtomicU64, Ordering};

/// Writes every event as one structured `tracing` line.
pub struct LogObserver {
    event_count: AtomicU64,
}

impl LogObserver {
    #[must_use]
    pub fn new() -> Self {
        Self {
            event_count: AtomicU64::new(0),
        }
    }

    pub fn events_recorded(&self) -> u64 {
        self.event_count.load(Ordering::Relaxed)
    }
}

impl Observer for LogObserver {
    fn record_event(&self, event: &ObserverEvent) {
        self.event_count.fetch_add(1, Ordering::Relaxed);
        match event {
            ObserverEvent::RunStart { topic, max_loops } => {
                tracing::info!(topic = topic.as_str(), max_loops, "run.start");
            }
            ObserverEvent::Decision { iteration, action } => {
                tracing::info!(iteration, action = action.as_str(), "run.decision");
            }
            ObserverEvent::ProtocolViolation {
                violation,
                corrections,
            } => {
                tracing::info!(
                    violation = violation.as_str(),
                    corrections,
                    "run.protocol_violation"
                );
            }
            ObserverEvent::ActionCall {
                action,
                call_id,
                duration,
                success,
            } => {
                let ms = u64::try_from(duration.as_millis()).unwrap_or(u64::MAX);
                tracing::info!(
                    action = action.as_str(),
                    call_id = call_id.as_str(),
                    duration_ms = ms,
                    success,
                    "run.action_call"
                );
            }
            ObserverEvent::Judgment {
                iteration,
                accepted,
            } => {
                tracing::info!(iteration, accepted, "run.judgment");
            }
            ObserverEvent::RunEnd {
                termination,
                iterations,
                duration,
            } => {
                let ms = u64::try_from(duration.as_millis()).unwrap_or(u64::MAX);
                tracing::info!(
                    termination = termination.as_str(),
                    iterations,
                    duration_ms = ms,
                    "run.end"
                );
            }
        }
    }

    fn flush(&self) {
        tracing::debug!(
            events_total = self.event_count.load(Ordering::Relaxed),
            "observer.log.flush"
        );
    }

    fn name(&self) -> &str {
        "log"
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::time::Duration;

    #[test]
    fn log_observer_name() {
        assert_eq!(LogObserver::new().name(), "log");
    }

    #[test]
    fn log_observer_counts_every_event() {
        let obs = LogObserver::new();
        obs.record_event(&ObserverEvent::RunStart {
            topic: "acme".into(),
            max_loops: 3,
        });
        obs.record_event(&ObserverEvent::ActionCall {
            action: "search".into(),
            call_id: "call_1".into(),
            duration: Duration::from_millis(12),
            success: false,
        });
        obs.record_event(&ObserverEvent::RunEnd {
            termination: "accepted".into(),
            iterations: 1,
            duration: Duration::MAX,
        });
        obs.flush();
        assert_eq!(obs.events_recorded(), 3);
    }
}
