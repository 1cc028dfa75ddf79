use super::traits::{Observer, ObserverEvent};

pub struct NoopObserver;

impl Observer for NoopObserver {
    #[inline(always)]
    fn record_event(&self, _event: &ObserverEvent) {}

    fn name(&self) -> &str {
        "noop"
    }
}
