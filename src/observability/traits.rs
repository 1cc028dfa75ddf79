use std::time::Duration;

/// Discrete events emitted by the control loop.
#[derive(Debug, Clone, PartialEq)]
pub enum ObserverEvent {
    RunStart {
        topic: String,
        max_loops: u32,
    },
    /// A well-formed decision consumed one iteration.
    Decision {
        iteration: u32,
        action: String,
    },
    /// A malformed decision was routed to correction.
    ProtocolViolation {
        violation: String,
        corrections: u32,
    },
    ActionCall {
        action: String,
        call_id: String,
        duration: Duration,
        success: bool,
    },
    Judgment {
        iteration: u32,
        accepted: bool,
    },
    RunEnd {
        termination: String,
        iterations: u32,
        duration: Duration,
    },
}

pub trait Observer: Send + Sync {
    fn record_event(&self, event: &ObserverEvent);

    fn flush(&self) {}

    fn name(&self) -> &str;
}
