pub mod log;
pub mod noop;
pub mod traits;

pub use self::log::LogObserver;
pub use noop::NoopObserver;
pub use traits::{Observer, ObserverEvent};

use crate::config::ObservabilityConfig;
use std::sync::Arc;

/// Factory: create the right observer from config
pub fn create_observer(config: &ObservabilityConfig) -> Arc<dyn Observer> {
    match config.backend.as_str() {
        "log" => Arc::new(LogObserver::new()),
        "none" | "noop" => Arc::new(NoopObserver),
        _ => {
            tracing::warn!(
                "Unknown observability backend '{}', falling back to noop",
                config.backend
            );
            Arc::new(NoopObserver)
        }
    }
}
