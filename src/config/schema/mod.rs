mod actions;
mod agent;
mod core;
mod observability;

pub use actions::{DEFAULT_SEARCH_BASE_URL, FetchConfig, SearchConfig};
pub use agent::AgentConfig;
pub use core::{Config, ReliabilityConfig};
pub use observability::ObservabilityConfig;
