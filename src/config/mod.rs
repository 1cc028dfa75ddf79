pub mod schema;

pub use schema::{
    AgentConfig, Config, DEFAULT_SEARCH_BASE_URL, FetchConfig, ObservabilityConfig,
    ReliabilityConfig, SearchConfig,
};
