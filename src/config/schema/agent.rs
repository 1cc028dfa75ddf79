use serde::{Deserialize, Serialize};

/// Loop limits, timeouts and prompt overrides.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AgentConfig {
    /// Iteration budget: well-formed decisions allowed per run.
    #[serde(default = "default_max_loops")]
    pub max_loops: u32,
    /// Malformed decisions tolerated per run before giving up.
    #[serde(default = "default_max_corrections")]
    pub max_corrections: u32,
    #[serde(default = "default_max_concurrent_actions")]
    pub max_concurrent_actions: usize,
    #[serde(default = "default_reasoning_timeout_secs")]
    pub decision_timeout_secs: u64,
    #[serde(default = "default_reasoning_timeout_secs")]
    pub judgment_timeout_secs: u64,
    #[serde(default = "default_action_timeout_secs")]
    pub action_timeout_secs: u64,
    /// Tera template for the opening user turn (`topic`, `schema`).
    #[serde(default)]
    pub prompt_template: Option<String>,
    /// Tera template for candidate review (`topic`, `schema`, `candidate`).
    #[serde(default)]
    pub judgment_template: Option<String>,
}

fn default_max_loops() -> u32 {
    6
}

fn default_max_corrections() -> u32 {
    6
}

fn default_max_concurrent_actions() -> usize {
    4
}

fn default_reasoning_timeout_secs() -> u64 {
    120
}

fn default_action_timeout_secs() -> u64 {
    60
}

impl Default for AgentConfig {
    fn default() -> Self {
        Self {
            max_loops: default_max_loops(),
            max_corrections: default_max_corrections(),
            max_concurrent_actions: default_max_concurrent_actions(),
            decision_timeout_secs: default_reasoning_timeout_secs(),
            judgment_timeout_secs: default_reasoning_timeout_secs(),
            action_timeout_secs: default_action_timeout_secs(),
            prompt_template: None,
            judgment_template: None,
        }
    }
}
