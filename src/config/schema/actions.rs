use serde::{Deserialize, Serialize};

pub const DEFAULT_SEARCH_BASE_URL: &str = "https://api.tavily.com";

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SearchConfig {
    #[serde(default)]
    pub api_key: Option<String>,
    #[serde(default = "default_search_base_url")]
    pub base_url: String,
    #[serde(default = "default_max_results")]
    pub max_results: u32,
}

fn default_search_base_url() -> String {
    DEFAULT_SEARCH_BASE_URL.into()
}

fn default_max_results() -> u32 {
    10
}

impl Default for SearchConfig {
    fn default() -> Self {
        Self {
            api_key: None,
            base_url: default_search_base_url(),
            max_results: default_max_results(),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct FetchConfig {
    /// Extracted page text is cut to this many characters before summarizing.
    #[serde(default = "default_max_content_chars")]
    pub max_content_chars: usize,
    #[serde(default = "default_fetch_timeout_secs")]
    pub timeout_secs: u64,
    /// Bytes read from a page body before extraction. The rest is dropped.
    #[serde(default = "default_max_page_bytes")]
    pub max_page_bytes: usize,
}

fn default_max_content_chars() -> usize {
    50_000
}

fn default_fetch_timeout_secs() -> u64 {
    30
}

fn default_max_page_bytes() -> usize {
    2 * 1024 * 1024
}

impl Default for FetchConfig {
    fn default() -> Self {
        Self {
            max_content_chars: default_max_content_chars(),
            timeout_secs: default_fetch_timeout_secs(),
            max_page_bytes: default_max_page_bytes(),
        }
    }
}
