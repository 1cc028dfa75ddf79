use reqwest::redirect::Policy;
use reqwest::{Client, ClientBuilder};
use std::time::Duration;

const CONNECT_TIMEOUT_SECS: u64 = 10;
const MAX_REDIRECTS: usize = 5;

fn base_builder(timeout_secs: u64) -> ClientBuilder {
    Client::builder()
        .timeout(Duration::from_secs(timeout_secs))
        .connect_timeout(Duration::from_secs(CONNECT_TIMEOUT_SECS))
        .user_agent(concat!("enricher/", env!("CARGO_PKG_VERSION")))
}

/// Client for LLM provider calls. Keeps idle connections to the one API host
/// warm across decisions. Falls back to a default client if the builder
/// rejects the configuration.
pub fn build_provider_client(timeout_secs: u64) -> Client {
    base_builder(timeout_secs)
        .pool_max_idle_per_host(10)
        .pool_idle_timeout(Duration::from_secs(90))
        .build()
        .unwrap_or_else(|_| Client::new())
}

/// Client for action traffic: the search API and arbitrary pages the model
/// asks to read. Redirect chains are capped.
pub fn build_web_client(timeout_secs: u64) -> Client {
    base_builder(timeout_secs)
        .redirect(Policy::limited(MAX_REDIRECTS))
        .build()
        .unwrap_or_else(|_| Client::new())
}
