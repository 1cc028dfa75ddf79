use super::traits::{Action, RunContext};
use crate::config::SearchConfig;
use crate::llm::{api_error, build_web_client};
use anyhow::Context;
use reqwest::Client;
use serde::{Deserialize, Serialize};
use serde_json::{Value, json};
use std::future::Future;
use std::pin::Pin;

const SEARCH_TIMEOUT_SECS: u64 = 30;

#[derive(Debug, Serialize)]
struct SearchRequest<'a> {
    query: &'a str,
    max_results: u32,
    search_depth: &'static str,
}

#[derive(Debug, Deserialize)]
struct SearchResponse {
    #[serde(default)]
    results: Vec<SearchHit>,
}

/// One search hit as shown to the model.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct SearchHit {
    pub title: String,
    pub url: String,
    #[serde(default)]
    pub content: String,
}

/// Web search over a Tavily-style JSON API.
pub struct SearchAction {
    client: Client,
    search_url: String,
    auth_header: Option<String>,
    max_results: u32,
}

impl SearchAction {
    pub fn new(config: &SearchConfig) -> Self {
        Self {
            client: build_web_client(SEARCH_TIMEOUT_SECS),
            search_url: format!("{}/search", config.base_url.trim_end_matches('/')),
            auth_header: config
                .api_key
                .as_deref()
                .filter(|key| !key.trim().is_empty())
                .map(|key| format!("Bearer {key}")),
            max_results: config.max_results.max(1),
        }
    }

    async fn search(&self, query: &str, max_results: u32) -> anyhow::Result<Vec<SearchHit>> {
        let auth_header = self
            .auth_header
            .as_ref()
            .context("search API key not set (set search.api_key or TAVILY_API_KEY)")?;

        let response = self
            .client
            .post(&self.search_url)
            .header("Authorization", auth_header)
            .json(&SearchRequest {
                query,
                max_results,
                search_depth: "basic",
            })
            .send()
            .await
            .context("search request failed")?;

        if !response.status().is_success() {
            return Err(api_error("search", response).await);
        }

        let body: SearchResponse = response
            .json()
            .await
            .context("search response was not valid JSON")?;
        Ok(body.results)
    }
}

impl Action for SearchAction {
    fn name(&self) -> &str {
        "search"
    }

    fn description(&self) -> &str {
        "Search the web. Returns a list of results with title, url and a content snippet. \
Use to discover sources; follow up with fetch_and_summarize on promising urls."
    }

    fn input_schema(&self) -> Value {
        json!({
            "type": "object",
            "properties": {
                "query": {
                    "type": "string",
                    "description": "Search query"
                },
                "max_results": {
                    "type": "integer",
                    "description": format!("Number of results (1-{})", self.max_results)
                }
            },
            "required": ["query"]
        })
    }

    fn invoke<'a>(
        &'a self,
        args: Value,
        _ctx: &'a RunContext,
    ) -> Pin<Box<dyn Future<Output = anyhow::Result<String>> + Send + 'a>> {
        Box::pin(async move {
            let query = args
                .get("query")
                .and_then(Value::as_str)
                .map(str::trim)
                .filter(|q| !q.is_empty())
                .ok_or_else(|| anyhow::anyhow!("Missing 'query' parameter"))?;

            let max_results = args
                .get("max_results")
                .and_then(Value::as_u64)
                .and_then(|n| u32::try_from(n).ok())
                .map_or(self.max_results, |n| n.clamp(1, self.max_results));

            tracing::debug!(query, max_results, "search");
            let hits = self.search(query, max_results).await?;
            if hits.is_empty() {
                return Ok(format!("No results found for '{query}'."));
            }
            Ok(serde_json::to_string_pretty(&hits)?)
        })
    }
}
