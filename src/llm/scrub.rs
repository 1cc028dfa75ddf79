use crate::error::LlmError;
use std::borrow::Cow;

const MAX_API_ERROR_CHARS: usize = 200;
const REDACTED: &str = "[REDACTED]";

/// Prefixes of API keys the enricher talks to (LLM providers and search).
const KEY_PREFIXES: [&str; 5] = ["sk-", "tvly-", "hf_", "AIza", "eyJ"];

/// Markers whose trailing token is a credential.
const KEY_MARKERS: [&str; 8] = [
    "Authorization: Bearer ",
    "authorization: bearer ",
    "\"authorization\":\"Bearer ",
    "api_key=",
    "access_token=",
    "\"api_key\":\"",
    "\"access_token\":\"",
    "\"token\":\"",
];

fn is_secret_char(c: char) -> bool {
    c.is_ascii_alphanumeric() || matches!(c, '-' | '_' | '.' | ':' | '+' | '/' | '=')
}

fn token_end(input: &str, from: usize) -> usize {
    input[from..]
        .char_indices()
        .find(|&(_, c)| !is_secret_char(c))
        .map_or(input.len(), |(i, _)| from + i)
}

fn scrub_after_marker(scrubbed: &mut String, marker: &str) {
    let mut search_from = 0;
    while let Some(rel) = scrubbed[search_from..].find(marker) {
        let start = search_from + rel;
        let content_start = start + marker.len();
        let end = token_end(scrubbed, content_start);

        // Bare marker with nothing after it.
        if end == content_start {
            search_from = content_start;
            continue;
        }

        scrubbed.replace_range(start..end, REDACTED);
        search_from = start + REDACTED.len();
    }
}

/// Redact credential-looking tokens from text that may be logged or shown.
pub fn scrub_secret_patterns(input: &str) -> Cow<'_, str> {
    let needs_scrubbing = KEY_PREFIXES
        .iter()
        .chain(KEY_MARKERS.iter())
        .any(|pattern| input.contains(pattern));
    if !needs_scrubbing {
        return Cow::Borrowed(input);
    }

    let mut scrubbed = input.to_string();
    for marker in KEY_MARKERS.iter().chain(KEY_PREFIXES.iter()) {
        scrub_after_marker(&mut scrubbed, marker);
    }
    Cow::Owned(scrubbed)
}

/// Scrub secrets and cap the length of an upstream error body.
pub fn sanitize_api_error(input: &str) -> String {
    let scrubbed = scrub_secret_patterns(input);

    if scrubbed.chars().count() <= MAX_API_ERROR_CHARS {
        return scrubbed.into_owned();
    }

    let scrubbed = scrubbed.as_ref();
    let mut end = MAX_API_ERROR_CHARS;
    while end > 0 && !scrubbed.is_char_boundary(end) {
        end -= 1;
    }

    format!("{}...", &scrubbed[..end])
}

/// Build a sanitized error from a failed HTTP response. The status stays a
/// typed field so retry decisions never depend on the body text.
pub async fn api_error(service: &str, response: reqwest::Response) -> anyhow::Error {
    let status = response.status().as_u16();
    let body = response
        .text()
        .await
        .unwrap_or_else(|_| "<failed to read error body>".to_string());
    LlmError::Api {
        provider: service.to_string(),
        status,
        body: sanitize_api_error(&body),
    }
    .into()
}
