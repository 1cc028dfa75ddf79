use anyhow::{Context, Result};
use reqwest::{Client, Response};
use scraper::{Html, Selector};
use url::Url;

/// Readable text pulled from a fetched page.
#[derive(Debug, Clone, PartialEq)]
pub struct PageText {
    pub url: String,
    pub title: Option<String>,
    pub text: String,
}

/// Parse and restrict a fetch target to http(s).
pub fn parse_target(raw: &str) -> Result<Url> {
    let url = Url::parse(raw.trim()).with_context(|| format!("invalid url '{raw}'"))?;
    match url.scheme() {
        "http" | "https" => Ok(url),
        other => anyhow::bail!("unsupported url scheme '{other}' (only http and https)"),
    }
}

/// GET the page and extract readable text, truncated to `max_chars`.
/// At most `max_bytes` of the body are read.
pub async fn fetch_page_text(
    client: &Client,
    url: &Url,
    max_chars: usize,
    max_bytes: usize,
) -> Result<PageText> {
    let response = client
        .get(url.as_str())
        .send()
        .await
        .with_context(|| format!("request to {url} failed"))?;

    let status = response.status();
    if !status.is_success() {
        anyhow::bail!("{url} returned HTTP {status}");
    }

    let is_html = response
        .headers()
        .get(reqwest::header::CONTENT_TYPE)
        .and_then(|v| v.to_str().ok())
        .is_some_and(|ct| ct.contains("text/html"));

    let body = read_body_capped(response, max_bytes)
        .await
        .with_context(|| format!("reading body of {url} failed"))?;

    if is_html {
        Ok(extract_from_html(url.as_str(), &body, max_chars))
    } else {
        Ok(PageText {
            url: url.to_string(),
            title: None,
            text: truncate_text(body.trim(), max_chars),
        })
    }
}

/// Read the body chunk by chunk, stopping once `max_bytes` are buffered.
/// A multi-byte character split at the cap decodes lossily.
async fn read_body_capped(mut response: Response, max_bytes: usize) -> Result<String> {
    let declared = response
        .content_length()
        .and_then(|len| usize::try_from(len).ok())
        .unwrap_or(0);
    let mut body = Vec::with_capacity(declared.min(max_bytes));

    while let Some(chunk) = response.chunk().await? {
        let room = max_bytes - body.len();
        if chunk.len() >= room {
            body.extend_from_slice(&chunk[..room]);
            tracing::debug!(max_bytes, "page body capped");
            break;
        }
        body.extend_from_slice(&chunk);
    }

    Ok(String::from_utf8_lossy(&body).into_owned())
}

pub(crate) fn extract_from_html(url: &str, html: &str, max_chars: usize) -> PageText {
    let document = Html::parse_document(html);

    let title = Selector::parse("title")
        .ok()
        .and_then(|sel| document.select(&sel).next())
        .map(|el| el.text().collect::<String>().trim().to_string())
        .filter(|t| !t.is_empty());

    let content = ["article", "main", "body"]
        .into_iter()
        .find_map(|selector| element_text(&document, selector))
        .unwrap_or_default();

    PageText {
        url: url.to_string(),
        title,
        text: truncate_text(&content, max_chars),
    }
}

fn element_text(document: &Html, selector: &str) -> Option<String> {
    let sel = Selector::parse(selector).ok()?;
    let element = document.select(&sel).next()?;
    let normalized = element
        .text()
        .flat_map(str::split_whitespace)
        .collect::<Vec<_>>()
        .join(" ");
    (!normalized.is_empty()).then_some(normalized)
}

fn truncate_text(text: &str, max_chars: usize) -> String {
    match text.char_indices().nth(max_chars) {
        Some((cut, _)) => format!("{}...", &text[..cut]),
        None => text.to_string(),
    }
}
