//! Search request construction and response extraction.

use crate::domain::{Page, Query, Result, SearchError};
use serde_json::Value;
use url::Url;

/// Builds the search URL with percent-encoded `query`, `page`, and `per_page`.
///
/// # Errors
///
/// Returns [`SearchError::InvalidUrl`] if `endpoint` is not an absolute URL.
pub fn search_url(endpoint: &str, query: &Query, page: Page, per_page: u32) -> Result<Url> {
    let mut url =
        Url::parse(endpoint).map_err(|e| SearchError::InvalidUrl(format!("{endpoint}: {e}")))?;

    url.query_pairs_mut()
        .append_pair("query", query.as_str())
        .append_pair("page", &page.to_string())
        .append_pair("per_page", &per_page.to_string());

    Ok(url)
}

/// Extracts the "regular"-resolution image URLs from a search response body.
///
/// Expects `{ "results": [ { "urls": { "regular": "<url>" } }, ... ] }`.
/// Entries without a string at `urls.regular` are skipped. Order follows the
/// response.
///
/// # Errors
///
/// - [`SearchError::NoData`] for an empty body
/// - [`SearchError::Parsing`] if the body is not JSON
/// - [`SearchError::InvalidResponse`] if `results` is missing or not an array
pub fn extract_regular_urls(body: &[u8]) -> Result<Vec<String>> {
    if body.is_empty() {
        return Err(SearchError::NoData);
    }

    let json: Value = serde_json::from_slice(body)?;
    let results = json
        .get("results")
        .and_then(Value::as_array)
        .ok_or(SearchError::InvalidResponse)?;

    let urls: Vec<String> = results
        .iter()
        .filter_map(|entry| entry.pointer("/urls/regular").and_then(Value::as_str))
        .map(String::from)
        .collect();

    if urls.len() < results.len() {
        tracing::debug!(
            skipped = results.len() - urls.len(),
            "search results without a regular url"
        );
    }

    Ok(urls)
}
