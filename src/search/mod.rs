/// Web-search collaborator
///
/// `WebSearcher` is the seam the query service talks to. Results feed two places:
/// the generation context string (`format_search_context`) and the `resources`
/// list returned to the client. Failures never reach the caller as errors; the
/// service logs them and carries on with an empty result list.

pub mod duckduckgo;

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use thiserror::Error;

pub use duckduckgo::DuckDuckGoClient;

/// Title used when an upstream result has none.
pub const UNTITLED: &str = "Untitled";

/// One web-search hit.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SearchResult {
    pub title: String,
    pub url: String,
    #[serde(default)]
    pub snippet: String,
}

/// Failure talking to a search or image collaborator.
#[derive(Debug, Error)]
pub enum UpstreamError {
    #[error("HTTP request failed: {0}")]
    Request(String),

    #[error("Upstream returned status {status}: {message}")]
    Status { status: u16, message: String },

    #[error("Failed to decode upstream response: {0}")]
    Decode(String),
}

#[async_trait]
pub trait WebSearcher: Send + Sync {
    async fn search(&self, query: &str) -> Result<Vec<SearchResult>, UpstreamError>;
}

/// Searcher that never finds anything. Used when web search is disabled.
pub struct NoopSearcher;

#[async_trait]
impl WebSearcher for NoopSearcher {
    async fn search(&self, _query: &str) -> Result<Vec<SearchResult>, UpstreamError> {
        tracing::debug!("NoopSearcher: web search disabled");
        Ok(vec![])
    }
}

/// Render search results as the numbered context block passed to providers.
///
/// Returns an empty string when there are no results.
pub fn format_search_context(results: &[SearchResult], max_results: usize) -> String {
    results
        .iter()
        .take(max_results)
        .enumerate()
        .map(|(i, r)| format!("{}. {}\n   URL: {}\n   {}", i + 1, r.title, r.url, r.snippet))
        .collect::<Vec<_>>()
        .join("\n\n")
}

#[cfg(test)]
mod tests {
    use super::*;

    fn result(title: &str, snippet: &str) -> SearchResult {
        SearchResult {
            title: title.to_string(),
            url: format!("https://example.com/{}", title.to_lowercase()),
            snippet: snippet.to_string(),
        }
    }

    #[test]
    fn test_context_format() {
        let results = vec![result("Nebula", "A cloud of gas."), result("Star", "")];
        let context = format_search_context(&results, 10);
        assert_eq!(
            context,
            "1. Nebula\n   URL: https://example.com/nebula\n   A cloud of gas.\n\n2. Star\n   URL: https://example.com/star\n   "
        );
    }

    #[test]
    fn test_context_respects_limit() {
        let results: Vec<_> = (0..12).map(|i| result(&format!("T{i}"), "s")).collect();
        let context = format_search_context(&results, 10);
        assert_eq!(context.split("\n\n").count(), 10);
        assert!(context.starts_with("1. T0"));
        assert!(!context.contains("11. "));
    }

    #[test]
    fn test_empty_results_give_empty_context() {
        assert_eq!(format_search_context(&[], 10), "");
    }

    #[tokio::test]
    async fn test_noop_searcher_is_empty() {
        assert!(NoopSearcher.search("anything").await.unwrap().is_empty());
    }
}
