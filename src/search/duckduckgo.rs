/// DuckDuckGo Instant Answer client
///
/// GET {base_url}/?q=...&format=json&no_html=1&skip_disambig=1
/// The abstract (Heading/AbstractText/AbstractURL) becomes the first result when
/// present, followed by RelatedTopics. Topic groups nest their entries under `Topics`.

use std::time::Duration;

use async_trait::async_trait;
use serde::Deserialize;

use super::{SearchResult, UpstreamError, WebSearcher, UNTITLED};

#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "PascalCase")]
struct InstantAnswer {
    #[serde(default)]
    heading: String,
    #[serde(default)]
    abstract_text: String,
    #[serde(rename = "AbstractURL", default)]
    abstract_url: String,
    #[serde(default)]
    related_topics: Vec<RelatedTopic>,
}

#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "PascalCase")]
struct RelatedTopic {
    #[serde(default)]
    text: Option<String>,
    #[serde(rename = "FirstURL", default)]
    first_url: Option<String>,
    #[serde(default)]
    topics: Vec<RelatedTopic>,
}

pub struct DuckDuckGoClient {
    client: reqwest::Client,
    base_url: String,
}

impl DuckDuckGoClient {
    pub fn new(base_url: String, timeout: Duration) -> Result<Self, UpstreamError> {
        let client = reqwest::Client::builder()
            .timeout(timeout)
            .build()
            .map_err(|e| UpstreamError::Request(format!("Failed to create HTTP client: {}", e)))?;

        Ok(Self {
            client,
            base_url: base_url.trim_end_matches('/').to_string(),
        })
    }
}

/// Split "Title - description" topic text into a title and snippet.
fn topic_result(topic: &RelatedTopic) -> Option<SearchResult> {
    let text = topic.text.as_deref().map(str::trim).unwrap_or_default();
    let url = topic.first_url.as_deref().map(str::trim).unwrap_or_default();
    if text.is_empty() && url.is_empty() {
        return None;
    }

    let title = match text.split_once(" - ") {
        Some((head, _)) => head.trim(),
        None => text,
    };

    Some(SearchResult {
        title: if title.is_empty() { UNTITLED.to_string() } else { title.to_string() },
        url: if url.is_empty() { "#".to_string() } else { url.to_string() },
        snippet: text.to_string(),
    })
}

fn collect_results(answer: InstantAnswer) -> Vec<SearchResult> {
    let mut results = Vec::new();

    if !answer.abstract_text.trim().is_empty() {
        let heading = answer.heading.trim();
        results.push(SearchResult {
            title: if heading.is_empty() { UNTITLED.to_string() } else { heading.to_string() },
            url: if answer.abstract_url.trim().is_empty() {
                "#".to_string()
            } else {
                answer.abstract_url.trim().to_string()
            },
            snippet: answer.abstract_text.trim().to_string(),
        });
    }

    for topic in &answer.related_topics {
        if topic.topics.is_empty() {
            results.extend(topic_result(topic));
        } else {
            results.extend(topic.topics.iter().filter_map(topic_result));
        }
    }

    results
}

#[async_trait]
impl WebSearcher for DuckDuckGoClient {
    async fn search(&self, query: &str) -> Result<Vec<SearchResult>, UpstreamError> {
        let url = format!("{}/", self.base_url);

        let response = self
            .client
            .get(&url)
            .query(&[
                ("q", query),
                ("format", "json"),
                ("no_html", "1"),
                ("skip_disambig", "1"),
            ])
            .send()
            .await
            .map_err(|e| UpstreamError::Request(e.to_string()))?;

        if !response.status().is_success() {
            let status = response.status().as_u16();
            let message = response.text().await.unwrap_or_default();
            return Err(UpstreamError::Status { status, message });
        }

        // DuckDuckGo serves this endpoint as application/x-javascript, so decode from text.
        let body = response
            .text()
            .await
            .map_err(|e| UpstreamError::Decode(e.to_string()))?;
        let answer: InstantAnswer =
            serde_json::from_str(&body).map_err(|e| UpstreamError::Decode(e.to_string()))?;

        let results = collect_results(answer);
        tracing::debug!(query = %query, count = results.len(), "DuckDuckGo search complete");
        Ok(results)
    }
}
