/// Query orchestration
///
/// One request runs: validate the topic, fetch web results and images
/// concurrently, render the search context, ask the provider adapter for text,
/// normalize it, and fall back to search-context content when the adapter fails
/// or its output is degenerate. Every stage after validation fails soft.

use std::sync::Arc;
use std::time::Duration;

use serde::{Deserialize, Serialize};

use crate::config::Config;
use crate::content::StructuredContent;
use crate::errors::AppError;
use crate::generation::{AdapterFailure, Difficulty, ProviderAdapter};
use crate::images::{ImageResult, ImageSearcher, PexelsClient};
use crate::normalize::{context_fallback, is_degenerate, structure_response, FallbackReason};
use crate::search::{format_search_context, DuckDuckGoClient, SearchResult, WebSearcher};

/// Longest accepted query, in characters.
pub const MAX_QUERY_CHARS: usize = 200;

/// Full answer for one topic query.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct QueryResponse {
    pub query: String,
    pub difficulty: Difficulty,
    #[serde(flatten)]
    pub content: StructuredContent,
    pub images: Vec<ImageResult>,
    pub resources: Vec<SearchResult>,
}

/// Limits applied while assembling a response.
#[derive(Debug, Clone, Copy)]
pub struct QueryLimits {
    pub max_context_results: usize,
    pub max_resources: usize,
    pub image_count: usize,
}

impl Default for QueryLimits {
    fn default() -> Self {
        QueryLimits {
            max_context_results: 10,
            max_resources: 8,
            image_count: 6,
        }
    }
}

#[derive(Clone)]
pub struct QueryService {
    adapter: ProviderAdapter,
    searcher: Arc<dyn WebSearcher>,
    images: Arc<dyn ImageSearcher>,
    limits: QueryLimits,
}

impl QueryService {
    pub fn new(
        adapter: ProviderAdapter,
        searcher: Arc<dyn WebSearcher>,
        images: Arc<dyn ImageSearcher>,
        limits: QueryLimits,
    ) -> Self {
        Self {
            adapter,
            searcher,
            images,
            limits,
        }
    }

    /// Configured text providers in call order.
    pub fn provider_names(&self) -> Vec<String> {
        self.adapter.provider_names()
    }

    pub fn images_enabled(&self) -> bool {
        self.images.is_enabled()
    }

    /// Wire the production collaborators from configuration.
    pub fn from_config(config: &Config) -> Result<Self, AppError> {
        let timeout = Duration::from_secs(config.providers.request_timeout_secs);

        let searcher = DuckDuckGoClient::new(config.search.duckduckgo_base_url.clone(), timeout)
            .map_err(|e| AppError::Config(e.to_string()))?;
        let images = PexelsClient::new(
            config.search.pexels_base_url.clone(),
            config.search.pexels_api_key.clone(),
            timeout,
        )
        .map_err(|e| AppError::Config(e.to_string()))?;

        let adapter = ProviderAdapter::from_config(&config.providers);
        if adapter.is_configured() {
            tracing::info!(providers = ?adapter.provider_names(), "Text generation providers configured");
        } else {
            tracing::warn!("No text generation provider configured; answers will come from web search only");
        }
        if !images.is_configured() {
            tracing::info!("No Pexels API key configured; image search disabled");
        }

        Ok(Self::new(
            adapter,
            Arc::new(searcher),
            Arc::new(images),
            QueryLimits {
                max_context_results: config.search.max_context_results,
                max_resources: config.search.max_resources,
                image_count: config.search.image_count,
            },
        ))
    }

    /// Answer a topic query.
    ///
    /// # Errors
    /// Only validation errors are returned; upstream and provider failures degrade
    /// to fallback content.
    pub async fn answer(&self, query: Option<&str>, difficulty: Difficulty) -> Result<QueryResponse, AppError> {
        let topic = clean_query(query)?;

        let (search_outcome, image_outcome) = tokio::join!(
            self.searcher.search(&topic),
            self.images.search_images(&topic, self.limits.image_count),
        );

        let results = search_outcome.unwrap_or_else(|e| {
            tracing::warn!(error = %e, "Web search failed; continuing without context");
            Vec::new()
        });
        let images = image_outcome.unwrap_or_else(|e| {
            tracing::warn!(error = %e, "Image search failed; continuing without images");
            Vec::new()
        });

        let context = format_search_context(&results, self.limits.max_context_results);
        let content = self.generate_content(&topic, &context, difficulty).await;

        let resources = results.into_iter().take(self.limits.max_resources).collect();

        Ok(QueryResponse {
            query: topic,
            difficulty,
            content,
            images,
            resources,
        })
    }

    /// Adapter output, normalized, or the search-context fallback.
    pub async fn generate_content(&self, topic: &str, context: &str, difficulty: Difficulty) -> StructuredContent {
        match self.adapter.generate(topic, context, difficulty).await {
            Ok(raw) => {
                let content = structure_response(&raw);
                if is_degenerate(&content) {
                    tracing::warn!(topic = %topic, "Provider output was degenerate; using search-context fallback");
                    context_fallback(topic, context, FallbackReason::DegenerateOutput)
                } else {
                    content
                }
            }
            Err(AdapterFailure::NoProviderConfigured) => {
                tracing::info!(topic = %topic, "No provider configured; using search-context fallback");
                context_fallback(topic, context, FallbackReason::NoProviderConfigured)
            }
            Err(e @ AdapterFailure::AllProvidersFailed { .. }) => {
                tracing::warn!(topic = %topic, error = %e, "Generation failed; using search-context fallback");
                context_fallback(topic, context, FallbackReason::ProvidersFailed)
            }
        }
    }
}

/// Validate and bound a raw query.
pub fn clean_query(query: Option<&str>) -> Result<String, AppError> {
    let Some(query) = query else {
        return Err(AppError::validation("query", "Query is required"));
    };
    if query.is_empty() {
        return Err(AppError::validation("query", "Query is required"));
    }

    let cleaned: String = query.trim().chars().take(MAX_QUERY_CHARS).collect();
    let cleaned = cleaned.trim_end().to_string();
    if cleaned.is_empty() {
        return Err(AppError::validation("query", "Query cannot be empty"));
    }
    Ok(cleaned)
}
