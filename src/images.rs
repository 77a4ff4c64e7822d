/// Image-search collaborator (Pexels)
///
/// GET {base_url}/v1/search?query=...&per_page=N with the bare API key in the
/// Authorization header. With no key configured the client returns an empty list
/// without making a request.

use std::time::Duration;

use async_trait::async_trait;
use serde::{Deserialize, Serialize};

use crate::search::UpstreamError;

/// Image sources at the sizes Pexels publishes.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ImageSources {
    #[serde(default)]
    pub original: String,
    #[serde(default)]
    pub large2x: String,
    #[serde(default)]
    pub large: String,
    #[serde(default)]
    pub medium: String,
    #[serde(default)]
    pub small: String,
}

/// Image returned to the client alongside study content.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ImageResult {
    pub id: u64,
    pub url: String,
    pub src: ImageSources,
    pub alt: String,
    pub photographer: String,
    pub photographer_url: String,
}

#[async_trait]
pub trait ImageSearcher: Send + Sync {
    async fn search_images(&self, query: &str, count: usize) -> Result<Vec<ImageResult>, UpstreamError>;

    /// Whether searches can return anything at all.
    fn is_enabled(&self) -> bool {
        true
    }
}

#[derive(Deserialize)]
struct PexelsResponse {
    #[serde(default)]
    photos: Vec<PexelsPhoto>,
}

#[derive(Deserialize)]
struct PexelsPhoto {
    id: u64,
    #[serde(default)]
    url: String,
    #[serde(default)]
    src: ImageSources,
    #[serde(default)]
    alt: Option<String>,
    #[serde(default)]
    photographer: String,
    #[serde(default)]
    photographer_url: String,
}

impl PexelsPhoto {
    fn into_result(self, query: &str) -> ImageResult {
        let alt = self
            .alt
            .filter(|a| !a.trim().is_empty())
            .unwrap_or_else(|| query.to_string());

        ImageResult {
            id: self.id,
            url: self.url,
            src: self.src,
            alt,
            photographer: self.photographer,
            photographer_url: self.photographer_url,
        }
    }
}

pub struct PexelsClient {
    client: reqwest::Client,
    base_url: String,
    api_key: Option<String>,
}

impl PexelsClient {
    pub fn new(base_url: String, api_key: Option<String>, timeout: Duration) -> Result<Self, UpstreamError> {
        let client = reqwest::Client::builder()
            .timeout(timeout)
            .build()
            .map_err(|e| UpstreamError::Request(format!("Failed to create HTTP client: {}", e)))?;

        Ok(Self {
            client,
            base_url: base_url.trim_end_matches('/').to_string(),
            api_key: api_key.filter(|k| !k.trim().is_empty()),
        })
    }

    pub fn is_configured(&self) -> bool {
        self.api_key.is_some()
    }
}

#[async_trait]
impl ImageSearcher for PexelsClient {
    fn is_enabled(&self) -> bool {
        self.is_configured()
    }

    async fn search_images(&self, query: &str, count: usize) -> Result<Vec<ImageResult>, UpstreamError> {
        let Some(api_key) = &self.api_key else {
            return Ok(vec![]);
        };

        let url = format!("{}/v1/search", self.base_url);
        let per_page = count.to_string();

        let response = self
            .client
            .get(&url)
            .header(reqwest::header::AUTHORIZATION, api_key.as_str())
            .query(&[("query", query), ("per_page", per_page.as_str())])
            .send()
            .await
            .map_err(|e| UpstreamError::Request(e.to_string()))?;

        if !response.status().is_success() {
            let status = response.status().as_u16();
            let message = response.text().await.unwrap_or_default();
            return Err(UpstreamError::Status { status, message });
        }

        let body: PexelsResponse = response
            .json()
            .await
            .map_err(|e| UpstreamError::Decode(e.to_string()))?;

        Ok(body
            .photos
            .into_iter()
            .map(|p| p.into_result(query))
            .collect())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;
    use wiremock::matchers::{header, method, path, query_param};
    use wiremock::{Mock, MockServer, ResponseTemplate};

    #[tokio::test]
    async fn test_unconfigured_key_returns_empty_without_request() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .respond_with(ResponseTemplate::new(200))
            .expect(0)
            .mount(&server)
            .await;

        let client = PexelsClient::new(server.uri(), None, Duration::from_secs(5)).unwrap();
        assert!(!client.is_configured());
        assert!(client.search_images("nebula", 6).await.unwrap().is_empty());
    }

    #[tokio::test]
    async fn test_search_images_maps_photos() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/v1/search"))
            .and(header("Authorization", "px_key"))
            .and(query_param("query", "nebula"))
            .and(query_param("per_page", "2"))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({
                "photos": [
                    {
                        "id": 1,
                        "url": "https://www.pexels.com/photo/1",
                        "src": {"original": "o1", "large2x": "l2", "large": "l", "medium": "m", "small": "s"},
                        "alt": "Colorful nebula",
                        "photographer": "Ana",
                        "photographer_url": "https://www.pexels.com/@ana"
                    },
                    {
                        "id": 2,
                        "url": "https://www.pexels.com/photo/2",
                        "src": {"original": "o2"},
                        "alt": "",
                        "photographer": "Ben",
                        "photographer_url": "https://www.pexels.com/@ben"
                    }
                ]
            })))
            .mount(&server)
            .await;

        let client = PexelsClient::new(server.uri(), Some("px_key".into()), Duration::from_secs(5)).unwrap();
        let images = client.search_images("nebula", 2).await.unwrap();

        assert_eq!(images.len(), 2);
        assert_eq!(images[0].alt, "Colorful nebula");
        assert_eq!(images[0].src.medium, "m");
        assert_eq!(images[1].alt, "nebula");
        assert_eq!(images[1].src.original, "o2");
    }

    #[tokio::test]
    async fn test_error_status_is_reported() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .respond_with(ResponseTemplate::new(401).set_body_string("bad key"))
            .mount(&server)
            .await;

        let client = PexelsClient::new(server.uri(), Some("px_key".into()), Duration::from_secs(5)).unwrap();
        let err = client.search_images("nebula", 6).await.unwrap_err();
        assert!(matches!(err, UpstreamError::Status { status: 401, .. }));
    }
}
