/// Groq text-generation provider
///
/// Calls Groq's OpenAI-compatible Chat Completions API with json_object response format.
/// The base_url is configurable so any compatible endpoint (or a mock server) works.
/// Uses llama-3.1-8b-instant by default and requires an API key.

use std::time::Duration;

use async_trait::async_trait;
use serde::{Deserialize, Serialize};

use super::{non_empty_completion, ProviderError, TextProvider};

#[derive(Serialize)]
struct ChatRequest {
    model: String,
    messages: Vec<ChatMessage>,
    temperature: f32,
    max_tokens: u32,
    response_format: ResponseFormat,
}

#[derive(Serialize)]
struct ChatMessage {
    role: String,
    content: String,
}

#[derive(Serialize)]
struct ResponseFormat {
    #[serde(rename = "type")]
    format_type: String,
}

#[derive(Deserialize)]
struct ChatResponse {
    #[serde(default)]
    choices: Vec<ChatChoice>,
    #[serde(default)]
    error: Option<ChatError>,
}

#[derive(Deserialize)]
struct ChatChoice {
    message: Option<ChatResponseMessage>,
}

#[derive(Deserialize)]
struct ChatResponseMessage {
    #[serde(default)]
    content: Option<String>,
}

#[derive(Deserialize)]
struct ChatError {
    message: Option<String>,
}

/// Groq-backed provider (OpenAI-compatible chat completions).
pub struct GroqProvider {
    client: reqwest::Client,
    base_url: String,
    api_key: String,
    model: String,
    max_tokens: u32,
}

impl GroqProvider {
    /// Create a new GroqProvider.
    ///
    /// # Errors
    /// Returns `ProviderError::NotConfigured` if api_key is empty.
    pub fn new(
        base_url: String,
        api_key: String,
        model: String,
        max_tokens: u32,
        timeout: Duration,
    ) -> Result<Self, ProviderError> {
        if api_key.trim().is_empty() {
            return Err(ProviderError::NotConfigured(
                "Groq API key is empty. Set GROQ_API_KEY or providers.groq_api_key in infoquest.toml"
                    .to_string(),
            ));
        }

        let client = reqwest::Client::builder()
            .timeout(timeout)
            .build()
            .map_err(|e| ProviderError::NotConfigured(format!("Failed to create HTTP client: {}", e)))?;

        Ok(GroqProvider {
            client,
            base_url: base_url.trim_end_matches('/').to_string(),
            api_key,
            model,
            max_tokens,
        })
    }
}

#[async_trait]
impl TextProvider for GroqProvider {
    async fn complete(&self, system: &str, prompt: &str) -> Result<String, ProviderError> {
        let request = ChatRequest {
            model: self.model.clone(),
            messages: vec![
                ChatMessage {
                    role: "system".to_string(),
                    content: system.to_string(),
                },
                ChatMessage {
                    role: "user".to_string(),
                    content: prompt.to_string(),
                },
            ],
            temperature: 0.5,
            max_tokens: self.max_tokens,
            response_format: ResponseFormat {
                format_type: "json_object".to_string(),
            },
        };

        let url = format!("{}/chat/completions", self.base_url);

        let response = self
            .client
            .post(&url)
            .bearer_auth(&self.api_key)
            .json(&request)
            .send()
            .await
            .map_err(|e| ProviderError::Request(e.to_string()))?;

        let status = response.status().as_u16();
        if !response.status().is_success() {
            let body = response
                .text()
                .await
                .unwrap_or_else(|_| "unknown error".to_string());
            return Err(ProviderError::Api { status, message: body });
        }

        let chat_response: ChatResponse = response
            .json()
            .await
            .map_err(|e| ProviderError::Generation(format!("Failed to parse Groq response: {}", e)))?;

        if let Some(error) = chat_response.error {
            let message = error
                .message
                .unwrap_or_else(|| "Groq API returned an error".to_string());
            return Err(ProviderError::Generation(message));
        }

        let content = chat_response
            .choices
            .into_iter()
            .find_map(|c| c.message.and_then(|m| m.content))
            .unwrap_or_default();

        non_empty_completion("Groq", content)
    }

    fn name(&self) -> &str {
        "groq"
    }

    fn model_name(&self) -> &str {
        &self.model
    }
}
