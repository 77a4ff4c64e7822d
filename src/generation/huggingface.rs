/// Hugging Face Inference API provider
///
/// POSTs an instruction-wrapped prompt to {base_url}/{model}.
/// The API answers with either `[{"generated_text": ...}]`, `{"generated_text": ...}`
/// or `{"error": ...}` (e.g. while the model is loading).

use std::time::Duration;

use async_trait::async_trait;
use serde::Serialize;
use serde_json::Value;

use super::{non_empty_completion, ProviderError, TextProvider};

#[derive(Serialize)]
struct InferenceRequest {
    inputs: String,
    parameters: InferenceParameters,
}

#[derive(Serialize)]
struct InferenceParameters {
    max_new_tokens: u32,
    temperature: f32,
    return_full_text: bool,
}

/// Hugging Face-backed provider (text-generation inference).
pub struct HuggingFaceProvider {
    client: reqwest::Client,
    base_url: String,
    api_key: String,
    model: String,
    max_tokens: u32,
}

impl HuggingFaceProvider {
    /// Create a new HuggingFaceProvider.
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
                "Hugging Face API key is empty. Set HUGGINGFACE_API_KEY or providers.huggingface_api_key"
                    .to_string(),
            ));
        }

        let client = reqwest::Client::builder()
            .timeout(timeout)
            .build()
            .map_err(|e| ProviderError::NotConfigured(format!("Failed to create HTTP client: {}", e)))?;

        Ok(HuggingFaceProvider {
            client,
            base_url: base_url.trim_end_matches('/').to_string(),
            api_key,
            model,
            max_tokens,
        })
    }
}

/// Wrap system and user text in the Mistral instruction format.
fn instruction_input(system: &str, prompt: &str) -> String {
    format!("<s>[INST] {}\n\n{} [/INST]", system, prompt)
}

/// Pull the generated text out of either response shape.
fn generated_text(body: &Value) -> Result<String, ProviderError> {
    if let Some(error) = body.get("error") {
        let message = error
            .as_str()
            .map(str::to_string)
            .unwrap_or_else(|| error.to_string());
        return Err(ProviderError::Generation(format!("Hugging Face error: {}", message)));
    }

    let text = match body {
        Value::Array(items) => items
            .first()
            .and_then(|item| item.get("generated_text"))
            .and_then(Value::as_str),
        Value::Object(_) => body.get("generated_text").and_then(Value::as_str),
        _ => None,
    };

    Ok(text.unwrap_or_default().to_string())
}

#[async_trait]
impl TextProvider for HuggingFaceProvider {
    async fn complete(&self, system: &str, prompt: &str) -> Result<String, ProviderError> {
        let request = InferenceRequest {
            inputs: instruction_input(system, prompt),
            parameters: InferenceParameters {
                max_new_tokens: self.max_tokens,
                temperature: 0.7,
                return_full_text: false,
            },
        };

        let url = format!("{}/{}", self.base_url, self.model);

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

        let body: Value = response.json().await.map_err(|e| {
            ProviderError::Generation(format!("Failed to parse Hugging Face response: {}", e))
        })?;

        non_empty_completion("Hugging Face", generated_text(&body)?)
    }

    fn name(&self) -> &str {
        "huggingface"
    }

    fn model_name(&self) -> &str {
        &self.model
    }
}
