/// Text-generation provider trait and supporting types
///
/// Provides a pluggable interface over generative-text providers.
/// Supports Groq (OpenAI-compatible chat completions, primary) and the
/// Hugging Face Inference API (secondary). `adapter::ProviderAdapter` owns the
/// primary/secondary ordering and the fallback hop between them.

pub mod adapter;
pub mod groq;
pub mod huggingface;

use std::fmt;
use std::str::FromStr;

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use thiserror::Error;

pub use adapter::{AdapterFailure, ProviderAdapter};

/// Errors a single provider call can produce.
#[derive(Debug, Error)]
pub enum ProviderError {
    /// Network or transport failure
    #[error("HTTP request failed: {0}")]
    Request(String),

    /// API provider returned an HTTP error
    #[error("API error (status {status}): {message}")]
    Api { status: u16, message: String },

    /// Response received but unusable (provider-reported error, bad body, empty text)
    #[error("Generation error: {0}")]
    Generation(String),

    /// Provider not configured (e.g., missing API key)
    #[error("Provider not configured: {0}")]
    NotConfigured(String),
}

/// Reading-level hint injected into the prompt.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Difficulty {
    Simple,
    #[default]
    Medium,
    Advanced,
}

impl Difficulty {
    /// Instruction sentence for this level.
    pub fn instruction(self) -> &'static str {
        match self {
            Difficulty::Simple => {
                "Use very simple language. Explain like to a curious 10-year-old. Short sentences. Avoid jargon."
            }
            Difficulty::Medium => "Use clear, accessible language. Suitable for general adult audience.",
            Difficulty::Advanced => {
                "Use precise terminology. Include technical details and nuances. Suitable for experts."
            }
        }
    }

    /// Parse a hint, coercing anything unrecognized to `Medium`.
    pub fn coerce(value: Option<&str>) -> Difficulty {
        value
            .and_then(|v| v.trim().parse().ok())
            .unwrap_or_default()
    }
}

impl fmt::Display for Difficulty {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Difficulty::Simple => write!(f, "simple"),
            Difficulty::Medium => write!(f, "medium"),
            Difficulty::Advanced => write!(f, "advanced"),
        }
    }
}

impl FromStr for Difficulty {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "simple" => Ok(Difficulty::Simple),
            "medium" => Ok(Difficulty::Medium),
            "advanced" => Ok(Difficulty::Advanced),
            other => Err(format!("Unknown difficulty: {}", other)),
        }
    }
}

/// System instruction shared by every provider.
pub const SYSTEM_PROMPT: &str = "You are a knowledgeable, engaging information assistant. Provide accurate, comprehensive information.\n\
You MUST respond with ONLY a valid JSON object. No text before or after. No markdown code blocks.\n\
Required keys: briefAnswer (string), keyPoints (array of strings), overview (array of {subtopic, content}), flashcards (array of {front, back}).";

/// Build the user prompt for a topic.
///
/// The web context block is omitted entirely when no search results were found.
pub fn build_study_prompt(topic: &str, context: &str, difficulty: Difficulty) -> String {
    let context_block = if context.trim().is_empty() {
        String::new()
    } else {
        format!("Web context:\n{}\n", context.trim())
    };

    format!(
        "Topic: \"{topic}\"\n\
         {hint}\n\n\
         {context_block}\
         Return a JSON object with these exact keys:\n\
         - briefAnswer: 2-3 sentence summary (required)\n\
         - keyPoints: array of 4-6 strings\n\
         - overview: array of objects with \"subtopic\" and \"content\"\n\
         - flashcards: array of objects with \"front\" and \"back\"\n\
         - timeline: REQUIRED for historical topics, people, events, wars, revolutions, inventions, or anything with dates. \
         Array of 4-8 objects: {{\"date\":\"YYYY or YYYY-MM\",\"title\":\"Event name\",\"description\":\"Brief detail\"}}. \
         Include key milestones in chronological order. If not applicable, use [].\n\
         - didYouKnow: 3-5 fun facts (array of strings)\n\
         - mindMap: {{\"nodes\":[{{\"id\":\"1\",\"label\":\"Concept\"}}],\"connections\":[{{\"from\":\"1\",\"to\":\"2\"}}]}} - 5-8 nodes, 4-8 connections\n\n\
         Return ONLY valid JSON.",
        hint = difficulty.instruction(),
    )
}

/// Core trait for generative-text providers.
///
/// Implementations must be Send + Sync to support use in async contexts
/// and across thread boundaries (e.g., Arc<dyn TextProvider>).
#[async_trait]
pub trait TextProvider: Send + Sync {
    /// Generate raw text for a system instruction and user prompt.
    async fn complete(&self, system: &str, prompt: &str) -> Result<String, ProviderError>;

    /// Short provider name for logs (e.g., "groq").
    fn name(&self) -> &str;

    /// Return the model name identifier used by this provider.
    fn model_name(&self) -> &str;
}

/// Reject empty completions so the adapter can fall through to the next provider.
pub(crate) fn non_empty_completion(provider: &str, content: String) -> Result<String, ProviderError> {
    if content.trim().is_empty() {
        return Err(ProviderError::Generation(format!(
            "{} returned an empty completion",
            provider
        )));
    }
    Ok(content)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_difficulty_coercion() {
        assert_eq!(Difficulty::coerce(Some("simple")), Difficulty::Simple);
        assert_eq!(Difficulty::coerce(Some(" ADVANCED ")), Difficulty::Advanced);
        assert_eq!(Difficulty::coerce(Some("expert")), Difficulty::Medium);
        assert_eq!(Difficulty::coerce(None), Difficulty::Medium);
    }

    #[test]
    fn test_difficulty_instructions_are_distinct() {
        let hints = [
            Difficulty::Simple.instruction(),
            Difficulty::Medium.instruction(),
            Difficulty::Advanced.instruction(),
        ];
        assert_ne!(hints[0], hints[1]);
        assert_ne!(hints[1], hints[2]);
        assert_ne!(hints[0], hints[2]);
    }

    #[test]
    fn test_prompt_includes_topic_hint_and_context() {
        let prompt = build_study_prompt("Black holes", "1. Black hole\n   URL: x\n   snippet", Difficulty::Advanced);
        assert!(prompt.starts_with("Topic: \"Black holes\"\n"));
        assert!(prompt.contains(Difficulty::Advanced.instruction()));
        assert!(prompt.contains("Web context:\n1. Black hole"));
        assert!(prompt.contains("{\"date\":\"YYYY or YYYY-MM\""));
        assert!(prompt.ends_with("Return ONLY valid JSON."));
    }

    #[test]
    fn test_prompt_omits_empty_context() {
        let prompt = build_study_prompt("Tides", "   ", Difficulty::Medium);
        assert!(!prompt.contains("Web context"));
    }

    #[test]
    fn test_empty_completion_is_error() {
        assert!(non_empty_completion("groq", "  \n".to_string()).is_err());
        assert_eq!(non_empty_completion("groq", "{}".to_string()).unwrap(), "{}");
    }
}
