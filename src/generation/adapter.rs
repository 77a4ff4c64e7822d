/// Provider adapter: primary/secondary selection and the single fallback hop.
///
/// The primary is always attempted first and must be observed to fail before the
/// secondary is tried. Providers are billed resources, so calls are never raced.

use std::sync::Arc;
use std::time::Duration;

use thiserror::Error;

use super::groq::GroqProvider;
use super::huggingface::HuggingFaceProvider;
use super::{build_study_prompt, Difficulty, ProviderError, TextProvider, SYSTEM_PROMPT};
use crate::config::ProvidersConfig;

/// Longest topic passed to a provider, in characters.
pub const MAX_TOPIC_CHARS: usize = 200;

/// Why the adapter produced no text. Both outcomes are handled by the caller.
#[derive(Debug, Error)]
pub enum AdapterFailure {
    #[error("No text-generation provider is configured")]
    NoProviderConfigured,

    #[error("All configured providers failed; last error: {cause}")]
    AllProvidersFailed { cause: ProviderError },
}

/// Wraps up to two providers in priority order.
#[derive(Clone, Default)]
pub struct ProviderAdapter {
    primary: Option<Arc<dyn TextProvider>>,
    secondary: Option<Arc<dyn TextProvider>>,
}

impl ProviderAdapter {
    /// Build from explicit providers. A lone secondary is promoted to primary.
    pub fn new(
        primary: Option<Arc<dyn TextProvider>>,
        secondary: Option<Arc<dyn TextProvider>>,
    ) -> Self {
        match (primary, secondary) {
            (None, secondary) => ProviderAdapter {
                primary: secondary,
                secondary: None,
            },
            (primary, secondary) => ProviderAdapter { primary, secondary },
        }
    }

    /// Build Groq (primary) and Hugging Face (secondary) from whichever keys are present.
    ///
    /// A provider whose construction fails is logged and left out.
    pub fn from_config(config: &ProvidersConfig) -> Self {
        let timeout = Duration::from_secs(config.request_timeout_secs);

        let groq = config.groq_api_key.clone().and_then(|key| {
            GroqProvider::new(
                config.groq_base_url.clone(),
                key,
                config.groq_model.clone(),
                config.max_tokens,
                timeout,
            )
            .map_err(|e| tracing::warn!(error = %e, "Groq provider disabled"))
            .ok()
            .map(|p| Arc::new(p) as Arc<dyn TextProvider>)
        });

        let huggingface = config.huggingface_api_key.clone().and_then(|key| {
            HuggingFaceProvider::new(
                config.huggingface_base_url.clone(),
                key,
                config.huggingface_model.clone(),
                config.max_tokens,
                timeout,
            )
            .map_err(|e| tracing::warn!(error = %e, "Hugging Face provider disabled"))
            .ok()
            .map(|p| Arc::new(p) as Arc<dyn TextProvider>)
        });

        ProviderAdapter::new(groq, huggingface)
    }

    /// True when at least one provider is available.
    pub fn is_configured(&self) -> bool {
        self.primary.is_some()
    }

    /// Names of the configured providers in call order.
    pub fn provider_names(&self) -> Vec<String> {
        self.primary
            .iter()
            .chain(self.secondary.iter())
            .map(|p| p.name().to_string())
            .collect()
    }

    /// Generate raw study-content text for a topic.
    pub async fn generate(
        &self,
        topic: &str,
        context: &str,
        difficulty: Difficulty,
    ) -> Result<String, AdapterFailure> {
        let Some(primary) = &self.primary else {
            return Err(AdapterFailure::NoProviderConfigured);
        };

        let topic = bounded_topic(topic);
        let prompt = build_study_prompt(&topic, context, difficulty);

        let primary_error = match primary.complete(SYSTEM_PROMPT, &prompt).await {
            Ok(text) => {
                tracing::debug!(provider = primary.name(), model = primary.model_name(), "Generation succeeded");
                return Ok(text);
            }
            Err(e) => {
                tracing::warn!(provider = primary.name(), error = %e, "Primary provider failed");
                e
            }
        };

        let Some(secondary) = &self.secondary else {
            return Err(AdapterFailure::AllProvidersFailed { cause: primary_error });
        };

        match secondary.complete(SYSTEM_PROMPT, &prompt).await {
            Ok(text) => {
                tracing::info!(provider = secondary.name(), model = secondary.model_name(), "Secondary provider succeeded");
                Ok(text)
            }
            Err(e) => {
                tracing::warn!(provider = secondary.name(), error = %e, "Secondary provider failed");
                Err(AdapterFailure::AllProvidersFailed { cause: e })
            }
        }
    }
}

/// Trim and cap a topic to `MAX_TOPIC_CHARS` characters.
pub fn bounded_topic(topic: &str) -> String {
    topic.trim().chars().take(MAX_TOPIC_CHARS).collect::<String>().trim_end().to_string()
}

#[cfg(test)]
mod tests {
    use super::*;
    use async_trait::async_trait;
    use std::sync::atomic::{AtomicUsize, Ordering};
    use std::sync::Mutex;

    /// Scripted provider that records every prompt it receives.
    struct FakeProvider {
        name: &'static str,
        reply: Result<&'static str, u16>,
        calls: AtomicUsize,
        prompts: Mutex<Vec<String>>,
    }

    impl FakeProvider {
        fn ok(name: &'static str, text: &'static str) -> Arc<Self> {
            Arc::new(FakeProvider {
                name,
                reply: Ok(text),
                calls: AtomicUsize::new(0),
                prompts: Mutex::new(Vec::new()),
            })
        }

        fn failing(name: &'static str, status: u16) -> Arc<Self> {
            Arc::new(FakeProvider {
                name,
                reply: Err(status),
                calls: AtomicUsize::new(0),
                prompts: Mutex::new(Vec::new()),
            })
        }

        fn calls(&self) -> usize {
            self.calls.load(Ordering::SeqCst)
        }
    }

    #[async_trait]
    impl TextProvider for FakeProvider {
        async fn complete(&self, _system: &str, prompt: &str) -> Result<String, ProviderError> {
            self.calls.fetch_add(1, Ordering::SeqCst);
            self.prompts.lock().unwrap().push(prompt.to_string());
            match self.reply {
                Ok(text) => Ok(text.to_string()),
                Err(status) => Err(ProviderError::Api {
                    status,
                    message: format!("{} failed", self.name),
                }),
            }
        }

        fn name(&self) -> &str {
            self.name
        }

        fn model_name(&self) -> &str {
            "fake-model"
        }
    }

    #[tokio::test]
    async fn test_no_provider_configured() {
        let adapter = ProviderAdapter::default();
        assert!(!adapter.is_configured());
        let err = adapter.generate("Nebulae", "", Difficulty::Medium).await.unwrap_err();
        assert!(matches!(err, AdapterFailure::NoProviderConfigured));
    }

    #[tokio::test]
    async fn test_primary_success_skips_secondary() {
        let primary = FakeProvider::ok("primary", "{\"briefAnswer\": \"p\"}");
        let secondary = FakeProvider::ok("secondary", "{}");
        let adapter = ProviderAdapter::new(Some(primary.clone()), Some(secondary.clone()));

        let text = adapter.generate("Tides", "", Difficulty::Simple).await.unwrap();
        assert_eq!(text, "{\"briefAnswer\": \"p\"}");
        assert_eq!(primary.calls(), 1);
        assert_eq!(secondary.calls(), 0);
    }

    #[tokio::test]
    async fn test_primary_failure_falls_back_to_secondary() {
        let primary = FakeProvider::failing("primary", 503);
        let secondary = FakeProvider::ok("secondary", "from secondary");
        let adapter = ProviderAdapter::new(Some(primary.clone()), Some(secondary.clone()));

        let text = adapter.generate("Tides", "ctx", Difficulty::Medium).await.unwrap();
        assert_eq!(text, "from secondary");
        assert_eq!(primary.calls(), 1);
        assert_eq!(secondary.calls(), 1);

        // Both providers see the same prompt.
        let p = primary.prompts.lock().unwrap().clone();
        let s = secondary.prompts.lock().unwrap().clone();
        assert_eq!(p, s);
    }

    #[tokio::test]
    async fn test_all_providers_failed_carries_last_error() {
        let primary = FakeProvider::failing("primary", 500);
        let secondary = FakeProvider::failing("secondary", 429);
        let adapter = ProviderAdapter::new(Some(primary), Some(secondary));

        match adapter.generate("Tides", "", Difficulty::Medium).await {
            Err(AdapterFailure::AllProvidersFailed { cause: ProviderError::Api { status, message } }) => {
                assert_eq!(status, 429);
                assert_eq!(message, "secondary failed");
            }
            other => panic!("unexpected result: {:?}", other.map(|_| ())),
        }
    }

    #[tokio::test]
    async fn test_single_failing_provider() {
        let adapter = ProviderAdapter::new(Some(FakeProvider::failing("only", 500)), None);
        let err = adapter.generate("Tides", "", Difficulty::Medium).await.unwrap_err();
        assert!(matches!(err, AdapterFailure::AllProvidersFailed { .. }));
    }

    #[tokio::test]
    async fn test_lone_secondary_is_promoted() {
        let secondary = FakeProvider::ok("secondary", "text");
        let adapter = ProviderAdapter::new(None, Some(secondary.clone()));
        assert!(adapter.is_configured());
        assert_eq!(adapter.provider_names(), vec!["secondary".to_string()]);
        assert_eq!(adapter.generate("x", "", Difficulty::Medium).await.unwrap(), "text");
    }

    #[tokio::test]
    async fn test_topic_is_trimmed_and_bounded() {
        let primary = FakeProvider::ok("primary", "ok");
        let adapter = ProviderAdapter::new(Some(primary.clone()), None);
        let long_topic = format!("  {}  ", "a".repeat(300));

        adapter.generate(&long_topic, "", Difficulty::Medium).await.unwrap();

        let prompt = primary.prompts.lock().unwrap()[0].clone();
        let expected = format!("Topic: \"{}\"", "a".repeat(MAX_TOPIC_CHARS));
        assert!(prompt.starts_with(&expected));
    }

    #[test]
    fn test_from_config_without_keys_is_unconfigured() {
        let adapter = ProviderAdapter::from_config(&ProvidersConfig::default());
        assert!(!adapter.is_configured());
    }

    #[test]
    fn test_from_config_orders_groq_first() {
        let mut config = ProvidersConfig::default();
        config.groq_api_key = Some("gsk_test".into());
        config.huggingface_api_key = Some("hf_test".into());
        let adapter = ProviderAdapter::from_config(&config);
        assert_eq!(adapter.provider_names(), vec!["groq".to_string(), "huggingface".to_string()]);
    }
}
