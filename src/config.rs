/// Configuration management using figment
///
/// Loads configuration with this precedence (highest wins):
/// 1. Defaults (hardcoded)
/// 2. TOML file: infoquest.toml (in working directory)
/// 3. Environment variables: prefixed INFOQUEST_, nested with `__`
///    (e.g., INFOQUEST_PROVIDERS__GROQ_API_KEY=...)
///
/// The bare GROQ_API_KEY, HUGGINGFACE_API_KEY and PEXELS_API_KEY variables fill
/// any credential that is still unset after the merge.

use std::path::PathBuf;

use figment::{
    Figment,
    providers::{Env, Format, Toml, Serialized},
};
use serde::{Deserialize, Serialize};
use crate::errors::AppError;

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Config {
    /// Log level: trace, debug, info, warn, error
    #[serde(default = "default_log_level")]
    pub log_level: String,

    #[serde(default)]
    pub server: ServerConfig,

    #[serde(default)]
    pub providers: ProvidersConfig,

    #[serde(default)]
    pub search: SearchConfig,

    #[serde(default)]
    pub storage: StorageConfig,
}

/// HTTP listener settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ServerConfig {
    #[serde(default = "default_bind_addr")]
    pub bind_addr: String,

    /// CORS origins. Empty means any origin is allowed.
    #[serde(default)]
    pub allowed_origins: Vec<String>,
}

/// Text-generation provider credentials and endpoints.
///
/// Groq is the primary provider and Hugging Face the secondary. Either key may be
/// absent; with neither configured the service answers from search results only.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ProvidersConfig {
    #[serde(default)]
    pub groq_api_key: Option<String>,

    /// OpenAI-compatible base URL (chat completions live at {base}/chat/completions)
    #[serde(default = "default_groq_base_url")]
    pub groq_base_url: String,

    #[serde(default = "default_groq_model")]
    pub groq_model: String,

    #[serde(default)]
    pub huggingface_api_key: Option<String>,

    /// Inference API base URL (the model id is appended as a path)
    #[serde(default = "default_huggingface_base_url")]
    pub huggingface_base_url: String,

    #[serde(default = "default_huggingface_model")]
    pub huggingface_model: String,

    #[serde(default = "default_max_tokens")]
    pub max_tokens: u32,

    #[serde(default = "default_request_timeout_secs")]
    pub request_timeout_secs: u64,
}

/// Web-search and image-search collaborators.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SearchConfig {
    #[serde(default = "default_duckduckgo_base_url")]
    pub duckduckgo_base_url: String,

    /// Number of search results rendered into the generation context
    #[serde(default = "default_max_context_results")]
    pub max_context_results: usize,

    /// Number of search results returned to the client as resources
    #[serde(default = "default_max_resources")]
    pub max_resources: usize,

    #[serde(default)]
    pub pexels_api_key: Option<String>,

    #[serde(default = "default_pexels_base_url")]
    pub pexels_base_url: String,

    #[serde(default = "default_image_count")]
    pub image_count: usize,
}

/// Local persistence for history, bookmarks, collections and study data.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct StorageConfig {
    /// Store file path. Defaults to <data dir>/infoquest/store.json.
    #[serde(default)]
    pub path: Option<String>,
}

fn default_log_level() -> String {
    "info".to_string()
}

fn default_bind_addr() -> String {
    "127.0.0.1:3000".to_string()
}

fn default_groq_base_url() -> String {
    "https://api.groq.com/openai/v1".to_string()
}

fn default_groq_model() -> String {
    "llama-3.1-8b-instant".to_string()
}

fn default_huggingface_base_url() -> String {
    "https://api-inference.huggingface.co/models".to_string()
}

fn default_huggingface_model() -> String {
    "mistralai/Mistral-7B-Instruct-v0.2".to_string()
}

fn default_max_tokens() -> u32 {
    2048
}

fn default_request_timeout_secs() -> u64 {
    30
}

fn default_duckduckgo_base_url() -> String {
    "https://api.duckduckgo.com".to_string()
}

fn default_max_context_results() -> usize {
    10
}

fn default_max_resources() -> usize {
    8
}

fn default_pexels_base_url() -> String {
    "https://api.pexels.com".to_string()
}

fn default_image_count() -> usize {
    6
}

impl Default for ServerConfig {
    fn default() -> Self {
        ServerConfig {
            bind_addr: default_bind_addr(),
            allowed_origins: Vec::new(),
        }
    }
}

impl Default for ProvidersConfig {
    fn default() -> Self {
        ProvidersConfig {
            groq_api_key: None,
            groq_base_url: default_groq_base_url(),
            groq_model: default_groq_model(),
            huggingface_api_key: None,
            huggingface_base_url: default_huggingface_base_url(),
            huggingface_model: default_huggingface_model(),
            max_tokens: default_max_tokens(),
            request_timeout_secs: default_request_timeout_secs(),
        }
    }
}

impl Default for SearchConfig {
    fn default() -> Self {
        SearchConfig {
            duckduckgo_base_url: default_duckduckgo_base_url(),
            max_context_results: default_max_context_results(),
            max_resources: default_max_resources(),
            pexels_api_key: None,
            pexels_base_url: default_pexels_base_url(),
            image_count: default_image_count(),
        }
    }
}

impl Default for Config {
    fn default() -> Self {
        Config {
            log_level: default_log_level(),
            server: ServerConfig::default(),
            providers: ProvidersConfig::default(),
            search: SearchConfig::default(),
            storage: StorageConfig::default(),
        }
    }
}

impl Config {
    /// Load configuration from defaults, TOML file, and environment variables
    ///
    /// Environment variables override TOML file values.
    /// Example: INFOQUEST_LOG_LEVEL=debug overrides log_level in infoquest.toml
    pub fn load() -> Result<Config, AppError> {
        let mut config: Config = Figment::new()
            .merge(Serialized::defaults(Config::default()))
            .merge(Toml::file("infoquest.toml"))
            .merge(Env::prefixed("INFOQUEST_").split("__"))
            .extract()
            .map_err(|e| AppError::Config(format!("Failed to load config: {}", e)))?;

        config.apply_credential_fallbacks(|name| std::env::var(name).ok());
        Ok(config)
    }

    /// Fill unset credentials from the conventional bare variable names.
    fn apply_credential_fallbacks(&mut self, lookup: impl Fn(&str) -> Option<String>) {
        fn fill(slot: &mut Option<String>, value: Option<String>) {
            let is_unset = slot.as_deref().map_or(true, |s| s.trim().is_empty());
            if is_unset {
                if let Some(v) = value.filter(|v| !v.trim().is_empty()) {
                    *slot = Some(v);
                }
            }
        }

        fill(&mut self.providers.groq_api_key, lookup("GROQ_API_KEY"));
        fill(&mut self.providers.huggingface_api_key, lookup("HUGGINGFACE_API_KEY"));
        fill(&mut self.search.pexels_api_key, lookup("PEXELS_API_KEY"));
    }

    /// Resolve the store file path, falling back to the platform data directory.
    pub fn storage_path(&self) -> PathBuf {
        match &self.storage.path {
            Some(path) => PathBuf::from(path),
            None => dirs::data_dir()
                .unwrap_or_else(|| PathBuf::from("."))
                .join("infoquest")
                .join("store.json"),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_config_defaults() {
        let config = Config::default();
        assert_eq!(config.log_level, "info");
        assert_eq!(config.server.bind_addr, "127.0.0.1:3000");
        assert_eq!(config.providers.groq_model, "llama-3.1-8b-instant");
        assert_eq!(config.providers.groq_api_key, None);
        assert_eq!(config.search.max_resources, 8);
        assert_eq!(config.search.max_context_results, 10);
        assert_eq!(config.search.image_count, 6);
    }

    #[test]
    fn test_credential_fallbacks_fill_only_unset() {
        let mut config = Config::default();
        config.providers.groq_api_key = Some("from-toml".to_string());

        config.apply_credential_fallbacks(|name| match name {
            "GROQ_API_KEY" => Some("from-env".to_string()),
            "HUGGINGFACE_API_KEY" => Some("hf-key".to_string()),
            "PEXELS_API_KEY" => Some("   ".to_string()),
            _ => None,
        });

        assert_eq!(config.providers.groq_api_key.as_deref(), Some("from-toml"));
        assert_eq!(config.providers.huggingface_api_key.as_deref(), Some("hf-key"));
        assert_eq!(config.search.pexels_api_key, None);
    }

    #[test]
    fn test_storage_path_override() {
        let mut config = Config::default();
        config.storage.path = Some("/tmp/iq/store.json".to_string());
        assert_eq!(config.storage_path(), PathBuf::from("/tmp/iq/store.json"));
    }
}
