use std::env;
use std::path::PathBuf;

use thiserror::Error;

const DEFAULT_EMBEDDING_BASE_URL: &str = "http://127.0.0.1:8090";
const DEFAULT_EMBEDDING_MODEL: &str = "all-minilm-l6-v2";
const DEFAULT_EMBEDDING_FALLBACK_MODEL: &str = "sentence-transformers/all-minilm-l6-v2";
const DEFAULT_COMPLETION_BASE_URL: &str = "https://api.mistral.ai";
const DEFAULT_COMPLETION_MODEL: &str = "mistral-small-latest";

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("missing required environment variable: {0}")]
    MissingVar(&'static str),
}

/// Environment-driven configuration, validated once at startup.
///
/// The vector store credentials are the only hard requirement; every
/// completion-side credential is optional and its absence selects a
/// documented degraded mode instead of failing requests.
#[derive(Debug, Clone)]
pub struct AppConfig {
    /// Supabase-style vector store base URL.
    pub vector_store_url: String,
    /// Vector store service key.
    pub vector_store_key: String,

    /// Base URL of the OpenAI-compatible embedding server.
    pub embedding_base_url: String,
    pub embedding_api_key: Option<String>,
    /// Primary embedding model identifier.
    pub embedding_model: String,
    /// Fallback model probed when the primary fails to load.
    pub embedding_fallback_model: String,

    /// Completion API key. `None` degrades synthesis to retrieval-only.
    pub completion_api_key: Option<String>,
    pub completion_base_url: String,
    pub completion_model: String,

    /// News API key for the proxy endpoint. Optional.
    pub news_api_key: Option<String>,

    pub documents_dir: PathBuf,
    pub log_dir: PathBuf,
}

impl AppConfig {
    pub fn from_env() -> Result<Self, ConfigError> {
        let vector_store_url = require("SUPABASE_URL")?;
        let vector_store_key = require("SUPABASE_KEY")?;

        Ok(AppConfig {
            vector_store_url: vector_store_url.trim_end_matches('/').to_string(),
            vector_store_key,
            embedding_base_url: optional("EMBEDDING_BASE_URL")
                .unwrap_or_else(|| DEFAULT_EMBEDDING_BASE_URL.to_string()),
            embedding_api_key: optional("EMBEDDING_API_KEY"),
            embedding_model: optional("EMBEDDING_MODEL")
                .unwrap_or_else(|| DEFAULT_EMBEDDING_MODEL.to_string()),
            embedding_fallback_model: optional("EMBEDDING_FALLBACK_MODEL")
                .unwrap_or_else(|| DEFAULT_EMBEDDING_FALLBACK_MODEL.to_string()),
            completion_api_key: optional("MISTRAL_API_KEY"),
            completion_base_url: optional("MISTRAL_BASE_URL")
                .unwrap_or_else(|| DEFAULT_COMPLETION_BASE_URL.to_string()),
            completion_model: optional("MISTRAL_MODEL")
                .unwrap_or_else(|| DEFAULT_COMPLETION_MODEL.to_string()),
            news_api_key: optional("NEWS_API_KEY"),
            documents_dir: optional("DOCUMENTS_DIR")
                .map(PathBuf::from)
                .unwrap_or_else(|| PathBuf::from("public").join("documents")),
            log_dir: optional("LOG_DIR")
                .map(PathBuf::from)
                .unwrap_or_else(|| PathBuf::from("logs")),
        })
    }
}

fn require(name: &'static str) -> Result<String, ConfigError> {
    optional(name).ok_or(ConfigError::MissingVar(name))
}

fn optional(name: &str) -> Option<String> {
    match env::var(name) {
        Ok(val) if !val.trim().is_empty() => Some(val),
        _ => None,
    }
}
