//! Settings configuration loaded from TOML files.
//!
//! This module handles non-sensitive configuration stored in TOML format
//! in the XDG config directory (~/.config/docquery/config.toml).

use std::fs;
use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};

/// Default TOML configuration file content
const DEFAULT_CONFIG_TOML: &str = r#"# docquery configuration file
# Located at: ~/.config/docquery/config.toml
#
# This file contains non-sensitive configuration.
# Secrets are loaded from environment variables:
#   - OPENROUTER_API_KEY
#   - DOCQUERY_API_TOKEN (bearer token for the HTTP API)

[gateway]
host = "127.0.0.1"
port = 8000

[logging]
level = "info"

[llm]
model = "google/gemini-flash-1.5"
# base_url = "https://openrouter.ai/api/v1"
# http_referer = "https://example.com"
# app_name = "docquery"
max_tokens = 1024
timeout_seconds = 30

[fetch]
timeout_seconds = 30
max_bytes = 52428800

[knowledge]
embedding_backend = "ollama"
embedding_url = "http://127.0.0.1:11434"
embedding_model = "all-minilm"
embedding_batch = 32
chunk_size = 500
chunk_overlap = 100
top_k = 7
corpus_dir = "data/base_knowledge"
store_dir = "data/vector_store"
base_name = "base_knowledge"
"#;

/// Settings loaded from TOML configuration file.
#[derive(Debug, Clone, Default, Deserialize, Serialize)]
pub struct Settings {
    /// HTTP server configuration
    #[serde(default)]
    pub gateway: GatewaySettings,

    /// Logging configuration
    #[serde(default)]
    pub logging: LoggingSettings,

    /// Answer-generation model settings
    #[serde(default)]
    pub llm: LlmSettings,

    /// Document download settings
    #[serde(default)]
    pub fetch: FetchSettings,

    /// Retrieval overrides (resolved into `KnowledgeSettings`)
    #[serde(default)]
    pub knowledge: KnowledgeOverrides,
}

/// HTTP server settings
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct GatewaySettings {
    /// Host to bind to
    #[serde(default = "default_gateway_host")]
    pub host: String,

    /// Port to listen on
    #[serde(default = "default_gateway_port")]
    pub port: u16,
}

/// Logging settings
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct LoggingSettings {
    /// Log level (error, warn, info, debug, trace), overridden by RUST_LOG
    #[serde(default = "default_log_level")]
    pub level: String,
}

/// Answer-generation model settings
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct LlmSettings {
    /// Model identifier sent to the chat completions endpoint
    #[serde(default = "default_llm_model")]
    pub model: String,

    /// Base URL of the OpenAI-compatible API (defaults to OpenRouter)
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub base_url: Option<String>,

    /// HTTP Referer header for OpenRouter rankings
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub http_referer: Option<String>,

    /// App name for OpenRouter rankings
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub app_name: Option<String>,

    /// Completion token cap per answer
    #[serde(default = "default_llm_max_tokens")]
    pub max_tokens: u32,

    /// Per-answer timeout in seconds
    #[serde(default = "default_llm_timeout_seconds")]
    pub timeout_seconds: u64,
}

/// Document download settings
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct FetchSettings {
    /// Request timeout in seconds
    #[serde(default = "default_fetch_timeout_seconds")]
    pub timeout_seconds: u64,

    /// Largest accepted document body in bytes
    #[serde(default = "default_fetch_max_bytes")]
    pub max_bytes: usize,
}

/// User-facing retrieval overrides; every field falls back to a default.
#[derive(Debug, Clone, Default, Deserialize, Serialize)]
pub struct KnowledgeOverrides {
    /// "ollama" (HTTP) or "hashed" (offline, deterministic)
    pub embedding_backend: Option<String>,

    /// Embedding provider base URL
    pub embedding_url: Option<String>,

    /// Embedding model name
    pub embedding_model: Option<String>,

    /// Embedding dimension (if known)
    pub embedding_dim: Option<usize>,

    /// Embedding batch size
    pub embedding_batch: Option<usize>,

    /// Chunk window in characters
    pub chunk_size: Option<usize>,

    /// Characters shared by consecutive chunks
    pub chunk_overlap: Option<usize>,

    /// Chunks retrieved per question
    pub top_k: Option<usize>,

    /// Directory of source documents for the offline builder
    pub corpus_dir: Option<String>,

    /// Directory holding the persisted index and cache files
    pub store_dir: Option<String>,

    /// Shared base name of the persisted index files
    pub base_name: Option<String>,
}

fn default_gateway_host() -> String {
    "127.0.0.1".to_string()
}

fn default_gateway_port() -> u16 {
    8000
}

fn default_log_level() -> String {
    "info".to_string()
}

fn default_llm_model() -> String {
    "google/gemini-flash-1.5".to_string()
}

fn default_llm_max_tokens() -> u32 {
    1024
}

fn default_llm_timeout_seconds() -> u64 {
    30
}

fn default_fetch_timeout_seconds() -> u64 {
    30
}

fn default_fetch_max_bytes() -> usize {
    50 * 1024 * 1024
}

impl Default for GatewaySettings {
    fn default() -> Self {
        Self {
            host: default_gateway_host(),
            port: default_gateway_port(),
        }
    }
}

impl Default for LoggingSettings {
    fn default() -> Self {
        Self {
            level: default_log_level(),
        }
    }
}

impl Default for LlmSettings {
    fn default() -> Self {
        Self {
            model: default_llm_model(),
            base_url: None,
            http_referer: None,
            app_name: None,
            max_tokens: default_llm_max_tokens(),
            timeout_seconds: default_llm_timeout_seconds(),
        }
    }
}

impl Default for FetchSettings {
    fn default() -> Self {
        Self {
            timeout_seconds: default_fetch_timeout_seconds(),
            max_bytes: default_fetch_max_bytes(),
        }
    }
}

/// Errors that can occur when loading settings
#[derive(Debug, thiserror::Error)]
pub enum SettingsError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("TOML parse error: {0}")]
    Parse(#[from] toml::de::Error),

    #[error("Config directory not found")]
    ConfigDirNotFound,
}

impl Settings {
    /// Load settings from the TOML configuration file.
    ///
    /// If the config file doesn't exist, creates it with default values.
    pub fn load() -> Result<Self, SettingsError> {
        let config_path = Self::config_path()?;

        if !config_path.exists() {
            tracing::info!("Creating default configuration at {:?}", config_path);
            Self::create_default_config(&config_path)?;
        }

        let content = fs::read_to_string(&config_path)?;
        Self::from_toml(&content)
    }

    /// Parse settings from TOML content.
    pub fn from_toml(content: &str) -> Result<Self, SettingsError> {
        let settings: Self = toml::from_str(content)?;
        Ok(settings)
    }

    /// Get the configuration file path.
    ///
    /// Uses `DOCQUERY_CONFIG_DIR` when set, otherwise the XDG config
    /// directory: `~/.config/docquery/config.toml`
    pub fn config_path() -> Result<PathBuf, SettingsError> {
        if let Ok(override_dir) = std::env::var("DOCQUERY_CONFIG_DIR") {
            let dir = PathBuf::from(override_dir);
            return Ok(dir.join("config.toml"));
        }

        let config_dir = dirs::config_dir()
            .ok_or(SettingsError::ConfigDirNotFound)?
            .join("docquery");

        Ok(config_dir.join("config.toml"))
    }

    fn create_default_config(path: &Path) -> Result<(), SettingsError> {
        if let Some(parent) = path.parent() {
            fs::create_dir_all(parent)?;
        }
        fs::write(path, DEFAULT_CONFIG_TOML)?;
        Ok(())
    }

    /// Get the HTTP bind address.
    pub fn bind_addr(&self) -> String {
        format!("{}:{}", self.gateway.host, self.gateway.port)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::Mutex;

    static ENV_MUTEX: Mutex<()> = Mutex::new(());

    #[test]
    fn test_default_settings() {
        let settings = Settings::default();
        assert_eq!(settings.gateway.host, "127.0.0.1");
        assert_eq!(settings.gateway.port, 8000);
        assert_eq!(settings.logging.level, "info");
        assert_eq!(settings.llm.timeout_seconds, 30);
        assert!(settings.llm.base_url.is_none());
        assert!(settings.knowledge.top_k.is_none());
    }

    #[test]
    fn test_default_toml_parses() {
        let settings = Settings::from_toml(DEFAULT_CONFIG_TOML).unwrap();
        assert_eq!(settings.llm.model, "google/gemini-flash-1.5");
        assert_eq!(settings.fetch.max_bytes, 52_428_800);
        assert_eq!(settings.knowledge.embedding_backend.as_deref(), Some("ollama"));
        assert_eq!(settings.knowledge.chunk_size, Some(500));
        assert_eq!(settings.knowledge.chunk_overlap, Some(100));
        assert_eq!(settings.knowledge.top_k, Some(7));
    }

    #[test]
    fn test_from_toml_partial() {
        let toml = r#"
[gateway]
port = 9100

[llm]
model = "openai/gpt-4o-mini"
"#;
        let settings = Settings::from_toml(toml).unwrap();
        assert_eq!(settings.gateway.host, "127.0.0.1");
        assert_eq!(settings.gateway.port, 9100);
        assert_eq!(settings.llm.model, "openai/gpt-4o-mini");
        assert_eq!(settings.llm.max_tokens, 1024);
        assert_eq!(settings.bind_addr(), "127.0.0.1:9100");
    }

    #[test]
    fn test_load_creates_default_file() {
        let _lock = ENV_MUTEX.lock().unwrap();
        let temp = tempfile::TempDir::new().unwrap();
        let dir = temp.path().join("nested");
        unsafe { std::env::set_var("DOCQUERY_CONFIG_DIR", &dir) };

        let settings = Settings::load().unwrap();
        assert_eq!(settings.llm.model, "google/gemini-flash-1.5");
        assert_eq!(
            fs::read_to_string(dir.join("config.toml")).unwrap(),
            DEFAULT_CONFIG_TOML
        );

        unsafe { std::env::remove_var("DOCQUERY_CONFIG_DIR") };
    }

    #[test]
    fn test_config_path_uses_env_override() {
        let _lock = ENV_MUTEX.lock().unwrap();
        unsafe { std::env::set_var("DOCQUERY_CONFIG_DIR", "/tmp/docquery-test-config") };

        let path = Settings::config_path().unwrap();
        assert_eq!(path, PathBuf::from("/tmp/docquery-test-config/config.toml"));

        unsafe { std::env::remove_var("DOCQUERY_CONFIG_DIR") };
    }
}
