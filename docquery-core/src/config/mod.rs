//! Configuration management for docquery.
//!
//! This module provides a unified configuration system that separates
//! secrets (from environment variables) from settings (from TOML files).
//!
//! # Configuration Sources
//!
//! ## Secrets (Environment Variables)
//! - `OPENROUTER_API_KEY` - answer-generation API key
//! - `DOCQUERY_API_TOKEN` - bearer token expected by the HTTP API
//!
//! ## Settings (TOML File)
//! Located at `~/.config/docquery/config.toml`:
//! ```toml
//! [gateway]
//! host = "127.0.0.1"
//! port = 8000
//!
//! [llm]
//! model = "google/gemini-flash-1.5"
//!
//! [knowledge]
//! embedding_model = "all-minilm"
//! top_k = 7
//! ```

pub mod knowledge;
mod secrets;
mod settings;

pub use knowledge::KnowledgeSettings;
pub use secrets::{Secrets, SecretsError};
pub use settings::{
    FetchSettings, GatewaySettings, KnowledgeOverrides, LlmSettings, LoggingSettings, Settings,
    SettingsError,
};

/// Combined configuration containing both secrets and settings.
#[derive(Debug, Clone)]
pub struct Config {
    /// Secrets loaded from environment variables
    pub secrets: Secrets,
    /// Settings loaded from TOML configuration file
    pub settings: Settings,
}

/// Errors that can occur when loading configuration
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("Secrets error: {0}")]
    Secrets(#[from] SecretsError),

    #[error("Settings error: {0}")]
    Settings(#[from] SettingsError),

    #[error("LLM model is not set in [llm]")]
    ModelNotSet,
}

impl Config {
    /// Load configuration from all sources.
    ///
    /// This loads:
    /// 1. Secrets from environment variables
    /// 2. Settings from TOML file (creating defaults if needed)
    ///
    /// # Errors
    ///
    /// Returns an error if the OpenRouter key is missing, the TOML file
    /// cannot be read or parsed, or no answer model is configured.
    pub fn load() -> Result<Self, ConfigError> {
        let secrets = Secrets::from_env()?;
        let settings = Settings::load()?;
        Self::from_parts(secrets, settings)
    }

    /// Validate and combine already-loaded parts.
    pub fn from_parts(secrets: Secrets, settings: Settings) -> Result<Self, ConfigError> {
        if settings.llm.model.trim().is_empty() {
            return Err(ConfigError::ModelNotSet);
        }
        Ok(Self { secrets, settings })
    }

    /// Resolved knowledge settings (defaults filled in).
    pub fn knowledge_settings(&self) -> KnowledgeSettings {
        KnowledgeSettings::from(&self.settings.knowledge)
    }

    /// Get the HTTP bind address.
    pub fn bind_addr(&self) -> String {
        self.settings.bind_addr()
    }

    /// Get the OpenRouter API key.
    pub fn openrouter_api_key(&self) -> &str {
        &self.secrets.openrouter_api_key
    }

    /// Get the API bearer token (if configured).
    pub fn api_token(&self) -> Option<&str> {
        self.secrets.api_token.as_deref()
    }
}

/// Load .env file if it exists (for development convenience).
///
/// This is called automatically by `Config::load()` but is also
/// exported for use in other contexts.
pub fn load_dotenv() {
    let _ = dotenvy::dotenv();
}

#[cfg(test)]
mod tests {
    use super::*;

    fn secrets() -> Secrets {
        Secrets {
            openrouter_api_key: "sk-or-test".to_string(),
            api_token: Some("token".to_string()),
        }
    }

    #[test]
    fn test_from_parts_requires_model() {
        let mut settings = Settings::default();
        settings.llm.model = "  ".to_string();

        let result = Config::from_parts(secrets(), settings);
        assert!(matches!(result, Err(ConfigError::ModelNotSet)));
    }

    #[test]
    fn test_knowledge_settings_resolved_from_overrides() {
        let mut settings = Settings::default();
        settings.knowledge.top_k = Some(3);
        settings.knowledge.chunk_size = Some(800);

        let config = Config::from_parts(secrets(), settings).unwrap();
        let knowledge = config.knowledge_settings();
        assert_eq!(knowledge.top_k, 3);
        assert_eq!(knowledge.chunk_size, 800);
        assert_eq!(knowledge.chunk_overlap, 100);
        assert_eq!(config.api_token(), Some("token"));
        assert_eq!(config.openrouter_api_key(), "sk-or-test");
    }
}
