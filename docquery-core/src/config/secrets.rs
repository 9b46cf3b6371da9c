//! Secrets configuration loaded from environment variables only.
//!
//! API keys and tokens are never stored in the TOML settings file.

use std::env;

/// Secrets loaded exclusively from environment variables.
#[derive(Debug, Clone, Default)]
pub struct Secrets {
    /// OpenRouter API key (env: OPENROUTER_API_KEY)
    pub openrouter_api_key: String,

    /// Bearer token required on the HTTP API (env: DOCQUERY_API_TOKEN)
    pub api_token: Option<String>,
}

/// Errors that can occur when loading secrets
#[derive(Debug, thiserror::Error)]
pub enum SecretsError {
    #[error("Missing required secret: {0}")]
    MissingSecret(String),
}

impl Secrets {
    /// Load secrets from environment variables.
    ///
    /// This function also loads .env file if present (for development),
    /// but production should rely on actual environment variables.
    pub fn from_env() -> Result<Self, SecretsError> {
        let _ = dotenvy::dotenv();

        Self::from_env_inner()
    }

    /// Internal method to load from environment without loading .env
    pub(crate) fn from_env_inner() -> Result<Self, SecretsError> {
        let openrouter_api_key = non_empty_var("OPENROUTER_API_KEY")
            .ok_or_else(|| SecretsError::MissingSecret("OPENROUTER_API_KEY".to_string()))?;

        Ok(Self {
            openrouter_api_key,
            api_token: non_empty_var("DOCQUERY_API_TOKEN"),
        })
    }
}

fn non_empty_var(name: &str) -> Option<String> {
    env::var(name)
        .ok()
        .map(|value| value.trim().to_string())
        .filter(|value| !value.is_empty())
}
