//! Provider trait for abstracting chat-completion backends.

use serde::{Deserialize, Serialize};

/// Unified usage information across providers
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ProviderUsage {
    pub input_tokens: u32,
    pub output_tokens: u32,
}

/// Unified response type across providers
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ProviderResponse {
    pub id: String,
    pub model: String,
    /// Text of the first choice; `None` when the model returned nothing.
    pub text: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub usage: Option<ProviderUsage>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub stop_reason: Option<String>,
}

/// Provider error types
#[derive(Debug, thiserror::Error)]
pub enum ProviderError {
    #[error("HTTP request failed: {0}")]
    HttpError(#[from] reqwest::Error),
    #[error("API error ({status}): {message}")]
    ApiError { status: u16, message: String },
    #[error("Invalid response format: {0}")]
    InvalidFormat(String),
    #[error("Invalid configuration: {0}")]
    Config(String),
}

/// Provider trait for different LLM backends
#[async_trait::async_trait]
pub trait Provider: Send + Sync {
    /// Provider name
    fn name(&self) -> &str;

    /// Send a single-turn user message.
    async fn send_message(&self, content: &str) -> Result<ProviderResponse, ProviderError>;
}

/// Extract the reply text, treating blank output as missing.
pub fn extract_text(response: &ProviderResponse) -> Option<&str> {
    response
        .text
        .as_deref()
        .filter(|text| !text.trim().is_empty())
}
