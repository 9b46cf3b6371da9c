//! OpenRouter API client with OpenAI-compatible format.
//!
//! The client sets no request timeout of its own; callers bound each call.

use reqwest::header::{AUTHORIZATION, CONTENT_TYPE, HeaderMap, HeaderValue};
use serde::{Deserialize, Serialize};

use docquery_core::LlmSettings;

use crate::providers::provider::{Provider, ProviderError, ProviderResponse, ProviderUsage};

const DEFAULT_BASE_URL: &str = "https://openrouter.ai/api/v1";

/// OpenRouter API client
#[derive(Clone)]
pub struct OpenRouterClient {
    http_client: reqwest::Client,
    api_key: String,
    model: String,
    base_url: String,
    http_referer: Option<String>,
    app_name: Option<String>,
    max_tokens: u32,
}

/// Request body for the Chat Completions API
#[derive(Debug, Serialize)]
struct ChatCompletionsRequest<'a> {
    model: &'a str,
    messages: Vec<OpenAiMessage>,
    max_tokens: u32,
}

/// OpenAI-compatible message format
#[derive(Debug, Serialize, Deserialize)]
struct OpenAiMessage {
    role: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    content: Option<String>,
}

/// OpenAI-compatible chat completion response
#[derive(Debug, Deserialize)]
struct ChatCompletionsResponse {
    #[serde(default)]
    id: String,
    #[serde(default)]
    model: String,
    choices: Vec<Choice>,
    #[serde(default)]
    usage: Option<Usage>,
}

/// Choice in the response
#[derive(Debug, Deserialize)]
struct Choice {
    message: OpenAiMessage,
    finish_reason: Option<String>,
}

/// Usage information
#[derive(Debug, Deserialize)]
struct Usage {
    prompt_tokens: u32,
    completion_tokens: u32,
}

impl OpenRouterClient {
    /// Create a new OpenRouter client
    pub fn new(
        api_key: impl Into<String>,
        model: impl Into<String>,
        base_url: Option<String>,
        http_referer: Option<String>,
        app_name: Option<String>,
        max_tokens: u32,
    ) -> Result<Self, ProviderError> {
        let mut headers = HeaderMap::new();
        headers.insert(CONTENT_TYPE, HeaderValue::from_static("application/json"));

        let http_client = reqwest::Client::builder()
            .default_headers(headers)
            .build()?;

        Ok(Self {
            http_client,
            api_key: api_key.into(),
            model: model.into(),
            base_url: base_url
                .map(|url| url.trim_end_matches('/').to_string())
                .unwrap_or_else(|| DEFAULT_BASE_URL.to_string()),
            http_referer,
            app_name,
            max_tokens,
        })
    }

    /// Create a client from the `[llm]` settings section.
    pub fn from_settings(api_key: &str, llm: &LlmSettings) -> Result<Self, ProviderError> {
        Self::new(
            api_key,
            &llm.model,
            llm.base_url.clone(),
            llm.http_referer.clone(),
            llm.app_name.clone(),
            llm.max_tokens,
        )
    }

    /// Build request headers with optional attribution
    fn build_headers(&self) -> Result<HeaderMap, ProviderError> {
        let mut headers = HeaderMap::new();
        headers.insert(CONTENT_TYPE, HeaderValue::from_static("application/json"));

        let auth_value = format!("Bearer {}", self.api_key);
        let auth = HeaderValue::from_str(&auth_value)
            .map_err(|_| ProviderError::Config("API key is not a valid header value".to_string()))?;
        headers.insert(AUTHORIZATION, auth);

        // Optional headers for OpenRouter rankings
        if let Some(ref referer) = self.http_referer
            && let Ok(value) = HeaderValue::from_str(referer)
        {
            headers.insert("HTTP-Referer", value);
        }

        if let Some(ref app_name) = self.app_name
            && let Ok(value) = HeaderValue::from_str(app_name)
        {
            headers.insert("X-Title", value);
        }

        Ok(headers)
    }

    fn request_body<'a>(&'a self, content: &str) -> ChatCompletionsRequest<'a> {
        ChatCompletionsRequest {
            model: &self.model,
            messages: vec![OpenAiMessage {
                role: "user".to_string(),
                content: Some(content.to_string()),
            }],
            max_tokens: self.max_tokens,
        }
    }

    /// Convert OpenAI response to provider response
    fn convert_response(response: ChatCompletionsResponse) -> ProviderResponse {
        let choice = response.choices.into_iter().next();
        let stop_reason = choice.as_ref().and_then(|c| c.finish_reason.clone());
        let text = choice
            .and_then(|c| c.message.content)
            .filter(|text| !text.is_empty());

        ProviderResponse {
            id: response.id,
            model: response.model,
            text,
            usage: response.usage.map(|u| ProviderUsage {
                input_tokens: u.prompt_tokens,
                output_tokens: u.completion_tokens,
            }),
            stop_reason,
        }
    }
}

#[async_trait::async_trait]
impl Provider for OpenRouterClient {
    fn name(&self) -> &str {
        "openrouter"
    }

    async fn send_message(&self, content: &str) -> Result<ProviderResponse, ProviderError> {
        let url = format!("{}/chat/completions", self.base_url);

        let response = self
            .http_client
            .post(&url)
            .headers(self.build_headers()?)
            .json(&self.request_body(content))
            .send()
            .await?;

        let status = response.status();
        if !status.is_success() {
            let error_text = response.text().await.unwrap_or_default();
            return Err(ProviderError::ApiError {
                status: status.as_u16(),
                message: error_text,
            });
        }

        let response_text = response.text().await?;
        let completions_response: ChatCompletionsResponse = serde_json::from_str(&response_text)
            .map_err(|e| {
                let preview = if response_text.len() > 500 {
                    &response_text[..response_text.floor_char_boundary(500)]
                } else {
                    &response_text
                };
                ProviderError::InvalidFormat(format!(
                    "Failed to parse OpenRouter response: {e}\nBody preview: {preview}"
                ))
            })?;

        Ok(Self::convert_response(completions_response))
    }
}
