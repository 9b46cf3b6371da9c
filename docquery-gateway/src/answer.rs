//! Grounded answer generation for a single question.

use std::sync::Arc;
use std::time::Duration;

use tracing::{debug, warn};

use crate::content::answer_prompt;
use crate::providers::{Provider, ProviderError, extract_text};

/// Placeholder returned when the language model answers with an error status.
pub const UPSTREAM_FAILURE_ANSWER: &str = "Error: Could not get a response from the language model.";

/// Placeholder for transport errors, timeouts and empty replies.
pub const UNEXPECTED_FAILURE_ANSWER: &str =
    "Error: An unexpected error occurred while processing the request.";

/// Produces an answer from a question and its retrieved context.
///
/// Never fails; problems degrade to a placeholder answer.
#[async_trait::async_trait]
pub trait AnswerGenerator: Send + Sync {
    async fn generate(&self, question: &str, context: &[String]) -> String;
}

pub struct LlmAnswerGenerator {
    provider: Arc<dyn Provider>,
    timeout: Duration,
}

impl LlmAnswerGenerator {
    pub fn new(provider: Arc<dyn Provider>, timeout: Duration) -> Self {
        Self { provider, timeout }
    }
}

#[async_trait::async_trait]
impl AnswerGenerator for LlmAnswerGenerator {
    async fn generate(&self, question: &str, context: &[String]) -> String {
        let prompt = match answer_prompt(question, context) {
            Ok(prompt) => prompt,
            Err(err) => {
                warn!(error = %err, "failed to render answer prompt");
                return UNEXPECTED_FAILURE_ANSWER.to_string();
            }
        };

        let reply = match tokio::time::timeout(self.timeout, self.provider.send_message(&prompt)).await
        {
            Ok(Ok(response)) => response,
            Ok(Err(err @ ProviderError::ApiError { .. })) => {
                warn!(provider = self.provider.name(), error = %err, "language model rejected the request");
                return UPSTREAM_FAILURE_ANSWER.to_string();
            }
            Ok(Err(err)) => {
                warn!(provider = self.provider.name(), error = %err, "answer generation failed");
                return UNEXPECTED_FAILURE_ANSWER.to_string();
            }
            Err(_) => {
                warn!(
                    provider = self.provider.name(),
                    timeout_secs = self.timeout.as_secs(),
                    "answer generation timed out"
                );
                return UNEXPECTED_FAILURE_ANSWER.to_string();
            }
        };

        match extract_text(&reply) {
            Some(text) => {
                debug!(model = %reply.model, chars = text.len(), "answer generated");
                flatten_answer(text)
            }
            None => {
                warn!(model = %reply.model, "language model returned an empty answer");
                UNEXPECTED_FAILURE_ANSWER.to_string()
            }
        }
    }
}

/// Trim the reply and put it on a single line.
pub fn flatten_answer(text: &str) -> String {
    text.trim().replace("\r\n", " ").replace('\n', " ")
}
