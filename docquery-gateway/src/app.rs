//! Wiring of the production collaborators behind an [`Orchestrator`].

use std::sync::Arc;
use std::time::Duration;

use tracing::info;

use docquery_core::Config;
use docquery_knowledge::{
    KnowledgeError, PdfTextExtractor, StorePaths, embedding_provider_from_settings,
};

use crate::answer::LlmAnswerGenerator;
use crate::orchestrator::{Orchestrator, RetrievalOptions};
use crate::providers::ProviderError;
use crate::providers::openrouter::OpenRouterClient;
use crate::state::KnowledgeSnapshot;
use crate::web::fetch::{FetchError, HttpDocumentFetcher};

#[derive(Debug, thiserror::Error)]
pub enum StartupError {
    #[error("knowledge setup failed: {0}")]
    Knowledge(#[from] KnowledgeError),
    #[error("provider setup failed: {0}")]
    Provider(#[from] ProviderError),
    #[error("fetcher setup failed: {0}")]
    Fetch(#[from] FetchError),
}

/// Load the knowledge snapshot and build an orchestrator backed by
/// OpenRouter, HTTP fetch and PDF extraction.
pub async fn build_orchestrator(config: &Config) -> Result<Orchestrator, StartupError> {
    let knowledge = config.knowledge_settings();
    let snapshot = KnowledgeSnapshot::load(&StorePaths::from_settings(&knowledge)).await;

    let embedder = embedding_provider_from_settings(&knowledge)?;
    info!(
        backend = %knowledge.embedding_backend,
        model = %knowledge.embedding_model,
        "embedding provider ready"
    );

    let llm = &config.settings.llm;
    let provider = OpenRouterClient::from_settings(config.openrouter_api_key(), llm)?;
    info!(model = %llm.model, "OpenRouter client created");
    let answerer = LlmAnswerGenerator::new(
        Arc::new(provider),
        Duration::from_secs(llm.timeout_seconds),
    );

    let fetcher = HttpDocumentFetcher::from_settings(&config.settings.fetch)?;

    Ok(Orchestrator::new(
        Arc::new(snapshot),
        Arc::new(fetcher),
        Arc::new(PdfTextExtractor),
        embedder,
        Arc::new(answerer),
        RetrievalOptions::from(&knowledge),
    ))
}
