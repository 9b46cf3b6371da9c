//! Per-request retrieval: resolve the source, pick an index, answer every
//! question against it.

use std::fmt;
use std::sync::Arc;

use futures::future::join_all;
use serde::Serialize;
use tracing::{debug, info, warn};
use uuid::Uuid;

use docquery_knowledge::{
    EmbeddingProvider, KnowledgeError, KnowledgeSettings, TextExtractor, VectorIndex, chunk_text,
    chunker::into_contents, extract_blocking, fingerprint,
};

use crate::answer::{AnswerGenerator, UNEXPECTED_FAILURE_ANSWER};
use crate::state::KnowledgeSnapshot;
use crate::web::fetch::{DocumentFetcher, FetchError};

/// Document-level failures. Each aborts the request before any question runs.
#[derive(Debug, thiserror::Error)]
pub enum RequestError {
    #[error("document could not be fetched: {0}")]
    SourceUnavailable(#[from] FetchError),
    #[error("no text could be extracted from the document")]
    ExtractionFailed,
    #[error("document produced no chunks")]
    EmptyInput,
    #[error("no index available: {0}")]
    IndexUnavailable(String),
}

/// Coarse failure category exposed to callers.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum FailureKind {
    BadDocument,
    KnowledgeBaseUnavailable,
    ExtractionFailed,
}

impl RequestError {
    pub fn kind(&self) -> FailureKind {
        match self {
            Self::SourceUnavailable(_) => FailureKind::BadDocument,
            Self::ExtractionFailed | Self::EmptyInput => FailureKind::ExtractionFailed,
            Self::IndexUnavailable(_) => FailureKind::KnowledgeBaseUnavailable,
        }
    }
}

/// Chunking and retrieval parameters for ephemeral indexes and search.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RetrievalOptions {
    pub chunk_size: usize,
    pub chunk_overlap: usize,
    pub top_k: usize,
    pub embedding_batch: usize,
    pub embedding_dim: Option<usize>,
}

impl Default for RetrievalOptions {
    fn default() -> Self {
        Self::from(&KnowledgeSettings::default())
    }
}

impl From<&KnowledgeSettings> for RetrievalOptions {
    fn from(settings: &KnowledgeSettings) -> Self {
        Self {
            chunk_size: settings.chunk_size,
            chunk_overlap: settings.chunk_overlap,
            top_k: settings.top_k,
            embedding_batch: settings.embedding_batch,
            embedding_dim: settings.embedding_dim,
        }
    }
}

/// Index a request is answered against.
enum BoundIndex {
    Base(Arc<VectorIndex>),
    /// Built for this request only; dropped when it completes.
    Ephemeral(VectorIndex),
}

impl BoundIndex {
    fn index(&self) -> &VectorIndex {
        match self {
            Self::Base(index) => index.as_ref(),
            Self::Ephemeral(index) => index,
        }
    }
}

enum RequestState {
    ResolveSource,
    CheckCache(String),
    BuildEphemeral(String),
    UseBase,
    AnswerAll(BoundIndex),
}

impl fmt::Display for RequestState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Self::ResolveSource => "resolve_source",
            Self::CheckCache(_) => "check_cache",
            Self::BuildEphemeral(_) => "build_ephemeral",
            Self::UseBase => "use_base",
            Self::AnswerAll(BoundIndex::Base(_)) => "answer_all(base)",
            Self::AnswerAll(BoundIndex::Ephemeral(_)) => "answer_all(ephemeral)",
        };
        f.write_str(name)
    }
}

pub struct Orchestrator {
    snapshot: Arc<KnowledgeSnapshot>,
    fetcher: Arc<dyn DocumentFetcher>,
    extractor: Arc<dyn TextExtractor>,
    embedder: Arc<dyn EmbeddingProvider>,
    answerer: Arc<dyn AnswerGenerator>,
    options: RetrievalOptions,
}

impl Orchestrator {
    pub fn new(
        snapshot: Arc<KnowledgeSnapshot>,
        fetcher: Arc<dyn DocumentFetcher>,
        extractor: Arc<dyn TextExtractor>,
        embedder: Arc<dyn EmbeddingProvider>,
        answerer: Arc<dyn AnswerGenerator>,
        options: RetrievalOptions,
    ) -> Self {
        Self {
            snapshot,
            fetcher,
            extractor,
            embedder,
            answerer,
            options,
        }
    }

    pub fn snapshot(&self) -> &KnowledgeSnapshot {
        &self.snapshot
    }

    /// Answer `questions` against `document`, or against the base knowledge
    /// when no document is given. Answers are positionally paired with the
    /// questions.
    pub async fn process(
        &self,
        document: Option<&str>,
        questions: &[String],
    ) -> Result<Vec<String>, RequestError> {
        let request_id = Uuid::new_v4();
        info!(%request_id, questions = questions.len(), document = document.is_some(), "processing request");

        let mut state = RequestState::ResolveSource;
        loop {
            debug!(%request_id, state = %state, "request state");
            state = match state {
                RequestState::ResolveSource => match document {
                    None => RequestState::UseBase,
                    Some(url) => RequestState::CheckCache(self.resolve_source(url).await?),
                },
                RequestState::CheckCache(text) => {
                    if self.snapshot.cache.contains(&fingerprint(&text)) {
                        info!(%request_id, "document already in base knowledge");
                        RequestState::UseBase
                    } else {
                        RequestState::BuildEphemeral(text)
                    }
                }
                RequestState::BuildEphemeral(text) => {
                    RequestState::AnswerAll(BoundIndex::Ephemeral(self.build_ephemeral(&text).await?))
                }
                RequestState::UseBase => match &self.snapshot.base {
                    Some(base) => RequestState::AnswerAll(BoundIndex::Base(Arc::clone(base))),
                    None => {
                        return Err(RequestError::IndexUnavailable(
                            "base knowledge is not loaded".to_string(),
                        ));
                    }
                },
                RequestState::AnswerAll(bound) => {
                    let answers = self.answer_all(bound.index(), questions).await;
                    debug!(%request_id, answers = answers.len(), "request complete");
                    return Ok(answers);
                }
            };
        }
    }

    async fn resolve_source(&self, url: &str) -> Result<String, RequestError> {
        let bytes = self.fetcher.fetch(url).await?;
        let text = extract_blocking(Arc::clone(&self.extractor), bytes).await;
        if text.trim().is_empty() {
            return Err(RequestError::ExtractionFailed);
        }
        Ok(text)
    }

    async fn build_ephemeral(&self, text: &str) -> Result<VectorIndex, RequestError> {
        let chunks = chunk_text(text, self.options.chunk_size, self.options.chunk_overlap)
            .map_err(|err| RequestError::IndexUnavailable(err.to_string()))?;
        if chunks.is_empty() {
            return Err(RequestError::EmptyInput);
        }

        VectorIndex::build(
            self.embedder.as_ref(),
            into_contents(chunks),
            self.options.embedding_batch,
            self.options.embedding_dim,
        )
        .await
        .map_err(|err| match err {
            KnowledgeError::EmptyInput(_) => RequestError::EmptyInput,
            other => RequestError::IndexUnavailable(other.to_string()),
        })
    }

    async fn answer_all(&self, index: &VectorIndex, questions: &[String]) -> Vec<String> {
        let tasks = questions
            .iter()
            .map(|question| self.answer_one(index, question));
        join_all(tasks).await
    }

    async fn answer_one(&self, index: &VectorIndex, question: &str) -> String {
        match index
            .search(self.embedder.as_ref(), question, self.options.top_k)
            .await
        {
            Ok(context) => self.answerer.generate(question, &context).await,
            Err(err) => {
                warn!(error = %err, "retrieval failed for question");
                UNEXPECTED_FAILURE_ANSWER.to_string()
            }
        }
    }
}
