//! Shared helpers for integration tests: scripted collaborators with call
//! counters, plus a small base knowledge fixture.

#![allow(dead_code)]

use std::collections::HashMap;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};
use std::time::Duration;

use docquery_gateway::answer::AnswerGenerator;
use docquery_gateway::web::fetch::{DocumentFetcher, FetchError};
use docquery_gateway::{KnowledgeSnapshot, Orchestrator, RetrievalOptions};
use docquery_knowledge::{
    ContentCache, EmbeddingProvider, HashedEmbedder, KnowledgeError, KnowledgeResult,
    TextExtractor, VectorIndex, chunk_text, chunker::into_contents, fingerprint,
};

pub const DIM: usize = 64;

pub const BASE_DOCUMENT: &str = "The grace period for premium payment is thirty days. \
The waiting period for pre-existing diseases is thirty-six months. \
Cataract surgery is covered after two years of continuous coverage.";

pub const OTHER_DOCUMENT: &str = "Own damage cover excludes mechanical breakdown. \
Third party liability covers death and bodily injury without limit. \
Roadside assistance is available within one hundred kilometres.";

pub fn options() -> RetrievalOptions {
    RetrievalOptions {
        chunk_size: 60,
        chunk_overlap: 10,
        top_k: 3,
        embedding_batch: 4,
        embedding_dim: Some(DIM),
    }
}

/// Hashed embeddings with every call recorded. Queries listed in
/// `fail_on` make the call fail.
pub struct RecordingEmbedder {
    inner: HashedEmbedder,
    calls: Mutex<Vec<Vec<String>>>,
    fail_on: Vec<String>,
    fail_all: bool,
}

impl RecordingEmbedder {
    pub fn new() -> Self {
        Self {
            inner: HashedEmbedder::new(DIM),
            calls: Mutex::new(Vec::new()),
            fail_on: Vec::new(),
            fail_all: false,
        }
    }

    pub fn failing_on(queries: &[&str]) -> Self {
        Self {
            fail_on: queries.iter().map(|q| q.to_string()).collect(),
            ..Self::new()
        }
    }

    pub fn always_failing() -> Self {
        Self {
            fail_all: true,
            ..Self::new()
        }
    }

    pub fn calls(&self) -> Vec<Vec<String>> {
        self.calls.lock().unwrap().clone()
    }

    /// Every embedded input across all calls.
    pub fn embedded_inputs(&self) -> Vec<String> {
        self.calls().into_iter().flatten().collect()
    }
}

#[async_trait::async_trait]
impl EmbeddingProvider for RecordingEmbedder {
    async fn embed(&self, inputs: &[String]) -> KnowledgeResult<Vec<Vec<f32>>> {
        self.calls.lock().unwrap().push(inputs.to_vec());
        if self.fail_all || inputs.iter().any(|input| self.fail_on.contains(input)) {
            return Err(KnowledgeError::Embedding("embedding backend down".to_string()));
        }
        self.inner.embed(inputs).await
    }
}

/// Serves fixed bodies by URL; unknown URLs fail with a 404.
pub struct StaticFetcher {
    documents: HashMap<String, Vec<u8>>,
    calls: AtomicUsize,
}

impl StaticFetcher {
    pub fn new(documents: &[(&str, &str)]) -> Self {
        Self {
            documents: documents
                .iter()
                .map(|(url, body)| (url.to_string(), body.as_bytes().to_vec()))
                .collect(),
            calls: AtomicUsize::new(0),
        }
    }

    pub fn calls(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }
}

#[async_trait::async_trait]
impl DocumentFetcher for StaticFetcher {
    async fn fetch(&self, url: &str) -> Result<Vec<u8>, FetchError> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        self.documents
            .get(url)
            .cloned()
            .ok_or(FetchError::Status(404))
    }
}

/// Treats document bytes as UTF-8 text.
pub struct Utf8Extractor;

impl TextExtractor for Utf8Extractor {
    fn extract(&self, bytes: &[u8]) -> String {
        String::from_utf8_lossy(bytes).trim().to_string()
    }
}

/// Echoes the question and its top context chunk. Questions of the form
/// `"<ms>:<text>"` sleep for `<ms>` milliseconds first.
pub struct EchoAnswerer {
    calls: AtomicUsize,
    in_flight: AtomicUsize,
    peak_in_flight: AtomicUsize,
    contexts: Mutex<Vec<Vec<String>>>,
}

impl EchoAnswerer {
    pub fn new() -> Self {
        Self {
            calls: AtomicUsize::new(0),
            in_flight: AtomicUsize::new(0),
            peak_in_flight: AtomicUsize::new(0),
            contexts: Mutex::new(Vec::new()),
        }
    }

    pub fn calls(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }

    pub fn peak_in_flight(&self) -> usize {
        self.peak_in_flight.load(Ordering::SeqCst)
    }

    pub fn contexts(&self) -> Vec<Vec<String>> {
        self.contexts.lock().unwrap().clone()
    }
}

#[async_trait::async_trait]
impl AnswerGenerator for EchoAnswerer {
    async fn generate(&self, question: &str, context: &[String]) -> String {
        self.calls.fetch_add(1, Ordering::SeqCst);
        self.contexts.lock().unwrap().push(context.to_vec());
        let now = self.in_flight.fetch_add(1, Ordering::SeqCst) + 1;
        self.peak_in_flight.fetch_max(now, Ordering::SeqCst);

        if let Some((delay, _)) = question.split_once(':')
            && let Ok(ms) = delay.parse::<u64>()
        {
            tokio::time::sleep(Duration::from_millis(ms)).await;
        }

        self.in_flight.fetch_sub(1, Ordering::SeqCst);
        format!("answer to {question}")
    }
}

pub async fn base_index() -> VectorIndex {
    let chunks = into_contents(chunk_text(BASE_DOCUMENT, 60, 10).unwrap());
    VectorIndex::build(&HashedEmbedder::new(DIM), chunks, 8, Some(DIM))
        .await
        .unwrap()
}

/// Snapshot with the base document indexed and fingerprinted.
pub async fn loaded_snapshot() -> KnowledgeSnapshot {
    let cache: ContentCache = [fingerprint(BASE_DOCUMENT)].into_iter().collect();
    KnowledgeSnapshot::new(Some(base_index().await), cache)
}

pub struct Harness {
    pub orchestrator: Orchestrator,
    pub embedder: Arc<RecordingEmbedder>,
    pub fetcher: Arc<StaticFetcher>,
    pub answerer: Arc<EchoAnswerer>,
}

pub fn harness(snapshot: KnowledgeSnapshot, embedder: RecordingEmbedder) -> Harness {
    let embedder = Arc::new(embedder);
    let fetcher = Arc::new(StaticFetcher::new(&[
        ("https://docs.test/base.pdf", BASE_DOCUMENT),
        ("https://docs.test/other.pdf", OTHER_DOCUMENT),
        ("https://docs.test/scanned.pdf", "   "),
    ]));
    let answerer = Arc::new(EchoAnswerer::new());

    let orchestrator = Orchestrator::new(
        Arc::new(snapshot),
        fetcher.clone(),
        Arc::new(Utf8Extractor),
        embedder.clone(),
        answerer.clone(),
        options(),
    );

    Harness {
        orchestrator,
        embedder,
        fetcher,
        answerer,
    }
}

pub fn questions(items: &[&str]) -> Vec<String> {
    items.iter().map(|q| q.to_string()).collect()
}
