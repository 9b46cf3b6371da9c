use std::sync::Arc;

use serde::Deserialize;
use sha2::{Digest, Sha256};

use crate::KnowledgeSettings;
use crate::errors::{KnowledgeError, KnowledgeResult};

/// Maps text to fixed-dimension vectors.
///
/// Implementations must be a pure function of model identity and input:
/// the same text always embeds to the same vector for a given model.
#[async_trait::async_trait]
pub trait EmbeddingProvider: Send + Sync {
    async fn embed(&self, inputs: &[String]) -> KnowledgeResult<Vec<Vec<f32>>>;
}

/// HTTP client for an Ollama-compatible `/api/embed` endpoint.
#[derive(Debug, Clone)]
pub struct EmbeddingClient {
    base_url: String,
    model: String,
    client: reqwest::Client,
}

impl EmbeddingClient {
    pub fn new(settings: &KnowledgeSettings) -> Self {
        Self {
            base_url: settings.embedding_url.trim_end_matches('/').to_string(),
            model: settings.embedding_model.clone(),
            client: reqwest::Client::new(),
        }
    }
}

#[async_trait::async_trait]
impl EmbeddingProvider for EmbeddingClient {
    async fn embed(&self, inputs: &[String]) -> KnowledgeResult<Vec<Vec<f32>>> {
        if inputs.is_empty() {
            return Ok(Vec::new());
        }

        let url = format!("{}/api/embed", self.base_url);
        let body = EmbedRequest {
            model: &self.model,
            input: inputs,
        };

        let response = self.client.post(&url).json(&body).send().await?;
        let status = response.status();
        if !status.is_success() {
            let text = response.text().await.unwrap_or_default();
            return Err(KnowledgeError::Embedding(format!(
                "embedding request failed: {status} {text}"
            )));
        }

        let payload: EmbedResponse = response.json().await?;

        if let Some(embeddings) = payload.embeddings {
            return Ok(embeddings);
        }

        if let Some(embedding) = payload.embedding {
            return Ok(vec![embedding]);
        }

        Err(KnowledgeError::Embedding(
            "embedding response missing vectors".to_string(),
        ))
    }
}

#[derive(Debug, serde::Serialize)]
struct EmbedRequest<'a> {
    model: &'a str,
    input: &'a [String],
}

#[derive(Debug, Clone, Deserialize)]
struct EmbedResponse {
    embeddings: Option<Vec<Vec<f32>>>,
    embedding: Option<Vec<f32>>,
}

/// Offline embedder: lowercase alphanumeric tokens are hashed into buckets
/// and the bucket counts are L2-normalised. Deterministic across processes
/// and platforms, so indexes built with it stay searchable after a reload.
#[derive(Debug, Clone)]
pub struct HashedEmbedder {
    dimension: usize,
}

impl HashedEmbedder {
    pub fn new(dimension: usize) -> Self {
        Self {
            dimension: dimension.max(1),
        }
    }

    pub fn dimension(&self) -> usize {
        self.dimension
    }

    pub fn embed_one(&self, text: &str) -> Vec<f32> {
        let mut vector = vec![0.0f32; self.dimension];
        for token in tokens(text) {
            vector[bucket(&token, self.dimension)] += 1.0;
        }

        let norm = vector.iter().map(|v| v * v).sum::<f32>().sqrt();
        if norm > 0.0 {
            for value in &mut vector {
                *value /= norm;
            }
        }
        vector
    }
}

#[async_trait::async_trait]
impl EmbeddingProvider for HashedEmbedder {
    async fn embed(&self, inputs: &[String]) -> KnowledgeResult<Vec<Vec<f32>>> {
        Ok(inputs.iter().map(|text| self.embed_one(text)).collect())
    }
}

fn tokens(text: &str) -> impl Iterator<Item = String> + '_ {
    text.split(|c: char| !c.is_alphanumeric())
        .filter(|token| !token.is_empty())
        .map(|token| token.to_lowercase())
}

fn bucket(token: &str, dimension: usize) -> usize {
    let digest = Sha256::digest(token.as_bytes());
    let mut prefix = [0u8; 8];
    prefix.copy_from_slice(&digest[..8]);
    (u64::from_le_bytes(prefix) % dimension as u64) as usize
}

const DEFAULT_HASHED_DIM: usize = 384;

/// Build the embedding backend named by `embedding_backend`.
pub fn embedding_provider_from_settings(
    settings: &KnowledgeSettings,
) -> KnowledgeResult<Arc<dyn EmbeddingProvider>> {
    match settings.embedding_backend.as_str() {
        "ollama" => Ok(Arc::new(EmbeddingClient::new(settings))),
        "hashed" => Ok(Arc::new(HashedEmbedder::new(
            settings.embedding_dim.unwrap_or(DEFAULT_HASHED_DIM),
        ))),
        other => Err(KnowledgeError::UnknownBackend(other.to_string())),
    }
}

/// Embed `inputs` in batches of `batch_size`, checking that the provider
/// returned one vector per input and that every vector has the same
/// dimension (equal to `expected_dim` when given).
pub async fn embed_in_batches(
    provider: &dyn EmbeddingProvider,
    inputs: &[String],
    batch_size: usize,
    expected_dim: Option<usize>,
) -> KnowledgeResult<Vec<Vec<f32>>> {
    let batch_size = batch_size.max(1);
    let mut vectors = Vec::with_capacity(inputs.len());
    let mut dim = expected_dim;

    for batch in inputs.chunks(batch_size) {
        let embeddings = provider.embed(batch).await?;
        if embeddings.len() != batch.len() {
            return Err(KnowledgeError::Embedding(format!(
                "expected {} vectors, got {}",
                batch.len(),
                embeddings.len()
            )));
        }

        for embedding in embeddings {
            match dim {
                Some(expected) if expected != embedding.len() => {
                    return Err(KnowledgeError::EmbeddingDimMismatch {
                        expected,
                        actual: embedding.len(),
                    });
                }
                Some(_) => {}
                None => dim = Some(embedding.len()),
            }
            vectors.push(embedding);
        }
    }

    if dim == Some(0) {
        return Err(KnowledgeError::Embedding(
            "provider returned zero-length vectors".to_string(),
        ));
    }

    Ok(vectors)
}
