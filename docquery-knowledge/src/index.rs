//! Exact nearest-neighbour index over chunk embeddings.
//!
//! Vectors are stored row-major in one flat buffer; row `i` belongs to
//! chunk `i`. Search is a full scan over squared Euclidean distance, so
//! results are exact and reproducible after a persist/load round trip.

use std::path::Path;

use tracing::debug;

use crate::embeddings::{EmbeddingProvider, embed_in_batches};
use crate::errors::{KnowledgeError, KnowledgeResult};
use crate::paths::{chunks_file, index_file, read_required, write_atomic};

const MAGIC: &[u8; 4] = b"DQVI";
const FORMAT_VERSION: u32 = 1;
const HEADER_LEN: usize = 4 + 4 + 4 + 8;

#[derive(Debug, Clone, PartialEq)]
pub struct VectorIndex {
    dim: usize,
    vectors: Vec<f32>,
    chunks: Vec<String>,
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct SearchHit {
    /// Position of the chunk in build order.
    pub index: usize,
    pub distance: f32,
}

impl VectorIndex {
    /// Embed every chunk and index the vectors in chunk order.
    pub async fn build(
        provider: &dyn EmbeddingProvider,
        chunks: Vec<String>,
        batch_size: usize,
        expected_dim: Option<usize>,
    ) -> KnowledgeResult<Self> {
        if chunks.is_empty() {
            return Err(KnowledgeError::EmptyInput("no chunks to index"));
        }

        let embeddings = embed_in_batches(provider, &chunks, batch_size, expected_dim).await?;
        let dim = embeddings[0].len();
        let vectors: Vec<f32> = embeddings.into_iter().flatten().collect();
        debug!(chunks = chunks.len(), dim, "built vector index");

        Self::from_parts(dim, vectors, chunks)
    }

    /// Assemble an index from precomputed row-major vectors.
    pub fn from_parts(dim: usize, vectors: Vec<f32>, chunks: Vec<String>) -> KnowledgeResult<Self> {
        if chunks.is_empty() {
            return Err(KnowledgeError::EmptyInput("no chunks to index"));
        }
        check_shape(dim, vectors.len(), chunks.len()).map_err(KnowledgeError::InvalidIndex)?;
        Ok(Self {
            dim,
            vectors,
            chunks,
        })
    }

    pub fn len(&self) -> usize {
        self.chunks.len()
    }

    pub fn is_empty(&self) -> bool {
        self.chunks.is_empty()
    }

    pub fn dim(&self) -> usize {
        self.dim
    }

    pub fn chunks(&self) -> &[String] {
        &self.chunks
    }

    /// Rank chunks by ascending squared distance to `query`.
    ///
    /// `k` is clamped to the number of indexed chunks; equal distances keep
    /// build order.
    pub fn search_vector(&self, query: &[f32], k: usize) -> KnowledgeResult<Vec<SearchHit>> {
        if query.len() != self.dim {
            return Err(KnowledgeError::EmbeddingDimMismatch {
                expected: self.dim,
                actual: query.len(),
            });
        }

        let k = k.min(self.len());
        if k == 0 {
            return Ok(Vec::new());
        }

        let mut hits: Vec<SearchHit> = self
            .vectors
            .chunks_exact(self.dim)
            .enumerate()
            .map(|(index, row)| SearchHit {
                index,
                distance: squared_l2(row, query),
            })
            .collect();

        hits.sort_by(|a, b| {
            a.distance
                .total_cmp(&b.distance)
                .then_with(|| a.index.cmp(&b.index))
        });
        hits.truncate(k);
        Ok(hits)
    }

    /// Embed `query` and return up to `k` chunk texts, most relevant first.
    pub async fn search(
        &self,
        provider: &dyn EmbeddingProvider,
        query: &str,
        k: usize,
    ) -> KnowledgeResult<Vec<String>> {
        let embedded = provider.embed(&[query.to_string()]).await?;
        let vector = embedded.into_iter().next().ok_or_else(|| {
            KnowledgeError::Embedding("embedding response missing query vector".to_string())
        })?;

        let hits = self.search_vector(&vector, k)?;
        Ok(hits
            .into_iter()
            .map(|hit| self.chunks[hit.index].clone())
            .collect())
    }

    /// Write `<base>.index` and `<base>.chunks.json`.
    pub async fn persist(&self, base: &Path) -> KnowledgeResult<()> {
        let index_path = index_file(base);
        let chunks_path = chunks_file(base);

        write_atomic(&index_path, &self.encode_vectors()).await?;
        write_atomic(&chunks_path, &serde_json::to_vec(&self.chunks)?).await?;
        debug!(path = %index_path.display(), chunks = self.len(), "persisted vector index");
        Ok(())
    }

    /// Load an index written by [`VectorIndex::persist`].
    pub async fn load(base: &Path) -> KnowledgeResult<Self> {
        let index_path = index_file(base);
        let chunks_path = chunks_file(base);

        let raw_index = read_required(&index_path).await?;
        let raw_chunks = read_required(&chunks_path).await?;

        let corrupt = |path: &Path, reason: String| KnowledgeError::CorruptIndex {
            path: path.to_path_buf(),
            reason,
        };

        let (dim, vectors) = decode_vectors(&raw_index).map_err(|reason| corrupt(&index_path, reason))?;
        let chunks: Vec<String> = serde_json::from_slice(&raw_chunks)
            .map_err(|err| corrupt(&chunks_path, err.to_string()))?;
        if chunks.is_empty() {
            return Err(corrupt(&chunks_path, "chunk list is empty".to_string()));
        }
        check_shape(dim, vectors.len(), chunks.len()).map_err(|reason| corrupt(&chunks_path, reason))?;

        Ok(Self {
            dim,
            vectors,
            chunks,
        })
    }

    fn encode_vectors(&self) -> Vec<u8> {
        let mut out = Vec::with_capacity(HEADER_LEN + self.vectors.len() * 4);
        out.extend_from_slice(MAGIC);
        out.extend_from_slice(&FORMAT_VERSION.to_le_bytes());
        out.extend_from_slice(&(self.dim as u32).to_le_bytes());
        out.extend_from_slice(&(self.len() as u64).to_le_bytes());
        for value in &self.vectors {
            out.extend_from_slice(&value.to_le_bytes());
        }
        out
    }
}

fn decode_vectors(raw: &[u8]) -> Result<(usize, Vec<f32>), String> {
    if raw.len() < HEADER_LEN {
        return Err(format!("file is {} bytes, header needs {HEADER_LEN}", raw.len()));
    }
    if &raw[..4] != MAGIC {
        return Err("bad magic".to_string());
    }

    let version = u32::from_le_bytes([raw[4], raw[5], raw[6], raw[7]]);
    if version != FORMAT_VERSION {
        return Err(format!("unsupported format version {version}"));
    }

    let dim = u32::from_le_bytes([raw[8], raw[9], raw[10], raw[11]]) as usize;
    let mut count_bytes = [0u8; 8];
    count_bytes.copy_from_slice(&raw[12..20]);
    let count = u64::from_le_bytes(count_bytes) as usize;

    let body = &raw[HEADER_LEN..];
    let expected = count
        .checked_mul(dim)
        .and_then(|values| values.checked_mul(4))
        .ok_or_else(|| "vector count overflows".to_string())?;
    if body.len() != expected {
        return Err(format!("expected {expected} vector bytes, found {}", body.len()));
    }

    let vectors = body
        .chunks_exact(4)
        .map(|bytes| f32::from_le_bytes([bytes[0], bytes[1], bytes[2], bytes[3]]))
        .collect();
    Ok((dim, vectors))
}

fn check_shape(dim: usize, values: usize, chunks: usize) -> Result<(), String> {
    if dim == 0 {
        return Err("vector dimension is zero".to_string());
    }
    if dim > u32::MAX as usize {
        return Err(format!("vector dimension {dim} is too large"));
    }
    if values != dim * chunks {
        return Err(format!(
            "{values} values do not fit {chunks} chunks of dimension {dim}"
        ));
    }
    Ok(())
}

fn squared_l2(a: &[f32], b: &[f32]) -> f32 {
    a.iter()
        .zip(b)
        .map(|(x, y)| {
            let d = x - y;
            d * d
        })
        .sum()
}
