use std::path::PathBuf;

#[derive(Debug, thiserror::Error)]
pub enum KnowledgeError {
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
    #[error("json error: {0}")]
    Json(#[from] serde_json::Error),
    #[error("http error: {0}")]
    Http(#[from] reqwest::Error),
    #[error("nothing to index: {0}")]
    EmptyInput(&'static str),
    #[error("invalid chunking: size {size}, overlap {overlap}")]
    InvalidChunking { size: usize, overlap: usize },
    #[error("invalid index: {0}")]
    InvalidIndex(String),
    #[error("not found: {0}")]
    NotFound(PathBuf),
    #[error("corrupt index {path}: {reason}")]
    CorruptIndex { path: PathBuf, reason: String },
    #[error("corrupt cache {path}: {reason}")]
    CorruptCache { path: PathBuf, reason: String },
    #[error("embedding dimension mismatch: expected {expected}, got {actual}")]
    EmbeddingDimMismatch { expected: usize, actual: usize },
    #[error("embedding error: {0}")]
    Embedding(String),
    #[error("unknown embedding backend: {0}")]
    UnknownBackend(String),
}

pub type KnowledgeResult<T> = Result<T, KnowledgeError>;
