//! Retrieval configuration types.
//!
//! These types define the resolved (non-optional) settings used by
//! `docquery-knowledge`. They are created from the user-facing
//! `KnowledgeOverrides` TOML struct via `From`.

use std::path::PathBuf;

use serde::{Deserialize, Serialize};

use super::settings::KnowledgeOverrides;

/// Resolved retrieval settings (all values filled with defaults).
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct KnowledgeSettings {
    #[serde(default = "default_embedding_backend")]
    pub embedding_backend: String,
    #[serde(default = "default_embedding_url")]
    pub embedding_url: String,
    #[serde(default = "default_embedding_model")]
    pub embedding_model: String,
    /// Expected vector dimension; checked against every embedding batch when set.
    #[serde(default)]
    pub embedding_dim: Option<usize>,
    #[serde(default = "default_embedding_batch")]
    pub embedding_batch: usize,
    #[serde(default = "default_chunk_size")]
    pub chunk_size: usize,
    #[serde(default = "default_chunk_overlap")]
    pub chunk_overlap: usize,
    #[serde(default = "default_top_k")]
    pub top_k: usize,
    #[serde(default = "default_corpus_dir")]
    pub corpus_dir: PathBuf,
    #[serde(default = "default_store_dir")]
    pub store_dir: PathBuf,
    #[serde(default = "default_base_name")]
    pub base_name: String,
}

impl Default for KnowledgeSettings {
    fn default() -> Self {
        Self {
            embedding_backend: default_embedding_backend(),
            embedding_url: default_embedding_url(),
            embedding_model: default_embedding_model(),
            embedding_dim: None,
            embedding_batch: default_embedding_batch(),
            chunk_size: default_chunk_size(),
            chunk_overlap: default_chunk_overlap(),
            top_k: default_top_k(),
            corpus_dir: default_corpus_dir(),
            store_dir: default_store_dir(),
            base_name: default_base_name(),
        }
    }
}

fn default_embedding_backend() -> String {
    "ollama".to_string()
}

fn default_embedding_url() -> String {
    "http://127.0.0.1:11434".to_string()
}

fn default_embedding_model() -> String {
    "all-minilm".to_string()
}

fn default_embedding_batch() -> usize {
    32
}

fn default_chunk_size() -> usize {
    500
}

fn default_chunk_overlap() -> usize {
    100
}

fn default_top_k() -> usize {
    7
}

fn default_corpus_dir() -> PathBuf {
    PathBuf::from("data/base_knowledge")
}

fn default_store_dir() -> PathBuf {
    PathBuf::from("data/vector_store")
}

fn default_base_name() -> String {
    "base_knowledge".to_string()
}

impl From<&KnowledgeOverrides> for KnowledgeSettings {
    fn from(value: &KnowledgeOverrides) -> Self {
        let mut settings = KnowledgeSettings::default();
        if let Some(backend) = &value.embedding_backend {
            settings.embedding_backend = backend.trim().to_ascii_lowercase();
        }
        if let Some(url) = &value.embedding_url {
            settings.embedding_url = url.clone();
        }
        if let Some(model) = &value.embedding_model {
            settings.embedding_model = model.clone();
        }
        if let Some(dim) = value.embedding_dim {
            settings.embedding_dim = Some(dim);
        }
        if let Some(batch) = value.embedding_batch {
            settings.embedding_batch = batch;
        }
        if let Some(size) = value.chunk_size {
            settings.chunk_size = size;
        }
        if let Some(overlap) = value.chunk_overlap {
            settings.chunk_overlap = overlap;
        }
        if let Some(top_k) = value.top_k {
            settings.top_k = top_k;
        }
        if let Some(dir) = &value.corpus_dir {
            settings.corpus_dir = PathBuf::from(dir);
        }
        if let Some(dir) = &value.store_dir {
            settings.store_dir = PathBuf::from(dir);
        }
        if let Some(name) = &value.base_name {
            settings.base_name = name.clone();
        }
        settings
    }
}
