//! Retrieval core for docquery: chunking, embeddings, the vector index,
//! the content cache and the offline base knowledge builder.

pub mod builder;
pub mod cache;
pub mod chunker;
pub mod embeddings;
pub mod errors;
pub mod extract;
pub mod index;
pub mod paths;

pub use builder::{BaseKnowledgeBuilder, BuildReport};
pub use cache::{ContentCache, Fingerprint, fingerprint};
pub use chunker::{Chunk, chunk_text, strip_overlaps};
pub use docquery_core::KnowledgeSettings;
pub use embeddings::{
    EmbeddingClient, EmbeddingProvider, HashedEmbedder, embed_in_batches,
    embedding_provider_from_settings,
};
pub use errors::{KnowledgeError, KnowledgeResult};
pub use extract::{PdfTextExtractor, TextExtractor, extract_blocking};
pub use index::{SearchHit, VectorIndex};
pub use paths::StorePaths;
