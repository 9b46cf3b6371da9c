//! Offline construction of the persisted base knowledge unit.

use std::collections::BTreeSet;
use std::path::{Path, PathBuf};
use std::sync::Arc;

use serde::Serialize;
use tracing::{debug, info, warn};

use crate::KnowledgeSettings;
use crate::cache::{ContentCache, fingerprint};
use crate::chunker::{chunk_text, into_contents};
use crate::embeddings::EmbeddingProvider;
use crate::errors::{KnowledgeError, KnowledgeResult};
use crate::extract::{PdfTextExtractor, TextExtractor, extract_blocking};
use crate::index::VectorIndex;
use crate::paths::StorePaths;

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct BuildReport {
    pub files_seen: usize,
    pub files_indexed: usize,
    pub files_skipped: usize,
    pub chunks: usize,
}

/// Builds one index over every PDF in a corpus directory and records the
/// fingerprint of each indexed document.
pub struct BaseKnowledgeBuilder {
    provider: Arc<dyn EmbeddingProvider>,
    extractor: Arc<dyn TextExtractor>,
    chunk_size: usize,
    chunk_overlap: usize,
    embedding_batch: usize,
    embedding_dim: Option<usize>,
}

impl BaseKnowledgeBuilder {
    pub fn new(settings: &KnowledgeSettings, provider: Arc<dyn EmbeddingProvider>) -> Self {
        Self {
            provider,
            extractor: Arc::new(PdfTextExtractor),
            chunk_size: settings.chunk_size,
            chunk_overlap: settings.chunk_overlap,
            embedding_batch: settings.embedding_batch,
            embedding_dim: settings.embedding_dim,
        }
    }

    pub fn with_extractor(mut self, extractor: Arc<dyn TextExtractor>) -> Self {
        self.extractor = extractor;
        self
    }

    /// Index `corpus_dir` and write the index pair, then the cache, under `out`.
    pub async fn build(&self, corpus_dir: &Path, out: &StorePaths) -> KnowledgeResult<BuildReport> {
        let files = list_pdfs(corpus_dir)?;
        if files.is_empty() {
            return Err(KnowledgeError::EmptyInput("no PDF files in corpus directory"));
        }
        info!(corpus = %corpus_dir.display(), files = files.len(), "building base knowledge");

        let mut report = BuildReport {
            files_seen: files.len(),
            ..Default::default()
        };
        let mut fingerprints = BTreeSet::new();
        let mut chunks = Vec::new();

        for path in &files {
            let bytes = tokio::fs::read(path).await?;
            let text = extract_blocking(Arc::clone(&self.extractor), bytes).await;
            if text.trim().is_empty() {
                warn!(file = %path.display(), "no text extracted, skipping");
                report.files_skipped += 1;
                continue;
            }

            if !fingerprints.insert(fingerprint(&text)) {
                debug!(file = %path.display(), "duplicate document content, skipping");
                report.files_skipped += 1;
                continue;
            }

            let file_chunks = chunk_text(&text, self.chunk_size, self.chunk_overlap)?;
            debug!(file = %path.display(), chunks = file_chunks.len(), "chunked document");
            chunks.extend(into_contents(file_chunks));
            report.files_indexed += 1;
        }

        if chunks.is_empty() {
            return Err(KnowledgeError::EmptyInput(
                "no text could be extracted from the corpus",
            ));
        }
        report.chunks = chunks.len();

        let index = VectorIndex::build(
            self.provider.as_ref(),
            chunks,
            self.embedding_batch,
            self.embedding_dim,
        )
        .await?;
        index.persist(&out.index_base).await?;

        let cache: ContentCache = fingerprints.into_iter().collect();
        cache.persist(&out.cache_file).await?;

        info!(
            indexed = report.files_indexed,
            skipped = report.files_skipped,
            chunks = report.chunks,
            base = %out.index_base.display(),
            "base knowledge written"
        );
        Ok(report)
    }
}

/// PDF files directly inside `dir`, sorted by file name.
fn list_pdfs(dir: &Path) -> KnowledgeResult<Vec<PathBuf>> {
    if !dir.is_dir() {
        return Err(KnowledgeError::NotFound(dir.to_path_buf()));
    }

    let mut files = Vec::new();
    for entry in walkdir::WalkDir::new(dir)
        .min_depth(1)
        .max_depth(1)
        .sort_by_file_name()
    {
        let entry = entry.map_err(|err| KnowledgeError::Io(err.into()))?;
        if !entry.file_type().is_file() {
            continue;
        }
        let is_pdf = entry
            .path()
            .extension()
            .is_some_and(|ext| ext.eq_ignore_ascii_case("pdf"));
        if is_pdf {
            files.push(entry.into_path());
        }
    }
    Ok(files)
}
