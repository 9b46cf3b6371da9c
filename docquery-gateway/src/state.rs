use std::sync::Arc;

use tracing::{info, warn};

use docquery_knowledge::{ContentCache, KnowledgeError, StorePaths, VectorIndex};

use crate::orchestrator::Orchestrator;

/// Base knowledge loaded once at startup and shared read-only by every
/// request.
#[derive(Debug, Default)]
pub struct KnowledgeSnapshot {
    pub base: Option<Arc<VectorIndex>>,
    pub cache: ContentCache,
}

impl KnowledgeSnapshot {
    pub fn new(base: Option<VectorIndex>, cache: ContentCache) -> Self {
        // A cache hit routes to the base index, so a cache without one is useless.
        let cache = if base.is_some() {
            cache
        } else {
            ContentCache::new()
        };
        Self {
            base: base.map(Arc::new),
            cache,
        }
    }

    /// Load the base index and content cache. Missing or unreadable
    /// artifacts are logged; boot continues without base knowledge.
    pub async fn load(paths: &StorePaths) -> Self {
        let base = match VectorIndex::load(&paths.index_base).await {
            Ok(index) => {
                info!(
                    base = %paths.index_base.display(),
                    chunks = index.len(),
                    dim = index.dim(),
                    "base knowledge loaded"
                );
                Some(index)
            }
            Err(KnowledgeError::NotFound(path)) => {
                warn!(
                    path = %path.display(),
                    "base knowledge not found; only supplied documents can be queried"
                );
                None
            }
            Err(err) => {
                warn!(error = %err, "failed to load base knowledge");
                None
            }
        };

        let cache = if base.is_none() {
            ContentCache::new()
        } else {
            match ContentCache::load(&paths.cache_file).await {
                Ok(cache) => {
                    info!(entries = cache.len(), "content cache loaded");
                    cache
                }
                Err(KnowledgeError::NotFound(_)) => ContentCache::new(),
                Err(err) => {
                    warn!(error = %err, "failed to load content cache; continuing without it");
                    ContentCache::new()
                }
            }
        };

        Self::new(base, cache)
    }

    pub fn has_base(&self) -> bool {
        self.base.is_some()
    }
}

/// Shared state for HTTP handlers.
pub struct AppState {
    pub orchestrator: Orchestrator,
    /// Expected bearer token; `None` disables the check.
    pub api_token: Option<String>,
}

impl AppState {
    pub fn new(orchestrator: Orchestrator, api_token: Option<String>) -> Self {
        Self {
            orchestrator,
            api_token,
        }
    }

    pub fn snapshot(&self) -> &KnowledgeSnapshot {
        self.orchestrator.snapshot()
    }
}
