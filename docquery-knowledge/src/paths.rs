use std::ffi::OsString;
use std::path::{Path, PathBuf};

use crate::KnowledgeSettings;
use crate::errors::{KnowledgeError, KnowledgeResult};

pub const INDEX_SUFFIX: &str = ".index";
pub const CHUNKS_SUFFIX: &str = ".chunks.json";
pub const CACHE_SUFFIX: &str = ".cache.json";

/// Locations of the persisted base knowledge unit.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StorePaths {
    /// Shared base name of the index file and its chunk list.
    pub index_base: PathBuf,
    pub cache_file: PathBuf,
}

impl StorePaths {
    pub fn from_settings(settings: &KnowledgeSettings) -> Self {
        Self::new(&settings.store_dir, &settings.base_name)
    }

    pub fn new(store_dir: &Path, base_name: &str) -> Self {
        let index_base = store_dir.join(base_name);
        let cache_file = with_suffix(&index_base, CACHE_SUFFIX);
        Self {
            index_base,
            cache_file,
        }
    }
}

pub fn index_file(base: &Path) -> PathBuf {
    with_suffix(base, INDEX_SUFFIX)
}

pub fn chunks_file(base: &Path) -> PathBuf {
    with_suffix(base, CHUNKS_SUFFIX)
}

fn with_suffix(base: &Path, suffix: &str) -> PathBuf {
    let mut name = OsString::from(base.as_os_str());
    name.push(suffix);
    PathBuf::from(name)
}

/// Read a file that must exist; a missing file maps to `NotFound`.
pub(crate) async fn read_required(path: &Path) -> KnowledgeResult<Vec<u8>> {
    match tokio::fs::read(path).await {
        Ok(bytes) => Ok(bytes),
        Err(err) if err.kind() == std::io::ErrorKind::NotFound => {
            Err(KnowledgeError::NotFound(path.to_path_buf()))
        }
        Err(err) => Err(err.into()),
    }
}

/// Write through a temporary sibling and rename over the target.
pub(crate) async fn write_atomic(path: &Path, bytes: &[u8]) -> KnowledgeResult<()> {
    if let Some(parent) = path.parent()
        && !parent.as_os_str().is_empty()
    {
        tokio::fs::create_dir_all(parent).await?;
    }
    let tmp = with_suffix(path, ".tmp");
    tokio::fs::write(&tmp, bytes).await?;
    tokio::fs::rename(&tmp, path).await?;
    Ok(())
}
