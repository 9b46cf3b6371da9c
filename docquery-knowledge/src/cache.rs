//! Content fingerprints of the documents already folded into the base index.

use std::collections::BTreeSet;
use std::fmt;
use std::path::Path;

use serde::{Deserialize, Serialize};
use sha2::{Digest, Sha256};
use tracing::debug;

use crate::errors::{KnowledgeError, KnowledgeResult};
use crate::paths::{read_required, write_atomic};

/// Lowercase hex SHA-256 digest of extracted document text.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct Fingerprint(String);

impl Fingerprint {
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for Fingerprint {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl TryFrom<String> for Fingerprint {
    type Error = String;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        let valid = value.len() == 64
            && value
                .bytes()
                .all(|b| b.is_ascii_digit() || (b'a'..=b'f').contains(&b));
        if valid {
            Ok(Self(value))
        } else {
            Err(format!("'{value}' is not a lowercase SHA-256 hex digest"))
        }
    }
}

impl From<Fingerprint> for String {
    fn from(value: Fingerprint) -> Self {
        value.0
    }
}

/// Fingerprint the exact text; no normalisation is applied.
pub fn fingerprint(text: &str) -> Fingerprint {
    let mut hasher = Sha256::new();
    hasher.update(text.as_bytes());
    Fingerprint(hex::encode(hasher.finalize()))
}

/// Set of fingerprints whose documents are already in the base index.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ContentCache {
    entries: BTreeSet<Fingerprint>,
}

impl ContentCache {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn contains(&self, fingerprint: &Fingerprint) -> bool {
        self.entries.contains(fingerprint)
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Read a cache file: a JSON array of hex digests.
    pub async fn load(path: &Path) -> KnowledgeResult<Self> {
        let raw = read_required(path).await?;
        let entries: Vec<Fingerprint> =
            serde_json::from_slice(&raw).map_err(|err| KnowledgeError::CorruptCache {
                path: path.to_path_buf(),
                reason: err.to_string(),
            })?;
        debug!(path = %path.display(), entries = entries.len(), "loaded content cache");
        Ok(entries.into_iter().collect())
    }

    /// Write the cache as a sorted JSON array. Only the offline builder
    /// calls this; the serving path never mutates the cache.
    pub async fn persist(&self, path: &Path) -> KnowledgeResult<()> {
        let entries: Vec<&Fingerprint> = self.entries.iter().collect();
        let raw = serde_json::to_vec_pretty(&entries)?;
        write_atomic(path, &raw).await
    }
}

impl FromIterator<Fingerprint> for ContentCache {
    fn from_iter<T: IntoIterator<Item = Fingerprint>>(iter: T) -> Self {
        Self {
            entries: iter.into_iter().collect(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn fingerprint_is_sha256_hex() {
        assert_eq!(
            fingerprint("").as_str(),
            "e3b0c44298fc1c149afbf4c8996fb92427ae41e4649b934ca495991b7852b855"
        );
        assert_eq!(
            fingerprint("abc").as_str(),
            "ba7816bf8f01cfea414140de5dae2223b00361a396177a9cb410ff61f20015ad"
        );
    }

    #[test]
    fn fingerprint_is_exact_match_only() {
        let cache: ContentCache = [fingerprint("policy text")].into_iter().collect();
        assert!(cache.contains(&fingerprint("policy text")));
        assert!(!cache.contains(&fingerprint("policy text ")));
        assert!(!cache.contains(&fingerprint("Policy text")));
    }

    #[test]
    fn rejects_malformed_digests() {
        assert!(Fingerprint::try_from("abc".to_string()).is_err());
        assert!(Fingerprint::try_from("G".repeat(64)).is_err());
        assert!(Fingerprint::try_from("A".repeat(64)).is_err());
        assert!(Fingerprint::try_from("a".repeat(64)).is_ok());
    }

    #[tokio::test]
    async fn persist_then_load_keeps_entries() {
        let dir = tempfile::TempDir::new().unwrap();
        let path = dir.path().join("store").join("base.cache.json");

        let cache: ContentCache = ["b", "a", "c"].iter().map(|t| fingerprint(t)).collect();
        cache.persist(&path).await.unwrap();

        let loaded = ContentCache::load(&path).await.unwrap();
        assert_eq!(loaded, cache);

        let raw: Vec<String> =
            serde_json::from_slice(&std::fs::read(&path).unwrap()).unwrap();
        let mut sorted = raw.clone();
        sorted.sort();
        assert_eq!(raw, sorted);
    }

    #[tokio::test]
    async fn load_distinguishes_missing_and_corrupt() {
        let dir = tempfile::TempDir::new().unwrap();
        let missing = dir.path().join("missing.cache.json");
        assert!(matches!(
            ContentCache::load(&missing).await,
            Err(KnowledgeError::NotFound(_))
        ));

        let corrupt = dir.path().join("corrupt.cache.json");
        std::fs::write(&corrupt, "[\"not-a-digest\"]").unwrap();
        assert!(matches!(
            ContentCache::load(&corrupt).await,
            Err(KnowledgeError::CorruptCache { .. })
        ));
    }
}
