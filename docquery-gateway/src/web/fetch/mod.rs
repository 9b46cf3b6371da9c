//! Retrieval of source documents by URL.

pub mod http;

pub use http::HttpDocumentFetcher;

#[derive(Debug, thiserror::Error)]
pub enum FetchError {
    #[error("invalid url: {0}")]
    InvalidUrl(String),
    #[error("unsupported url scheme: {0}")]
    UnsupportedScheme(String),
    #[error("upstream returned status {0}")]
    Status(u16),
    #[error("document exceeds {limit} bytes")]
    TooLarge { limit: usize },
    #[error("request failed: {0}")]
    RequestFailed(String),
}

/// Fetches raw document bytes.
#[async_trait::async_trait]
pub trait DocumentFetcher: Send + Sync {
    async fn fetch(&self, url: &str) -> Result<Vec<u8>, FetchError>;
}

/// Parse `raw` and accept only http and https URLs.
pub fn parse_document_url(raw: &str) -> Result<url::Url, FetchError> {
    let parsed = url::Url::parse(raw.trim()).map_err(|e| FetchError::InvalidUrl(e.to_string()))?;
    match parsed.scheme() {
        "http" | "https" => Ok(parsed),
        other => Err(FetchError::UnsupportedScheme(other.to_string())),
    }
}
