use std::time::Duration;

use tracing::debug;

use docquery_core::FetchSettings;

use super::{DocumentFetcher, FetchError, parse_document_url};

#[derive(Debug, Clone)]
pub struct HttpDocumentFetcher {
    client: reqwest::Client,
    timeout: Duration,
    max_bytes: usize,
}

impl HttpDocumentFetcher {
    pub fn new(timeout: Duration, max_bytes: usize) -> Result<Self, FetchError> {
        let client = reqwest::Client::builder()
            .timeout(timeout)
            .build()
            .map_err(|e| FetchError::RequestFailed(e.to_string()))?;

        Ok(Self {
            client,
            timeout,
            max_bytes,
        })
    }

    pub fn from_settings(settings: &FetchSettings) -> Result<Self, FetchError> {
        Self::new(
            Duration::from_secs(settings.timeout_seconds),
            settings.max_bytes,
        )
    }
}

#[async_trait::async_trait]
impl DocumentFetcher for HttpDocumentFetcher {
    async fn fetch(&self, url: &str) -> Result<Vec<u8>, FetchError> {
        let parsed = parse_document_url(url)?;

        let mut response = self
            .client
            .get(parsed)
            .timeout(self.timeout)
            .send()
            .await
            .map_err(|e| FetchError::RequestFailed(e.to_string()))?;

        let status = response.status();
        if !status.is_success() {
            return Err(FetchError::Status(status.as_u16()));
        }

        if let Some(length) = response.content_length()
            && length > self.max_bytes as u64
        {
            return Err(FetchError::TooLarge {
                limit: self.max_bytes,
            });
        }

        let mut body = Vec::new();
        while let Some(chunk) = response
            .chunk()
            .await
            .map_err(|e| FetchError::RequestFailed(e.to_string()))?
        {
            if body.len() + chunk.len() > self.max_bytes {
                return Err(FetchError::TooLarge {
                    limit: self.max_bytes,
                });
            }
            body.extend_from_slice(&chunk);
        }

        debug!(bytes = body.len(), "fetched document");
        Ok(body)
    }
}
