use std::sync::Arc;

use tracing::warn;

/// Turns raw document bytes into plain text.
///
/// An empty string means nothing usable could be extracted; callers treat
/// it as a failure rather than as an empty document.
pub trait TextExtractor: Send + Sync {
    fn extract(&self, bytes: &[u8]) -> String;
}

/// Text-layer extraction via `pdf-extract`. Scanned PDFs without a text
/// layer come back empty.
#[derive(Debug, Clone, Copy, Default)]
pub struct PdfTextExtractor;

impl TextExtractor for PdfTextExtractor {
    fn extract(&self, bytes: &[u8]) -> String {
        match pdf_extract::extract_text_from_mem(bytes) {
            Ok(text) => text.trim().to_string(),
            Err(err) => {
                warn!(error = %err, "pdf text extraction failed");
                String::new()
            }
        }
    }
}

/// Run an extractor off the async executor. A panicking extractor is
/// reported as an empty extraction.
pub async fn extract_blocking(extractor: Arc<dyn TextExtractor>, bytes: Vec<u8>) -> String {
    match tokio::task::spawn_blocking(move || extractor.extract(&bytes)).await {
        Ok(text) => text,
        Err(err) => {
            warn!(error = %err, "text extraction task failed");
            String::new()
        }
    }
}
