pub mod openrouter;
pub mod provider;

pub use provider::{Provider, ProviderError, ProviderResponse, ProviderUsage, extract_text};
