pub mod answer;
pub mod app;
pub mod content;
pub mod orchestrator;
pub mod providers;
pub mod server;
pub mod state;
pub mod web;

pub use answer::{AnswerGenerator, LlmAnswerGenerator};
pub use app::{StartupError, build_orchestrator};
pub use orchestrator::{FailureKind, Orchestrator, RequestError, RetrievalOptions};
pub use providers::provider::{
    Provider, ProviderError, ProviderResponse, ProviderUsage, extract_text,
};
pub use state::{AppState, KnowledgeSnapshot};
