use std::sync::Arc;

use tracing::info;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use docquery_gateway::server;
use docquery_gateway::state::AppState;

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    // Load configuration
    let config = docquery_core::Config::load()?;

    // Initialize tracing
    let env_filter = tracing_subscriber::EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| config.settings.logging.level.as_str().into());
    tracing_subscriber::registry()
        .with(env_filter)
        .with(tracing_subscriber::fmt::layer())
        .init();

    info!("Configuration loaded (model: {})", config.settings.llm.model);

    let orchestrator = docquery_gateway::build_orchestrator(&config).await?;
    info!(
        "Base knowledge {}",
        if orchestrator.snapshot().has_base() {
            "available"
        } else {
            "unavailable"
        }
    );

    let state = Arc::new(AppState::new(
        orchestrator,
        config.api_token().map(ToString::to_string),
    ));

    server::run(state, &config.bind_addr()).await
}
