use std::sync::Arc;

use axum::{
    Json, Router,
    extract::{Request, State},
    http::{HeaderMap, StatusCode, header::AUTHORIZATION},
    middleware::{Next, from_fn_with_state},
    response::{IntoResponse, Response},
    routing::{get, post},
};
use serde::{Deserialize, Serialize};
use sha2::{Digest, Sha256};
use tracing::{info, warn};

use crate::orchestrator::{FailureKind, RequestError};
use crate::state::AppState;
use crate::web::fetch::parse_document_url;

/// Query request for the HTTP API
#[derive(Debug, Deserialize)]
pub struct RunRequest {
    /// Document URL; absent or `null` answers from the base knowledge.
    #[serde(default)]
    pub documents: Option<String>,
    pub questions: Vec<String>,
}

/// Ordered answers, one per question
#[derive(Debug, Serialize)]
pub struct RunResponse {
    pub answers: Vec<String>,
}

/// Health check response
#[derive(Debug, Serialize)]
pub struct HealthResponse {
    pub status: String,
    pub version: String,
    pub base_knowledge: bool,
}

/// Error response
#[derive(Debug, Serialize)]
pub struct ErrorResponse {
    pub error: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub kind: Option<FailureKind>,
}

/// Run the HTTP server
pub async fn run(state: Arc<AppState>, bind_addr: &str) -> Result<(), Box<dyn std::error::Error>> {
    if state.api_token.is_none() {
        warn!("DOCQUERY_API_TOKEN is not set; /api/v1/run accepts unauthenticated requests");
    }

    let app = create_router(state);

    let listener = tokio::net::TcpListener::bind(bind_addr).await?;
    info!("Server listening on {}", bind_addr);

    axum::serve(listener, app).await?;
    Ok(())
}

/// Create the router with all routes
pub fn create_router(state: Arc<AppState>) -> Router {
    // Authorization runs before any body extraction.
    let protected = Router::new()
        .route("/api/v1/run", post(run_handler))
        .route_layer(from_fn_with_state(state.clone(), require_token));

    Router::new()
        .route("/health", get(health_handler))
        .merge(protected)
        .with_state(state)
        .layer(tower_http::trace::TraceLayer::new_for_http())
}

/// Reject requests without the configured bearer token.
async fn require_token(
    State(state): State<Arc<AppState>>,
    request: Request,
    next: Next,
) -> Response {
    if let Some(expected) = state.api_token.as_deref()
        && !bearer_matches(request.headers(), expected)
    {
        return error_response(StatusCode::UNAUTHORIZED, "invalid or missing bearer token", None);
    }
    next.run(request).await
}

/// Health check handler
async fn health_handler(State(state): State<Arc<AppState>>) -> impl IntoResponse {
    Json(HealthResponse {
        status: "ok".to_string(),
        version: env!("CARGO_PKG_VERSION").to_string(),
        base_knowledge: state.snapshot().has_base(),
    })
}

/// Query handler - POST /api/v1/run
async fn run_handler(
    State(state): State<Arc<AppState>>,
    Json(request): Json<RunRequest>,
) -> Response {
    if request.questions.is_empty() {
        return error_response(
            StatusCode::UNPROCESSABLE_ENTITY,
            "at least one question is required",
            None,
        );
    }

    // A supplied reference must be a usable URL, blank strings included.
    let document = request.documents.as_deref().map(str::trim);
    if let Some(url) = document
        && let Err(err) = parse_document_url(url)
    {
        return error_response(StatusCode::UNPROCESSABLE_ENTITY, &err.to_string(), None);
    }

    match state.orchestrator.process(document, &request.questions).await {
        Ok(answers) => (StatusCode::OK, Json(RunResponse { answers })).into_response(),
        Err(err) => {
            warn!(error = %err, "request failed");
            request_error_response(&err)
        }
    }
}

fn bearer_matches(headers: &HeaderMap, expected: &str) -> bool {
    headers
        .get(AUTHORIZATION)
        .and_then(|value| value.to_str().ok())
        .and_then(|value| value.strip_prefix("Bearer "))
        .is_some_and(|token| tokens_match(token.trim(), expected))
}

/// Compare fixed-length digests without an early exit.
fn tokens_match(presented: &str, expected: &str) -> bool {
    let presented = Sha256::digest(presented.as_bytes());
    let expected = Sha256::digest(expected.as_bytes());
    presented
        .iter()
        .zip(expected.iter())
        .fold(0u8, |diff, (a, b)| diff | (a ^ b))
        == 0
}

pub fn status_for(kind: FailureKind) -> StatusCode {
    match kind {
        FailureKind::BadDocument => StatusCode::BAD_REQUEST,
        FailureKind::ExtractionFailed => StatusCode::UNPROCESSABLE_ENTITY,
        FailureKind::KnowledgeBaseUnavailable => StatusCode::SERVICE_UNAVAILABLE,
    }
}

fn request_error_response(err: &RequestError) -> Response {
    let kind = err.kind();
    error_response(status_for(kind), &err.to_string(), Some(kind))
}

fn error_response(status: StatusCode, message: &str, kind: Option<FailureKind>) -> Response {
    (
        status,
        Json(ErrorResponse {
            error: message.to_string(),
            kind,
        }),
    )
        .into_response()
}
