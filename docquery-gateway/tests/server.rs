//! HTTP surface driven through the router without binding a socket.

mod common;

use std::sync::Arc;

use axum::{
    Router,
    body::{Body, to_bytes},
    http::{Request, StatusCode, header},
};
use insta::assert_json_snapshot;
use serde_json::{Value, json};
use tower::ServiceExt;

use docquery_gateway::server::create_router;
use docquery_gateway::{AppState, KnowledgeSnapshot};

use common::{Harness, RecordingEmbedder, harness, loaded_snapshot};

const TOKEN: &str = "test-token";

fn router(snapshot: KnowledgeSnapshot, token: Option<&str>) -> Router {
    router_for(harness(snapshot, RecordingEmbedder::new()), token)
}

fn router_for(h: Harness, token: Option<&str>) -> Router {
    create_router(Arc::new(AppState::new(
        h.orchestrator,
        token.map(ToString::to_string),
    )))
}

fn run_request(body: Value, token: Option<&str>) -> Request<Body> {
    let mut builder = Request::builder()
        .method("POST")
        .uri("/api/v1/run")
        .header(header::CONTENT_TYPE, "application/json");
    if let Some(token) = token {
        builder = builder.header(header::AUTHORIZATION, format!("Bearer {token}"));
    }
    builder.body(Body::from(body.to_string())).expect("request")
}

async fn send(app: Router, request: Request<Body>) -> (StatusCode, Value) {
    let response = app.oneshot(request).await.expect("router response");
    let status = response.status();
    let bytes = to_bytes(response.into_body(), usize::MAX).await.expect("body");
    let body = serde_json::from_slice(&bytes).unwrap_or(Value::Null);
    (status, body)
}

#[tokio::test]
async fn health_reports_base_knowledge() {
    let app = router(loaded_snapshot().await, Some(TOKEN));
    let request = Request::builder()
        .uri("/health")
        .body(Body::empty())
        .expect("request");

    let (status, body) = send(app, request).await;
    assert_eq!(status, StatusCode::OK);
    assert_json_snapshot!(body, { ".version" => "[version]" }, @r#"
    {
      "base_knowledge": true,
      "status": "ok",
      "version": "[version]"
    }
    "#);
}

#[tokio::test]
async fn run_answers_in_order() {
    let app = router(loaded_snapshot().await, Some(TOKEN));
    let request = run_request(
        json!({ "questions": ["20:What is the grace period?", "0:Is cataract covered?"] }),
        Some(TOKEN),
    );

    let (status, body) = send(app, request).await;
    assert_eq!(status, StatusCode::OK);
    assert_json_snapshot!(body, @r#"
    {
      "answers": [
        "answer to 20:What is the grace period?",
        "answer to 0:Is cataract covered?"
      ]
    }
    "#);
}

#[tokio::test]
async fn run_rejects_bad_token() {
    let app = router(loaded_snapshot().await, Some(TOKEN));

    let (status, _) = send(app.clone(), run_request(json!({ "questions": ["q"] }), None)).await;
    assert_eq!(status, StatusCode::UNAUTHORIZED);

    let (status, _) = send(app, run_request(json!({ "questions": ["q"] }), Some("wrong"))).await;
    assert_eq!(status, StatusCode::UNAUTHORIZED);
}

#[tokio::test]
async fn run_checks_token_before_reading_body() {
    let app = router(loaded_snapshot().await, Some(TOKEN));

    let (status, body) = send(app.clone(), run_request(json!({ "nope": 1 }), None)).await;
    assert_eq!(status, StatusCode::UNAUTHORIZED);
    assert_json_snapshot!(body, @r#"
    {
      "error": "invalid or missing bearer token"
    }
    "#);

    let (status, _) = send(app, run_request(json!({ "nope": 1 }), Some(TOKEN))).await;
    assert_eq!(status, StatusCode::UNPROCESSABLE_ENTITY);
}

#[tokio::test]
async fn run_without_configured_token_is_open() {
    let app = router(loaded_snapshot().await, None);
    let (status, body) = send(app, run_request(json!({ "questions": ["q"] }), None)).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["answers"][0], "answer to q");
}

#[tokio::test]
async fn run_validates_input() {
    let app = router(loaded_snapshot().await, Some(TOKEN));

    let (status, _) = send(app.clone(), run_request(json!({ "questions": [] }), Some(TOKEN))).await;
    assert_eq!(status, StatusCode::UNPROCESSABLE_ENTITY);

    let (status, body) = send(
        app,
        run_request(
            json!({ "documents": "ftp://docs.test/a.pdf", "questions": ["q"] }),
            Some(TOKEN),
        ),
    )
    .await;
    assert_eq!(status, StatusCode::UNPROCESSABLE_ENTITY);
    assert!(body["error"].as_str().unwrap().contains("ftp"));
}

#[tokio::test]
async fn run_rejects_blank_document_reference() {
    for blank in ["", "   "] {
        let h = harness(loaded_snapshot().await, RecordingEmbedder::new());
        let fetcher = h.fetcher.clone();
        let embedder = h.embedder.clone();
        let app = router_for(h, Some(TOKEN));

        let (status, body) = send(
            app,
            run_request(json!({ "documents": blank, "questions": ["q"] }), Some(TOKEN)),
        )
        .await;

        assert_eq!(status, StatusCode::UNPROCESSABLE_ENTITY);
        assert!(body["error"].as_str().unwrap().starts_with("invalid url"));
        assert_eq!(fetcher.calls(), 0);
        assert!(embedder.calls().is_empty());
    }
}

#[tokio::test]
async fn run_with_null_document_uses_base_knowledge() {
    let h = harness(loaded_snapshot().await, RecordingEmbedder::new());
    let fetcher = h.fetcher.clone();
    let app = router_for(h, Some(TOKEN));

    let (status, body) = send(
        app,
        run_request(json!({ "documents": null, "questions": ["q"] }), Some(TOKEN)),
    )
    .await;

    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["answers"][0], "answer to q");
    assert_eq!(fetcher.calls(), 0);
}

#[tokio::test]
async fn run_maps_failure_kinds_to_status() {
    let app = router(loaded_snapshot().await, Some(TOKEN));
    let (status, body) = send(
        app,
        run_request(
            json!({ "documents": "https://docs.test/missing.pdf", "questions": ["q"] }),
            Some(TOKEN),
        ),
    )
    .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["kind"], "bad_document");

    let app = router(loaded_snapshot().await, Some(TOKEN));
    let (status, body) = send(
        app,
        run_request(
            json!({ "documents": "https://docs.test/scanned.pdf", "questions": ["q"] }),
            Some(TOKEN),
        ),
    )
    .await;
    assert_eq!(status, StatusCode::UNPROCESSABLE_ENTITY);
    assert_eq!(body["kind"], "extraction_failed");

    let app = router(KnowledgeSnapshot::default(), Some(TOKEN));
    let (status, body) = send(app, run_request(json!({ "questions": ["q"] }), Some(TOKEN))).await;
    assert_eq!(status, StatusCode::SERVICE_UNAVAILABLE);
    assert_json_snapshot!(body, @r#"
    {
      "error": "no index available: base knowledge is not loaded",
      "kind": "knowledge_base_unavailable"
    }
    "#);
}
