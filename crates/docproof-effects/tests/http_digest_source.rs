//! HTTP digest source against a fake document service

use assert_matches::assert_matches;
use axum::extract::Path;
use axum::http::{HeaderMap, StatusCode};
use axum::routing::get;
use axum::{Json, Router};
use docproof_core::effects::DigestSourceEffects;
use docproof_core::{canonicalize, ProofError};
use docproof_effects::HttpDigestSource;
use docproof_testkit::fixtures::{SAMPLE_DOCUMENT, SAMPLE_SHA256};
use serde_json::{json, Value};
use std::time::Duration;
use tokio::net::TcpListener;

const TOKEN: &str = "test-token";

async fn proof_hash(
    headers: HeaderMap,
    Path(document_id): Path<String>,
) -> (StatusCode, Json<Value>) {
    let authorized = headers
        .get("authorization")
        .and_then(|v| v.to_str().ok())
        .is_some_and(|v| v == format!("Bearer {TOKEN}"));
    if !authorized {
        return (
            StatusCode::UNAUTHORIZED,
            Json(json!({
                "success": false,
                "error": "Unauthorized",
                "error_code": "AUTH_REQUIRED"
            })),
        );
    }
    match document_id.as_str() {
        SAMPLE_DOCUMENT => (
            StatusCode::OK,
            Json(json!({ "success": true, "document_id": document_id, "sha256": SAMPLE_SHA256 })),
        ),
        "pending" => (
            StatusCode::OK,
            Json(json!({ "success": false, "error": "Hash not computed yet" })),
        ),
        "teapot" => (StatusCode::IM_A_TEAPOT, Json(Value::Null)),
        _ => (
            StatusCode::NOT_FOUND,
            Json(json!({
                "success": false,
                "error": "Document not found",
                "error_code": "NOT_FOUND"
            })),
        ),
    }
}

async fn serve() -> String {
    let app = Router::new().route("/api/proof/hash/:document_id", get(proof_hash));
    let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();
    tokio::spawn(async move {
        axum::serve(listener, app).await.unwrap();
    });
    format!("http://{addr}/api")
}

fn source(base: &str, token: Option<&str>) -> HttpDigestSource {
    HttpDigestSource::new(base, token.map(str::to_string), Duration::from_secs(5)).unwrap()
}

#[tokio::test]
async fn fetches_digest_with_bearer_token() {
    let base = serve().await;
    let raw = source(&base, Some(TOKEN))
        .fetch_digest(SAMPLE_DOCUMENT)
        .await
        .unwrap();
    assert_eq!(raw, SAMPLE_SHA256);
    assert!(canonicalize(&raw).is_ok());
}

#[tokio::test]
async fn service_errors_carry_collaborator_message() {
    let base = serve().await;
    let digests = source(&base, Some(TOKEN));

    assert_matches!(
        digests.fetch_digest("missing").await,
        Err(ProofError::DigestUnavailable { ref message, .. }) if message == "Document not found"
    );
    assert_matches!(
        digests.fetch_digest("pending").await,
        Err(ProofError::DigestUnavailable { ref message, .. }) if message == "Hash not computed yet"
    );
    assert_matches!(
        digests.fetch_digest("teapot").await,
        Err(ProofError::DigestUnavailable { ref message, .. }) if message.contains("418")
    );
}

#[tokio::test]
async fn missing_token_is_rejected() {
    let base = serve().await;
    assert_matches!(
        source(&base, None).fetch_digest(SAMPLE_DOCUMENT).await,
        Err(ProofError::DigestUnavailable { ref message, .. }) if message == "Unauthorized"
    );
}

#[tokio::test]
async fn unreachable_service_is_connectivity_error() {
    let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();
    drop(listener);

    assert_matches!(
        source(&format!("http://{addr}/api"), None)
            .fetch_digest(SAMPLE_DOCUMENT)
            .await,
        Err(ProofError::Connectivity { .. })
    );
}
