//! API Integration Tests
//!
//! Note: Tests marked with #[ignore] require PostgreSQL and Qdrant.
//! To run them, start the backing services and run: cargo test -- --ignored

use axum::{
    body::Body,
    http::{Request, StatusCode},
};
use mqa_api::create_router_for_testing;
use serde_json::{json, Value};
use tower::ServiceExt;

/// Helper to create a test request
fn create_json_request(method: &str, uri: &str, body: Option<Value>) -> Request<Body> {
    let builder = Request::builder()
        .method(method)
        .uri(uri)
        .header("Content-Type", "application/json");

    match body {
        Some(json_body) => builder
            .body(Body::from(serde_json::to_string(&json_body).unwrap()))
            .unwrap(),
        None => builder.body(Body::empty()).unwrap(),
    }
}

async fn response_json(response: axum::response::Response) -> Value {
    let body = axum::body::to_bytes(response.into_body(), usize::MAX)
        .await
        .unwrap();
    serde_json::from_slice(&body).unwrap()
}

// =============================================================================
// Health Check Tests
// =============================================================================

#[tokio::test]
async fn test_health_check() {
    let app = create_router_for_testing();

    let response = app
        .oneshot(
            Request::builder()
                .uri("/health")
                .body(Body::empty())
                .unwrap(),
        )
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::OK);

    let json = response_json(response).await;
    assert_eq!(json["status"], "ok");
    assert!(json["version"].is_string());
}

#[tokio::test]
async fn test_readiness_check() {
    let app = create_router_for_testing();

    let response = app
        .oneshot(
            Request::builder()
                .uri("/ready")
                .body(Body::empty())
                .unwrap(),
        )
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::OK);

    let json = response_json(response).await;
    assert!(json["ready"].is_boolean());
    assert!(json["checks"].is_object());
}

#[tokio::test]
async fn test_metrics_endpoint() {
    let app = create_router_for_testing();

    let response = app
        .oneshot(
            Request::builder()
                .uri("/metrics")
                .body(Body::empty())
                .unwrap(),
        )
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::OK);

    let json = response_json(response).await;
    assert!(json["uptime_seconds"].is_number());
    assert!(json["total_requests"].is_number());
    assert!(json["query_cache_hits"].is_number());
}

#[tokio::test]
async fn test_service_info() {
    let app = create_router_for_testing();

    let response = app
        .oneshot(Request::builder().uri("/").body(Body::empty()).unwrap())
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::OK);

    let json = response_json(response).await;
    assert!(json["message"].is_string());
    assert!(json["endpoints"]["chat"].is_string());
}

// =============================================================================
// Chat API Tests
// =============================================================================

#[tokio::test]
async fn test_chat_empty_query() {
    let app = create_router_for_testing();

    let request = create_json_request(
        "POST",
        "/api/v1/chat",
        Some(json!({
            "query": ""
        })),
    );

    let response = app.oneshot(request).await.unwrap();

    assert_eq!(response.status(), StatusCode::BAD_REQUEST);

    let json = response_json(response).await;
    assert_eq!(json["code"], "BAD_REQUEST");
}

#[tokio::test]
async fn test_chat_whitespace_query() {
    let app = create_router_for_testing();

    let request = create_json_request(
        "POST",
        "/api/v1/chat",
        Some(json!({
            "query": "   "
        })),
    );

    let response = app.oneshot(request).await.unwrap();

    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
}

#[tokio::test]
async fn test_chat_stream_empty_query() {
    let app = create_router_for_testing();

    let request = create_json_request(
        "POST",
        "/api/v1/chat/stream",
        Some(json!({
            "query": ""
        })),
    );

    let response = app.oneshot(request).await.unwrap();

    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
}

#[tokio::test]
#[ignore = "requires database and vector store"]
async fn test_chat_success() {
    let app = create_router_for_testing();

    let request = create_json_request(
        "POST",
        "/api/v1/chat",
        Some(json!({
            "query": "How do I save a patch?",
            "top_k": 5
        })),
    );

    let response = app.oneshot(request).await.unwrap();

    assert_eq!(response.status(), StatusCode::OK);

    let json = response_json(response).await;
    assert!(json["answer"].is_string());
    assert!(json["citations"].is_array());
    assert!(json["processing_time_ms"].is_number());
}

#[tokio::test]
#[ignore = "requires database"]
async fn test_chat_history() {
    let app = create_router_for_testing();

    let response = app
        .oneshot(
            Request::builder()
                .uri("/api/v1/chat/history?limit=10")
                .body(Body::empty())
                .unwrap(),
        )
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::OK);

    let json = response_json(response).await;
    assert!(json["chats"].is_array());
    assert!(json["total"].is_number());
}

// =============================================================================
// Document API Tests
// =============================================================================

#[tokio::test]
async fn test_upload_empty_filename() {
    let app = create_router_for_testing();

    let request = create_json_request(
        "POST",
        "/api/v1/documents",
        Some(json!({
            "filename": "",
            "content": "dGVzdCBjb250ZW50"
        })),
    );

    let response = app.oneshot(request).await.unwrap();

    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
}

#[tokio::test]
async fn test_upload_rejects_non_pdf() {
    let app = create_router_for_testing();

    let request = create_json_request(
        "POST",
        "/api/v1/documents",
        Some(json!({
            "filename": "notes.txt",
            "content": "dGVzdCBjb250ZW50"
        })),
    );

    let response = app.oneshot(request).await.unwrap();

    assert_eq!(response.status(), StatusCode::BAD_REQUEST);

    let json = response_json(response).await;
    assert!(json["message"]
        .as_str()
        .unwrap()
        .contains("Only PDF files are supported"));
}

#[tokio::test]
async fn test_upload_rejects_invalid_base64() {
    let app = create_router_for_testing();

    let request = create_json_request(
        "POST",
        "/api/v1/documents",
        Some(json!({
            "filename": "manual.pdf",
            "content": "not base64 !!!"
        })),
    );

    let response = app.oneshot(request).await.unwrap();

    assert_eq!(response.status(), StatusCode::BAD_REQUEST);

    let json = response_json(response).await;
    assert!(json["message"].as_str().unwrap().contains("base64"));
}

#[tokio::test]
#[ignore = "requires database"]
async fn test_list_documents() {
    let app = create_router_for_testing();

    let response = app
        .oneshot(
            Request::builder()
                .uri("/api/v1/documents?limit=10&offset=0")
                .body(Body::empty())
                .unwrap(),
        )
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::OK);

    let json = response_json(response).await;
    assert!(json["documents"].is_array());
    assert!(json["total"].is_number());
}

#[tokio::test]
#[ignore = "requires database"]
async fn test_get_document_not_found() {
    let app = create_router_for_testing();

    let response = app
        .oneshot(
            Request::builder()
                .uri("/api/v1/documents/550e8400-e29b-41d4-a716-446655440000")
                .body(Body::empty())
                .unwrap(),
        )
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::NOT_FOUND);
}

#[tokio::test]
#[ignore = "requires database and vector store"]
async fn test_delete_document_not_found() {
    let app = create_router_for_testing();

    let response = app
        .oneshot(
            Request::builder()
                .method("DELETE")
                .uri("/api/v1/documents/550e8400-e29b-41d4-a716-446655440000")
                .body(Body::empty())
                .unwrap(),
        )
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::NOT_FOUND);
}

// =============================================================================
// OpenAPI/Swagger Tests
// =============================================================================

#[tokio::test]
async fn test_openapi_spec_available() {
    let app = create_router_for_testing();

    let response = app
        .oneshot(
            Request::builder()
                .uri("/api-docs/openapi.json")
                .body(Body::empty())
                .unwrap(),
        )
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::OK);

    let json = response_json(response).await;
    assert!(json["openapi"].is_string());
    assert!(json["paths"]["/api/v1/chat"].is_object());
    assert!(json["paths"]["/api/v1/documents"].is_object());
}

#[tokio::test]
async fn test_swagger_ui_available() {
    let app = create_router_for_testing();

    let response = app
        .oneshot(
            Request::builder()
                .uri("/swagger-ui/")
                .body(Body::empty())
                .unwrap(),
        )
        .await
        .unwrap();

    // Swagger UI should redirect or return HTML
    assert!(
        response.status() == StatusCode::OK || response.status() == StatusCode::MOVED_PERMANENTLY
    );
}
