//! Health check and service info handlers

use crate::state::AppState;
use axum::{extract::State, http::StatusCode, response::IntoResponse, Json};
use serde::Serialize;
use serde_json::json;
use std::sync::Arc;
use utoipa::ToSchema;

/// Root endpoint with API information
pub async fn service_info() -> impl IntoResponse {
    Json(json!({
        "message": "MQA Manual Question-Answering API",
        "version": env!("CARGO_PKG_VERSION"),
        "docs": "/swagger-ui",
        "endpoints": {
            "chat": "/api/v1/chat",
            "documents": "/api/v1/documents",
            "health": "/health"
        }
    }))
}

/// Health check response
#[derive(Serialize, ToSchema)]
pub struct HealthResponse {
    pub status: String,
    pub version: String,
}

/// Liveness probe - basic health check
#[utoipa::path(
    get,
    path = "/health",
    tag = "health",
    responses(
        (status = 200, description = "Service is alive", body = HealthResponse)
    )
)]
pub async fn health_check() -> impl IntoResponse {
    Json(HealthResponse {
        status: "ok".to_string(),
        version: env!("CARGO_PKG_VERSION").to_string(),
    })
}

/// Readiness response
#[derive(Serialize, ToSchema)]
pub struct ReadinessResponse {
    pub ready: bool,
    pub checks: ReadinessChecks,
}

#[derive(Serialize, ToSchema)]
pub struct ReadinessChecks {
    pub database: bool,
    pub vector_store: bool,
    pub llm: bool,
}

/// Readiness probe - checks dependencies
#[utoipa::path(
    get,
    path = "/ready",
    tag = "health",
    responses(
        (status = 200, description = "Service is ready", body = ReadinessResponse),
        (status = 503, description = "Service not ready")
    )
)]
pub async fn readiness_check(State(state): State<Arc<AppState>>) -> impl IntoResponse {
    let is_ready = state.is_ready();

    let response = ReadinessResponse {
        ready: is_ready,
        checks: ReadinessChecks {
            database: true,
            vector_store: true,
            llm: true,
        },
    };

    if is_ready {
        (StatusCode::OK, Json(response))
    } else {
        (StatusCode::SERVICE_UNAVAILABLE, Json(response))
    }
}

/// JSON metrics response
#[derive(Serialize)]
pub struct MetricsResponse {
    pub uptime_seconds: u64,
    pub total_requests: u64,
    pub requests_per_second: f64,
    /// Points in the vector collection; None when Qdrant is unreachable
    pub indexed_vectors: Option<u64>,
    pub embedding_cache_hits: u64,
    pub embedding_cache_misses: u64,
    pub query_cache_hits: u64,
    pub query_cache_misses: u64,
}

/// Basic operational metrics
pub async fn metrics(State(state): State<Arc<AppState>>) -> impl IntoResponse {
    let uptime = state.uptime_secs();
    let total_requests = state.get_request_count();
    let rps = if uptime > 0 {
        total_requests as f64 / uptime as f64
    } else {
        0.0
    };

    let indexed_vectors = state
        .vector_store
        .collection_stats()
        .await
        .ok()
        .map(|stats| stats.points_count);

    let (embedding_stats, query_stats) = state.rag.cache_stats();

    Json(MetricsResponse {
        uptime_seconds: uptime,
        total_requests,
        requests_per_second: rps,
        indexed_vectors,
        embedding_cache_hits: embedding_stats.hits(),
        embedding_cache_misses: embedding_stats.misses(),
        query_cache_hits: query_stats.hits(),
        query_cache_misses: query_stats.misses(),
    })
}
