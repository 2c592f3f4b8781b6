//! MQA API - REST server
//!
//! HTTP surface for the manual question-answering system: document
//! ingestion, chat with citations, history, and operational endpoints.

pub mod error;
pub mod handlers;
pub mod openapi;
pub mod routes;
pub mod state;

use axum::extract::DefaultBodyLimit;
use axum::http::HeaderValue;
use axum::routing::get;
use axum::Router;
use std::sync::Arc;
use tower_http::cors::{AllowOrigin, Any, CorsLayer};
use tower_http::trace::TraceLayer;
use utoipa::OpenApi;
use utoipa_swagger_ui::SwaggerUi;

use crate::state::AppState;

/// Build the application router
pub fn create_router(state: Arc<AppState>) -> Router {
    let cors = if state.config.server.cors_origins.is_empty() {
        CorsLayer::permissive()
    } else {
        let origins: Vec<HeaderValue> = state
            .config
            .server
            .cors_origins
            .iter()
            .filter_map(|origin| origin.parse().ok())
            .collect();

        CorsLayer::new()
            .allow_origin(AllowOrigin::list(origins))
            .allow_methods(Any)
            .allow_headers(Any)
    };

    let max_body_size = state.config.server.max_body_size;

    Router::new()
        .route("/", get(handlers::health::service_info))
        .route("/health", get(handlers::health::health_check))
        .route("/ready", get(handlers::health::readiness_check))
        .route("/metrics", get(handlers::health::metrics))
        .nest("/api/v1", routes::api_routes())
        .merge(
            SwaggerUi::new("/swagger-ui")
                .url("/api-docs/openapi.json", openapi::ApiDoc::openapi()),
        )
        .layer(TraceLayer::new_for_http())
        .layer(cors)
        .layer(DefaultBodyLimit::max(max_body_size))
        .with_state(state)
}

/// Build a router backed by lazy connections and disabled embeddings
///
/// Nothing is contacted until a handler actually needs a backend, so
/// endpoints whose validation fails early are fully testable offline.
#[cfg(any(test, feature = "test-utils"))]
pub fn create_router_for_testing() -> Router {
    use mqa_core::{AppConfig, LlmProvider, MetadataStore};

    let mut config = AppConfig::default();
    config.llm.disable_embeddings = true;
    config.llm.provider = LlmProvider::Ollama;

    let store = MetadataStore::connect_lazy(&config.database.postgres_url, 2)
        .expect("lazy pool from default URL");
    let state = AppState::with_store(config, store).expect("test state");

    create_router(Arc::new(state))
}
