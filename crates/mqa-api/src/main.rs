//! MQA API Server
//!
//! REST API server for retrieval-augmented question answering over
//! PDF manuals.

use mqa_api::{create_router, state::AppState};
use mqa_core::AppConfig;
use std::sync::Arc;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // Initialize tracing
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "mqa_api=debug,tower_http=debug".into()),
        )
        .init();

    // Load configuration
    let config = AppConfig::from_env().unwrap_or_default();
    let addr = format!("{}:{}", config.server.host, config.server.port);

    // Connect backends and build application state
    let state = Arc::new(AppState::initialize(config).await?);

    // Apply schema migrations
    state.store.run_migrations().await?;
    tracing::info!("database schema up to date");

    // Collection setup is best-effort at startup; ingestion will surface
    // the error if Qdrant is actually unreachable.
    if let Err(e) = state.vector_store.ensure_collection().await {
        tracing::warn!("could not initialize vector collection: {e}");
    }

    // Create router and serve
    let app = create_router(state);
    let listener = tokio::net::TcpListener::bind(&addr).await?;

    tracing::info!("MQA API server starting on http://{}", addr);
    tracing::info!("Swagger UI available at http://{}/swagger-ui", addr);
    tracing::info!("OpenAPI spec at http://{}/api-docs/openapi.json", addr);

    axum::serve(listener, app).await?;

    Ok(())
}
