//! API route definitions

use crate::handlers::{chat, documents};
use crate::state::AppState;
use axum::{
    routing::{delete, get, post},
    Router,
};
use std::sync::Arc;

/// Create API v1 routes
pub fn api_routes() -> Router<Arc<AppState>> {
    Router::new()
        // Chat endpoints
        .route("/chat", post(chat::chat_handler))
        .route("/chat/history", get(chat::chat_history))
        .route("/chat/stream", post(chat::chat_stream_handler))
        // Document endpoints
        .route("/documents", get(documents::list_documents))
        .route("/documents", post(documents::upload_document))
        .route("/documents/:id", get(documents::get_document))
        .route("/documents/:id", delete(documents::delete_document))
        .route("/documents/:id/chunks", get(documents::get_document_chunks))
}
