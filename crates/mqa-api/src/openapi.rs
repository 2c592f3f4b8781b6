//! OpenAPI documentation

use utoipa::OpenApi;

use crate::error::ApiError;
use crate::handlers::{chat, documents, health};

/// OpenAPI specification for the MQA API
#[derive(OpenApi)]
#[openapi(
    info(
        title = "MQA API",
        description = "Retrieval-augmented question answering over PDF manuals"
    ),
    paths(
        health::health_check,
        health::readiness_check,
        documents::list_documents,
        documents::get_document,
        documents::get_document_chunks,
        documents::upload_document,
        documents::delete_document,
        chat::chat_handler,
        chat::chat_history,
    ),
    components(schemas(
        ApiError,
        health::HealthResponse,
        health::ReadinessResponse,
        health::ReadinessChecks,
        documents::DocumentInfo,
        documents::DocumentListResponse,
        documents::ChunkInfo,
        documents::DocumentChunksResponse,
        documents::UploadDocumentRequest,
        documents::DocumentUploadResponse,
        documents::DeleteDocumentResponse,
        chat::ChatRequest,
        chat::ChatResponse,
        chat::CitationInfo,
        chat::ChatHistoryItem,
        chat::ChatHistoryResponse,
    )),
    tags(
        (name = "health", description = "Liveness and readiness probes"),
        (name = "documents", description = "PDF upload, listing, and deletion"),
        (name = "chat", description = "Question answering with citations")
    )
)]
pub struct ApiDoc;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_openapi_spec_builds() {
        let spec = ApiDoc::openapi();
        let json = spec.to_json().expect("spec serializes");

        assert!(json.contains("/api/v1/chat"));
        assert!(json.contains("/api/v1/documents"));
    }
}
