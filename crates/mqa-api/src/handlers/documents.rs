//! Document management handlers

use crate::error::AppError;
use crate::state::AppState;
use axum::{
    extract::{Path, Query, State},
    http::StatusCode,
    response::IntoResponse,
    Json,
};
use base64::Engine;
use chrono::{DateTime, Utc};
use mqa_core::{DocumentMetadata, MetadataRepository};
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use utoipa::{IntoParams, ToSchema};
use uuid::Uuid;

/// Document information
#[derive(Debug, Serialize, ToSchema)]
pub struct DocumentInfo {
    /// Document UUID
    #[schema(example = "550e8400-e29b-41d4-a716-446655440000")]
    pub id: Uuid,

    /// Stored filename
    #[schema(example = "sh-101_manual.pdf")]
    pub filename: String,

    /// Filename as uploaded
    #[schema(example = "sh-101_manual.pdf")]
    pub original_filename: String,

    /// File size in bytes
    #[schema(example = 2048576)]
    pub file_size: u64,

    /// Number of pages
    #[schema(example = 48)]
    pub num_pages: u32,

    /// Number of chunks
    #[schema(example = 120)]
    pub num_chunks: u32,

    /// Upload timestamp
    pub upload_date: DateTime<Utc>,
}

impl From<DocumentMetadata> for DocumentInfo {
    fn from(doc: DocumentMetadata) -> Self {
        Self {
            id: doc.id,
            filename: doc.filename,
            original_filename: doc.original_filename,
            file_size: doc.file_size,
            num_pages: doc.num_pages,
            num_chunks: doc.num_chunks,
            upload_date: doc.upload_date,
        }
    }
}

/// Document list response
#[derive(Debug, Serialize, ToSchema)]
pub struct DocumentListResponse {
    /// List of documents
    pub documents: Vec<DocumentInfo>,

    /// Total count
    pub total: u64,
}

/// Query parameters for paginated listings
#[derive(Debug, Deserialize, IntoParams)]
pub struct PageQuery {
    /// Maximum items to return
    #[param(default = 50)]
    pub limit: Option<i64>,

    /// Items to skip
    #[param(default = 0)]
    pub offset: Option<i64>,
}

impl PageQuery {
    fn limit(&self) -> i64 {
        self.limit.unwrap_or(50).clamp(1, 200)
    }

    fn offset(&self) -> i64 {
        self.offset.unwrap_or(0).max(0)
    }
}

/// List uploaded documents
#[utoipa::path(
    get,
    path = "/api/v1/documents",
    tag = "documents",
    params(PageQuery),
    responses(
        (status = 200, description = "Document list", body = DocumentListResponse)
    )
)]
pub async fn list_documents(
    State(state): State<Arc<AppState>>,
    Query(params): Query<PageQuery>,
) -> Result<impl IntoResponse, AppError> {
    state.increment_requests();

    let documents = state
        .store
        .list_documents(params.limit(), params.offset())
        .await?;
    let total = state.store.count_documents().await?;

    let response = DocumentListResponse {
        documents: documents.into_iter().map(DocumentInfo::from).collect(),
        total,
    };

    Ok((StatusCode::OK, Json(response)))
}

/// Get single document by ID
#[utoipa::path(
    get,
    path = "/api/v1/documents/{id}",
    tag = "documents",
    params(
        ("id" = Uuid, Path, description = "Document UUID")
    ),
    responses(
        (status = 200, description = "Document details", body = DocumentInfo),
        (status = 404, description = "Document not found", body = crate::error::ApiError)
    )
)]
pub async fn get_document(
    State(state): State<Arc<AppState>>,
    Path(id): Path<Uuid>,
) -> Result<impl IntoResponse, AppError> {
    state.increment_requests();

    let document = state
        .store
        .get_document(id)
        .await?
        .ok_or_else(|| AppError::NotFound("Document".to_string()))?;

    Ok((StatusCode::OK, Json(DocumentInfo::from(document))))
}

/// Chunk information
#[derive(Debug, Serialize, ToSchema)]
pub struct ChunkInfo {
    /// Chunk UUID
    pub id: Uuid,

    /// Chunk index within the document
    pub chunk_index: u32,

    /// Chunk text
    pub content: String,

    /// Page the chunk was cut from
    pub page_number: u32,

    /// Vector store point ID
    pub embedding_id: String,
}

/// Document chunks response
#[derive(Debug, Serialize, ToSchema)]
pub struct DocumentChunksResponse {
    /// Parent document UUID
    pub document_id: Uuid,

    /// Chunks for the requested page window
    pub chunks: Vec<ChunkInfo>,

    /// Total chunk count for the document
    pub total: u64,
}

/// List chunks for a document
#[utoipa::path(
    get,
    path = "/api/v1/documents/{id}/chunks",
    tag = "documents",
    params(
        ("id" = Uuid, Path, description = "Document UUID"),
        PageQuery
    ),
    responses(
        (status = 200, description = "Chunk list", body = DocumentChunksResponse),
        (status = 404, description = "Document not found", body = crate::error::ApiError)
    )
)]
pub async fn get_document_chunks(
    State(state): State<Arc<AppState>>,
    Path(id): Path<Uuid>,
    Query(params): Query<PageQuery>,
) -> Result<impl IntoResponse, AppError> {
    state.increment_requests();

    if state.store.get_document(id).await?.is_none() {
        return Err(AppError::NotFound("Document".to_string()));
    }

    let chunks = state
        .store
        .get_chunks(id, params.limit(), params.offset())
        .await?;
    let total = state.store.count_chunks(id).await?;

    let response = DocumentChunksResponse {
        document_id: id,
        chunks: chunks
            .into_iter()
            .map(|chunk| ChunkInfo {
                id: chunk.id,
                chunk_index: chunk.chunk_index,
                content: chunk.content,
                page_number: chunk.page_number,
                embedding_id: chunk.embedding_id,
            })
            .collect(),
        total,
    };

    Ok((StatusCode::OK, Json(response)))
}

/// Upload document request
#[derive(Debug, Deserialize, ToSchema)]
pub struct UploadDocumentRequest {
    /// Original filename; must end in .pdf
    #[schema(example = "sh-101_manual.pdf")]
    pub filename: String,

    /// Base64 encoded file content
    pub content: String,
}

/// Upload document response
#[derive(Debug, Serialize, ToSchema)]
pub struct DocumentUploadResponse {
    /// Stored document
    #[serde(flatten)]
    pub document: DocumentInfo,

    /// Status message
    pub message: String,
}

/// Upload and synchronously ingest a PDF document
#[utoipa::path(
    post,
    path = "/api/v1/documents",
    tag = "documents",
    request_body = UploadDocumentRequest,
    responses(
        (status = 201, description = "Document uploaded and processed", body = DocumentUploadResponse),
        (status = 400, description = "Invalid request", body = crate::error::ApiError)
    )
)]
pub async fn upload_document(
    State(state): State<Arc<AppState>>,
    Json(req): Json<UploadDocumentRequest>,
) -> Result<impl IntoResponse, AppError> {
    state.increment_requests();

    if req.filename.trim().is_empty() {
        return Err(AppError::BadRequest("Filename cannot be empty".to_string()));
    }

    let bytes = base64::engine::general_purpose::STANDARD
        .decode(&req.content)
        .map_err(|_| AppError::BadRequest("Content is not valid base64".to_string()))?;

    let document = state.processor.process(&bytes, &req.filename).await?;

    let response = DocumentUploadResponse {
        document: DocumentInfo::from(document),
        message: "Document uploaded and processed successfully".to_string(),
    };

    Ok((StatusCode::CREATED, Json(response)))
}

/// Delete document response
#[derive(Debug, Serialize, ToSchema)]
pub struct DeleteDocumentResponse {
    pub message: String,
}

/// Delete a document and its indexed vectors
#[utoipa::path(
    delete,
    path = "/api/v1/documents/{id}",
    tag = "documents",
    params(
        ("id" = Uuid, Path, description = "Document UUID")
    ),
    responses(
        (status = 200, description = "Document deleted", body = DeleteDocumentResponse),
        (status = 404, description = "Document not found", body = crate::error::ApiError)
    )
)]
pub async fn delete_document(
    State(state): State<Arc<AppState>>,
    Path(id): Path<Uuid>,
) -> Result<impl IntoResponse, AppError> {
    state.increment_requests();

    let deleted = state.processor.delete(id).await?;
    if !deleted {
        return Err(AppError::NotFound("Document".to_string()));
    }

    Ok((
        StatusCode::OK,
        Json(DeleteDocumentResponse {
            message: "Document deleted successfully".to_string(),
        }),
    ))
}
