//! RAG chat handlers

use crate::error::AppError;
use crate::state::AppState;
use axum::{
    extract::{Query, State},
    http::StatusCode,
    response::{
        sse::{Event, KeepAlive, Sse},
        IntoResponse,
    },
    Json,
};
use chrono::{DateTime, Utc};
use futures::stream::{self, Stream, StreamExt};
use mqa_core::{ChatCitation, ChatRecord, MetadataRepository};
use serde::{Deserialize, Serialize};
use std::convert::Infallible;
use std::sync::Arc;
use std::time::Duration;
use utoipa::{IntoParams, ToSchema};
use uuid::Uuid;

/// Chat request body
#[derive(Debug, Deserialize, ToSchema)]
pub struct ChatRequest {
    /// User's question
    #[schema(example = "How do I save a patch on the SH-101?")]
    pub query: String,

    /// Document to associate the exchange with (recorded, not a retrieval filter)
    pub document_id: Option<Uuid>,

    /// Number of chunks to retrieve
    #[schema(example = 5)]
    pub top_k: Option<usize>,
}

/// Citation returned with a chat response
#[derive(Debug, Serialize, ToSchema)]
pub struct CitationInfo {
    /// Cited chunk UUID
    pub chunk_id: Uuid,

    /// Chunk text
    pub content: String,

    /// Page the chunk was cut from
    #[schema(example = 15)]
    pub page_number: u32,

    /// Similarity score the chunk was retrieved with
    #[schema(example = 0.92)]
    pub relevance_score: f32,
}

/// Chat response body
#[derive(Debug, Serialize, ToSchema)]
pub struct ChatResponse {
    /// Chat record UUID
    pub id: Uuid,

    /// Generated answer
    pub answer: String,

    /// Chunks the answer was grounded on
    pub citations: Vec<CitationInfo>,

    /// Processing time in milliseconds
    #[schema(example = 1250)]
    pub processing_time_ms: u64,
}

/// Answer a question and record the exchange with its citations
#[utoipa::path(
    post,
    path = "/api/v1/chat",
    tag = "chat",
    request_body = ChatRequest,
    responses(
        (status = 200, description = "Answer with citations", body = ChatResponse),
        (status = 400, description = "Invalid request", body = crate::error::ApiError),
        (status = 500, description = "Internal error", body = crate::error::ApiError)
    )
)]
pub async fn chat_handler(
    State(state): State<Arc<AppState>>,
    Json(req): Json<ChatRequest>,
) -> Result<impl IntoResponse, AppError> {
    state.increment_requests();

    if req.query.trim().is_empty() {
        return Err(AppError::BadRequest("Query cannot be empty".to_string()));
    }

    let result = state.rag.answer(&req.query, req.top_k).await?;

    let chat = ChatRecord::new(req.query.as_str(), result.answer.as_str())
        .with_document(req.document_id)
        .with_response_time_ms(result.processing_time_ms);

    // Resolve retrieved points back to chunk rows; points without a
    // matching row (e.g. from a half-deleted document) are skipped.
    let mut citations = Vec::new();
    let mut citation_rows = Vec::new();

    for source in &result.sources {
        if let Some(chunk) = state
            .store
            .find_chunk_by_embedding_id(&source.embedding_id)
            .await?
        {
            citation_rows.push(ChatCitation::new(chat.id, chunk.id, Some(source.score)));
            citations.push(CitationInfo {
                chunk_id: chunk.id,
                content: chunk.content,
                page_number: chunk.page_number,
                relevance_score: source.score,
            });
        }
    }

    state.store.record_chat(&chat, &citation_rows).await?;

    Ok((
        StatusCode::OK,
        Json(ChatResponse {
            id: chat.id,
            answer: result.answer,
            citations,
            processing_time_ms: result.processing_time_ms,
        }),
    ))
}

/// Query parameters for chat history
#[derive(Debug, Deserialize, IntoParams)]
pub struct HistoryQuery {
    /// Filter by document
    pub document_id: Option<Uuid>,

    /// Maximum items to return
    #[param(default = 50)]
    pub limit: Option<i64>,

    /// Items to skip
    #[param(default = 0)]
    pub offset: Option<i64>,
}

/// Chat history item
#[derive(Debug, Serialize, ToSchema)]
pub struct ChatHistoryItem {
    pub id: Uuid,
    pub user_query: String,
    pub ai_response: String,
    pub created_at: DateTime<Utc>,
    pub response_time_ms: Option<u64>,
    pub document_id: Option<Uuid>,
}

/// Chat history response
#[derive(Debug, Serialize, ToSchema)]
pub struct ChatHistoryResponse {
    pub chats: Vec<ChatHistoryItem>,
    pub total: u64,
}

/// Get chat history, optionally filtered by document
#[utoipa::path(
    get,
    path = "/api/v1/chat/history",
    tag = "chat",
    params(HistoryQuery),
    responses(
        (status = 200, description = "Chat history", body = ChatHistoryResponse)
    )
)]
pub async fn chat_history(
    State(state): State<Arc<AppState>>,
    Query(params): Query<HistoryQuery>,
) -> Result<impl IntoResponse, AppError> {
    state.increment_requests();

    let limit = params.limit.unwrap_or(50).clamp(1, 200);
    let offset = params.offset.unwrap_or(0).max(0);

    let chats = state
        .store
        .list_chats(params.document_id, limit, offset)
        .await?;
    let total = state.store.count_chats(params.document_id).await?;

    let response = ChatHistoryResponse {
        chats: chats
            .into_iter()
            .map(|chat| ChatHistoryItem {
                id: chat.id,
                user_query: chat.user_query,
                ai_response: chat.ai_response,
                created_at: chat.created_at,
                response_time_ms: chat.response_time_ms,
                document_id: chat.document_id,
            })
            .collect(),
        total,
    };

    Ok((StatusCode::OK, Json(response)))
}

/// Answer a question as a server-sent event stream
///
/// Emits a `sources` event with the retrieved chunks, then `message`
/// events with answer tokens. Streamed exchanges are not recorded in
/// the chat history.
pub async fn chat_stream_handler(
    State(state): State<Arc<AppState>>,
    Json(req): Json<ChatRequest>,
) -> Result<Sse<impl Stream<Item = Result<Event, Infallible>>>, AppError> {
    state.increment_requests();

    if req.query.trim().is_empty() {
        return Err(AppError::BadRequest("Query cannot be empty".to_string()));
    }

    let (sources, answer_stream) = state.rag.answer_stream(&req.query, req.top_k).await?;

    let sources_event = Event::default()
        .event("sources")
        .data(serde_json::to_string(&sources).unwrap_or_default());

    let stream = stream::once(async move { Ok(sources_event) }).chain(answer_stream.map(
        |chunk| {
            let event = match chunk {
                Ok(text) => Event::default().event("message").data(text),
                Err(e) => Event::default().event("error").data(e.to_string()),
            };
            Ok::<_, Infallible>(event)
        },
    ));

    Ok(Sse::new(stream).keep_alive(
        KeepAlive::new()
            .interval(Duration::from_secs(15))
            .text("keep-alive"),
    ))
}
