//! MQA Core - Domain models, traits, and shared types
//!
//! This crate defines the core abstractions used throughout the MQA system:
//! - Document and chunk metadata models
//! - Chat history and citation models
//! - Retrieval result types shared by the vector and RAG layers
//! - Common error types
//! - Configuration management
//! - Metadata storage (PostgreSQL)

pub mod config;
pub mod metadata;

pub use config::{
    AppConfig, ConfigError, DatabaseConfig, IngestConfig, LlmConfig, LlmProvider, RagSettings,
    ServerConfig,
};
pub use metadata::{MetadataRepository, MetadataStore};

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use thiserror::Error;
use uuid::Uuid;

// ============================================================================
// Error Types
// ============================================================================

/// Core error types for MQA operations
#[derive(Error, Debug)]
pub enum MqaError {
    #[error("Not found: {0}")]
    NotFound(String),

    #[error("Validation error: {0}")]
    Validation(String),

    #[error("Database error: {0}")]
    Database(String),

    #[error("Vector store error: {0}")]
    VectorStore(String),

    #[error("Embedding error: {0}")]
    Embedding(String),

    #[error("LLM error: {0}")]
    Llm(String),

    #[error("Document parsing error: {0}")]
    Parse(String),

    #[error("Configuration error: {0}")]
    Config(String),

    #[error(transparent)]
    Other(#[from] anyhow::Error),
}

pub type Result<T> = std::result::Result<T, MqaError>;

// ============================================================================
// Document Models
// ============================================================================

/// Metadata for an ingested document
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DocumentMetadata {
    /// Unique identifier
    pub id: Uuid,

    /// Stored filename
    pub filename: String,

    /// Filename as provided by the uploader
    pub original_filename: String,

    /// File size in bytes
    pub file_size: u64,

    /// Number of pages in the source PDF
    pub num_pages: u32,

    /// Number of chunks produced during ingestion
    pub num_chunks: u32,

    /// Upload timestamp
    pub upload_date: DateTime<Utc>,
}

impl DocumentMetadata {
    /// Create new document metadata
    pub fn new(filename: impl Into<String>, original_filename: impl Into<String>) -> Self {
        Self {
            id: Uuid::new_v4(),
            filename: filename.into(),
            original_filename: original_filename.into(),
            file_size: 0,
            num_pages: 0,
            num_chunks: 0,
            upload_date: Utc::now(),
        }
    }

    /// Set file size
    pub fn with_file_size(mut self, size: u64) -> Self {
        self.file_size = size;
        self
    }

    /// Set page count
    pub fn with_num_pages(mut self, pages: u32) -> Self {
        self.num_pages = pages;
        self
    }

    /// Set chunk count
    pub fn with_num_chunks(mut self, chunks: u32) -> Self {
        self.num_chunks = chunks;
        self
    }
}

/// A chunk of document content with its vector store reference
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DocumentChunk {
    /// Unique identifier
    pub id: Uuid,

    /// Parent document ID
    pub document_id: Uuid,

    /// Chunk index within the document
    pub chunk_index: u32,

    /// Text content
    pub content: String,

    /// Page the chunk was cut from (1-based)
    pub page_number: u32,

    /// Point ID in the vector store
    pub embedding_id: String,
}

impl DocumentChunk {
    /// Create a new chunk
    pub fn new(document_id: Uuid, chunk_index: u32, content: impl Into<String>) -> Self {
        Self {
            id: Uuid::new_v4(),
            document_id,
            chunk_index,
            content: content.into(),
            page_number: 1,
            embedding_id: String::new(),
        }
    }

    /// Set page number
    pub fn with_page_number(mut self, page: u32) -> Self {
        self.page_number = page;
        self
    }

    /// Set vector store point ID
    pub fn with_embedding_id(mut self, id: impl Into<String>) -> Self {
        self.embedding_id = id.into();
        self
    }
}

// ============================================================================
// Chat Models
// ============================================================================

/// A recorded chat exchange
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ChatRecord {
    /// Unique identifier
    pub id: Uuid,

    /// Optional document the question was about
    pub document_id: Option<Uuid>,

    /// The user's question
    pub user_query: String,

    /// The generated answer
    pub ai_response: String,

    /// Creation timestamp
    pub created_at: DateTime<Utc>,

    /// End-to-end processing time in milliseconds
    pub response_time_ms: Option<u64>,
}

impl ChatRecord {
    /// Create a new chat record
    pub fn new(user_query: impl Into<String>, ai_response: impl Into<String>) -> Self {
        Self {
            id: Uuid::new_v4(),
            document_id: None,
            user_query: user_query.into(),
            ai_response: ai_response.into(),
            created_at: Utc::now(),
            response_time_ms: None,
        }
    }

    /// Associate with a document
    pub fn with_document(mut self, document_id: Option<Uuid>) -> Self {
        self.document_id = document_id;
        self
    }

    /// Set processing time
    pub fn with_response_time_ms(mut self, ms: u64) -> Self {
        self.response_time_ms = Some(ms);
        self
    }
}

/// Link between a chat response and a chunk it was grounded on
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ChatCitation {
    /// Unique identifier
    pub id: Uuid,

    /// Chat this citation belongs to
    pub chat_id: Uuid,

    /// Cited chunk
    pub chunk_id: Uuid,

    /// Similarity score the chunk was retrieved with
    pub relevance_score: Option<f32>,
}

impl ChatCitation {
    /// Create a new citation
    pub fn new(chat_id: Uuid, chunk_id: Uuid, relevance_score: Option<f32>) -> Self {
        Self {
            id: Uuid::new_v4(),
            chat_id,
            chunk_id,
            relevance_score,
        }
    }
}

// ============================================================================
// Retrieval Types
// ============================================================================

/// A chunk returned from vector similarity search
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RetrievedChunk {
    /// Point ID in the vector store
    pub embedding_id: String,

    /// Similarity score (higher is better)
    pub score: f32,

    /// Chunk text
    pub content: String,

    /// Chunk index within its document
    pub chunk_index: u32,

    /// Page the chunk was cut from
    pub page_number: u32,

    /// Parent document ID
    pub document_id: Uuid,

    /// Original filename of the parent document
    pub filename: String,
}

/// Answer produced by the RAG chain
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RagAnswer {
    /// Generated answer text
    pub answer: String,

    /// Chunks the answer was conditioned on, with their scores
    pub sources: Vec<RetrievedChunk>,

    /// Processing time in milliseconds
    pub processing_time_ms: u64,
}

// ============================================================================
// Traits
// ============================================================================

/// Trait for chat LLM clients
#[async_trait::async_trait]
pub trait LlmClient: Send + Sync {
    /// Generate a response
    async fn generate(&self, prompt: &str) -> Result<String>;

    /// Generate a streaming response
    async fn generate_stream(
        &self,
        prompt: &str,
    ) -> Result<futures::stream::BoxStream<'static, Result<String>>>;
}

// ============================================================================
// Tests
// ============================================================================

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_document_metadata_builder() {
        let doc = DocumentMetadata::new("a1b2.pdf", "sh-101_manual.pdf")
            .with_file_size(4096)
            .with_num_pages(12)
            .with_num_chunks(40);

        assert_eq!(doc.original_filename, "sh-101_manual.pdf");
        assert_eq!(doc.file_size, 4096);
        assert_eq!(doc.num_pages, 12);
        assert_eq!(doc.num_chunks, 40);
    }

    #[test]
    fn test_chunk_builder() {
        let doc_id = Uuid::new_v4();
        let chunk = DocumentChunk::new(doc_id, 3, "Press the FILTER button.")
            .with_page_number(7)
            .with_embedding_id("point-1");

        assert_eq!(chunk.document_id, doc_id);
        assert_eq!(chunk.chunk_index, 3);
        assert_eq!(chunk.page_number, 7);
        assert_eq!(chunk.embedding_id, "point-1");
    }

    #[test]
    fn test_chat_record_builder() {
        let doc_id = Uuid::new_v4();
        let chat = ChatRecord::new("How do I save a patch?", "Hold WRITE and...")
            .with_document(Some(doc_id))
            .with_response_time_ms(1250);

        assert_eq!(chat.document_id, Some(doc_id));
        assert_eq!(chat.response_time_ms, Some(1250));
    }

    #[test]
    fn test_error_display() {
        let err = MqaError::NotFound("document 42".to_string());
        assert_eq!(err.to_string(), "Not found: document 42");

        let err = MqaError::Validation("only PDF files are supported".to_string());
        assert!(err.to_string().contains("only PDF files"));
    }
}
