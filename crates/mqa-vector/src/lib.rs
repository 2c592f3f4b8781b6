//! MQA Vector - Embedding generation and vector storage
//!
//! Provides the embedding client abstraction (OpenAI, Ollama, or a
//! disabled stand-in) and the vector store abstraction over Qdrant
//! for indexing and searching document chunk embeddings.

use async_trait::async_trait;
use mqa_core::{Result, RetrievedChunk};
use uuid::Uuid;

pub mod embedding;
pub mod qdrant_store;

pub use embedding::{
    create_embedding_client, DisabledEmbedding, EmbeddingClient, OllamaEmbedding, OpenAiEmbedding,
};
pub use qdrant_store::QdrantStore;

/// A chunk embedding ready to be indexed, with its search payload
#[derive(Debug, Clone)]
pub struct ChunkPoint {
    /// Point ID; recorded on the relational chunk row as `embedding_id`
    pub id: Uuid,

    /// Embedding vector
    pub vector: Vec<f32>,

    /// Parent document ID
    pub document_id: Uuid,

    /// Chunk index within the document
    pub chunk_index: u32,

    /// Page the chunk was cut from
    pub page_number: u32,

    /// Chunk text
    pub content: String,

    /// Original filename of the parent document
    pub filename: String,
}

/// Collection-level statistics
#[derive(Debug, Clone)]
pub struct CollectionStats {
    /// Collection name
    pub name: String,

    /// Number of points currently indexed
    pub points_count: u64,
}

/// Trait for vector database operations
#[async_trait]
pub trait VectorStore: Send + Sync {
    /// Create the collection if it does not exist
    async fn ensure_collection(&self) -> Result<()>;

    /// Index a batch of chunk embeddings
    async fn upsert(&self, points: Vec<ChunkPoint>) -> Result<()>;

    /// Search for the most similar chunks
    async fn search(&self, query_vector: &[f32], limit: usize) -> Result<Vec<RetrievedChunk>>;

    /// Delete points by their IDs
    async fn delete_points(&self, ids: &[String]) -> Result<()>;

    /// Collection statistics
    async fn collection_stats(&self) -> Result<CollectionStats>;
}
