//! PostgreSQL metadata store
//!
//! Document, chunk, and chat history persistence using SQLx and PostgreSQL.

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use sqlx::postgres::{PgPool, PgPoolOptions};
use sqlx::FromRow;
use uuid::Uuid;

use crate::{ChatCitation, ChatRecord, DocumentChunk, DocumentMetadata, MqaError, Result};

/// PostgreSQL metadata store
#[derive(Clone)]
pub struct MetadataStore {
    pool: PgPool,
}

impl MetadataStore {
    /// Create a new metadata store connection
    pub async fn new(database_url: &str, pool_size: u32) -> Result<Self> {
        let pool = PgPoolOptions::new()
            .max_connections(pool_size)
            .connect(database_url)
            .await
            .map_err(|e| MqaError::Database(format!("PostgreSQL connection failed: {e}")))?;

        Ok(Self { pool })
    }

    /// Create a store whose pool connects on first use
    ///
    /// Used by the CLI and by tests that never touch the database.
    pub fn connect_lazy(database_url: &str, pool_size: u32) -> Result<Self> {
        let pool = PgPoolOptions::new()
            .max_connections(pool_size)
            .connect_lazy(database_url)
            .map_err(|e| MqaError::Database(format!("Invalid PostgreSQL URL: {e}")))?;

        Ok(Self { pool })
    }

    /// Create from an existing pool
    pub fn from_pool(pool: PgPool) -> Self {
        Self { pool }
    }

    /// Get the connection pool
    pub fn pool(&self) -> &PgPool {
        &self.pool
    }

    /// Apply pending schema migrations
    pub async fn run_migrations(&self) -> Result<()> {
        sqlx::migrate!("../../migrations")
            .run(&self.pool)
            .await
            .map_err(|e| MqaError::Database(format!("Migration failed: {e}")))?;

        Ok(())
    }
}

/// Document row from database
#[derive(Debug, FromRow)]
struct DocumentRow {
    id: Uuid,
    filename: String,
    original_filename: String,
    file_size: i64,
    num_pages: i32,
    num_chunks: i32,
    upload_date: DateTime<Utc>,
}

impl From<DocumentRow> for DocumentMetadata {
    fn from(row: DocumentRow) -> Self {
        DocumentMetadata {
            id: row.id,
            filename: row.filename,
            original_filename: row.original_filename,
            file_size: row.file_size as u64,
            num_pages: row.num_pages as u32,
            num_chunks: row.num_chunks as u32,
            upload_date: row.upload_date,
        }
    }
}

/// Document chunk row from database
#[derive(Debug, FromRow)]
struct ChunkRow {
    id: Uuid,
    document_id: Uuid,
    chunk_index: i32,
    content: String,
    page_number: i32,
    embedding_id: String,
}

impl From<ChunkRow> for DocumentChunk {
    fn from(row: ChunkRow) -> Self {
        DocumentChunk {
            id: row.id,
            document_id: row.document_id,
            chunk_index: row.chunk_index as u32,
            content: row.content,
            page_number: row.page_number as u32,
            embedding_id: row.embedding_id,
        }
    }
}

/// Chat row from database
#[derive(Debug, FromRow)]
struct ChatRow {
    id: Uuid,
    document_id: Option<Uuid>,
    user_query: String,
    ai_response: String,
    created_at: DateTime<Utc>,
    response_time_ms: Option<i64>,
}

impl From<ChatRow> for ChatRecord {
    fn from(row: ChatRow) -> Self {
        ChatRecord {
            id: row.id,
            document_id: row.document_id,
            user_query: row.user_query,
            ai_response: row.ai_response,
            created_at: row.created_at,
            response_time_ms: row.response_time_ms.map(|ms| ms as u64),
        }
    }
}

/// Trait for metadata operations
#[async_trait]
pub trait MetadataRepository: Send + Sync {
    /// Store a document and its chunks in one transaction
    async fn create_document_with_chunks(
        &self,
        doc: &DocumentMetadata,
        chunks: &[DocumentChunk],
    ) -> Result<()>;

    /// Get document by ID
    async fn get_document(&self, id: Uuid) -> Result<Option<DocumentMetadata>>;

    /// List documents, newest first
    async fn list_documents(&self, limit: i64, offset: i64) -> Result<Vec<DocumentMetadata>>;

    /// Total number of documents
    async fn count_documents(&self) -> Result<u64>;

    /// Delete a document; chunks and citations cascade
    async fn delete_document(&self, id: Uuid) -> Result<bool>;

    /// Get chunks for a document, ordered by chunk index
    async fn get_chunks(
        &self,
        document_id: Uuid,
        limit: i64,
        offset: i64,
    ) -> Result<Vec<DocumentChunk>>;

    /// Total number of chunks for a document
    async fn count_chunks(&self, document_id: Uuid) -> Result<u64>;

    /// Vector store point IDs for all chunks of a document
    async fn chunk_embedding_ids(&self, document_id: Uuid) -> Result<Vec<String>>;

    /// Look up a chunk by its vector store point ID
    async fn find_chunk_by_embedding_id(&self, embedding_id: &str)
        -> Result<Option<DocumentChunk>>;

    /// Store a chat exchange and its citations in one transaction
    async fn record_chat(&self, chat: &ChatRecord, citations: &[ChatCitation]) -> Result<()>;

    /// List chat history, newest first, optionally filtered by document
    async fn list_chats(
        &self,
        document_id: Option<Uuid>,
        limit: i64,
        offset: i64,
    ) -> Result<Vec<ChatRecord>>;

    /// Total number of chats, optionally filtered by document
    async fn count_chats(&self, document_id: Option<Uuid>) -> Result<u64>;
}

#[async_trait]
impl MetadataRepository for MetadataStore {
    async fn create_document_with_chunks(
        &self,
        doc: &DocumentMetadata,
        chunks: &[DocumentChunk],
    ) -> Result<()> {
        let mut tx = self
            .pool
            .begin()
            .await
            .map_err(|e| MqaError::Database(format!("Failed to begin transaction: {e}")))?;

        sqlx::query(
            r#"
            INSERT INTO documents (
                id, filename, original_filename, file_size,
                num_pages, num_chunks, upload_date
            ) VALUES ($1, $2, $3, $4, $5, $6, $7)
            "#,
        )
        .bind(doc.id)
        .bind(&doc.filename)
        .bind(&doc.original_filename)
        .bind(doc.file_size as i64)
        .bind(doc.num_pages as i32)
        .bind(doc.num_chunks as i32)
        .bind(doc.upload_date)
        .execute(&mut *tx)
        .await
        .map_err(|e| MqaError::Database(format!("Failed to create document: {e}")))?;

        for chunk in chunks {
            sqlx::query(
                r#"
                INSERT INTO document_chunks (
                    id, document_id, chunk_index, content, page_number, embedding_id
                ) VALUES ($1, $2, $3, $4, $5, $6)
                "#,
            )
            .bind(chunk.id)
            .bind(chunk.document_id)
            .bind(chunk.chunk_index as i32)
            .bind(&chunk.content)
            .bind(chunk.page_number as i32)
            .bind(&chunk.embedding_id)
            .execute(&mut *tx)
            .await
            .map_err(|e| MqaError::Database(format!("Failed to create chunk: {e}")))?;
        }

        tx.commit()
            .await
            .map_err(|e| MqaError::Database(format!("Failed to commit document: {e}")))?;

        Ok(())
    }

    async fn get_document(&self, id: Uuid) -> Result<Option<DocumentMetadata>> {
        let row: Option<DocumentRow> = sqlx::query_as(
            r#"
            SELECT id, filename, original_filename, file_size,
                   num_pages, num_chunks, upload_date
            FROM documents
            WHERE id = $1
            "#,
        )
        .bind(id)
        .fetch_optional(&self.pool)
        .await
        .map_err(|e| MqaError::Database(format!("Failed to get document: {e}")))?;

        Ok(row.map(DocumentMetadata::from))
    }

    async fn list_documents(&self, limit: i64, offset: i64) -> Result<Vec<DocumentMetadata>> {
        let rows: Vec<DocumentRow> = sqlx::query_as(
            r#"
            SELECT id, filename, original_filename, file_size,
                   num_pages, num_chunks, upload_date
            FROM documents
            ORDER BY upload_date DESC
            LIMIT $1 OFFSET $2
            "#,
        )
        .bind(limit)
        .bind(offset)
        .fetch_all(&self.pool)
        .await
        .map_err(|e| MqaError::Database(format!("Failed to list documents: {e}")))?;

        Ok(rows.into_iter().map(DocumentMetadata::from).collect())
    }

    async fn count_documents(&self) -> Result<u64> {
        let row: (i64,) = sqlx::query_as("SELECT COUNT(*) FROM documents")
            .fetch_one(&self.pool)
            .await
            .map_err(|e| MqaError::Database(format!("Failed to count documents: {e}")))?;

        Ok(row.0 as u64)
    }

    async fn delete_document(&self, id: Uuid) -> Result<bool> {
        let result = sqlx::query("DELETE FROM documents WHERE id = $1")
            .bind(id)
            .execute(&self.pool)
            .await
            .map_err(|e| MqaError::Database(format!("Failed to delete document: {e}")))?;

        Ok(result.rows_affected() > 0)
    }

    async fn get_chunks(
        &self,
        document_id: Uuid,
        limit: i64,
        offset: i64,
    ) -> Result<Vec<DocumentChunk>> {
        let rows: Vec<ChunkRow> = sqlx::query_as(
            r#"
            SELECT id, document_id, chunk_index, content, page_number, embedding_id
            FROM document_chunks
            WHERE document_id = $1
            ORDER BY chunk_index
            LIMIT $2 OFFSET $3
            "#,
        )
        .bind(document_id)
        .bind(limit)
        .bind(offset)
        .fetch_all(&self.pool)
        .await
        .map_err(|e| MqaError::Database(format!("Failed to get chunks: {e}")))?;

        Ok(rows.into_iter().map(DocumentChunk::from).collect())
    }

    async fn count_chunks(&self, document_id: Uuid) -> Result<u64> {
        let row: (i64,) =
            sqlx::query_as("SELECT COUNT(*) FROM document_chunks WHERE document_id = $1")
                .bind(document_id)
                .fetch_one(&self.pool)
                .await
                .map_err(|e| MqaError::Database(format!("Failed to count chunks: {e}")))?;

        Ok(row.0 as u64)
    }

    async fn chunk_embedding_ids(&self, document_id: Uuid) -> Result<Vec<String>> {
        let rows: Vec<(String,)> = sqlx::query_as(
            "SELECT embedding_id FROM document_chunks WHERE document_id = $1 ORDER BY chunk_index",
        )
        .bind(document_id)
        .fetch_all(&self.pool)
        .await
        .map_err(|e| MqaError::Database(format!("Failed to get embedding ids: {e}")))?;

        Ok(rows.into_iter().map(|(id,)| id).collect())
    }

    async fn find_chunk_by_embedding_id(
        &self,
        embedding_id: &str,
    ) -> Result<Option<DocumentChunk>> {
        let row: Option<ChunkRow> = sqlx::query_as(
            r#"
            SELECT id, document_id, chunk_index, content, page_number, embedding_id
            FROM document_chunks
            WHERE embedding_id = $1
            "#,
        )
        .bind(embedding_id)
        .fetch_optional(&self.pool)
        .await
        .map_err(|e| MqaError::Database(format!("Failed to find chunk: {e}")))?;

        Ok(row.map(DocumentChunk::from))
    }

    async fn record_chat(&self, chat: &ChatRecord, citations: &[ChatCitation]) -> Result<()> {
        let mut tx = self
            .pool
            .begin()
            .await
            .map_err(|e| MqaError::Database(format!("Failed to begin transaction: {e}")))?;

        sqlx::query(
            r#"
            INSERT INTO chats (
                id, document_id, user_query, ai_response, created_at, response_time_ms
            ) VALUES ($1, $2, $3, $4, $5, $6)
            "#,
        )
        .bind(chat.id)
        .bind(chat.document_id)
        .bind(&chat.user_query)
        .bind(&chat.ai_response)
        .bind(chat.created_at)
        .bind(chat.response_time_ms.map(|ms| ms as i64))
        .execute(&mut *tx)
        .await
        .map_err(|e| MqaError::Database(format!("Failed to record chat: {e}")))?;

        for citation in citations {
            sqlx::query(
                r#"
                INSERT INTO chat_citations (id, chat_id, chunk_id, relevance_score)
                VALUES ($1, $2, $3, $4)
                "#,
            )
            .bind(citation.id)
            .bind(citation.chat_id)
            .bind(citation.chunk_id)
            .bind(citation.relevance_score)
            .execute(&mut *tx)
            .await
            .map_err(|e| MqaError::Database(format!("Failed to record citation: {e}")))?;
        }

        tx.commit()
            .await
            .map_err(|e| MqaError::Database(format!("Failed to commit chat: {e}")))?;

        Ok(())
    }

    async fn list_chats(
        &self,
        document_id: Option<Uuid>,
        limit: i64,
        offset: i64,
    ) -> Result<Vec<ChatRecord>> {
        let rows: Vec<ChatRow> = sqlx::query_as(
            r#"
            SELECT id, document_id, user_query, ai_response, created_at, response_time_ms
            FROM chats
            WHERE $1::uuid IS NULL OR document_id = $1
            ORDER BY created_at DESC
            LIMIT $2 OFFSET $3
            "#,
        )
        .bind(document_id)
        .bind(limit)
        .bind(offset)
        .fetch_all(&self.pool)
        .await
        .map_err(|e| MqaError::Database(format!("Failed to list chats: {e}")))?;

        Ok(rows.into_iter().map(ChatRecord::from).collect())
    }

    async fn count_chats(&self, document_id: Option<Uuid>) -> Result<u64> {
        let row: (i64,) =
            sqlx::query_as("SELECT COUNT(*) FROM chats WHERE $1::uuid IS NULL OR document_id = $1")
                .bind(document_id)
                .fetch_one(&self.pool)
                .await
                .map_err(|e| MqaError::Database(format!("Failed to count chats: {e}")))?;

        Ok(row.0 as u64)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_row_conversions() {
        let row = DocumentRow {
            id: Uuid::new_v4(),
            filename: "a.pdf".to_string(),
            original_filename: "manual.pdf".to_string(),
            file_size: 2048,
            num_pages: 10,
            num_chunks: 25,
            upload_date: Utc::now(),
        };

        let doc = DocumentMetadata::from(row);
        assert_eq!(doc.file_size, 2048);
        assert_eq!(doc.num_pages, 10);
        assert_eq!(doc.num_chunks, 25);
    }

    #[test]
    fn test_chat_row_conversion() {
        let row = ChatRow {
            id: Uuid::new_v4(),
            document_id: None,
            user_query: "q".to_string(),
            ai_response: "a".to_string(),
            created_at: Utc::now(),
            response_time_ms: Some(420),
        };

        let chat = ChatRecord::from(row);
        assert_eq!(chat.response_time_ms, Some(420));
        assert!(chat.document_id.is_none());
    }
}
