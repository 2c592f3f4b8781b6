//! Document ingestion pipeline
//!
//! Drives an uploaded PDF through the full pipeline: validation, text
//! extraction, chunking, embedding, vector indexing, and metadata
//! persistence. The relational writes happen in one transaction that
//! rolls back on failure; vectors already upserted are not compensated.

use std::sync::Arc;

use mqa_core::{
    AppConfig, DocumentChunk, DocumentMetadata, MetadataRepository, MetadataStore, MqaError,
    Result,
};
use mqa_parser::{chunk_document, extract_document, ChunkConfig};
use mqa_vector::{ChunkPoint, EmbeddingClient, VectorStore};
use uuid::Uuid;

/// Orchestrates PDF ingestion and deletion
#[derive(Clone)]
pub struct DocumentProcessor {
    store: MetadataStore,
    vector_store: Arc<dyn VectorStore>,
    embedder: Arc<dyn EmbeddingClient>,
    chunk_config: ChunkConfig,
    max_file_size: usize,
}

impl DocumentProcessor {
    /// Create a new processor
    pub fn new(
        store: MetadataStore,
        vector_store: Arc<dyn VectorStore>,
        embedder: Arc<dyn EmbeddingClient>,
        config: &AppConfig,
    ) -> Self {
        Self {
            store,
            vector_store,
            embedder,
            chunk_config: ChunkConfig::new(config.rag.chunk_size, config.rag.chunk_overlap),
            max_file_size: config.ingest.max_file_size,
        }
    }

    /// Ingest a PDF and return the stored document metadata
    pub async fn process(&self, bytes: &[u8], original_filename: &str) -> Result<DocumentMetadata> {
        self.validate(bytes, original_filename)?;

        let pdf = extract_document(bytes).map_err(|e| MqaError::Parse(e.to_string()))?;
        let text_chunks = chunk_document(&pdf, &self.chunk_config);

        if text_chunks.is_empty() {
            return Err(MqaError::Validation(
                "Document contains no extractable text".to_string(),
            ));
        }

        tracing::info!(
            filename = original_filename,
            pages = pdf.page_count(),
            chunks = text_chunks.len(),
            "document extracted"
        );

        let texts: Vec<String> = text_chunks.iter().map(|c| c.content.clone()).collect();
        let embeddings = self.embedder.embed_batch(&texts).await?;

        if embeddings.len() != text_chunks.len() {
            return Err(MqaError::Embedding(format!(
                "Expected {} embeddings, got {}",
                text_chunks.len(),
                embeddings.len()
            )));
        }

        let document = DocumentMetadata::new(original_filename, original_filename)
            .with_file_size(bytes.len() as u64)
            .with_num_pages(pdf.page_count())
            .with_num_chunks(text_chunks.len() as u32);

        let mut chunks = Vec::with_capacity(text_chunks.len());
        let mut points = Vec::with_capacity(text_chunks.len());

        for (text_chunk, vector) in text_chunks.iter().zip(embeddings) {
            let point_id = Uuid::new_v4();

            chunks.push(
                DocumentChunk::new(document.id, text_chunk.index, text_chunk.content.as_str())
                    .with_page_number(text_chunk.page)
                    .with_embedding_id(point_id.to_string()),
            );

            points.push(ChunkPoint {
                id: point_id,
                vector,
                document_id: document.id,
                chunk_index: text_chunk.index,
                page_number: text_chunk.page,
                content: text_chunk.content.clone(),
                filename: original_filename.to_string(),
            });
        }

        self.vector_store.upsert(points).await?;

        // Relational writes are transactional; a failure here leaves the
        // freshly upserted vectors orphaned rather than compensating.
        self.store
            .create_document_with_chunks(&document, &chunks)
            .await?;

        tracing::info!(document_id = %document.id, "document ingested");

        Ok(document)
    }

    /// Delete a document, its chunks, and its vectors
    ///
    /// Returns false when the document does not exist.
    pub async fn delete(&self, document_id: Uuid) -> Result<bool> {
        if self.store.get_document(document_id).await?.is_none() {
            return Ok(false);
        }

        let embedding_ids = self.store.chunk_embedding_ids(document_id).await?;
        if !embedding_ids.is_empty() {
            self.vector_store.delete_points(&embedding_ids).await?;
        }

        let deleted = self.store.delete_document(document_id).await?;

        tracing::info!(document_id = %document_id, vectors = embedding_ids.len(), "document deleted");

        Ok(deleted)
    }

    fn validate(&self, bytes: &[u8], original_filename: &str) -> Result<()> {
        if !original_filename.to_lowercase().ends_with(".pdf") {
            return Err(MqaError::Validation(
                "Only PDF files are supported".to_string(),
            ));
        }

        if bytes.is_empty() {
            return Err(MqaError::Validation("Uploaded file is empty".to_string()));
        }

        if bytes.len() > self.max_file_size {
            return Err(MqaError::Validation(format!(
                "File size exceeds maximum allowed size of {} bytes",
                self.max_file_size
            )));
        }

        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use async_trait::async_trait;
    use mqa_core::RetrievedChunk;
    use mqa_vector::CollectionStats;

    struct NoopVectors;

    #[async_trait]
    impl VectorStore for NoopVectors {
        async fn ensure_collection(&self) -> Result<()> {
            Ok(())
        }
        async fn upsert(&self, _points: Vec<ChunkPoint>) -> Result<()> {
            Ok(())
        }
        async fn search(&self, _v: &[f32], _limit: usize) -> Result<Vec<RetrievedChunk>> {
            Ok(Vec::new())
        }
        async fn delete_points(&self, _ids: &[String]) -> Result<()> {
            Ok(())
        }
        async fn collection_stats(&self) -> Result<CollectionStats> {
            Ok(CollectionStats {
                name: "test".to_string(),
                points_count: 0,
            })
        }
    }

    struct NoopEmbedder;

    #[async_trait]
    impl EmbeddingClient for NoopEmbedder {
        async fn embed(&self, _text: &str) -> Result<Vec<f32>> {
            Ok(vec![0.0; 4])
        }
        async fn embed_batch(&self, texts: &[String]) -> Result<Vec<Vec<f32>>> {
            Ok(texts.iter().map(|_| vec![0.0; 4]).collect())
        }
        fn dimension(&self) -> usize {
            4
        }
    }

    fn test_processor() -> DocumentProcessor {
        let config = AppConfig::default();
        let store = MetadataStore::connect_lazy(&config.database.postgres_url, 1).unwrap();
        DocumentProcessor::new(store, Arc::new(NoopVectors), Arc::new(NoopEmbedder), &config)
    }

    #[tokio::test]
    async fn test_rejects_non_pdf_filename() {
        let processor = test_processor();
        let result = processor.process(b"data", "notes.txt").await;

        assert!(matches!(result, Err(MqaError::Validation(_))));
    }

    #[tokio::test]
    async fn test_rejects_empty_upload() {
        let processor = test_processor();
        let result = processor.process(b"", "manual.pdf").await;

        assert!(matches!(result, Err(MqaError::Validation(_))));
    }

    #[tokio::test]
    async fn test_rejects_oversized_upload() {
        let config = AppConfig::default();
        let store = MetadataStore::connect_lazy(&config.database.postgres_url, 1).unwrap();
        let mut processor =
            DocumentProcessor::new(store, Arc::new(NoopVectors), Arc::new(NoopEmbedder), &config);
        processor.max_file_size = 8;

        let result = processor.process(b"0123456789", "manual.pdf").await;
        assert!(matches!(result, Err(MqaError::Validation(_))));
    }

    #[tokio::test]
    async fn test_accepts_uppercase_extension() {
        let processor = test_processor();
        // Passes filename validation, fails later at PDF parsing
        let result = processor.process(b"garbage bytes", "MANUAL.PDF").await;

        assert!(matches!(result, Err(MqaError::Parse(_))));
    }
}
