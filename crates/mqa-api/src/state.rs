//! Application state management

use std::sync::atomic::{AtomicBool, AtomicU64, Ordering};
use std::sync::Arc;
use std::time::Instant;

use mqa_core::{AppConfig, LlmClient, MetadataStore};
use mqa_rag::{create_llm_client, DocumentProcessor, RagChain};
use mqa_vector::{create_embedding_client, EmbeddingClient, QdrantStore, VectorStore};

/// Application state shared across handlers
pub struct AppState {
    /// Application configuration
    pub config: AppConfig,
    /// Server start time
    pub start_time: Instant,
    /// Request counter
    pub request_count: AtomicU64,
    /// Ready status
    pub is_ready: AtomicBool,
    /// Metadata store
    pub store: MetadataStore,
    /// Vector store
    pub vector_store: Arc<dyn VectorStore>,
    /// RAG chain
    pub rag: Arc<RagChain>,
    /// Ingestion pipeline
    pub processor: DocumentProcessor,
}

impl AppState {
    /// Connect to all backends and build the application state
    pub async fn initialize(config: AppConfig) -> anyhow::Result<Self> {
        let store = MetadataStore::new(
            &config.database.postgres_url,
            config.database.postgres_pool_size,
        )
        .await?;

        Self::with_store(config, store)
    }

    /// Build state around an existing metadata store
    pub fn with_store(config: AppConfig, store: MetadataStore) -> anyhow::Result<Self> {
        let vector_store: Arc<dyn VectorStore> = Arc::new(QdrantStore::new(&config.database)?);
        let embedder: Arc<dyn EmbeddingClient> = Arc::from(create_embedding_client(&config.llm)?);
        let llm: Arc<dyn LlmClient> = Arc::from(create_llm_client(&config.llm)?);

        let rag = Arc::new(RagChain::new(
            embedder.clone(),
            vector_store.clone(),
            llm,
            config.rag.clone(),
        ));

        let processor = DocumentProcessor::new(
            store.clone(),
            vector_store.clone(),
            embedder,
            &config,
        );

        Ok(Self {
            config,
            start_time: Instant::now(),
            request_count: AtomicU64::new(0),
            is_ready: AtomicBool::new(true),
            store,
            vector_store,
            rag,
            processor,
        })
    }

    /// Increment request counter
    pub fn increment_requests(&self) -> u64 {
        self.request_count.fetch_add(1, Ordering::SeqCst)
    }

    /// Get total request count
    pub fn get_request_count(&self) -> u64 {
        self.request_count.load(Ordering::SeqCst)
    }

    /// Get uptime in seconds
    pub fn uptime_secs(&self) -> u64 {
        self.start_time.elapsed().as_secs()
    }

    /// Check if service is ready
    pub fn is_ready(&self) -> bool {
        self.is_ready.load(Ordering::SeqCst)
    }

    /// Set ready status
    pub fn set_ready(&self, ready: bool) {
        self.is_ready.store(ready, Ordering::SeqCst);
    }
}
