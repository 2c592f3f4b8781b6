//! Caching layer for the RAG pipeline
//!
//! Provides concurrent caching for:
//! - Query embeddings (to avoid re-computing expensive embeddings)
//! - Retrieval results (to serve repeated queries quickly)
//!
//! Uses the moka crate for thread-safe, async-compatible LRU caching
//! with TTL support.

use moka::future::Cache;
use mqa_core::RetrievedChunk;
use std::collections::hash_map::DefaultHasher;
use std::hash::{Hash, Hasher};
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;
use std::time::Duration;

// ============================================================================
// Cache Configuration
// ============================================================================

/// Configuration for cache behavior
#[derive(Debug, Clone)]
pub struct CacheConfig {
    /// Maximum number of entries in the embedding cache
    pub embedding_max_capacity: u64,

    /// Maximum number of entries in the retrieval cache
    pub query_max_capacity: u64,

    /// Time-to-live for embedding cache entries (in seconds)
    pub embedding_ttl_seconds: u64,

    /// Time-to-live for retrieval cache entries (in seconds)
    pub query_ttl_seconds: u64,
}

impl Default for CacheConfig {
    fn default() -> Self {
        Self {
            // 10k embeddings @ ~6KB each = ~60MB
            embedding_max_capacity: 10_000,
            query_max_capacity: 1_000,
            // Embeddings are stable, cache for 1 hour
            embedding_ttl_seconds: 3600,
            // Retrieval results change as documents are added, cache for 5 minutes
            query_ttl_seconds: 300,
        }
    }
}

// ============================================================================
// Statistics
// ============================================================================

/// Hit/miss counters for a cache
#[derive(Debug)]
pub struct CacheStats {
    hits: AtomicU64,
    misses: AtomicU64,
}

impl CacheStats {
    fn new() -> Self {
        Self {
            hits: AtomicU64::new(0),
            misses: AtomicU64::new(0),
        }
    }

    fn record_hit(&self) {
        self.hits.fetch_add(1, Ordering::Relaxed);
    }

    fn record_miss(&self) {
        self.misses.fetch_add(1, Ordering::Relaxed);
    }

    /// Total cache hits
    pub fn hits(&self) -> u64 {
        self.hits.load(Ordering::Relaxed)
    }

    /// Total cache misses
    pub fn misses(&self) -> u64 {
        self.misses.load(Ordering::Relaxed)
    }
}

// ============================================================================
// Embedding Cache
// ============================================================================

/// Cache for query embeddings
///
/// Caches embedding vectors keyed by text hash so repeated questions
/// skip the embedding API round trip.
#[derive(Clone)]
pub struct EmbeddingCache {
    cache: Cache<u64, Vec<f32>>,
    stats: Arc<CacheStats>,
}

impl EmbeddingCache {
    /// Create a new embedding cache with default configuration
    pub fn new() -> Self {
        Self::with_config(&CacheConfig::default())
    }

    /// Create a new embedding cache with custom configuration
    pub fn with_config(config: &CacheConfig) -> Self {
        let cache = Cache::builder()
            .max_capacity(config.embedding_max_capacity)
            .time_to_live(Duration::from_secs(config.embedding_ttl_seconds))
            .build();

        Self {
            cache,
            stats: Arc::new(CacheStats::new()),
        }
    }

    /// Get an embedding from cache
    pub async fn get(&self, text: &str) -> Option<Vec<f32>> {
        let result = self.cache.get(&hash_text(text)).await;

        if result.is_some() {
            self.stats.record_hit();
        } else {
            self.stats.record_miss();
        }

        result
    }

    /// Store an embedding in cache
    pub async fn put(&self, text: &str, embedding: Vec<f32>) {
        self.cache.insert(hash_text(text), embedding).await;
    }

    /// Cache statistics
    pub fn stats(&self) -> &CacheStats {
        &self.stats
    }
}

impl Default for EmbeddingCache {
    fn default() -> Self {
        Self::new()
    }
}

// ============================================================================
// Query Cache
// ============================================================================

/// Cache for retrieval results
///
/// Keyed by question text and top-k so the same question asked twice in
/// quick succession skips the vector search entirely.
#[derive(Clone)]
pub struct QueryCache {
    cache: Cache<u64, Vec<RetrievedChunk>>,
    stats: Arc<CacheStats>,
}

impl QueryCache {
    /// Create a new query cache with default configuration
    pub fn new() -> Self {
        Self::with_config(&CacheConfig::default())
    }

    /// Create a new query cache with custom configuration
    pub fn with_config(config: &CacheConfig) -> Self {
        let cache = Cache::builder()
            .max_capacity(config.query_max_capacity)
            .time_to_live(Duration::from_secs(config.query_ttl_seconds))
            .build();

        Self {
            cache,
            stats: Arc::new(CacheStats::new()),
        }
    }

    /// Get cached retrieval results for a question
    pub async fn get(&self, question: &str, top_k: usize) -> Option<Vec<RetrievedChunk>> {
        let result = self.cache.get(&query_key(question, top_k)).await;

        if result.is_some() {
            self.stats.record_hit();
        } else {
            self.stats.record_miss();
        }

        result
    }

    /// Store retrieval results for a question
    pub async fn put(&self, question: &str, top_k: usize, results: Vec<RetrievedChunk>) {
        self.cache.insert(query_key(question, top_k), results).await;
    }

    /// Cache statistics
    pub fn stats(&self) -> &CacheStats {
        &self.stats
    }
}

impl Default for QueryCache {
    fn default() -> Self {
        Self::new()
    }
}

// ============================================================================
// Helpers
// ============================================================================

fn hash_text(text: &str) -> u64 {
    let mut hasher = DefaultHasher::new();
    text.hash(&mut hasher);
    hasher.finish()
}

fn query_key(question: &str, top_k: usize) -> u64 {
    let mut hasher = DefaultHasher::new();
    question.hash(&mut hasher);
    top_k.hash(&mut hasher);
    hasher.finish()
}

// ============================================================================
// Tests
// ============================================================================

#[cfg(test)]
mod tests {
    use super::*;
    use uuid::Uuid;

    fn chunk(content: &str) -> RetrievedChunk {
        RetrievedChunk {
            embedding_id: Uuid::new_v4().to_string(),
            score: 0.9,
            content: content.to_string(),
            chunk_index: 0,
            page_number: 1,
            document_id: Uuid::new_v4(),
            filename: "manual.pdf".to_string(),
        }
    }

    #[tokio::test]
    async fn test_embedding_cache_hit_and_miss() {
        let cache = EmbeddingCache::new();

        assert!(cache.get("hello").await.is_none());
        assert_eq!(cache.stats().misses(), 1);

        cache.put("hello", vec![1.0, 2.0]).await;
        assert_eq!(cache.get("hello").await, Some(vec![1.0, 2.0]));
        assert_eq!(cache.stats().hits(), 1);
    }

    #[tokio::test]
    async fn test_query_cache_keyed_by_top_k() {
        let cache = QueryCache::new();

        cache.put("how to save", 5, vec![chunk("hold WRITE")]).await;

        assert!(cache.get("how to save", 5).await.is_some());
        assert!(cache.get("how to save", 10).await.is_none());
        assert!(cache.get("different question", 5).await.is_none());
    }

    #[test]
    fn test_hash_is_stable() {
        assert_eq!(hash_text("abc"), hash_text("abc"));
        assert_ne!(hash_text("abc"), hash_text("abd"));
        assert_ne!(query_key("q", 5), query_key("q", 6));
    }
}
