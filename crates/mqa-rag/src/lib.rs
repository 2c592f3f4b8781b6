//! MQA RAG - Retrieval-Augmented Generation chain
//!
//! Answers a question by embedding it, retrieving the most similar
//! document chunks from the vector store, assembling a prompt from the
//! retrieved context, and generating an answer with a chat LLM. The
//! retrieved chunks travel with the answer so callers can persist them
//! as citations.

use futures::stream::BoxStream;
use mqa_core::{LlmClient, MqaError, RagAnswer, RagSettings, Result, RetrievedChunk};
use mqa_vector::{EmbeddingClient, VectorStore};
use std::sync::Arc;
use std::time::Instant;

pub mod cache;
pub mod ingest;
pub mod llm;

pub use cache::{CacheConfig, CacheStats, EmbeddingCache, QueryCache};
pub use ingest::DocumentProcessor;
pub use llm::{create_llm_client, OllamaClient, OpenAiClient};

// ============================================================================
// RAG Chain
// ============================================================================

/// The retrieval-augmented generation chain
pub struct RagChain {
    /// Query embedding client
    embedder: Arc<dyn EmbeddingClient>,

    /// Vector similarity search backend
    vector_store: Arc<dyn VectorStore>,

    /// Chat LLM client
    llm: Arc<dyn LlmClient>,

    /// Retrieval and prompt settings
    settings: RagSettings,

    /// Query embedding cache
    embedding_cache: EmbeddingCache,

    /// Retrieval result cache
    query_cache: QueryCache,
}

impl RagChain {
    /// Create a new chain
    pub fn new(
        embedder: Arc<dyn EmbeddingClient>,
        vector_store: Arc<dyn VectorStore>,
        llm: Arc<dyn LlmClient>,
        settings: RagSettings,
    ) -> Self {
        Self {
            embedder,
            vector_store,
            llm,
            settings,
            embedding_cache: EmbeddingCache::new(),
            query_cache: QueryCache::new(),
        }
    }

    /// Use custom cache sizing/TTLs
    pub fn with_cache_config(mut self, config: &CacheConfig) -> Self {
        self.embedding_cache = EmbeddingCache::with_config(config);
        self.query_cache = QueryCache::with_config(config);
        self
    }

    /// Cache statistics (embedding, retrieval)
    pub fn cache_stats(&self) -> (&CacheStats, &CacheStats) {
        (self.embedding_cache.stats(), self.query_cache.stats())
    }

    /// Retrieve the chunks most relevant to a question
    pub async fn retrieve(&self, question: &str, top_k: usize) -> Result<Vec<RetrievedChunk>> {
        if let Some(cached) = self.query_cache.get(question, top_k).await {
            tracing::debug!("retrieval served from cache");
            return Ok(cached);
        }

        let query_vector = self.query_embedding(question).await?;
        let mut results = self.vector_store.search(&query_vector, top_k).await?;

        if let Some(min_score) = self.settings.min_score {
            results.retain(|r| r.score >= min_score);
        }

        tracing::debug!(results = results.len(), "vector search completed");
        self.query_cache
            .put(question, top_k, results.clone())
            .await;

        Ok(results)
    }

    /// Answer a question through the complete RAG pipeline
    pub async fn answer(&self, question: &str, top_k: Option<usize>) -> Result<RagAnswer> {
        let start = Instant::now();
        let top_k = top_k.unwrap_or(self.settings.top_k);

        tracing::info!(top_k, "RAG query started");

        let sources = self.retrieve(question, top_k).await?;
        let prompt = self.build_prompt(question, &sources);

        tracing::info!(prompt_len = prompt.len(), "calling LLM");
        let answer = self.llm.generate(&prompt).await?;
        tracing::info!(answer_len = answer.len(), "LLM response received");

        Ok(RagAnswer {
            answer,
            sources,
            processing_time_ms: start.elapsed().as_millis() as u64,
        })
    }

    /// Answer a question as a token stream
    ///
    /// Returns the retrieved sources alongside the stream; the exchange
    /// is not recorded anywhere.
    pub async fn answer_stream(
        &self,
        question: &str,
        top_k: Option<usize>,
    ) -> Result<(Vec<RetrievedChunk>, BoxStream<'static, Result<String>>)> {
        let top_k = top_k.unwrap_or(self.settings.top_k);

        let sources = self.retrieve(question, top_k).await?;
        let prompt = self.build_prompt(question, &sources);
        let stream = self.llm.generate_stream(&prompt).await?;

        Ok((sources, stream))
    }

    /// Embed the question, going through the embedding cache
    async fn query_embedding(&self, question: &str) -> Result<Vec<f32>> {
        if let Some(cached) = self.embedding_cache.get(question).await {
            return Ok(cached);
        }

        let vector = self.embedder.embed(question).await?;
        if vector.is_empty() {
            return Err(MqaError::Embedding(
                "Embedding provider returned an empty vector".to_string(),
            ));
        }

        self.embedding_cache.put(question, vector.clone()).await;
        Ok(vector)
    }

    /// Build the LLM prompt with retrieved context
    fn build_prompt(&self, question: &str, sources: &[RetrievedChunk]) -> String {
        let mut builder = PromptBuilder::new()
            .system(
                "You are a helpful assistant that answers questions about product manuals \
                 and technical documentation. Use the provided context to answer the user's \
                 question. If you cannot answer the question based on the context, say so \
                 clearly.",
            )
            .question(question)
            .add_instruction("Answer the question based on the context provided.")
            .add_instruction("Be accurate and cite specific information from the context.")
            .add_instruction(
                "If the context doesn't contain enough information to answer the question, \
                 say \"I don't have enough information to answer this question based on the \
                 available documentation.\"",
            );

        let mut total_length = 0;
        for (i, source) in sources.iter().enumerate() {
            if total_length + source.content.len() > self.settings.max_context_length {
                break;
            }

            builder = builder.add_context(format!(
                "Chunk {} (Page {}): {}",
                i + 1,
                source.page_number,
                source.content
            ));
            total_length += source.content.len();
        }

        builder.build()
    }
}

// ============================================================================
// Prompt Builder
// ============================================================================

/// Builder for constructing RAG prompts
pub struct PromptBuilder {
    system_instruction: String,
    context_sections: Vec<String>,
    question: String,
    instructions: Vec<String>,
}

impl PromptBuilder {
    /// Create a new prompt builder
    pub fn new() -> Self {
        Self {
            system_instruction: String::new(),
            context_sections: Vec::new(),
            question: String::new(),
            instructions: Vec::new(),
        }
    }

    /// Set system instruction
    pub fn system(mut self, instruction: impl Into<String>) -> Self {
        self.system_instruction = instruction.into();
        self
    }

    /// Add a context section
    pub fn add_context(mut self, context: impl Into<String>) -> Self {
        self.context_sections.push(context.into());
        self
    }

    /// Set the question
    pub fn question(mut self, q: impl Into<String>) -> Self {
        self.question = q.into();
        self
    }

    /// Add an instruction
    pub fn add_instruction(mut self, instruction: impl Into<String>) -> Self {
        self.instructions.push(instruction.into());
        self
    }

    /// Build the final prompt
    pub fn build(self) -> String {
        let mut prompt = String::new();

        if !self.system_instruction.is_empty() {
            prompt.push_str("<s>\n");
            prompt.push_str(&self.system_instruction);
            prompt.push_str("\n</s>\n\n");
        }

        if !self.context_sections.is_empty() {
            prompt.push_str("<context>\n");
            for section in &self.context_sections {
                prompt.push_str(section);
                prompt.push_str("\n\n");
            }
            prompt.push_str("</context>\n\n");
        }

        if !self.question.is_empty() {
            prompt.push_str("<question>\n");
            prompt.push_str(&self.question);
            prompt.push_str("\n</question>\n\n");
        }

        if !self.instructions.is_empty() {
            prompt.push_str("<instructions>\n");
            for (i, inst) in self.instructions.iter().enumerate() {
                prompt.push_str(&format!("{}. {}\n", i + 1, inst));
            }
            prompt.push_str("</instructions>\n");
        }

        prompt
    }
}

impl Default for PromptBuilder {
    fn default() -> Self {
        Self::new()
    }
}

// ============================================================================
// Tests
// ============================================================================
