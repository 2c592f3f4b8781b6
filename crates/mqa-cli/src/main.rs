//! MQA CLI - Command-line interface
//!
//! Usage:
//!   mqa ingest <file.pdf>
//!   mqa ask <question> [--top-k N]
//!   mqa documents list

use std::path::PathBuf;
use std::sync::Arc;

use clap::{Parser, Subcommand};
use mqa_core::{
    AppConfig, LlmClient, MetadataRepository, MetadataStore,
};
use mqa_rag::{create_llm_client, DocumentProcessor, RagChain};
use mqa_vector::{create_embedding_client, EmbeddingClient, QdrantStore, VectorStore};

#[derive(Parser)]
#[command(name = "mqa")]
#[command(about = "Manual question-answering over PDF documents")]
#[command(version)]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Ingest a PDF manual into the knowledge base
    Ingest {
        /// Path to the PDF file
        file: PathBuf,
    },
    /// Ask a question against the ingested manuals
    Ask {
        /// Question to ask
        question: String,

        /// Number of chunks to retrieve
        #[arg(long)]
        top_k: Option<usize>,
    },
    /// Manage ingested documents
    Documents {
        #[command(subcommand)]
        action: DocumentsAction,
    },
}

#[derive(Subcommand)]
enum DocumentsAction {
    /// List ingested documents
    List,
}

/// Backends shared by all subcommands
struct Backends {
    store: MetadataStore,
    vector_store: Arc<dyn VectorStore>,
    embedder: Arc<dyn EmbeddingClient>,
    llm: Arc<dyn LlmClient>,
    config: AppConfig,
}

async fn connect(config: AppConfig) -> anyhow::Result<Backends> {
    let store = MetadataStore::new(
        &config.database.postgres_url,
        config.database.postgres_pool_size,
    )
    .await?;
    store.run_migrations().await?;

    let vector_store: Arc<dyn VectorStore> = Arc::new(QdrantStore::new(&config.database)?);
    let embedder: Arc<dyn EmbeddingClient> = Arc::from(create_embedding_client(&config.llm)?);
    let llm: Arc<dyn LlmClient> = Arc::from(create_llm_client(&config.llm)?);

    Ok(Backends {
        store,
        vector_store,
        embedder,
        llm,
        config,
    })
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "mqa=info".into()),
        )
        .init();

    let cli = Cli::parse();
    let config = AppConfig::from_env().unwrap_or_default();

    match cli.command {
        Commands::Ingest { file } => {
            let backends = connect(config).await?;
            backends.vector_store.ensure_collection().await?;

            let bytes = std::fs::read(&file)?;
            let filename = file
                .file_name()
                .and_then(|name| name.to_str())
                .ok_or_else(|| anyhow::anyhow!("Invalid file name: {}", file.display()))?;

            let processor = DocumentProcessor::new(
                backends.store.clone(),
                backends.vector_store.clone(),
                backends.embedder.clone(),
                &backends.config,
            );

            let document = processor.process(&bytes, filename).await?;

            println!("Ingested {}", document.original_filename);
            println!("  id:     {}", document.id);
            println!("  pages:  {}", document.num_pages);
            println!("  chunks: {}", document.num_chunks);
        }
        Commands::Ask { question, top_k } => {
            let backends = connect(config).await?;

            let chain = RagChain::new(
                backends.embedder.clone(),
                backends.vector_store.clone(),
                backends.llm.clone(),
                backends.config.rag.clone(),
            );

            let result = chain.answer(&question, top_k).await?;

            println!("{}\n", result.answer);
            if !result.sources.is_empty() {
                println!("Sources:");
                for (i, source) in result.sources.iter().enumerate() {
                    println!(
                        "  [{}] {} (page {}, score {:.3})",
                        i + 1,
                        source.filename,
                        source.page_number,
                        source.score
                    );
                }
            }
            println!("\n({} ms)", result.processing_time_ms);
        }
        Commands::Documents { action } => match action {
            DocumentsAction::List => {
                let backends = connect(config).await?;

                let documents = backends.store.list_documents(100, 0).await?;
                let total = backends.store.count_documents().await?;

                if documents.is_empty() {
                    println!("No documents ingested yet.");
                } else {
                    for doc in &documents {
                        println!(
                            "{}  {}  pages={} chunks={} uploaded={}",
                            doc.id,
                            doc.original_filename,
                            doc.num_pages,
                            doc.num_chunks,
                            doc.upload_date.format("%Y-%m-%d %H:%M")
                        );
                    }
                    println!("\n{total} document(s)");
                }
            }
        },
    }

    Ok(())
}
