//! Application state wiring all collaborators together.
//!
//! AppState holds the concrete instances used by both CLI and server.
//! The engine and compactor are generic over repository traits, but
//! AppState pins them to the concrete infra implementations.

use std::path::PathBuf;
use std::sync::Arc;

use secrecy::SecretString;

use valet_core::chat::ChatEngine;
use valet_core::llm::BoxLlmProvider;
use valet_core::memory::{BoxEmbedder, BoxVectorIndex, Compactor, ContextRetriever};
use valet_core::session::SessionPool;
use valet_infra::ai::WorkersAiClient;
use valet_infra::config::{default_data_dir, load_config};
use valet_infra::sqlite::{DatabasePool, SqliteConversationRepository, SqliteMemoryStore};
use valet_infra::vector::VectorizeClient;
use valet_types::config::ValetConfig;

/// Concrete engine type pinned to the infra implementations.
pub type ConcreteChatEngine = ChatEngine<SqliteConversationRepository, SqliteMemoryStore>;

/// Shared application state for CLI commands and HTTP handlers.
#[derive(Clone)]
pub struct AppState {
    pub engine: Arc<ConcreteChatEngine>,
    pub retriever: Arc<ContextRetriever>,
    pub pool: Arc<SessionPool>,
    pub repository: Arc<SqliteConversationRepository>,
    pub memories: Arc<SqliteMemoryStore>,
    pub config: Arc<ValetConfig>,
    pub data_dir: PathBuf,
    pub db_pool: DatabasePool,
}

impl AppState {
    /// Initialize the application state: load config, connect to the
    /// database, wire the engine.
    pub async fn init() -> anyhow::Result<Self> {
        Self::init_with(None).await
    }

    /// Like [`init`](Self::init), with a pool-size override taking
    /// precedence over the configured value.
    pub async fn init_with(pool_size: Option<usize>) -> anyhow::Result<Self> {
        let data_dir = default_data_dir();
        tokio::fs::create_dir_all(&data_dir).await?;

        let mut config = load_config(&data_dir).await;
        if let Some(size) = pool_size {
            config.pool_size = size;
        }

        let db_url = format!("sqlite://{}?mode=rwc", data_dir.join("valet.db").display());
        let db_pool = DatabasePool::new(&db_url).await?;

        let repository = Arc::new(SqliteConversationRepository::new(db_pool.clone()));
        let memories = Arc::new(SqliteMemoryStore::new(db_pool.clone()));

        // One gateway client serves chat, summaries, and embeddings; the
        // model id in each request selects the task.
        let raw_token = std::env::var("VALET_API_TOKEN").unwrap_or_default();
        let gateway = |token: &str| {
            WorkersAiClient::new(
                config.ai_endpoint.clone(),
                SecretString::from(token.to_string()),
                config.embedding_model.clone(),
                config.embedding_dimension,
            )
        };
        let embedder = Arc::new(BoxEmbedder::new(gateway(&raw_token)));
        let llm = Arc::new(BoxLlmProvider::new(gateway(&raw_token)));
        let index = Arc::new(BoxVectorIndex::new(VectorizeClient::new(
            config.vector_endpoint.clone(),
            SecretString::from(raw_token),
        )));

        let retriever = Arc::new(ContextRetriever::new(
            embedder,
            index,
            config.retrieval_top_k,
            config.retrieval_min_score,
        ));
        let compactor = Arc::new(Compactor::new(
            Arc::clone(&repository),
            Arc::clone(&llm),
            config.summary_model.clone(),
            u64::from(config.compaction_window),
        ));
        let engine = Arc::new(ChatEngine::new(
            Arc::clone(&repository),
            Arc::clone(&memories),
            llm,
            Arc::clone(&retriever),
            compactor,
            config.chat_model.clone(),
            config.recent_turns as usize,
        ));

        let pool = Arc::new(SessionPool::new(config.pool_size));

        Ok(Self {
            engine,
            retriever,
            pool,
            repository,
            memories,
            config: Arc::new(config),
            data_dir,
            db_pool,
        })
    }
}
