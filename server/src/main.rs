//! Unifinder chat server.
//!
//! Reads the corpus once at startup, builds the knowledge store, and serves
//! the chat endpoint. Ingestion failures degrade to an empty store instead
//! of refusing to start; the assistant then answers without context.

mod config;
mod routes;
mod synthesis;

use std::sync::Arc;

use anyhow::Result;
use tracing::{error, info};
use tracing_subscriber::EnvFilter;
use unifinder_embeddings::{EmbeddingProvider, GeminiEmbedder};
use unifinder_generation::{CompletionProvider, GeminiGenerator};
use unifinder_knowledge::KnowledgeStore;
use unifinder_retrieval::RetrievalEngine;

use crate::config::ServerConfig;
use crate::routes::AppState;

#[tokio::main]
async fn main() -> Result<()> {
    dotenvy::dotenv().ok();
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .init();

    let config = ServerConfig::from_env()?;

    let embedder: Arc<dyn EmbeddingProvider> = Arc::new(GeminiEmbedder::new());
    let generator: Arc<dyn CompletionProvider> = Arc::new(GeminiGenerator::new());

    let store = match KnowledgeStore::build_from_file(
        &config.corpus_path,
        config.split_policy,
        embedder.as_ref(),
    )
    .await
    {
        Ok(store) => store,
        Err(err) => {
            error!("corpus ingestion failed, serving with an empty store: {err}");
            KnowledgeStore::empty()
        }
    };
    info!("knowledge store ready with {} units", store.len());

    let engine = Arc::new(RetrievalEngine::new(
        config.retrieval.clone(),
        embedder,
        generator.clone(),
        store,
    ));

    let state = AppState {
        engine,
        generator,
        max_message_len: config.max_message_len,
    };

    let listener = tokio::net::TcpListener::bind(("0.0.0.0", config.port)).await?;
    info!("listening on {}", listener.local_addr()?);
    axum::serve(listener, routes::app(state)).await?;

    Ok(())
}
