//! Retrieval engine implementation.

use std::sync::Arc;
use std::time::Duration;

use tokio::sync::RwLock;
use tracing::{debug, info};
use unifinder_embeddings::{rank, select_top_k, EmbeddingProvider, EmbeddingTask};
use unifinder_generation::CompletionProvider;
use unifinder_knowledge::{KnowledgeStore, SplitPolicy};

use crate::config::RetrievalConfig;
use crate::error::Result;
use crate::expand::QueryExpander;
use crate::router::{IntentRouter, Route};

/// Orchestrates one retrieval per query: classify, expand, embed, rank,
/// select.
///
/// The knowledge store sits behind an `Arc` that readers snapshot per query;
/// a rebuild assembles a whole new store offline and swaps the reference, so
/// in-flight queries keep ranking against a consistent snapshot and scores
/// are never written to shared records.
pub struct RetrievalEngine {
    config: RetrievalConfig,
    embedder: Arc<dyn EmbeddingProvider>,
    expander: QueryExpander,
    router: Option<IntentRouter>,
    store: RwLock<Arc<KnowledgeStore>>,
}

impl RetrievalEngine {
    /// Create an engine serving the given store.
    pub fn new(
        config: RetrievalConfig,
        embedder: Arc<dyn EmbeddingProvider>,
        generator: Arc<dyn CompletionProvider>,
        store: KnowledgeStore,
    ) -> Self {
        let aux_timeout = Duration::from_secs(config.aux_timeout_secs);
        let expander = QueryExpander::new(
            generator.clone(),
            config.strategy,
            config.multi_query_variants,
            aux_timeout,
        );
        let router = config
            .routing
            .enabled
            .then(|| IntentRouter::new(generator, config.routing.clone(), aux_timeout));

        Self {
            config,
            embedder,
            expander,
            router,
            store: RwLock::new(Arc::new(store)),
        }
    }

    /// Retrieve the context texts for a query, best match first.
    ///
    /// An empty result is a normal outcome (nothing relevant, or the query
    /// routed away from the knowledge base); an error means the embedding
    /// service was unreachable.
    pub async fn retrieve(&self, query: &str) -> Result<Vec<String>> {
        if let Some(router) = &self.router {
            if router.classify(query).await == Route::General {
                debug!("query routed general, skipping retrieval");
                return Ok(Vec::new());
            }
        }

        let store = self.store.read().await.clone();
        if store.is_empty() {
            debug!("knowledge store is empty, returning no context");
            return Ok(Vec::new());
        }

        let texts = self.expander.expand(query).await;
        let vectors = self
            .embedder
            .embed_batch(&texts, EmbeddingTask::RetrievalQuery)
            .await?;

        let ranked = rank(store.units(), &vectors);
        let selected = select_top_k(ranked, self.config.top_k, self.config.min_score);

        debug!(
            "retrieved {} of {} units for query",
            selected.len(),
            store.len()
        );

        Ok(selected
            .iter()
            .filter_map(|s| store.unit(s.index))
            .map(|u| u.text.clone())
            .collect())
    }

    /// Rebuild the store from a new corpus and swap it in atomically.
    ///
    /// The new store is fully built before the swap; queries in flight keep
    /// their snapshot of the old one.
    pub async fn rebuild(&self, corpus: &str, policy: SplitPolicy) -> Result<usize> {
        let store = KnowledgeStore::build(corpus, policy, self.embedder.as_ref()).await?;
        let len = store.len();
        self.swap_store(store).await;
        Ok(len)
    }

    /// Replace the served store with a pre-built one.
    pub async fn swap_store(&self, store: KnowledgeStore) {
        let len = store.len();
        *self.store.write().await = Arc::new(store);
        info!("knowledge store swapped, now serving {len} units");
    }

    /// Number of units currently served.
    pub async fn store_len(&self) -> usize {
        self.store.read().await.len()
    }
}
