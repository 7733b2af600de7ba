//! The in-memory knowledge store.

use std::path::Path;

use tracing::{info, warn};
use unifinder_embeddings::{Embedding, EmbeddingProvider, EmbeddingTask};

use crate::corpus::{split_records, SplitPolicy};
use crate::error::Result;

/// One stored fact and its embedding.
///
/// Units are immutable after ingestion. Ranking never writes a score back
/// onto a unit; per-query scores live in request-scoped structures.
#[derive(Debug, Clone)]
pub struct KnowledgeUnit {
    /// Position in corpus order, also the unit's identity.
    pub id: usize,

    /// The record text. Non-empty.
    pub text: String,

    /// The record's embedding vector.
    pub embedding: Embedding,
}

impl AsRef<[f32]> for KnowledgeUnit {
    fn as_ref(&self) -> &[f32] {
        &self.embedding
    }
}

/// Ordered, read-only collection of knowledge units.
///
/// Built once from the corpus before serving. A rebuild produces a new store
/// that replaces the old one wholesale; the store itself never changes while
/// queries are in flight.
#[derive(Debug, Default)]
pub struct KnowledgeStore {
    units: Vec<KnowledgeUnit>,
}

impl KnowledgeStore {
    /// Create an empty store.
    ///
    /// Valid for serving: queries against it retrieve no context.
    pub fn empty() -> Self {
        Self::default()
    }

    /// Build a store from raw corpus text.
    ///
    /// Records are split under `policy`, embedded in batches no larger than
    /// the provider's cap, and assembled preserving corpus order across
    /// batches. An empty corpus yields an empty store; an embedding failure
    /// aborts the build and surfaces as an ingestion error.
    pub async fn build(
        corpus: &str,
        policy: SplitPolicy,
        embedder: &dyn EmbeddingProvider,
    ) -> Result<Self> {
        let records = split_records(corpus, policy);
        if records.is_empty() {
            warn!("corpus is empty; knowledge store will serve no context");
            return Ok(Self::empty());
        }

        let cap = embedder.max_batch_size();
        let mut units = Vec::with_capacity(records.len());

        for chunk in records.chunks(cap) {
            let embeddings = embedder
                .embed_batch(chunk, EmbeddingTask::RetrievalDocument)
                .await?;
            for (text, embedding) in chunk.iter().zip(embeddings) {
                units.push(KnowledgeUnit {
                    id: units.len(),
                    text: text.clone(),
                    embedding,
                });
            }
        }

        info!("knowledge store built with {} units", units.len());
        Ok(Self { units })
    }

    /// Build a store from a corpus file on disk.
    pub async fn build_from_file(
        path: impl AsRef<Path>,
        policy: SplitPolicy,
        embedder: &dyn EmbeddingProvider,
    ) -> Result<Self> {
        let corpus = tokio::fs::read_to_string(path).await?;
        Self::build(&corpus, policy, embedder).await
    }

    /// All units, in corpus order.
    pub fn units(&self) -> &[KnowledgeUnit] {
        &self.units
    }

    /// Get a unit by its corpus position.
    pub fn unit(&self, id: usize) -> Option<&KnowledgeUnit> {
        self.units.get(id)
    }

    /// Number of stored units.
    pub fn len(&self) -> usize {
        self.units.len()
    }

    /// Check if the store holds no units.
    pub fn is_empty(&self) -> bool {
        self.units.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use async_trait::async_trait;
    use pretty_assertions::assert_eq;
    use std::sync::Mutex;
    use unifinder_embeddings::EmbeddingError;

    /// Embedder that derives a vector from the record text and records every
    /// batch size it is asked for.
    struct StubEmbedder {
        batch_sizes: Mutex<Vec<usize>>,
        fail: bool,
    }

    impl StubEmbedder {
        fn new() -> Self {
            Self {
                batch_sizes: Mutex::new(Vec::new()),
                fail: false,
            }
        }

        fn failing() -> Self {
            Self {
                batch_sizes: Mutex::new(Vec::new()),
                fail: true,
            }
        }
    }

    #[async_trait]
    impl EmbeddingProvider for StubEmbedder {
        fn name(&self) -> &str {
            "stub"
        }

        fn max_batch_size(&self) -> usize {
            100
        }

        async fn embed(
            &self,
            text: &str,
            _task: EmbeddingTask,
        ) -> unifinder_embeddings::Result<Embedding> {
            Ok(vec![text.len() as f32, 1.0])
        }

        async fn embed_batch(
            &self,
            texts: &[String],
            _task: EmbeddingTask,
        ) -> unifinder_embeddings::Result<Vec<Embedding>> {
            if self.fail {
                return Err(EmbeddingError::ApiRequest("stub failure".to_string()));
            }
            self.batch_sizes.lock().unwrap().push(texts.len());
            Ok(texts
                .iter()
                .map(|t| vec![t.len() as f32, 1.0])
                .collect())
        }

        fn is_available(&self) -> bool {
            true
        }
    }

    #[tokio::test]
    async fn test_build_batches_respect_cap_and_order() {
        let corpus: String = (0..250)
            .map(|i| format!("fact number {i}\n"))
            .collect();
        let embedder = StubEmbedder::new();

        let store = KnowledgeStore::build(&corpus, SplitPolicy::Line, &embedder)
            .await
            .unwrap();

        // 250 records with a cap of 100 means exactly three calls.
        assert_eq!(*embedder.batch_sizes.lock().unwrap(), vec![100, 100, 50]);
        assert_eq!(store.len(), 250);

        // Corpus order survives batching.
        for (i, unit) in store.units().iter().enumerate() {
            assert_eq!(unit.id, i);
            assert_eq!(unit.text, format!("fact number {i}"));
            assert_eq!(unit.embedding[0], unit.text.len() as f32);
        }
    }

    #[tokio::test]
    async fn test_empty_corpus_builds_empty_store() {
        let embedder = StubEmbedder::new();
        let store = KnowledgeStore::build("", SplitPolicy::BlankLine, &embedder)
            .await
            .unwrap();

        assert!(store.is_empty());
        assert!(embedder.batch_sizes.lock().unwrap().is_empty());
    }

    #[tokio::test]
    async fn test_embedding_failure_aborts_build() {
        let embedder = StubEmbedder::failing();
        let result = KnowledgeStore::build("a fact", SplitPolicy::Line, &embedder).await;

        assert!(matches!(result, Err(crate::KnowledgeError::Ingestion(_))));
    }

    #[tokio::test]
    async fn test_build_from_missing_file() {
        let embedder = StubEmbedder::new();
        let result = KnowledgeStore::build_from_file(
            "/definitely/not/here.txt",
            SplitPolicy::Line,
            &embedder,
        )
        .await;

        assert!(matches!(
            result,
            Err(crate::KnowledgeError::CorpusUnreadable(_))
        ));
    }

    #[tokio::test]
    async fn test_build_from_file_reads_corpus() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("facts.txt");
        tokio::fs::write(&path, "alpha\nbeta\n").await.unwrap();

        let embedder = StubEmbedder::new();
        let store = KnowledgeStore::build_from_file(&path, SplitPolicy::Line, &embedder)
            .await
            .unwrap();

        assert_eq!(store.len(), 2);
        assert_eq!(store.unit(0).unwrap().text, "alpha");
    }
}
