//! Error types for knowledge store construction.

use thiserror::Error;

/// Result type alias for knowledge store operations.
pub type Result<T> = std::result::Result<T, KnowledgeError>;

/// Errors that can occur while building the knowledge store.
#[derive(Error, Debug)]
pub enum KnowledgeError {
    /// Embedding a batch of records failed.
    #[error("ingestion failed while embedding records: {0}")]
    Ingestion(#[from] unifinder_embeddings::EmbeddingError),

    /// Corpus file could not be read.
    #[error("corpus unreadable: {0}")]
    CorpusUnreadable(#[from] std::io::Error),
}
