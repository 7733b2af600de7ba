//! Error types for the retrieval engine.
//!
//! Only infrastructure failures surface here. Auxiliary generation failures
//! (paraphrasing, hypothetical answers, intent classification) fail open
//! inside their stages and never reach the caller.

use thiserror::Error;

/// Result type alias for retrieval operations.
pub type Result<T> = std::result::Result<T, RetrievalError>;

/// Errors that can occur in the retrieval engine.
#[derive(Error, Debug)]
pub enum RetrievalError {
    /// Embedding error.
    #[error("embedding error: {0}")]
    Embedding(#[from] unifinder_embeddings::EmbeddingError),

    /// Knowledge store error during a rebuild.
    #[error("knowledge error: {0}")]
    Knowledge(#[from] unifinder_knowledge::KnowledgeError),
}
