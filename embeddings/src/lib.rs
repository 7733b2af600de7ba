//! # Embeddings
//!
//! This crate provides the embedding half of the Unifinder retrieval core:
//!
//! - **Embedding Generation**: Convert text to dense vectors via the Gemini
//!   embedding API, single or batched
//! - **Similarity Ranking**: Score stored vectors against one or more query
//!   vectors and select the best matches
//!
//! ## Architecture
//!
//! ```text
//! ┌────────────────────────────────────────────────────────────┐
//! │                     Embeddings System                      │
//! ├────────────────────────────────────────────────────────────┤
//! │  EmbeddingProvider ──► Embedding ──► rank / select_top_k   │
//! │        │                                                   │
//! │        ▼                                                   │
//! │  Gemini embedContent / batchEmbedContents                  │
//! └────────────────────────────────────────────────────────────┘
//! ```

pub mod error;
pub mod provider;
pub mod similarity;

pub use error::{EmbeddingError, Result};
pub use provider::{EmbeddingProvider, EmbeddingTask, GeminiEmbedder};
pub use similarity::{cosine_similarity, rank, select_top_k, ScoredUnit};

/// A dense vector embedding.
pub type Embedding = Vec<f32>;

/// Dimension of embeddings produced by the default model.
pub const DEFAULT_DIMENSION: usize = 768; // Gemini text-embedding-004
