//! # Retrieval Engine
//!
//! The orchestration layer of the Unifinder core. One retrieval call runs a
//! staged pipeline, each stage awaiting an external service and each
//! auxiliary stage failing open:
//!
//! ```text
//! ┌──────────────────────────────────────────────────────────────┐
//! │                      Retrieval Pipeline                      │
//! ├──────────────────────────────────────────────────────────────┤
//! │  query ──► [classify] ──► expand ──► embed ──► rank ──► top-k│
//! │               │             │          │                     │
//! │               ▼             ▼          ▼                     │
//! │            General?     Direct /    Embedding                │
//! │            (skip all)   MultiQuery  Service                  │
//! │                         / HyDE                               │
//! └──────────────────────────────────────────────────────────────┘
//! ```
//!
//! ## Usage
//!
//! ```rust,ignore
//! use unifinder_retrieval::{RetrievalConfig, RetrievalEngine};
//!
//! let engine = RetrievalEngine::new(config, embedder, generator, store);
//! let context = engine.retrieve("which courses run in the evening?").await?;
//! ```

pub mod config;
pub mod engine;
pub mod error;
pub mod expand;
pub mod router;

pub use config::{RetrievalConfig, RoutingConfig};
pub use engine::RetrievalEngine;
pub use error::{Result, RetrievalError};
pub use expand::{ExpansionStrategy, QueryExpander, VARIANT_DELIMITER};
pub use router::{IntentRouter, Route};
