//! # Generation
//!
//! Client for the generative text service. One [`CompletionProvider`] call
//! shape (prompt in, text out) serves every use in the system: paraphrase
//! generation, hypothetical answers, intent classification, and final answer
//! synthesis.

pub mod error;
pub mod provider;

pub use error::{GenerationError, Result};
pub use provider::{CompletionProvider, GeminiGenerator};
