//! Configuration for the retrieval engine.

use serde::{Deserialize, Serialize};

use crate::expand::ExpansionStrategy;

/// Configuration for the retrieval engine.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RetrievalConfig {
    /// Query expansion strategy.
    pub strategy: ExpansionStrategy,

    /// Number of paraphrases requested by the multi-query strategy.
    pub multi_query_variants: usize,

    /// Maximum number of matches returned per query.
    ///
    /// Useful values sit between 2 and 5 depending on record size.
    pub top_k: usize,

    /// Minimum similarity score a match must exceed (0.0 to 1.0).
    ///
    /// Tuning tends to land between 0.6 and 0.7; higher values trade recall
    /// for precision.
    pub min_score: f32,

    /// Intent routing configuration.
    pub routing: RoutingConfig,

    /// Timeout in seconds for auxiliary generation calls (paraphrasing,
    /// hypothetical answers, classification). On expiry the stage falls back
    /// to its fail-open default.
    pub aux_timeout_secs: u64,
}

impl RetrievalConfig {
    /// Create a configuration with default values.
    pub fn new() -> Self {
        Self {
            strategy: ExpansionStrategy::Direct,
            multi_query_variants: 3,
            top_k: 5,
            min_score: 0.65,
            routing: RoutingConfig::default(),
            aux_timeout_secs: 10,
        }
    }

    /// Set the expansion strategy.
    pub fn with_strategy(mut self, strategy: ExpansionStrategy) -> Self {
        self.strategy = strategy;
        self
    }

    /// Set the number of matches returned per query.
    pub fn with_top_k(mut self, top_k: usize) -> Self {
        self.top_k = top_k;
        self
    }

    /// Set the minimum similarity score.
    pub fn with_min_score(mut self, min_score: f32) -> Self {
        self.min_score = min_score;
        self
    }

    /// Set the routing configuration.
    pub fn with_routing(mut self, routing: RoutingConfig) -> Self {
        self.routing = routing;
        self
    }
}

impl Default for RetrievalConfig {
    fn default() -> Self {
        Self::new()
    }
}

/// Configuration for the optional intent router.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RoutingConfig {
    /// Whether to classify queries before retrieving.
    pub enabled: bool,

    /// Label whose exact (case-insensitive) match routes to retrieval.
    pub domain_label: String,

    /// Label offered to the classifier for everything else.
    pub general_label: String,

    /// Short description of the knowledge domain, used in the
    /// classification prompt.
    pub domain_description: String,
}

impl Default for RoutingConfig {
    fn default() -> Self {
        Self {
            enabled: false,
            domain_label: "DOMAIN".to_string(),
            general_label: "GENERAL".to_string(),
            domain_description: "the assistant's knowledge base".to_string(),
        }
    }
}
