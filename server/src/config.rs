//! Server configuration from environment variables.

use std::path::PathBuf;
use std::str::FromStr;

use anyhow::{bail, Context, Result};
use unifinder_knowledge::SplitPolicy;
use unifinder_retrieval::{ExpansionStrategy, RetrievalConfig};

/// Longest user message accepted by the chat endpoint, in characters.
pub const DEFAULT_MAX_MESSAGE_LEN: usize = 2000;

/// Deployment configuration for the chat server.
#[derive(Debug, Clone)]
pub struct ServerConfig {
    /// TCP port to listen on.
    pub port: u16,

    /// Path to the corpus file read once at startup.
    pub corpus_path: PathBuf,

    /// How the corpus splits into records. An explicit choice; never
    /// inferred from the file contents.
    pub split_policy: SplitPolicy,

    /// Retrieval tuning passed through to the engine.
    pub retrieval: RetrievalConfig,

    /// Maximum accepted chat message length in characters.
    pub max_message_len: usize,
}

impl ServerConfig {
    /// Load the configuration from the process environment.
    pub fn from_env() -> Result<Self> {
        let mut retrieval = RetrievalConfig::new();
        retrieval.strategy = parse_env("EXPANSION_STRATEGY", ExpansionStrategy::Direct)?;
        retrieval.top_k = parse_env("RETRIEVAL_TOP_K", retrieval.top_k)?;
        retrieval.min_score = parse_env("RETRIEVAL_MIN_SCORE", retrieval.min_score)?;
        retrieval.routing.enabled = parse_env("ROUTING_ENABLED", false)?;
        if let Ok(description) = std::env::var("ROUTING_DOMAIN_DESCRIPTION") {
            retrieval.routing.domain_description = description;
        }

        Ok(Self {
            port: parse_env("PORT", 3000)?,
            corpus_path: std::env::var("CORPUS_PATH")
                .map(PathBuf::from)
                .unwrap_or_else(|_| PathBuf::from("facts.txt")),
            split_policy: parse_env("SPLIT_POLICY", SplitPolicy::BlankLine)?,
            retrieval,
            max_message_len: parse_env("MAX_MESSAGE_LEN", DEFAULT_MAX_MESSAGE_LEN)?,
        })
    }
}

/// Parse an env var, falling back to `default` when unset.
fn parse_env<T: EnvValue>(key: &str, default: T) -> Result<T> {
    match std::env::var(key) {
        Ok(raw) => T::parse(&raw).with_context(|| format!("invalid value for {key}: {raw:?}")),
        Err(_) => Ok(default),
    }
}

/// Values readable from the environment.
trait EnvValue: Sized {
    fn parse(raw: &str) -> Result<Self>;
}

impl EnvValue for u16 {
    fn parse(raw: &str) -> Result<Self> {
        Ok(Self::from_str(raw)?)
    }
}

impl EnvValue for usize {
    fn parse(raw: &str) -> Result<Self> {
        Ok(Self::from_str(raw)?)
    }
}

impl EnvValue for f32 {
    fn parse(raw: &str) -> Result<Self> {
        Ok(Self::from_str(raw)?)
    }
}

impl EnvValue for bool {
    fn parse(raw: &str) -> Result<Self> {
        match raw.to_ascii_lowercase().as_str() {
            "1" | "true" | "yes" => Ok(true),
            "0" | "false" | "no" => Ok(false),
            _ => bail!("expected a boolean"),
        }
    }
}

impl EnvValue for SplitPolicy {
    fn parse(raw: &str) -> Result<Self> {
        match raw {
            "line" => Ok(Self::Line),
            "blank_line" => Ok(Self::BlankLine),
            _ => bail!("expected \"line\" or \"blank_line\""),
        }
    }
}

impl EnvValue for ExpansionStrategy {
    fn parse(raw: &str) -> Result<Self> {
        match raw {
            "direct" => Ok(Self::Direct),
            "multi_query" => Ok(Self::MultiQuery),
            "hyde" => Ok(Self::Hyde),
            _ => bail!("expected \"direct\", \"multi_query\" or \"hyde\""),
        }
    }
}
