//! Query expansion strategies.
//!
//! Each strategy turns one query into the ordered list of texts that get
//! embedded for ranking. Expansion is an auxiliary step: any generation
//! failure or timeout falls back to the plain query rather than aborting
//! the retrieval.

use std::sync::Arc;
use std::time::Duration;

use serde::{Deserialize, Serialize};
use tracing::{debug, warn};
use unifinder_generation::CompletionProvider;

/// Token separating paraphrases in a multi-query generation response.
pub const VARIANT_DELIMITER: &str = "|||";

/// Which expansion strategy to run per query.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ExpansionStrategy {
    /// Embed the query as-is.
    Direct,

    /// Ask for paraphrases and embed the query plus every parsed variant.
    MultiQuery,

    /// Embed a generated hypothetical answer instead of the query; prose
    /// answers resemble stored fact text better than terse questions do.
    Hyde,
}

/// Expands queries into the texts to embed.
pub struct QueryExpander {
    generator: Arc<dyn CompletionProvider>,
    strategy: ExpansionStrategy,
    variants: usize,
    timeout: Duration,
}

impl QueryExpander {
    /// Create an expander running the given strategy.
    pub fn new(
        generator: Arc<dyn CompletionProvider>,
        strategy: ExpansionStrategy,
        variants: usize,
        timeout: Duration,
    ) -> Self {
        Self {
            generator,
            strategy,
            variants,
            timeout,
        }
    }

    /// Expand a query into an ordered, non-empty list of texts to embed.
    pub async fn expand(&self, query: &str) -> Vec<String> {
        match self.strategy {
            ExpansionStrategy::Direct => vec![query.to_string()],
            ExpansionStrategy::MultiQuery => self.multi_query(query).await,
            ExpansionStrategy::Hyde => self.hyde(query).await,
        }
    }

    /// Run a generation call with the auxiliary timeout; `None` means the
    /// caller should fall back.
    async fn generate(&self, prompt: String) -> Option<String> {
        match tokio::time::timeout(self.timeout, self.generator.complete(&prompt)).await {
            Ok(Ok(text)) => Some(text),
            Ok(Err(err)) => {
                warn!("expansion call failed, falling back to direct: {err}");
                None
            }
            Err(_) => {
                warn!(
                    "expansion call timed out after {}s, falling back to direct",
                    self.timeout.as_secs()
                );
                None
            }
        }
    }

    async fn multi_query(&self, query: &str) -> Vec<String> {
        let prompt = format!(
            "You rewrite search queries for a retrieval system. Produce {n} \
             alternative phrasings of the question below, keeping its meaning. \
             Separate the phrasings with the token {VARIANT_DELIMITER} and \
             output nothing else.\n\nQuestion: {query}",
            n = self.variants,
        );

        let Some(response) = self.generate(prompt).await else {
            return vec![query.to_string()];
        };

        let variants = parse_variants(&response, self.variants);
        if variants.is_empty() {
            warn!("no variants parsed from paraphrase response, using query alone");
            return vec![query.to_string()];
        }

        debug!("expanded query into {} variants", variants.len());
        let mut texts = Vec::with_capacity(variants.len() + 1);
        texts.push(query.to_string());
        texts.extend(variants);
        texts
    }

    async fn hyde(&self, query: &str) -> Vec<String> {
        let prompt = format!(
            "Write one short paragraph that plausibly answers the question \
             below, as if quoting from reference material. Guessing is fine; \
             the text is used for similarity search and never shown to \
             anyone.\n\nQuestion: {query}"
        );

        match self.generate(prompt).await {
            Some(answer) if !answer.trim().is_empty() => vec![answer],
            _ => vec![query.to_string()],
        }
    }
}

/// Parse a delimited paraphrase response.
///
/// A response without the delimiter token is treated as malformed and yields
/// no variants; the strategy tolerates the model returning too few or too
/// many by capping at `max`.
fn parse_variants(response: &str, max: usize) -> Vec<String> {
    if !response.contains(VARIANT_DELIMITER) {
        return Vec::new();
    }
    response
        .split(VARIANT_DELIMITER)
        .map(str::trim)
        .filter(|v| !v.is_empty())
        .take(max)
        .map(str::to_string)
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use async_trait::async_trait;
    use pretty_assertions::assert_eq;
    use unifinder_generation::{GenerationError, Result as GenResult};

    struct StubGenerator {
        response: Option<&'static str>,
    }

    #[async_trait]
    impl CompletionProvider for StubGenerator {
        fn name(&self) -> &str {
            "stub"
        }

        async fn complete(&self, _prompt: &str) -> GenResult<String> {
            match self.response {
                Some(text) => Ok(text.to_string()),
                None => Err(GenerationError::ApiRequest("stub failure".to_string())),
            }
        }

        fn is_available(&self) -> bool {
            true
        }
    }

    fn expander(strategy: ExpansionStrategy, response: Option<&'static str>) -> QueryExpander {
        QueryExpander::new(
            Arc::new(StubGenerator { response }),
            strategy,
            3,
            Duration::from_secs(5),
        )
    }

    #[tokio::test]
    async fn test_direct_returns_query_unchanged() {
        let texts = expander(ExpansionStrategy::Direct, None)
            .expand("where is the library?")
            .await;
        assert_eq!(texts, vec!["where is the library?"]);
    }

    #[tokio::test]
    async fn test_multi_query_prepends_query_to_variants() {
        let texts = expander(
            ExpansionStrategy::MultiQuery,
            Some("library location ||| where can I find the library ||| campus library address"),
        )
        .expand("where is the library?")
        .await;

        assert_eq!(texts.len(), 4);
        assert_eq!(texts[0], "where is the library?");
        assert_eq!(texts[1], "library location");
    }

    #[tokio::test]
    async fn test_multi_query_without_delimiter_falls_back() {
        let texts = expander(
            ExpansionStrategy::MultiQuery,
            Some("1. library location\n2. campus library"),
        )
        .expand("where is the library?")
        .await;

        assert_eq!(texts, vec!["where is the library?"]);
    }

    #[tokio::test]
    async fn test_multi_query_with_only_empty_variants_falls_back() {
        let texts = expander(ExpansionStrategy::MultiQuery, Some(" ||| \n ||| "))
            .expand("where is the library?")
            .await;

        assert_eq!(texts, vec!["where is the library?"]);
    }

    #[tokio::test]
    async fn test_multi_query_caps_excess_variants() {
        let texts = expander(
            ExpansionStrategy::MultiQuery,
            Some("a ||| b ||| c ||| d ||| e"),
        )
        .expand("q")
        .await;

        // query + at most 3 variants
        assert_eq!(texts.len(), 4);
    }

    #[tokio::test]
    async fn test_multi_query_fails_open_on_generation_error() {
        let texts = expander(ExpansionStrategy::MultiQuery, None)
            .expand("where is the library?")
            .await;

        assert_eq!(texts, vec!["where is the library?"]);
    }

    #[tokio::test]
    async fn test_hyde_returns_only_the_hypothetical() {
        let texts = expander(
            ExpansionStrategy::Hyde,
            Some("The library sits on the main campus, next to block B."),
        )
        .expand("where is the library?")
        .await;

        assert_eq!(
            texts,
            vec!["The library sits on the main campus, next to block B."]
        );
    }

    #[tokio::test]
    async fn test_hyde_fails_open_on_generation_error() {
        let texts = expander(ExpansionStrategy::Hyde, None)
            .expand("where is the library?")
            .await;

        assert_eq!(texts, vec!["where is the library?"]);
    }

    #[test]
    fn test_parse_variants_trims_and_drops_empties() {
        let variants = parse_variants("  a  |||   ||| b ", 5);
        assert_eq!(variants, vec!["a", "b"]);
    }
}
