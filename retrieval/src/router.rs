//! Intent routing.
//!
//! One classification call decides whether a query needs the knowledge base
//! at all. Only an exact, case-insensitive match of the domain label routes
//! to retrieval; anything else, including a failed or timed-out call, routes
//! to the cheaper, context-free path.

use std::sync::Arc;
use std::time::Duration;

use tracing::{debug, warn};
use unifinder_generation::CompletionProvider;

use crate::config::RoutingConfig;

/// Where a classified query should go.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Route {
    /// The query asks about the knowledge domain; retrieve context.
    Domain,

    /// General conversation; skip retrieval entirely.
    General,
}

/// Classifies queries ahead of retrieval.
pub struct IntentRouter {
    generator: Arc<dyn CompletionProvider>,
    config: RoutingConfig,
    timeout: Duration,
}

impl IntentRouter {
    /// Create a router with the given configuration.
    pub fn new(
        generator: Arc<dyn CompletionProvider>,
        config: RoutingConfig,
        timeout: Duration,
    ) -> Self {
        Self {
            generator,
            config,
            timeout,
        }
    }

    /// Classify a query.
    pub async fn classify(&self, query: &str) -> Route {
        let prompt = format!(
            "Classify the user message. Reply with exactly one word: \
             {domain} if the message asks about {description}, or {general} \
             for anything else.\n\nMessage: {query}",
            domain = self.config.domain_label,
            description = self.config.domain_description,
            general = self.config.general_label,
        );

        let label = match tokio::time::timeout(self.timeout, self.generator.complete(&prompt)).await
        {
            Ok(Ok(label)) => label,
            Ok(Err(err)) => {
                warn!("intent classification failed, routing general: {err}");
                return Route::General;
            }
            Err(_) => {
                warn!(
                    "intent classification timed out after {}s, routing general",
                    self.timeout.as_secs()
                );
                return Route::General;
            }
        };

        let route = if label.trim().eq_ignore_ascii_case(&self.config.domain_label) {
            Route::Domain
        } else {
            Route::General
        };
        debug!("classified query as {route:?}");
        route
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use async_trait::async_trait;
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

    fn router(response: Option<&'static str>) -> IntentRouter {
        IntentRouter::new(
            Arc::new(StubGenerator { response }),
            RoutingConfig::default(),
            Duration::from_secs(5),
        )
    }

    #[tokio::test]
    async fn test_exact_label_routes_domain() {
        assert_eq!(router(Some("DOMAIN")).classify("q").await, Route::Domain);
    }

    #[tokio::test]
    async fn test_label_match_is_case_insensitive() {
        assert_eq!(router(Some("  domain\n")).classify("q").await, Route::Domain);
    }

    #[tokio::test]
    async fn test_other_output_routes_general() {
        assert_eq!(router(Some("GENERAL")).classify("q").await, Route::General);
        assert_eq!(
            router(Some("DOMAIN, probably")).classify("q").await,
            Route::General
        );
    }

    #[tokio::test]
    async fn test_failed_call_routes_general() {
        assert_eq!(router(None).classify("q").await, Route::General);
    }
}
