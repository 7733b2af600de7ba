//! Embedding providers.
//!
//! The retrieval core talks to the embedding service through the
//! [`EmbeddingProvider`] trait; [`GeminiEmbedder`] is the production
//! implementation backed by the Gemini embedding API.

use std::time::Duration;

use async_trait::async_trait;
use serde::Deserialize;
use tracing::debug;

use crate::error::{EmbeddingError, Result};
use crate::Embedding;

/// Maximum number of texts the Gemini batch endpoint accepts per call.
pub const GEMINI_MAX_BATCH_SIZE: usize = 100;

/// Default timeout for a single embedding API call.
const DEFAULT_TIMEOUT: Duration = Duration::from_secs(20);

/// Task type hint sent with each embedding request.
///
/// The API embeds documents and queries asymmetrically; corpus records are
/// stored with [`EmbeddingTask::RetrievalDocument`] and looked up with
/// [`EmbeddingTask::RetrievalQuery`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum EmbeddingTask {
    /// Embedding a corpus record for storage.
    RetrievalDocument,

    /// Embedding a query (or query rewrite) for lookup.
    RetrievalQuery,
}

impl EmbeddingTask {
    /// Wire name of this task type.
    pub fn as_str(self) -> &'static str {
        match self {
            Self::RetrievalDocument => "RETRIEVAL_DOCUMENT",
            Self::RetrievalQuery => "RETRIEVAL_QUERY",
        }
    }
}

/// Trait for embedding providers.
#[async_trait]
pub trait EmbeddingProvider: Send + Sync {
    /// Get the name of this provider.
    fn name(&self) -> &str;

    /// Maximum number of texts accepted by a single batch call.
    ///
    /// Callers embedding more texts than this must chunk their input.
    fn max_batch_size(&self) -> usize;

    /// Generate an embedding for the given text.
    async fn embed(&self, text: &str, task: EmbeddingTask) -> Result<Embedding>;

    /// Generate embeddings for multiple texts, preserving input order.
    async fn embed_batch(&self, texts: &[String], task: EmbeddingTask) -> Result<Vec<Embedding>> {
        // Default implementation: process sequentially
        if texts.len() > self.max_batch_size() {
            return Err(EmbeddingError::BatchTooLarge {
                len: texts.len(),
                max: self.max_batch_size(),
            });
        }
        let mut results = Vec::with_capacity(texts.len());
        for text in texts {
            results.push(self.embed(text, task).await?);
        }
        Ok(results)
    }

    /// Check if the provider is available (API key set, etc.).
    fn is_available(&self) -> bool;
}

/// Gemini embedding provider.
pub struct GeminiEmbedder {
    /// API key.
    api_key: Option<String>,

    /// API base URL.
    base_url: String,

    /// HTTP client.
    client: reqwest::Client,

    /// Embedding model name.
    model: String,

    /// Per-request timeout.
    timeout: Duration,
}

impl GeminiEmbedder {
    /// Create a new Gemini embedder.
    pub fn new() -> Self {
        Self {
            api_key: std::env::var("GEMINI_API_KEY").ok(),
            base_url: "https://generativelanguage.googleapis.com/v1beta".to_string(),
            client: reqwest::Client::new(),
            model: "text-embedding-004".to_string(),
            timeout: DEFAULT_TIMEOUT,
        }
    }

    /// Set the API key.
    pub fn with_api_key(mut self, key: impl Into<String>) -> Self {
        self.api_key = Some(key.into());
        self
    }

    /// Set the base URL.
    pub fn with_base_url(mut self, url: impl Into<String>) -> Self {
        self.base_url = url.into();
        self
    }

    /// Set the embedding model.
    pub fn with_model(mut self, model: impl Into<String>) -> Self {
        self.model = model.into();
        self
    }

    /// Set the per-request timeout.
    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout = timeout;
        self
    }

    fn api_key(&self) -> Result<&str> {
        self.api_key
            .as_deref()
            .ok_or(EmbeddingError::ProviderNotConfigured)
    }

    fn content_json(text: &str) -> serde_json::Value {
        serde_json::json!({ "parts": [{ "text": text }] })
    }
}

impl Default for GeminiEmbedder {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl EmbeddingProvider for GeminiEmbedder {
    fn name(&self) -> &str {
        "gemini"
    }

    fn max_batch_size(&self) -> usize {
        GEMINI_MAX_BATCH_SIZE
    }

    async fn embed(&self, text: &str, task: EmbeddingTask) -> Result<Embedding> {
        let api_key = self.api_key()?;

        debug!("Generating embedding with model: {}", self.model);

        let body = serde_json::json!({
            "model": format!("models/{}", self.model),
            "content": Self::content_json(text),
            "taskType": task.as_str(),
        });

        let response = self
            .client
            .post(format!("{}/models/{}:embedContent", self.base_url, self.model))
            .header("x-goog-api-key", api_key)
            .timeout(self.timeout)
            .json(&body)
            .send()
            .await?;

        if response.status() == reqwest::StatusCode::TOO_MANY_REQUESTS {
            let retry_after = response
                .headers()
                .get("retry-after")
                .and_then(|v| v.to_str().ok())
                .and_then(|s| s.parse().ok())
                .unwrap_or(60);

            return Err(EmbeddingError::RateLimited {
                retry_after_secs: retry_after,
            });
        }

        if !response.status().is_success() {
            let error_text = response.text().await.unwrap_or_default();
            return Err(EmbeddingError::ApiRequest(format!(
                "API error: {error_text}"
            )));
        }

        let result: EmbedContentResponse = response.json().await?;

        if result.embedding.values.is_empty() {
            return Err(EmbeddingError::InvalidResponse(
                "empty embedding in response".to_string(),
            ));
        }

        Ok(result.embedding.values)
    }

    async fn embed_batch(&self, texts: &[String], task: EmbeddingTask) -> Result<Vec<Embedding>> {
        if texts.is_empty() {
            return Ok(Vec::new());
        }
        if texts.len() > self.max_batch_size() {
            return Err(EmbeddingError::BatchTooLarge {
                len: texts.len(),
                max: self.max_batch_size(),
            });
        }

        let api_key = self.api_key()?;

        debug!(
            "Generating batch embeddings for {} texts with model: {}",
            texts.len(),
            self.model
        );

        let requests: Vec<serde_json::Value> = texts
            .iter()
            .map(|text| {
                serde_json::json!({
                    "model": format!("models/{}", self.model),
                    "content": Self::content_json(text),
                    "taskType": task.as_str(),
                })
            })
            .collect();

        let body = serde_json::json!({ "requests": requests });

        let response = self
            .client
            .post(format!(
                "{}/models/{}:batchEmbedContents",
                self.base_url, self.model
            ))
            .header("x-goog-api-key", api_key)
            .timeout(self.timeout)
            .json(&body)
            .send()
            .await?;

        if !response.status().is_success() {
            let error_text = response.text().await.unwrap_or_default();
            return Err(EmbeddingError::ApiRequest(format!(
                "API error: {error_text}"
            )));
        }

        let result: BatchEmbedResponse = response.json().await?;

        if result.embeddings.len() != texts.len() {
            return Err(EmbeddingError::InvalidResponse(format!(
                "expected {} embeddings, got {}",
                texts.len(),
                result.embeddings.len()
            )));
        }

        // The API returns embeddings in request order.
        Ok(result.embeddings.into_iter().map(|e| e.values).collect())
    }

    fn is_available(&self) -> bool {
        self.api_key.is_some()
    }
}

/// Gemini `embedContent` response format.
#[derive(Debug, Deserialize)]
struct EmbedContentResponse {
    embedding: ContentEmbedding,
}

/// Gemini `batchEmbedContents` response format.
#[derive(Debug, Deserialize)]
struct BatchEmbedResponse {
    embeddings: Vec<ContentEmbedding>,
}

#[derive(Debug, Deserialize)]
struct ContentEmbedding {
    values: Vec<f32>,
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;
    use serde_json::json;
    use wiremock::matchers::{body_partial_json, method, path};
    use wiremock::{Mock, MockServer, ResponseTemplate};

    fn test_embedder(server: &MockServer) -> GeminiEmbedder {
        GeminiEmbedder::new()
            .with_api_key("test-key")
            .with_base_url(server.uri())
    }

    #[test]
    fn test_task_wire_names() {
        assert_eq!(EmbeddingTask::RetrievalDocument.as_str(), "RETRIEVAL_DOCUMENT");
        assert_eq!(EmbeddingTask::RetrievalQuery.as_str(), "RETRIEVAL_QUERY");
    }

    #[tokio::test]
    async fn test_embed_single() {
        let server = MockServer::start().await;

        Mock::given(method("POST"))
            .and(path("/models/text-embedding-004:embedContent"))
            .and(body_partial_json(json!({ "taskType": "RETRIEVAL_QUERY" })))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({
                "embedding": { "values": [0.1, 0.2, 0.3] }
            })))
            .mount(&server)
            .await;

        let embedder = test_embedder(&server);
        let embedding = embedder
            .embed("hello", EmbeddingTask::RetrievalQuery)
            .await
            .unwrap();

        assert_eq!(embedding, vec![0.1, 0.2, 0.3]);
    }

    #[tokio::test]
    async fn test_embed_batch_preserves_order() {
        let server = MockServer::start().await;

        Mock::given(method("POST"))
            .and(path("/models/text-embedding-004:batchEmbedContents"))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({
                "embeddings": [
                    { "values": [1.0, 0.0] },
                    { "values": [0.0, 1.0] }
                ]
            })))
            .mount(&server)
            .await;

        let embedder = test_embedder(&server);
        let embeddings = embedder
            .embed_batch(
                &["first".to_string(), "second".to_string()],
                EmbeddingTask::RetrievalDocument,
            )
            .await
            .unwrap();

        assert_eq!(embeddings.len(), 2);
        assert_eq!(embeddings[0], vec![1.0, 0.0]);
        assert_eq!(embeddings[1], vec![0.0, 1.0]);
    }

    #[tokio::test]
    async fn test_embed_batch_count_mismatch() {
        let server = MockServer::start().await;

        Mock::given(method("POST"))
            .and(path("/models/text-embedding-004:batchEmbedContents"))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({
                "embeddings": [{ "values": [1.0] }]
            })))
            .mount(&server)
            .await;

        let embedder = test_embedder(&server);
        let result = embedder
            .embed_batch(
                &["a".to_string(), "b".to_string()],
                EmbeddingTask::RetrievalDocument,
            )
            .await;

        assert!(matches!(result, Err(EmbeddingError::InvalidResponse(_))));
    }

    #[tokio::test]
    async fn test_embed_rate_limited() {
        let server = MockServer::start().await;

        Mock::given(method("POST"))
            .and(path("/models/text-embedding-004:embedContent"))
            .respond_with(ResponseTemplate::new(429).insert_header("retry-after", "7"))
            .mount(&server)
            .await;

        let embedder = test_embedder(&server);
        let result = embedder.embed("hello", EmbeddingTask::RetrievalQuery).await;

        assert!(matches!(
            result,
            Err(EmbeddingError::RateLimited {
                retry_after_secs: 7
            })
        ));
    }

    #[tokio::test]
    async fn test_missing_api_key() {
        let embedder = GeminiEmbedder {
            api_key: None,
            ..GeminiEmbedder::new().with_base_url("http://localhost:1")
        };

        assert!(!embedder.is_available());
        let result = embedder.embed("hi", EmbeddingTask::RetrievalQuery).await;
        assert!(matches!(result, Err(EmbeddingError::ProviderNotConfigured)));
    }

    #[tokio::test]
    async fn test_batch_too_large() {
        let server = MockServer::start().await;
        let embedder = test_embedder(&server);

        let texts: Vec<String> = (0..GEMINI_MAX_BATCH_SIZE + 1)
            .map(|i| format!("record {i}"))
            .collect();

        let result = embedder
            .embed_batch(&texts, EmbeddingTask::RetrievalDocument)
            .await;

        assert!(matches!(
            result,
            Err(EmbeddingError::BatchTooLarge { len: 101, max: 100 })
        ));
    }

    #[tokio::test]
    async fn test_empty_batch_is_noop() {
        let server = MockServer::start().await;
        let embedder = test_embedder(&server);

        let embeddings = embedder
            .embed_batch(&[], EmbeddingTask::RetrievalDocument)
            .await
            .unwrap();
        assert!(embeddings.is_empty());
    }
}
