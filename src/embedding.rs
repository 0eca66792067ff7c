//! Embedding service abstraction.
//!
//! [`Embedder`] turns an ordered list of chunk texts into index-aligned
//! vectors of a fixed dimension. The pipeline never retries: any
//! transport failure, rate limit, or malformed response surfaces as
//! [`IngestError::EmbeddingService`] and aborts the invocation.
//!
//! - **[`OpenAIEmbedder`]** calls `POST {base_url}/embeddings`.
//! - [`embed_in_batches`] splits a chunk list into requests of at most
//!   `batch_size` texts and checks order and dimension of the result.

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use std::time::Duration;

use crate::config::EmbeddingConfig;
use crate::error::{IngestError, Result};

/// An embedding backend.
#[async_trait]
pub trait Embedder: Send + Sync {
    /// Returns the model identifier (e.g. `"text-embedding-3-large"`).
    fn model_name(&self) -> &str;

    /// Returns the embedding vector dimensionality (e.g. `3072`).
    fn dims(&self) -> usize;

    /// Embeds `texts`, returning one vector per input in the same order.
    async fn embed(&self, texts: &[String]) -> Result<Vec<Vec<f32>>>;
}

/// Embeds `texts` in consecutive batches of at most `batch_size`.
///
/// Batches are sent one at a time, in order. The output has exactly one
/// vector per input text and every vector has [`Embedder::dims`] entries.
pub async fn embed_in_batches(
    embedder: &dyn Embedder,
    texts: &[String],
    batch_size: usize,
) -> Result<Vec<Vec<f32>>> {
    if batch_size == 0 {
        return Err(IngestError::Config(
            "embedding batch size must be > 0".to_string(),
        ));
    }

    let mut vectors = Vec::with_capacity(texts.len());
    for batch in texts.chunks(batch_size) {
        let embedded = embedder.embed(batch).await?;
        if embedded.len() != batch.len() {
            return Err(IngestError::EmbeddingService(format!(
                "expected {} embeddings, got {}",
                batch.len(),
                embedded.len()
            )));
        }
        vectors.extend(embedded);
    }

    let dims = embedder.dims();
    if let Some(bad) = vectors.iter().find(|v| v.len() != dims) {
        return Err(IngestError::EmbeddingService(format!(
            "expected vectors of dimension {}, got {}",
            dims,
            bad.len()
        )));
    }

    Ok(vectors)
}

// ============ OpenAI ============

/// Embedder backed by the OpenAI embeddings API.
pub struct OpenAIEmbedder {
    client: reqwest::Client,
    endpoint: String,
    api_key: String,
    model: String,
    dims: usize,
}

impl OpenAIEmbedder {
    /// Builds the client, reading the key from `OPENAI_API_KEY`.
    pub fn new(config: &EmbeddingConfig) -> anyhow::Result<Self> {
        let api_key = std::env::var("OPENAI_API_KEY")
            .map_err(|_| anyhow::anyhow!("OPENAI_API_KEY environment variable not set"))?;
        Self::with_api_key(config, api_key)
    }

    pub fn with_api_key(config: &EmbeddingConfig, api_key: String) -> anyhow::Result<Self> {
        anyhow::ensure!(!api_key.trim().is_empty(), "missing OpenAI API key");
        let client = reqwest::Client::builder()
            .timeout(Duration::from_secs(config.timeout_secs))
            .build()?;
        Ok(Self {
            client,
            endpoint: format!("{}/embeddings", config.base_url.trim_end_matches('/')),
            api_key: api_key.trim().to_string(),
            model: config.model.clone(),
            dims: config.dims,
        })
    }

    /// Only the `text-embedding-3` family accepts an explicit `dimensions`.
    fn requested_dimensions(&self) -> Option<usize> {
        self.model
            .starts_with("text-embedding-3")
            .then_some(self.dims)
    }
}

#[derive(Serialize)]
struct EmbeddingRequest<'a> {
    model: &'a str,
    input: &'a [String],
    #[serde(skip_serializing_if = "Option::is_none")]
    dimensions: Option<usize>,
}

#[derive(Deserialize)]
struct EmbeddingResponse {
    data: Vec<EmbeddingData>,
}

#[derive(Deserialize)]
struct EmbeddingData {
    index: usize,
    embedding: Vec<f32>,
}

#[async_trait]
impl Embedder for OpenAIEmbedder {
    fn model_name(&self) -> &str {
        &self.model
    }

    fn dims(&self) -> usize {
        self.dims
    }

    async fn embed(&self, texts: &[String]) -> Result<Vec<Vec<f32>>> {
        if texts.is_empty() {
            return Ok(Vec::new());
        }

        let request = EmbeddingRequest {
            model: &self.model,
            input: texts,
            dimensions: self.requested_dimensions(),
        };

        let response = self
            .client
            .post(&self.endpoint)
            .bearer_auth(&self.api_key)
            .json(&request)
            .send()
            .await
            .map_err(|e| IngestError::EmbeddingService(e.to_string()))?;

        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            let message = if status.as_u16() == 429 {
                format!("rate limited ({}): {}", status, body)
            } else {
                format!("OpenAI API error {}: {}", status, body)
            };
            return Err(IngestError::EmbeddingService(message));
        }

        let body = response
            .text()
            .await
            .map_err(|e| IngestError::EmbeddingService(e.to_string()))?;
        parse_openai_response(&body, texts.len(), self.dims)
    }
}

/// Parses an embeddings response body, restoring input order by `index`.
pub fn parse_openai_response(body: &str, expected: usize, dims: usize) -> Result<Vec<Vec<f32>>> {
    let mut parsed: EmbeddingResponse = serde_json::from_str(body).map_err(|e| {
        IngestError::EmbeddingService(format!("invalid OpenAI response: {}", e))
    })?;

    if parsed.data.len() != expected {
        return Err(IngestError::EmbeddingService(format!(
            "OpenAI returned {} embeddings for {} inputs",
            parsed.data.len(),
            expected
        )));
    }

    parsed.data.sort_by_key(|entry| entry.index);
    for (position, entry) in parsed.data.iter().enumerate() {
        if entry.index != position {
            return Err(IngestError::EmbeddingService(format!(
                "invalid OpenAI response: missing embedding for input {}",
                position
            )));
        }
        if entry.embedding.len() != dims {
            return Err(IngestError::EmbeddingService(format!(
                "OpenAI returned a {}-dimensional vector, expected {}",
                entry.embedding.len(),
                dims
            )));
        }
    }

    Ok(parsed.data.into_iter().map(|e| e.embedding).collect())
}

/// Builds the configured embedder.
pub fn create_embedder(config: &EmbeddingConfig) -> anyhow::Result<Arc<dyn Embedder>> {
    match config.provider.as_str() {
        "openai" => Ok(Arc::new(OpenAIEmbedder::new(config)?)),
        other => anyhow::bail!("Unknown embedding provider: {}", other),
    }
}
