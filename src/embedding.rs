//! Embedding gateway abstraction and implementations.
//!
//! Defines the [`EmbeddingGateway`] trait and concrete implementations:
//! - **[`DisabledEmbedder`]** — returns errors; used when embeddings are not configured.
//! - **[`OpenAiEmbedder`]** — calls an OpenAI-compatible embeddings API.
//!
//! The gateway is a thin boundary: it performs a single blocking request
//! per call and maps quota/rate-limit rejections (HTTP 429) to
//! [`BotError::Quota`] so orchestrators can treat them differently from
//! generic provider failures. Retry and backoff policy belongs to
//! callers, not here.
//!
//! Also provides vector utilities shared with the index:
//! - [`cosine_similarity`] — similarity between two embedding vectors
//! - [`vec_to_blob`] — encode a `Vec<f32>` as little-endian bytes for SQLite BLOB storage
//! - [`blob_to_vec`] — decode a SQLite BLOB back into a `Vec<f32>`

use std::sync::Arc;
use std::time::Duration;

use anyhow::{bail, Result};
use async_trait::async_trait;
use serde::Deserialize;

use crate::config::EmbeddingConfig;
use crate::error::BotError;

/// Converts batches of text into fixed-dimension vectors.
///
/// Implementations return one vector per input text, in input order.
#[async_trait]
pub trait EmbeddingGateway: Send + Sync {
    /// Returns the model identifier (e.g. `"text-embedding-3-small"`).
    fn model_name(&self) -> &str;
    /// Returns the embedding vector dimensionality (e.g. `1536`).
    fn dims(&self) -> usize;
    /// Embed a batch of texts, preserving input order.
    async fn embed(&self, texts: &[String]) -> Result<Vec<Vec<f32>>, BotError>;
}

// ============ Disabled Embedder ============

/// A no-op gateway that always fails. Used when
/// `embedding.provider = "disabled"` in the configuration.
pub struct DisabledEmbedder;

#[async_trait]
impl EmbeddingGateway for DisabledEmbedder {
    fn model_name(&self) -> &str {
        "disabled"
    }
    fn dims(&self) -> usize {
        0
    }
    async fn embed(&self, _texts: &[String]) -> Result<Vec<Vec<f32>>, BotError> {
        Err(BotError::Provider(
            "embedding provider is disabled".to_string(),
        ))
    }
}

// ============ OpenAI-compatible Embedder ============

/// Embedding gateway for OpenAI-compatible `POST /v1/embeddings`
/// endpoints. Requires the `OPENAI_API_KEY` environment variable.
pub struct OpenAiEmbedder {
    client: reqwest::Client,
    api_base: String,
    api_key: String,
    model: String,
    dims: usize,
}

#[derive(Deserialize)]
struct EmbeddingsResponse {
    data: Vec<EmbeddingData>,
}

#[derive(Deserialize)]
struct EmbeddingData {
    embedding: Vec<f32>,
}

impl OpenAiEmbedder {
    pub fn new(config: &EmbeddingConfig) -> Result<Self> {
        let model = config
            .model
            .clone()
            .ok_or_else(|| anyhow::anyhow!("embedding.model required for OpenAI provider"))?;
        let dims = config
            .dims
            .ok_or_else(|| anyhow::anyhow!("embedding.dims required for OpenAI provider"))?;
        let api_key = std::env::var("OPENAI_API_KEY")
            .map_err(|_| anyhow::anyhow!("OPENAI_API_KEY environment variable not set"))?;

        let client = reqwest::Client::builder()
            .timeout(Duration::from_secs(config.timeout_secs))
            .build()?;

        Ok(Self {
            client,
            api_base: config.api_base.trim_end_matches('/').to_string(),
            api_key,
            model,
            dims,
        })
    }
}

#[async_trait]
impl EmbeddingGateway for OpenAiEmbedder {
    fn model_name(&self) -> &str {
        &self.model
    }

    fn dims(&self) -> usize {
        self.dims
    }

    async fn embed(&self, texts: &[String]) -> Result<Vec<Vec<f32>>, BotError> {
        let body = serde_json::json!({
            "model": self.model,
            "input": texts,
        });

        let response = self
            .client
            .post(format!("{}/v1/embeddings", self.api_base))
            .header("Authorization", format!("Bearer {}", self.api_key))
            .json(&body)
            .send()
            .await
            .map_err(|e| BotError::Provider(format!("embeddings request failed: {e}")))?;

        let status = response.status();
        if status.as_u16() == 429 {
            let detail = response.text().await.unwrap_or_default();
            return Err(BotError::Quota(format!("embeddings API: {detail}")));
        }
        if !status.is_success() {
            let detail = response.text().await.unwrap_or_default();
            return Err(BotError::Provider(format!(
                "embeddings API error {status}: {detail}"
            )));
        }

        let parsed: EmbeddingsResponse = response
            .json()
            .await
            .map_err(|e| BotError::Provider(format!("invalid embeddings response: {e}")))?;

        if parsed.data.len() != texts.len() {
            return Err(BotError::Provider(format!(
                "embeddings API returned {} vectors for {} inputs",
                parsed.data.len(),
                texts.len()
            )));
        }

        Ok(parsed.data.into_iter().map(|d| d.embedding).collect())
    }
}

/// Create the appropriate [`EmbeddingGateway`] based on configuration.
pub fn create_embedder(config: &EmbeddingConfig) -> Result<Arc<dyn EmbeddingGateway>> {
    match config.provider.as_str() {
        "disabled" => Ok(Arc::new(DisabledEmbedder)),
        "openai" => Ok(Arc::new(OpenAiEmbedder::new(config)?)),
        other => bail!("Unknown embedding provider: {}", other),
    }
}

// ============ Vector utilities ============

/// Encode a float vector as a BLOB (little-endian f32 bytes).
pub fn vec_to_blob(vec: &[f32]) -> Vec<u8> {
    let mut bytes = Vec::with_capacity(vec.len() * 4);
    for &v in vec {
        bytes.extend_from_slice(&v.to_le_bytes());
    }
    bytes
}

/// Decode a BLOB back into a float vector.
pub fn blob_to_vec(blob: &[u8]) -> Vec<f32> {
    blob.chunks_exact(4)
        .map(|chunk| f32::from_le_bytes([chunk[0], chunk[1], chunk[2], chunk[3]]))
        .collect()
}

/// Compute cosine similarity between two embedding vectors.
///
/// Returns a value in `[-1.0, 1.0]`. Returns `0.0` for empty vectors or
/// vectors of different lengths.
pub fn cosine_similarity(a: &[f32], b: &[f32]) -> f32 {
    if a.len() != b.len() || a.is_empty() {
        return 0.0;
    }

    let mut dot = 0.0f32;
    let mut norm_a = 0.0f32;
    let mut norm_b = 0.0f32;

    for (x, y) in a.iter().zip(b.iter()) {
        dot += x * y;
        norm_a += x * x;
        norm_b += y * y;
    }

    let denom = norm_a.sqrt() * norm_b.sqrt();
    if denom < f32::EPSILON {
        return 0.0;
    }

    dot / denom
}
