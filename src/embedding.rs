//! Embedding generation and similarity scoring.
//!
//! The [`EmbeddingProvider`] trait is the single seam to the vector model;
//! it is used identically for document chunks and ad-hoc queries so both
//! land in the same vector space. [`embed_chunks`] implements the two-step
//! contextual/plain pipeline: when a [`DocumentContext`] is given, each
//! chunk is embedded with a short metadata header prepended, which improves
//! retrieval for generically worded chunks; if that pass fails, the batch is
//! recomputed once without headers. Only when both passes fail does the
//! operation surface [`RagError::Embedding`]; the fallback is the one
//! sanctioned silent degrade in the pipeline.
//!
//! [`OpenAiEmbeddings`] is the bundled provider: it calls the OpenAI
//! embeddings API with a configurable timeout and exponential backoff on
//! 429/5xx/network errors, failing fast on other client errors.

use anyhow::{bail, Result};
use async_trait::async_trait;
use std::time::Duration;
use tracing::warn;

use crate::config::EmbeddingConfig;
use crate::error::RagError;
use crate::models::{Document, DocumentSourceType};

/// Trait for embedding providers.
#[async_trait]
pub trait EmbeddingProvider: Send + Sync {
    /// Returns the model identifier (e.g. `"text-embedding-3-small"`).
    fn model_name(&self) -> &str;
    /// Returns the embedding vector dimensionality (e.g. `1536`).
    fn dims(&self) -> usize;
    /// Compute the embedding vector for one text.
    async fn embed(&self, text: &str) -> Result<Vec<f32>>;
}

/// Pluggable similarity scoring, so an alternate distance metric can be
/// substituted without touching ranking or threshold logic.
pub trait SimilarityMetric: Send + Sync {
    fn score(&self, a: &[f32], b: &[f32]) -> f32;
}

/// Cosine similarity, the default metric.
pub struct Cosine;

impl SimilarityMetric for Cosine {
    fn score(&self, a: &[f32], b: &[f32]) -> f32 {
        cosine_similarity(a, b)
    }
}

/// Compute cosine similarity between two embedding vectors.
///
/// Returns `0.0` for empty vectors or vectors of different lengths.
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

/// Document-level metadata prepended to chunk text in contextual mode.
#[derive(Debug, Clone)]
pub struct DocumentContext {
    pub title: String,
    pub source_type: DocumentSourceType,
    /// Origin URL or identifier, when the source has one.
    pub origin: Option<String>,
}

impl DocumentContext {
    pub fn from_document(doc: &Document) -> Self {
        Self {
            title: doc.name.clone(),
            source_type: doc.source_type(),
            origin: doc.source.origin().map(str::to_string),
        }
    }

    /// Render the header prepended to each chunk before embedding.
    pub fn render_header(&self) -> String {
        let mut header = format!(
            "Document: {}\nType: {}\n",
            self.title,
            self.source_type.label()
        );
        if let Some(origin) = &self.origin {
            header.push_str(&format!("Source: {}\n", origin));
        }
        header.push('\n');
        header
    }
}

/// One embedded chunk, index-aligned with the input texts.
#[derive(Debug, Clone)]
pub struct EmbeddedChunk {
    /// Original chunk text, without any contextual header.
    pub content: String,
    pub embedding: Vec<f32>,
    pub chunk_index: i64,
}

/// Embed a batch of chunk texts, one result per input in input order.
///
/// With a context, the contextual pass runs first; on failure it is logged
/// and the whole batch is recomputed plain. An error is returned only when
/// the plain pass fails too.
pub async fn embed_chunks(
    provider: &dyn EmbeddingProvider,
    texts: &[String],
    context: Option<&DocumentContext>,
) -> std::result::Result<Vec<EmbeddedChunk>, RagError> {
    if let Some(ctx) = context {
        match embed_pass(provider, texts, Some(ctx)).await {
            Ok(embedded) => return Ok(embedded),
            Err(e) => {
                warn!(
                    model = provider.model_name(),
                    error = %e,
                    "contextual embedding failed, retrying without document context"
                );
            }
        }
    }

    embed_pass(provider, texts, None)
        .await
        .map_err(|e| RagError::Embedding(e.to_string()))
}

async fn embed_pass(
    provider: &dyn EmbeddingProvider,
    texts: &[String],
    context: Option<&DocumentContext>,
) -> Result<Vec<EmbeddedChunk>> {
    let header = context.map(|c| c.render_header());
    let mut embedded = Vec::with_capacity(texts.len());

    for (i, text) in texts.iter().enumerate() {
        let input = match &header {
            Some(h) => format!("{h}{text}"),
            None => text.clone(),
        };
        let vector = provider.embed(&input).await?;
        embedded.push(EmbeddedChunk {
            content: text.clone(),
            embedding: vector,
            chunk_index: i as i64,
        });
    }

    Ok(embedded)
}

// ============ OpenAI provider ============

/// Embedding provider backed by the OpenAI embeddings API.
///
/// Requires the `OPENAI_API_KEY` environment variable.
pub struct OpenAiEmbeddings {
    model: String,
    dims: usize,
    api_key: String,
    client: reqwest::Client,
    max_retries: u32,
}

impl OpenAiEmbeddings {
    pub fn new(config: &EmbeddingConfig) -> Result<Self> {
        let api_key = std::env::var("OPENAI_API_KEY")
            .map_err(|_| anyhow::anyhow!("OPENAI_API_KEY environment variable not set"))?;

        let client = reqwest::Client::builder()
            .timeout(Duration::from_secs(config.timeout_secs))
            .build()?;

        Ok(Self {
            model: config.model.clone(),
            dims: config.dims,
            api_key,
            client,
            max_retries: config.max_retries,
        })
    }
}

#[async_trait]
impl EmbeddingProvider for OpenAiEmbeddings {
    fn model_name(&self) -> &str {
        &self.model
    }

    fn dims(&self) -> usize {
        self.dims
    }

    /// Call `POST /v1/embeddings` with retry and backoff.
    ///
    /// 429 and 5xx responses and network errors retry with exponential
    /// backoff (1s, 2s, 4s, ... capped at 32s); other 4xx fail immediately.
    async fn embed(&self, text: &str) -> Result<Vec<f32>> {
        let body = serde_json::json!({
            "model": self.model,
            "input": text,
        });

        let mut last_err = None;

        for attempt in 0..=self.max_retries {
            if attempt > 0 {
                let delay = Duration::from_secs(1 << (attempt - 1).min(5));
                tokio::time::sleep(delay).await;
            }

            let resp = self
                .client
                .post("https://api.openai.com/v1/embeddings")
                .header("Authorization", format!("Bearer {}", self.api_key))
                .header("Content-Type", "application/json")
                .json(&body)
                .send()
                .await;

            match resp {
                Ok(response) => {
                    let status = response.status();

                    if status.is_success() {
                        let json: serde_json::Value = response.json().await?;
                        return parse_embedding_response(&json);
                    }

                    if status.as_u16() == 429 || status.is_server_error() {
                        let body_text = response.text().await.unwrap_or_default();
                        last_err =
                            Some(anyhow::anyhow!("OpenAI API error {}: {}", status, body_text));
                        continue;
                    }

                    let body_text = response.text().await.unwrap_or_default();
                    bail!("OpenAI API error {}: {}", status, body_text);
                }
                Err(e) => {
                    last_err = Some(e.into());
                    continue;
                }
            }
        }

        Err(last_err.unwrap_or_else(|| anyhow::anyhow!("embedding failed after retries")))
    }
}

/// Extract the first `data[].embedding` array from an embeddings response.
fn parse_embedding_response(json: &serde_json::Value) -> Result<Vec<f32>> {
    let embedding = json
        .get("data")
        .and_then(|d| d.as_array())
        .and_then(|d| d.first())
        .and_then(|item| item.get("embedding"))
        .and_then(|e| e.as_array())
        .ok_or_else(|| anyhow::anyhow!("invalid embeddings response: missing data[0].embedding"))?;

    Ok(embedding
        .iter()
        .map(|v| v.as_f64().unwrap_or(0.0) as f32)
        .collect())
}
