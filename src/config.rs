//! Configuration for the ingestion and retrieval pipeline.
//!
//! All knobs have working defaults so `RagConfig::default()` is usable as-is;
//! [`load_config`] layers TOML on top and validates ranges. The chunking and
//! validation constants were tuning knobs in the product this crate serves,
//! not hard design decisions, so they are exposed here rather than hardcoded.

use anyhow::{Context, Result};
use serde::Deserialize;
use std::path::Path;

#[derive(Debug, Deserialize, Clone, Default)]
pub struct RagConfig {
    #[serde(default)]
    pub chunking: ChunkingConfig,
    #[serde(default)]
    pub retrieval: RetrievalConfig,
    #[serde(default)]
    pub validation: ValidationConfig,
    #[serde(default)]
    pub embedding: EmbeddingConfig,
}

#[derive(Debug, Deserialize, Clone)]
pub struct ChunkingConfig {
    /// Target chunk size in characters.
    #[serde(default = "default_chunk_size")]
    pub chunk_size: usize,
    /// Characters shared between consecutive chunks.
    #[serde(default = "default_chunk_overlap")]
    pub chunk_overlap: usize,
}

impl Default for ChunkingConfig {
    fn default() -> Self {
        Self {
            chunk_size: default_chunk_size(),
            chunk_overlap: default_chunk_overlap(),
        }
    }
}

fn default_chunk_size() -> usize {
    1000
}
fn default_chunk_overlap() -> usize {
    100
}

#[derive(Debug, Deserialize, Clone)]
pub struct RetrievalConfig {
    /// Maximum results returned by similarity search when the caller does
    /// not pass an explicit limit.
    #[serde(default = "default_limit")]
    pub default_limit: usize,
    /// Minimum cosine similarity for a chunk to be included in ranked
    /// search results.
    #[serde(default = "default_threshold")]
    pub similarity_threshold: f64,
}

impl Default for RetrievalConfig {
    fn default() -> Self {
        Self {
            default_limit: default_limit(),
            similarity_threshold: default_threshold(),
        }
    }
}

fn default_limit() -> usize {
    6
}
fn default_threshold() -> f64 {
    0.3
}

#[derive(Debug, Deserialize, Clone)]
pub struct ValidationConfig {
    /// Minimum useful content length in characters.
    #[serde(default = "default_min_content_length")]
    pub min_content_length: usize,
}

impl Default for ValidationConfig {
    fn default() -> Self {
        Self {
            min_content_length: default_min_content_length(),
        }
    }
}

fn default_min_content_length() -> usize {
    10
}

#[derive(Debug, Deserialize, Clone)]
pub struct EmbeddingConfig {
    /// Prepend a document-metadata header to each chunk before embedding.
    /// Falls back to plain embeddings if the contextual pass fails.
    #[serde(default = "default_contextual")]
    pub contextual: bool,
    /// Model identifier passed to the provider.
    #[serde(default = "default_model")]
    pub model: String,
    /// Embedding vector dimensionality.
    #[serde(default = "default_dims")]
    pub dims: usize,
    #[serde(default = "default_max_retries")]
    pub max_retries: u32,
    #[serde(default = "default_timeout_secs")]
    pub timeout_secs: u64,
}

impl Default for EmbeddingConfig {
    fn default() -> Self {
        Self {
            contextual: default_contextual(),
            model: default_model(),
            dims: default_dims(),
            max_retries: default_max_retries(),
            timeout_secs: default_timeout_secs(),
        }
    }
}

fn default_contextual() -> bool {
    true
}
fn default_model() -> String {
    "text-embedding-3-small".to_string()
}
fn default_dims() -> usize {
    1536
}
fn default_max_retries() -> u32 {
    5
}
fn default_timeout_secs() -> u64 {
    30
}

/// Load configuration from a TOML file and validate it.
pub fn load_config(path: &Path) -> Result<RagConfig> {
    let content = std::fs::read_to_string(path)
        .with_context(|| format!("Failed to read config file: {}", path.display()))?;

    let config: RagConfig =
        toml::from_str(&content).with_context(|| "Failed to parse config file")?;

    validate_config(&config)?;
    Ok(config)
}

/// Validate configuration ranges. Called by [`load_config`]; exposed so
/// programmatically built configs can be checked too.
pub fn validate_config(config: &RagConfig) -> Result<()> {
    if config.chunking.chunk_size == 0 {
        anyhow::bail!("chunking.chunk_size must be > 0");
    }
    if config.chunking.chunk_overlap >= config.chunking.chunk_size {
        anyhow::bail!("chunking.chunk_overlap must be < chunking.chunk_size");
    }
    if config.retrieval.default_limit < 1 {
        anyhow::bail!("retrieval.default_limit must be >= 1");
    }
    if !(0.0..=1.0).contains(&config.retrieval.similarity_threshold) {
        anyhow::bail!("retrieval.similarity_threshold must be in [0.0, 1.0]");
    }
    if config.validation.min_content_length == 0 {
        anyhow::bail!("validation.min_content_length must be >= 1");
    }
    if config.embedding.dims == 0 {
        anyhow::bail!("embedding.dims must be > 0");
    }
    if config.embedding.model.is_empty() {
        anyhow::bail!("embedding.model must not be empty");
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults_are_valid() {
        let config = RagConfig::default();
        assert!(validate_config(&config).is_ok());
        assert_eq!(config.chunking.chunk_size, 1000);
        assert_eq!(config.chunking.chunk_overlap, 100);
        assert_eq!(config.validation.min_content_length, 10);
    }

    #[test]
    fn load_from_toml() {
        let tmp = tempfile::TempDir::new().unwrap();
        let path = tmp.path().join("ragbase.toml");
        std::fs::write(
            &path,
            r#"
[chunking]
chunk_size = 500
chunk_overlap = 50

[retrieval]
default_limit = 10
similarity_threshold = 0.5
"#,
        )
        .unwrap();

        let config = load_config(&path).unwrap();
        assert_eq!(config.chunking.chunk_size, 500);
        assert_eq!(config.chunking.chunk_overlap, 50);
        assert_eq!(config.retrieval.default_limit, 10);
        // Untouched sections fall back to defaults
        assert_eq!(config.embedding.model, "text-embedding-3-small");
    }

    #[test]
    fn rejects_zero_chunk_size() {
        let mut config = RagConfig::default();
        config.chunking.chunk_size = 0;
        assert!(validate_config(&config).is_err());
    }

    #[test]
    fn rejects_overlap_not_below_size() {
        let mut config = RagConfig::default();
        config.chunking.chunk_size = 100;
        config.chunking.chunk_overlap = 100;
        assert!(validate_config(&config).is_err());
    }

    #[test]
    fn rejects_out_of_range_threshold() {
        let mut config = RagConfig::default();
        config.retrieval.similarity_threshold = 1.5;
        assert!(validate_config(&config).is_err());
    }
}
