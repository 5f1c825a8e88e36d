//! Retrieval engine: similarity search and fixed selection.
//!
//! Two mutually exclusive modes. Similarity search embeds the query with
//! the same provider used at ingestion (so vector spaces match) and ranks
//! project-scoped chunks against a threshold. Fixed selection returns
//! every chunk of the documents the user explicitly picked, unranked and
//! unfiltered: an explicit selection must guarantee full inclusion
//! regardless of query wording, trading context size for predictability.

use crate::embedding::EmbeddingProvider;
use crate::error::{RagError, Result};
use crate::models::ChunkWithSimilarity;
use crate::store::DocumentStore;

/// Rank project chunks against `query` and return at most `limit` results
/// scoring at least `threshold`.
///
/// The threshold is clamped to `[0.0, 1.0]` so out-of-range caller values
/// cannot let negative cosine scores into the results. An empty or
/// whitespace-only query short-circuits to an empty result set without
/// calling the embedding provider.
pub async fn search(
    store: &dyn DocumentStore,
    provider: &dyn EmbeddingProvider,
    project_id: &str,
    query: &str,
    limit: usize,
    threshold: f64,
) -> Result<Vec<ChunkWithSimilarity>> {
    if query.trim().is_empty() {
        return Ok(Vec::new());
    }
    let threshold = threshold.clamp(0.0, 1.0);

    let query_embedding = provider
        .embed(query)
        .await
        .map_err(|e| RagError::Embedding(e.to_string()))?;

    let results = store
        .search_by_similarity(project_id, &query_embedding, limit, threshold)
        .await?;

    Ok(results)
}

/// Return all chunks of the selected documents with `similarity` pinned to
/// 1.0, in `(document, chunk_index)` order. An empty selection returns an
/// empty result set.
pub async fn get_selected(
    store: &dyn DocumentStore,
    project_id: &str,
    document_ids: &[String],
) -> Result<Vec<ChunkWithSimilarity>> {
    if document_ids.is_empty() {
        return Ok(Vec::new());
    }

    let results = store
        .get_all_chunks_from_documents(project_id, document_ids)
        .await?;

    Ok(results)
}
