//! Storage abstraction for documents and chunks.
//!
//! The [`DocumentStore`] trait is the narrow repository contract the
//! pipeline depends on, enabling pluggable backends (a relational database
//! in production, [`memory::InMemoryStore`] for tests and embedded use).
//!
//! Contract notes:
//! - `delete_document` cascades to the document's chunks.
//! - `create_chunks` writes one document's chunks as a single batch;
//!   readers never observe a partial chunk set.
//! - No multi-document transactions are required; retrieval reads may lag
//!   concurrent ingestion.
//!
//! Implementations must be `Send + Sync` to work with async runtimes.

pub mod memory;

use anyhow::Result;
use async_trait::async_trait;

use crate::models::{ChunkWithSimilarity, Document, DocumentChunk};

/// Abstract document/chunk repository.
#[async_trait]
pub trait DocumentStore: Send + Sync {
    /// Persist a new document.
    async fn create_document(&self, doc: &Document) -> Result<()>;

    /// Fetch a document by id, or `None` when it does not exist.
    async fn get_document_by_id(&self, id: &str) -> Result<Option<Document>>;

    /// List all documents in a project, in creation order.
    async fn get_documents_by_project_id(&self, project_id: &str) -> Result<Vec<Document>>;

    /// Replace a stored document with the given state (matched by id).
    async fn update_document(&self, doc: &Document) -> Result<()>;

    /// Delete a document and cascade to all of its chunks. Deleting a
    /// missing id is a no-op.
    async fn delete_document(&self, id: &str) -> Result<()>;

    /// Write one document's chunks as a single batch.
    async fn create_chunks(&self, chunks: &[DocumentChunk]) -> Result<()>;

    /// Delete all chunks owned by a document (used before regeneration).
    async fn delete_chunks_by_document_id(&self, document_id: &str) -> Result<()>;

    /// Score all embedded chunks in a project against `query_embedding`,
    /// drop scores below `threshold`, and return at most `limit` results
    /// ordered by similarity descending with deterministic tie-breaking
    /// (ascending `chunk_index`, then document creation order).
    async fn search_by_similarity(
        &self,
        project_id: &str,
        query_embedding: &[f32],
        limit: usize,
        threshold: f64,
    ) -> Result<Vec<ChunkWithSimilarity>>;

    /// Return every chunk belonging to the given documents, in
    /// `(document creation order, chunk_index)` order, with `similarity`
    /// pinned to 1.0. No ranking is performed.
    async fn get_all_chunks_from_documents(
        &self,
        project_id: &str,
        document_ids: &[String],
    ) -> Result<Vec<ChunkWithSimilarity>>;
}
