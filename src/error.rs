//! Crate error taxonomy.
//!
//! Each variant maps to a distinct failure stage of the ingestion and
//! retrieval pipeline, so callers can tell a rejected upload apart from a
//! provider outage or a missing document id. Collaborator traits
//! ([`DocumentStore`](crate::store::DocumentStore),
//! [`EmbeddingProvider`](crate::embedding::EmbeddingProvider)) report
//! failures as `anyhow::Error`; the service layer maps them into this
//! taxonomy at the boundary.

use thiserror::Error;

#[derive(Error, Debug)]
pub enum RagError {
    /// Content failed validation before any store write. The message is the
    /// validator's reason string and is safe to show to the uploader.
    #[error("document rejected: {0}")]
    Validation(String),

    /// A source-specific extraction adapter (web page, video transcript)
    /// failed to retrieve content. No partial document exists.
    #[error("content extraction failed: {0}")]
    Extraction(String),

    /// The embedding provider failed for both the contextual and the plain
    /// pass. The partially created document has already been removed.
    #[error("embedding failed: {0}")]
    Embedding(String),

    /// An operation referenced a document id that does not exist.
    #[error("document not found: {0}")]
    NotFound(String),

    /// The document store reported a failure.
    #[error(transparent)]
    Store(#[from] anyhow::Error),
}

pub type Result<T> = std::result::Result<T, RagError>;
