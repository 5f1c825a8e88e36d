//! Core data models for the ingestion and retrieval pipeline.
//!
//! These types represent the documents, chunks, and scored results that flow
//! from upload through chunking, embedding, storage, and context assembly.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Closed set of knowledge-base source types.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum DocumentSourceType {
    File,
    Web,
    Youtube,
}

impl DocumentSourceType {
    /// Human-readable label used in embedding headers and context blocks.
    pub fn label(&self) -> &'static str {
        match self {
            DocumentSourceType::File => "File",
            DocumentSourceType::Web => "Web Page",
            DocumentSourceType::Youtube => "YouTube Video",
        }
    }
}

/// Source-type-specific metadata carried by a [`Document`].
///
/// Modeled as a tagged union so every consumer matches exhaustively;
/// adding a source type is a compile-checked change.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "lowercase")]
pub enum SourceDetails {
    File,
    Web(WebDetails),
    Youtube(YoutubeDetails),
}

impl SourceDetails {
    pub fn source_type(&self) -> DocumentSourceType {
        match self {
            SourceDetails::File => DocumentSourceType::File,
            SourceDetails::Web(_) => DocumentSourceType::Web,
            SourceDetails::Youtube(_) => DocumentSourceType::Youtube,
        }
    }

    /// The origin a reader could follow back to the source, if any.
    pub fn origin(&self) -> Option<&str> {
        match self {
            SourceDetails::File => None,
            SourceDetails::Web(web) => Some(&web.url),
            SourceDetails::Youtube(yt) => Some(&yt.video_id),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct WebDetails {
    pub url: String,
    pub title: Option<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct YoutubeDetails {
    pub video_id: String,
    pub title: Option<String>,
    pub channel_name: Option<String>,
    /// Duration in seconds.
    pub duration: Option<u64>,
    pub thumbnail: Option<String>,
}

/// A stored unit of knowledge: an uploaded file, a web page, or a video
/// transcript. `content` is always plain text; binary formats are either
/// text-extracted or stored with an explicit unextracted placeholder.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Document {
    pub id: String,
    /// Owning collection. A document is never reassigned to another project.
    pub project_id: String,
    /// Uploader.
    pub user_id: String,
    pub name: String,
    pub content: String,
    pub mime_type: String,
    /// Original upload size in bytes.
    pub size: u64,
    pub source: SourceDetails,
    pub metadata: serde_json::Value,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl Document {
    pub fn source_type(&self) -> DocumentSourceType {
        self.source.source_type()
    }
}

/// Input for creating a new document. `content` is the raw upload already
/// decoded to a string; the extractor turns it into indexable plain text.
#[derive(Debug, Clone)]
pub struct NewDocument {
    pub project_id: String,
    pub user_id: String,
    pub name: String,
    pub content: String,
    pub mime_type: String,
    pub size: u64,
    pub source: SourceDetails,
    pub metadata: serde_json::Value,
}

/// Partial update for an existing document. A `content` change forces
/// re-chunking and re-embedding.
#[derive(Debug, Clone, Default)]
pub struct DocumentUpdate {
    pub name: Option<String>,
    pub content: Option<String>,
    pub metadata: Option<serde_json::Value>,
}

/// A bounded, overlapping window of a document's text, the unit of
/// embedding and retrieval.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DocumentChunk {
    pub id: String,
    pub document_id: String,
    /// Denormalized for project-scoped queries.
    pub project_id: String,
    pub content: String,
    /// `None` when embedding was never attempted or failed.
    pub embedding: Option<Vec<f32>>,
    /// 0-based emission order within the document, contiguous with no gaps.
    pub chunk_index: i64,
    /// SHA-256 of `content`, for staleness detection.
    pub hash: String,
    pub metadata: serde_json::Value,
}

/// Query-time result: a chunk, its similarity score, and its resolved
/// parent document (needed by the context formatter). In fixed-selection
/// mode `similarity` is pinned to 1.0.
#[derive(Debug, Clone)]
pub struct ChunkWithSimilarity {
    pub chunk: DocumentChunk,
    pub similarity: f64,
    pub document: Option<Document>,
}
