//! # ragbase
//!
//! A retrieval-augmented-generation core for project knowledge bases.
//!
//! ragbase ingests documents (uploaded files, web pages, video
//! transcripts), chunks and embeds them, and answers query-time retrieval
//! with either ranked similarity search or an explicit document selection,
//! rendering the results into a structured context block for a language
//! model. It is the indexing and retrieval engine behind a chat
//! application; the chat handler, source-specific fetchers, and UI live
//! elsewhere and talk to this crate through [`KnowledgeBase`].
//!
//! ## Architecture
//!
//! ```text
//! ┌──────────┐   ┌──────────┐   ┌─────────┐   ┌───────────┐   ┌───────┐
//! │ Extract  │──▶│ Validate │──▶│  Chunk  │──▶│   Embed   │──▶│ Store │
//! └──────────┘   └──────────┘   └─────────┘   └───────────┘   └───┬───┘
//!                                                                 │
//!                       ┌─────────────────────────────────────────┤
//!                       ▼                                         ▼
//!                ┌─────────────┐                           ┌───────────┐
//!                │  Retrieval  │──── ChunkWithSimilarity ─▶│  Context  │
//!                │ ranked/fixed│                           │ formatter │
//!                └─────────────┘                           └───────────┘
//! ```
//!
//! ## Modules
//!
//! | Module | Purpose |
//! |--------|---------|
//! | [`config`] | TOML configuration with validated defaults |
//! | [`error`] | Error taxonomy |
//! | [`models`] | Documents, chunks, scored results |
//! | [`extract`] | MIME-aware text extraction |
//! | [`validate`] | Content validation gate |
//! | [`chunk`] | Overlapping-window chunker |
//! | [`embedding`] | Embedding provider trait, contextual fallback, OpenAI |
//! | [`store`] | Document store trait and in-memory backend |
//! | [`retrieval`] | Similarity search and fixed selection |
//! | [`context`] | Context-block formatter |
//! | [`service`] | [`KnowledgeBase`] facade |

pub mod chunk;
pub mod config;
pub mod context;
pub mod embedding;
pub mod error;
pub mod extract;
pub mod models;
pub mod retrieval;
pub mod service;
pub mod store;
pub mod validate;

pub use config::{load_config, RagConfig};
pub use embedding::{EmbeddingProvider, OpenAiEmbeddings};
pub use error::{RagError, Result};
pub use models::{
    ChunkWithSimilarity, Document, DocumentChunk, DocumentSourceType, DocumentUpdate, NewDocument,
    SourceDetails,
};
pub use service::KnowledgeBase;
pub use store::memory::InMemoryStore;
pub use store::DocumentStore;
