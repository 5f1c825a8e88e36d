//! Caller-facing knowledge-base service.
//!
//! [`KnowledgeBase`] wires the pipeline stages together behind the small
//! API the chat handler consumes: ingestion (extract, validate, chunk,
//! embed, persist), document CRUD, retrieval in both ranked and
//! fixed-selection modes, and context formatting.
//!
//! Failure policy: ingestion is all-or-nothing. Validation rejects before
//! anything is written. If embedding or chunk persistence fails after the
//! document row exists, the row is deleted again so a document is never
//! left listable but unsearchable by accident.

use std::sync::Arc;

use chrono::Utc;
use tracing::{debug, warn};
use uuid::Uuid;

use crate::chunk::chunk_text;
use crate::config::RagConfig;
use crate::context::format_context;
use crate::embedding::{embed_chunks, DocumentContext, EmbeddingProvider};
use crate::error::{RagError, Result};
use crate::extract::extract_text;
use crate::models::{ChunkWithSimilarity, Document, DocumentUpdate, NewDocument};
use crate::retrieval;
use crate::store::DocumentStore;
use crate::validate::validate_content;

/// Facade over the ingestion and retrieval pipeline.
pub struct KnowledgeBase {
    store: Arc<dyn DocumentStore>,
    embeddings: Arc<dyn EmbeddingProvider>,
    config: RagConfig,
}

impl KnowledgeBase {
    pub fn new(
        store: Arc<dyn DocumentStore>,
        embeddings: Arc<dyn EmbeddingProvider>,
        config: RagConfig,
    ) -> Self {
        Self {
            store,
            embeddings,
            config,
        }
    }

    pub fn config(&self) -> &RagConfig {
        &self.config
    }

    /// Ingest an upload: extract, validate, persist, chunk, embed.
    ///
    /// Returns [`RagError::Validation`] when the extracted text is not
    /// indexable; nothing is persisted in that case. When embedding or
    /// chunk persistence fails, the already-created document row is
    /// deleted before the error is returned.
    pub async fn add_document(&self, upload: NewDocument) -> Result<Document> {
        let content = extract_text(&upload.name, &upload.content, &upload.mime_type);

        let verdict = validate_content(&content, &self.config.validation);
        if !verdict.is_valid {
            let reason = verdict
                .reason
                .unwrap_or_else(|| "document failed validation".to_string());
            return Err(RagError::Validation(reason));
        }

        let now = Utc::now();
        let doc = Document {
            id: Uuid::new_v4().to_string(),
            project_id: upload.project_id,
            user_id: upload.user_id,
            name: upload.name,
            content,
            mime_type: upload.mime_type,
            size: upload.size,
            source: upload.source,
            metadata: upload.metadata,
            created_at: now,
            updated_at: now,
        };

        self.store.create_document(&doc).await?;

        match self.index_document(&doc).await {
            Ok(chunk_count) => {
                debug!(
                    document_id = %doc.id,
                    project_id = %doc.project_id,
                    chunks = chunk_count,
                    "document ingested"
                );
                Ok(doc)
            }
            Err(e) => {
                // The document row must not outlive a failed indexing run.
                if let Err(cleanup) = self.store.delete_document(&doc.id).await {
                    warn!(
                        document_id = %doc.id,
                        error = %cleanup,
                        "failed to clean up document after indexing error"
                    );
                }
                Err(e)
            }
        }
    }

    /// Apply a partial update. A content change re-validates, re-chunks and
    /// re-embeds. In contextual mode a name or metadata change also
    /// re-embeds, because the stored vectors bake the document title into
    /// their header. New chunks are fully embedded before the old ones are
    /// touched, and a failed chunk write restores the previous set, so a
    /// failed update leaves the old index intact.
    pub async fn update_document(&self, id: &str, updates: DocumentUpdate) -> Result<Document> {
        let mut doc = self
            .store
            .get_document_by_id(id)
            .await?
            .ok_or_else(|| RagError::NotFound(id.to_string()))?;

        let mut header_changed = false;
        if let Some(name) = updates.name {
            header_changed |= name != doc.name;
            doc.name = name;
        }
        if let Some(metadata) = updates.metadata {
            header_changed |= metadata != doc.metadata;
            doc.metadata = metadata;
        }

        let content_changed = match updates.content {
            Some(raw) => {
                let content = extract_text(&doc.name, &raw, &doc.mime_type);
                let verdict = validate_content(&content, &self.config.validation);
                if !verdict.is_valid {
                    let reason = verdict
                        .reason
                        .unwrap_or_else(|| "document failed validation".to_string());
                    return Err(RagError::Validation(reason));
                }
                let changed = content != doc.content;
                doc.content = content;
                changed
            }
            None => false,
        };

        doc.updated_at = Utc::now();

        let reindex =
            content_changed || (header_changed && self.config.embedding.contextual);
        if reindex {
            self.replace_chunks(&doc).await?;
        }

        self.store.update_document(&doc).await?;
        Ok(doc)
    }

    /// Swap a document's chunk set for freshly embedded ones. The previous
    /// chunks are snapshotted first and restored when the new batch fails
    /// to write, so readers never end up with an empty index on error.
    async fn replace_chunks(&self, doc: &Document) -> Result<()> {
        let chunks = self.embed_for(doc).await?;

        let previous: Vec<crate::models::DocumentChunk> = self
            .store
            .get_all_chunks_from_documents(&doc.project_id, std::slice::from_ref(&doc.id))
            .await?
            .into_iter()
            .map(|r| r.chunk)
            .collect();

        self.store.delete_chunks_by_document_id(&doc.id).await?;

        if let Err(e) = self.store.create_chunks(&chunks).await {
            if let Err(restore) = self.store.create_chunks(&previous).await {
                warn!(
                    document_id = %doc.id,
                    error = %restore,
                    "failed to restore previous chunks after a failed update"
                );
            }
            return Err(e.into());
        }

        Ok(())
    }

    /// Delete a document and its chunks. Returns [`RagError::NotFound`] for
    /// a missing id, so callers can tell a bad reference from a clean delete.
    pub async fn delete_document(&self, id: &str) -> Result<()> {
        if self.store.get_document_by_id(id).await?.is_none() {
            return Err(RagError::NotFound(id.to_string()));
        }
        self.store.delete_document(id).await?;
        Ok(())
    }

    pub async fn get_document(&self, id: &str) -> Result<Option<Document>> {
        Ok(self.store.get_document_by_id(id).await?)
    }

    pub async fn get_documents_by_project(&self, project_id: &str) -> Result<Vec<Document>> {
        Ok(self.store.get_documents_by_project_id(project_id).await?)
    }

    /// Retrieve the chunks relevant to `query`.
    ///
    /// A non-empty `selected_document_ids` switches to fixed-selection mode:
    /// every chunk of the selected documents is returned, the query is not
    /// embedded, and `limit`/`threshold` are ignored. Otherwise ranked
    /// similarity search runs with the given or configured limit and
    /// threshold.
    pub async fn search_relevant_content(
        &self,
        project_id: &str,
        query: &str,
        limit: Option<usize>,
        threshold: Option<f64>,
        selected_document_ids: Option<&[String]>,
    ) -> Result<Vec<ChunkWithSimilarity>> {
        if let Some(ids) = selected_document_ids {
            if !ids.is_empty() {
                return retrieval::get_selected(self.store.as_ref(), project_id, ids).await;
            }
        }

        let limit = limit.unwrap_or(self.config.retrieval.default_limit);
        let threshold = threshold.unwrap_or(self.config.retrieval.similarity_threshold);

        retrieval::search(
            self.store.as_ref(),
            self.embeddings.as_ref(),
            project_id,
            query,
            limit,
            threshold,
        )
        .await
    }

    /// Fetch all chunks of the selected documents for fixed-context chat.
    ///
    /// Soft-fails: a store error is logged and reported as "no context"
    /// rather than blocking the chat response.
    pub async fn get_selected_documents_content(
        &self,
        project_id: &str,
        selected_document_ids: &[String],
    ) -> Vec<ChunkWithSimilarity> {
        match retrieval::get_selected(self.store.as_ref(), project_id, selected_document_ids).await
        {
            Ok(results) => results,
            Err(e) => {
                warn!(
                    project_id = %project_id,
                    error = %e,
                    "failed to load selected documents, continuing without context"
                );
                Vec::new()
            }
        }
    }

    /// Render retrieved chunks into the context block for the model prompt.
    pub fn format_context_for_rag(&self, results: &[ChunkWithSimilarity]) -> String {
        format_context(results)
    }

    /// Chunk, embed, and persist a document's content. Returns the number
    /// of chunks written.
    async fn index_document(&self, doc: &Document) -> Result<usize> {
        let chunks = self.embed_for(doc).await?;
        let count = chunks.len();
        self.store.create_chunks(&chunks).await?;
        Ok(count)
    }

    /// Chunk `doc.content` and attach embeddings, honoring the configured
    /// contextual mode.
    async fn embed_for(&self, doc: &Document) -> Result<Vec<crate::models::DocumentChunk>> {
        let mut chunks = chunk_text(&doc.id, &doc.project_id, &doc.content, &self.config.chunking);

        let context = self
            .config
            .embedding
            .contextual
            .then(|| DocumentContext::from_document(doc));

        let texts: Vec<String> = chunks.iter().map(|c| c.content.clone()).collect();
        let embedded = embed_chunks(self.embeddings.as_ref(), &texts, context.as_ref()).await?;

        for (chunk, vector) in chunks.iter_mut().zip(embedded) {
            chunk.embedding = Some(vector.embedding);
        }

        Ok(chunks)
    }
}
