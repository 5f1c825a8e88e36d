//! In-memory [`DocumentStore`] implementation.
//!
//! Uses `Vec`s behind `std::sync::RwLock` for thread safety; document
//! creation order is the vector order, which gives the deterministic
//! tie-breaking the search contract requires. Similarity search is
//! brute-force scoring over all stored vectors with a pluggable
//! [`SimilarityMetric`].

use std::cmp::Ordering;
use std::sync::RwLock;

use anyhow::Result;
use async_trait::async_trait;

use crate::embedding::{Cosine, SimilarityMetric};
use crate::models::{ChunkWithSimilarity, Document, DocumentChunk};

use super::DocumentStore;

/// In-memory store for tests and embedded use.
pub struct InMemoryStore {
    docs: RwLock<Vec<Document>>,
    chunks: RwLock<Vec<DocumentChunk>>,
    metric: Box<dyn SimilarityMetric>,
}

impl InMemoryStore {
    pub fn new() -> Self {
        Self::with_metric(Box::new(Cosine))
    }

    pub fn with_metric(metric: Box<dyn SimilarityMetric>) -> Self {
        Self {
            docs: RwLock::new(Vec::new()),
            chunks: RwLock::new(Vec::new()),
            metric,
        }
    }
}

impl Default for InMemoryStore {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl DocumentStore for InMemoryStore {
    async fn create_document(&self, doc: &Document) -> Result<()> {
        let mut docs = self.docs.write().unwrap();
        if docs.iter().any(|d| d.id == doc.id) {
            anyhow::bail!("document already exists: {}", doc.id);
        }
        docs.push(doc.clone());
        Ok(())
    }

    async fn get_document_by_id(&self, id: &str) -> Result<Option<Document>> {
        let docs = self.docs.read().unwrap();
        Ok(docs.iter().find(|d| d.id == id).cloned())
    }

    async fn get_documents_by_project_id(&self, project_id: &str) -> Result<Vec<Document>> {
        let docs = self.docs.read().unwrap();
        Ok(docs
            .iter()
            .filter(|d| d.project_id == project_id)
            .cloned()
            .collect())
    }

    async fn update_document(&self, doc: &Document) -> Result<()> {
        let mut docs = self.docs.write().unwrap();
        match docs.iter_mut().find(|d| d.id == doc.id) {
            Some(stored) => {
                *stored = doc.clone();
                Ok(())
            }
            None => anyhow::bail!("document does not exist: {}", doc.id),
        }
    }

    async fn delete_document(&self, id: &str) -> Result<()> {
        self.docs.write().unwrap().retain(|d| d.id != id);
        // Cascade
        self.chunks.write().unwrap().retain(|c| c.document_id != id);
        Ok(())
    }

    async fn create_chunks(&self, chunks: &[DocumentChunk]) -> Result<()> {
        let mut stored = self.chunks.write().unwrap();
        stored.extend_from_slice(chunks);
        Ok(())
    }

    async fn delete_chunks_by_document_id(&self, document_id: &str) -> Result<()> {
        self.chunks
            .write()
            .unwrap()
            .retain(|c| c.document_id != document_id);
        Ok(())
    }

    async fn search_by_similarity(
        &self,
        project_id: &str,
        query_embedding: &[f32],
        limit: usize,
        threshold: f64,
    ) -> Result<Vec<ChunkWithSimilarity>> {
        let docs = self.docs.read().unwrap();
        let chunks = self.chunks.read().unwrap();

        // (document creation position, scored chunk) for tie-breaking
        let mut scored: Vec<(usize, ChunkWithSimilarity)> = Vec::new();

        for chunk in chunks.iter().filter(|c| c.project_id == project_id) {
            let Some(embedding) = &chunk.embedding else {
                continue;
            };
            let similarity = self.metric.score(query_embedding, embedding) as f64;
            if similarity < threshold {
                continue;
            }
            let position = docs.iter().position(|d| d.id == chunk.document_id);
            let document = position.map(|p| docs[p].clone());
            scored.push((
                position.unwrap_or(usize::MAX),
                ChunkWithSimilarity {
                    chunk: chunk.clone(),
                    similarity,
                    document,
                },
            ));
        }

        scored.sort_by(|a, b| {
            b.1.similarity
                .partial_cmp(&a.1.similarity)
                .unwrap_or(Ordering::Equal)
                .then(a.1.chunk.chunk_index.cmp(&b.1.chunk.chunk_index))
                .then(a.0.cmp(&b.0))
        });
        scored.truncate(limit);

        Ok(scored.into_iter().map(|(_, c)| c).collect())
    }

    async fn get_all_chunks_from_documents(
        &self,
        project_id: &str,
        document_ids: &[String],
    ) -> Result<Vec<ChunkWithSimilarity>> {
        let docs = self.docs.read().unwrap();
        let chunks = self.chunks.read().unwrap();

        let mut selected: Vec<(usize, ChunkWithSimilarity)> = chunks
            .iter()
            .filter(|c| c.project_id == project_id && document_ids.contains(&c.document_id))
            .map(|chunk| {
                let position = docs.iter().position(|d| d.id == chunk.document_id);
                let document = position.map(|p| docs[p].clone());
                (
                    position.unwrap_or(usize::MAX),
                    ChunkWithSimilarity {
                        chunk: chunk.clone(),
                        similarity: 1.0,
                        document,
                    },
                )
            })
            .collect();

        selected.sort_by(|a, b| a.0.cmp(&b.0).then(a.1.chunk.chunk_index.cmp(&b.1.chunk.chunk_index)));

        Ok(selected.into_iter().map(|(_, c)| c).collect())
    }
}
