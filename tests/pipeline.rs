//! End-to-end pipeline tests: ingest through retrieval and formatting
//! against the in-memory store with deterministic fake providers.

use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;

use anyhow::bail;
use async_trait::async_trait;
use ragbase::{
    DocumentStore, DocumentUpdate, EmbeddingProvider, InMemoryStore, KnowledgeBase, NewDocument,
    RagConfig, RagError, SourceDetails,
};

/// Deterministic provider: maps keywords to fixed directions so tests can
/// predict similarity scores exactly.
///
/// - text containing "alpha"   -> [1.0, 0.0, 0.0]
/// - text containing "slanted" -> [1.0, 0.7, 0.0]  (cosine vs alpha ~= 0.819)
/// - anything else             -> [0.0, 0.0, 1.0]
struct KeywordProvider {
    fail_contextual: bool,
    fail_all: bool,
    calls: AtomicUsize,
}

impl KeywordProvider {
    fn new() -> Self {
        Self {
            fail_contextual: false,
            fail_all: false,
            calls: AtomicUsize::new(0),
        }
    }

    fn contextual_failing() -> Self {
        Self {
            fail_contextual: true,
            ..Self::new()
        }
    }

    fn failing() -> Self {
        Self {
            fail_all: true,
            ..Self::new()
        }
    }
}

#[async_trait]
impl EmbeddingProvider for KeywordProvider {
    fn model_name(&self) -> &str {
        "keyword-fake"
    }

    fn dims(&self) -> usize {
        3
    }

    async fn embed(&self, text: &str) -> anyhow::Result<Vec<f32>> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        if self.fail_all {
            bail!("provider unavailable");
        }
        if self.fail_contextual && text.starts_with("Document:") {
            bail!("contextual input rejected");
        }
        if text.contains("slanted") {
            Ok(vec![1.0, 0.7, 0.0])
        } else if text.contains("alpha") {
            Ok(vec![1.0, 0.0, 0.0])
        } else {
            Ok(vec![0.0, 0.0, 1.0])
        }
    }
}

fn knowledge_base(provider: KeywordProvider) -> (KnowledgeBase, Arc<InMemoryStore>) {
    let store = Arc::new(InMemoryStore::new());
    let kb = KnowledgeBase::new(store.clone(), Arc::new(provider), RagConfig::default());
    (kb, store)
}

fn file_upload(name: &str, content: &str) -> NewDocument {
    NewDocument {
        project_id: "proj-1".to_string(),
        user_id: "user-1".to_string(),
        name: name.to_string(),
        content: content.to_string(),
        mime_type: "text/plain".to_string(),
        size: content.len() as u64,
        source: SourceDetails::File,
        metadata: serde_json::json!({}),
    }
}

#[tokio::test]
async fn long_document_chunks_and_stays_retrievable() {
    let (kb, _store) = knowledge_base(KeywordProvider::new());

    // 2500 chars with the default 1000/100 config yields 3 chunks.
    let content = "alpha ".repeat(417); // 2502 chars, trimmed by nothing; every chunk matches
    let doc = kb
        .add_document(file_upload("alpha.txt", &content))
        .await
        .unwrap();

    let results = kb
        .search_relevant_content("proj-1", "alpha deployment", None, Some(0.5), None)
        .await
        .unwrap();

    assert_eq!(results.len(), 3);
    let indices: Vec<i64> = results.iter().map(|r| r.chunk.chunk_index).collect();
    assert_eq!(indices, vec![0, 1, 2]);
    for r in &results {
        assert_eq!(r.document.as_ref().unwrap().id, doc.id);
        assert!(r.similarity > 0.99);
    }

    // The same three chunks come back complete via fixed selection.
    let selected = kb
        .get_selected_documents_content("proj-1", &[doc.id.clone()])
        .await;
    assert_eq!(selected.len(), 3);
    for r in &selected {
        assert!(r.chunk.embedding.is_some());
        assert_eq!(r.similarity, 1.0);
    }
}

#[tokio::test]
async fn threshold_and_limit_are_monotonic() {
    let (kb, _store) = knowledge_base(KeywordProvider::new());
    kb.add_document(file_upload("a.txt", "alpha exact match text"))
        .await
        .unwrap();
    kb.add_document(file_upload("b.txt", "slanted partial match text"))
        .await
        .unwrap();

    let kb = &kb;
    let count = |limit: usize, threshold: f64| async move {
        kb.search_relevant_content("proj-1", "alpha", Some(limit), Some(threshold), None)
            .await
            .unwrap()
            .len()
    };

    // Raising the threshold never increases the result count.
    let loose = count(10, 0.1).await;
    let tight = count(10, 0.9).await;
    let impossible = count(10, 1.0).await;
    assert_eq!(loose, 2);
    assert_eq!(tight, 1);
    assert!(loose >= tight && tight >= impossible);

    // Raising the limit never decreases it.
    assert_eq!(count(1, 0.1).await, 1);
    assert_eq!(count(2, 0.1).await, 2);
    assert_eq!(count(50, 0.1).await, 2);
}

#[tokio::test]
async fn threshold_above_best_score_yields_no_results() {
    let (kb, _store) = knowledge_base(KeywordProvider::new());
    kb.add_document(file_upload("notes.txt", "slanted notes about the rollout"))
        .await
        .unwrap();

    // Best achievable score is ~0.819, below the 0.9 floor.
    let results = kb
        .search_relevant_content("proj-1", "alpha question", None, Some(0.9), None)
        .await
        .unwrap();
    assert!(results.is_empty());

    // The same query with a permissive threshold does match.
    let results = kb
        .search_relevant_content("proj-1", "alpha question", None, Some(0.5), None)
        .await
        .unwrap();
    assert_eq!(results.len(), 1);
    assert!((results[0].similarity - 0.819).abs() < 0.01);
}

#[tokio::test]
async fn selected_documents_format_into_numbered_sources() {
    // Chunking small enough that "Alpha" splits into two chunks.
    let mut config = RagConfig::default();
    config.chunking.chunk_size = 40;
    config.chunking.chunk_overlap = 5;
    let store = Arc::new(InMemoryStore::new());
    let kb = KnowledgeBase::new(store, Arc::new(KeywordProvider::new()), config);

    let alpha = kb
        .add_document(file_upload(
            "Alpha",
            "alpha section one has some words. alpha section two has more words here.",
        ))
        .await
        .unwrap();
    let beta = kb
        .add_document(file_upload("Beta", "beta has a single short body."))
        .await
        .unwrap();

    let ids = vec![alpha.id.clone(), beta.id.clone()];
    let results = kb.get_selected_documents_content("proj-1", &ids).await;
    assert!(results.len() >= 3, "Alpha should contribute 2+ chunks");
    assert!(results.iter().all(|r| r.similarity == 1.0));

    let out = kb.format_context_for_rag(&results);
    assert!(out.contains("[Source 1: Alpha]"));
    assert!(out.contains("[Source 2: Beta]"));
    assert!(out.contains("Section 1:"));
    assert!(out.contains("Section 2:"));
    assert!(out.contains("Content:\nbeta has a single short body."));
    assert!(out.starts_with("<knowledge_base_context>"));
    assert!(out.ends_with("</knowledge_base_context>"));

    // Formatting is pure: a second render is byte-identical.
    assert_eq!(out, kb.format_context_for_rag(&results));
}

#[tokio::test]
async fn contextual_embedding_failure_degrades_silently() {
    let (kb, _store) = knowledge_base(KeywordProvider::contextual_failing());

    let doc = kb
        .add_document(file_upload("alpha.txt", "alpha content that embeds fine plain"))
        .await
        .expect("fallback must keep ingestion alive");

    let results = kb
        .get_selected_documents_content("proj-1", &[doc.id.clone()])
        .await;
    assert_eq!(results.len(), 1);
    assert!(results[0].chunk.embedding.is_some());
}

#[tokio::test]
async fn total_embedding_failure_leaves_no_document_behind() {
    let (kb, store) = knowledge_base(KeywordProvider::failing());

    let err = kb
        .add_document(file_upload("alpha.txt", "alpha content that cannot embed"))
        .await
        .unwrap_err();
    assert!(matches!(err, RagError::Embedding(_)));

    let docs = store.get_documents_by_project_id("proj-1").await.unwrap();
    assert!(docs.is_empty());
}

#[tokio::test]
async fn empty_query_never_touches_the_provider() {
    let (kb, _store) = knowledge_base(KeywordProvider::failing());

    // Provider fails every call, yet an empty query must still succeed.
    let results = kb
        .search_relevant_content("proj-1", "   ", None, None, None)
        .await
        .unwrap();
    assert!(results.is_empty());
}

#[tokio::test]
async fn search_is_deterministic_across_runs() {
    let (kb, _store) = knowledge_base(KeywordProvider::new());
    kb.add_document(file_upload("a.txt", "alpha text number one"))
        .await
        .unwrap();
    kb.add_document(file_upload("b.txt", "alpha text number two"))
        .await
        .unwrap();
    kb.add_document(file_upload("c.txt", "unrelated zebra text"))
        .await
        .unwrap();

    let run = || kb.search_relevant_content("proj-1", "alpha query", None, Some(0.5), None);
    let first = run().await.unwrap();
    let second = run().await.unwrap();

    assert_eq!(first.len(), 2);
    let ids_first: Vec<&str> = first.iter().map(|r| r.chunk.id.as_str()).collect();
    let ids_second: Vec<&str> = second.iter().map(|r| r.chunk.id.as_str()).collect();
    assert_eq!(ids_first, ids_second);

    // Scores are non-increasing down the result list.
    for pair in first.windows(2) {
        assert!(pair[0].similarity >= pair[1].similarity);
    }
}

#[tokio::test]
async fn deleted_documents_disappear_from_search() {
    let (kb, _store) = knowledge_base(KeywordProvider::new());
    let doc = kb
        .add_document(file_upload("a.txt", "alpha text to delete soon"))
        .await
        .unwrap();

    let before = kb
        .search_relevant_content("proj-1", "alpha", None, Some(0.5), None)
        .await
        .unwrap();
    assert_eq!(before.len(), 1);

    kb.delete_document(&doc.id).await.unwrap();

    let after = kb
        .search_relevant_content("proj-1", "alpha", None, Some(0.5), None)
        .await
        .unwrap();
    assert!(after.is_empty());
}

#[tokio::test]
async fn update_reindexes_content_for_search() {
    let (kb, _store) = knowledge_base(KeywordProvider::new());
    let doc = kb
        .add_document(file_upload("a.txt", "unrelated zebra text originally"))
        .await
        .unwrap();

    let miss = kb
        .search_relevant_content("proj-1", "alpha", None, Some(0.5), None)
        .await
        .unwrap();
    assert!(miss.is_empty());

    kb.update_document(
        &doc.id,
        DocumentUpdate {
            content: Some("alpha content after the rewrite".to_string()),
            ..Default::default()
        },
    )
    .await
    .unwrap();

    let hit = kb
        .search_relevant_content("proj-1", "alpha", None, Some(0.5), None)
        .await
        .unwrap();
    assert_eq!(hit.len(), 1);
    assert_eq!(hit[0].chunk.content, "alpha content after the rewrite");
}

#[tokio::test]
async fn projects_are_isolated() {
    let (kb, _store) = knowledge_base(KeywordProvider::new());
    kb.add_document(file_upload("a.txt", "alpha content in project one"))
        .await
        .unwrap();

    let other_project = kb
        .search_relevant_content("proj-2", "alpha", None, Some(0.1), None)
        .await
        .unwrap();
    assert!(other_project.is_empty());
}
