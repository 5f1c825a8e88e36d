//! Fixed-window text chunker.
//!
//! Splits validated document text into overlapping character windows of
//! `chunk_size`, stepping by `chunk_size - chunk_overlap` so that semantic
//! context is not severed at a boundary. The final chunk may be shorter
//! than the target size; text shorter than one window yields exactly one
//! chunk containing the whole text.
//!
//! Pure function of `(text, config)`: chunk count and contents are
//! deterministic, and `chunk_index` values are contiguous starting at 0.
//! Each chunk receives a SHA-256 hash of its text for staleness detection.
//!
//! Windows are computed over characters, not bytes, so multi-byte text
//! never splits inside a code point.

use sha2::{Digest, Sha256};
use uuid::Uuid;

use crate::config::ChunkingConfig;
use crate::models::DocumentChunk;

/// Split text into overlapping chunks owned by `document_id`.
///
/// Config validation guarantees `chunk_overlap < chunk_size`; a degenerate
/// config that bypassed validation is clamped to a positive window and
/// step so the sequence still terminates instead of underflowing.
pub fn chunk_text(
    document_id: &str,
    project_id: &str,
    text: &str,
    config: &ChunkingConfig,
) -> Vec<DocumentChunk> {
    let chars: Vec<char> = text.chars().collect();
    let size = config.chunk_size.max(1);
    let step = size.saturating_sub(config.chunk_overlap).max(1);

    if chars.len() <= size {
        return vec![make_chunk(document_id, project_id, 0, text)];
    }

    let mut chunks = Vec::new();
    let mut start = 0usize;
    let mut index: i64 = 0;

    loop {
        let end = (start + size).min(chars.len());
        let window: String = chars[start..end].iter().collect();
        chunks.push(make_chunk(document_id, project_id, index, &window));
        index += 1;

        if end == chars.len() {
            break;
        }
        start += step;
    }

    chunks
}

fn make_chunk(document_id: &str, project_id: &str, index: i64, text: &str) -> DocumentChunk {
    let mut hasher = Sha256::new();
    hasher.update(text.as_bytes());
    let hash = format!("{:x}", hasher.finalize());

    DocumentChunk {
        id: Uuid::new_v4().to_string(),
        document_id: document_id.to_string(),
        project_id: project_id.to_string(),
        content: text.to_string(),
        embedding: None,
        chunk_index: index,
        hash,
        metadata: serde_json::json!({}),
    }
}
