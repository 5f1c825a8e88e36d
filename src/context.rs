//! Context formatter: renders retrieved chunks into the structured text
//! block handed to the language model.
//!
//! Chunks are grouped by parent document name and each group gets a stable
//! 1-based source index in first-encounter order. Chunks whose parent
//! document could not be resolved are skipped. No re-ranking or truncation
//! happens here; any limiting must already have been done by the retrieval
//! engine.

use std::fmt::Write as _;

use url::Url;

use crate::extract::file_type_label;
use crate::models::{ChunkWithSimilarity, Document, SourceDetails};

const CONTEXT_PREAMBLE: &str = "<knowledge_base_context>\n\
The following sources from the project knowledge base are relevant to the \
user's question. Use them to ground your answer.\n\
- Cite sources by their number and type, e.g. \"according to Source 1 (Web Page)\".\n\
- If sources conflict with each other, point out the conflict instead of \
silently picking one.\n\
- Do not invent information that is not supported by the sources.\n";

const CONTEXT_EPILOGUE: &str = "</knowledge_base_context>";

/// Render scored chunks into a single structured context block.
///
/// Returns an empty string for an empty input. Output is a pure function
/// of the input sequence, so repeated calls are byte-identical.
pub fn format_context(results: &[ChunkWithSimilarity]) -> String {
    let groups = group_by_document(results);
    if groups.is_empty() {
        return String::new();
    }

    let mut out = String::from(CONTEXT_PREAMBLE);

    for (index, group) in groups.iter().enumerate() {
        out.push('\n');
        render_source_block(&mut out, index + 1, group);
    }

    out.push('\n');
    out.push_str(CONTEXT_EPILOGUE);
    out
}

/// One document's worth of retrieved chunks, in `chunk_index` order.
struct SourceGroup<'a> {
    document: &'a Document,
    chunks: Vec<&'a ChunkWithSimilarity>,
}

fn group_by_document(results: &[ChunkWithSimilarity]) -> Vec<SourceGroup<'_>> {
    let mut groups: Vec<SourceGroup<'_>> = Vec::new();

    for result in results {
        // A chunk without a resolvable parent has nothing to label it with.
        let Some(doc) = &result.document else {
            continue;
        };

        match groups.iter_mut().find(|g| g.document.name == doc.name) {
            Some(group) => group.chunks.push(result),
            None => groups.push(SourceGroup {
                document: doc,
                chunks: vec![result],
            }),
        }
    }

    for group in &mut groups {
        group.chunks.sort_by_key(|r| r.chunk.chunk_index);
    }
    groups
}

fn render_source_block(out: &mut String, index: usize, group: &SourceGroup<'_>) {
    let _ = writeln!(out, "[Source {}: {}]", index, group.document.name);
    render_source_metadata(out, group.document);

    if group.chunks.len() > 1 {
        for (section, result) in group.chunks.iter().enumerate() {
            let _ = writeln!(out, "Section {}:", section + 1);
            let _ = writeln!(out, "{}", result.chunk.content.trim_end());
        }
    } else if let Some(result) = group.chunks.first() {
        out.push_str("Content:\n");
        let _ = writeln!(out, "{}", result.chunk.content.trim_end());
    }
}

fn render_source_metadata(out: &mut String, doc: &Document) {
    match &doc.source {
        SourceDetails::Youtube(yt) => {
            if let Some(title) = &yt.title {
                let _ = writeln!(out, "Title: {title}");
            }
            if let Some(channel) = &yt.channel_name {
                let _ = writeln!(out, "Channel: {channel}");
            }
            out.push_str("Type: Video Transcript\n");
        }
        SourceDetails::Web(web) => {
            if let Some(title) = &web.title {
                let _ = writeln!(out, "Title: {title}");
            }
            if let Some(host) = hostname(&web.url) {
                let _ = writeln!(out, "Site: {host}");
            }
            out.push_str("Type: Web Content\n");
        }
        SourceDetails::File => {
            let _ = writeln!(out, "Type: {}", file_type_label(&doc.mime_type, &doc.name));
        }
    }
}

fn hostname(raw: &str) -> Option<String> {
    Url::parse(raw)
        .ok()
        .and_then(|u| u.host_str().map(|h| h.to_string()))
}
