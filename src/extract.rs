//! MIME-aware content extraction.
//!
//! Uploads arrive already decoded to a string; text formats pass through
//! unchanged. Formats this crate cannot text-extract (PDF and Word in the
//! current scope) degrade to a labeled placeholder instead of failing, so
//! the document can still be stored and listed. Web pages and video
//! transcripts are resolved by source-specific adapters outside this core;
//! only their plain-text output flows through here.
//!
//! Label resolution is table-driven: adding a format is a data change.

pub const MIME_PDF: &str = "application/pdf";
pub const MIME_DOC: &str = "application/msword";
pub const MIME_DOCX: &str =
    "application/vnd.openxmlformats-officedocument.wordprocessingml.document";

/// Formats stored without text extraction, with their placeholder label.
const UNEXTRACTED_FORMATS: &[(&str, &str)] = &[
    (MIME_PDF, "PDF"),
    (MIME_DOC, "Word"),
    (MIME_DOCX, "Word"),
];

/// MIME type to human file-type label, for context-block headers.
const MIME_LABELS: &[(&str, &str)] = &[
    (MIME_PDF, "PDF Document"),
    (MIME_DOC, "Word Document"),
    (MIME_DOCX, "Word Document"),
    ("text/plain", "Text Document"),
    ("text/markdown", "Markdown Document"),
    ("text/html", "HTML Document"),
    ("text/csv", "CSV Document"),
    ("application/json", "JSON Document"),
    ("application/xml", "XML Document"),
];

/// File-extension fallback when the MIME type is missing or generic.
const EXTENSION_LABELS: &[(&str, &str)] = &[
    ("pdf", "PDF Document"),
    ("doc", "Word Document"),
    ("docx", "Word Document"),
    ("txt", "Text Document"),
    ("md", "Markdown Document"),
    ("html", "HTML Document"),
    ("csv", "CSV Document"),
    ("json", "JSON Document"),
    ("xml", "XML Document"),
];

/// Normalize raw upload content into indexable plain text.
///
/// Text formats (and unknown formats, which the caller has already decoded)
/// return the input unchanged. Unsupported binary formats return a clearly
/// labeled placeholder naming the file. Pure function, no I/O.
pub fn extract_text(file_name: &str, raw: &str, mime_type: &str) -> String {
    match UNEXTRACTED_FORMATS
        .iter()
        .find(|(mime, _)| *mime == mime_type)
    {
        Some((_, kind)) => unextracted_placeholder(file_name, kind),
        None => raw.to_string(),
    }
}

/// Placeholder stored for formats without extraction support. The document
/// stays listable; its contents just are not searchable.
fn unextracted_placeholder(file_name: &str, kind: &str) -> String {
    format!(
        "[{kind} file: {file_name}]\n\
         Text extraction is not available for this file format. \
         The document is stored but its contents cannot be searched."
    )
}

/// Resolve a human file-type label from the MIME type, falling back to the
/// file extension, then to `"File"`.
pub fn file_type_label(mime_type: &str, file_name: &str) -> &'static str {
    if let Some((_, label)) = MIME_LABELS.iter().find(|(mime, _)| *mime == mime_type) {
        return label;
    }
    let extension = file_name.rsplit('.').next().unwrap_or_default();
    EXTENSION_LABELS
        .iter()
        .find(|(ext, _)| ext.eq_ignore_ascii_case(extension))
        .map(|(_, label)| *label)
        .unwrap_or("File")
}
