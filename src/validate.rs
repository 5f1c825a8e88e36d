//! Content validation gate.
//!
//! Runs after extraction and before any store write. A failed validation
//! means the upload is rejected outright; nothing is persisted and no
//! rollback is needed. The extractor's unextracted-format placeholder is
//! deliberately valid: it is clean text over the minimum length, so those
//! documents stay listable.

use crate::config::ValidationConfig;

/// Fraction of U+FFFD replacement characters above which content is
/// considered undecoded binary.
const MAX_REPLACEMENT_RATIO: f64 = 0.05;

/// Outcome of content validation. When `is_valid` is false, `reason` holds
/// a human-readable rejection message for the uploader.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Validation {
    pub is_valid: bool,
    pub reason: Option<String>,
}

impl Validation {
    fn ok() -> Self {
        Self {
            is_valid: true,
            reason: None,
        }
    }

    fn rejected(reason: impl Into<String>) -> Self {
        Self {
            is_valid: false,
            reason: Some(reason.into()),
        }
    }
}

/// Check whether extracted text is suitable for indexing.
///
/// Rejects empty or whitespace-only text, text under the configured minimum
/// length, and content that is clearly undecoded binary (NUL bytes or a high
/// ratio of replacement characters).
pub fn validate_content(text: &str, config: &ValidationConfig) -> Validation {
    let trimmed = text.trim();
    if trimmed.is_empty() {
        return Validation::rejected("document is empty");
    }

    let char_count = trimmed.chars().count();
    if char_count < config.min_content_length {
        return Validation::rejected(format!(
            "document is too short to index ({} characters, minimum {})",
            char_count, config.min_content_length
        ));
    }

    if trimmed.contains('\0') {
        return Validation::rejected("document appears to be binary data");
    }
    let replacements = trimmed.chars().filter(|c| *c == '\u{FFFD}').count();
    if replacements as f64 / char_count as f64 > MAX_REPLACEMENT_RATIO {
        return Validation::rejected("document appears to be binary data");
    }

    Validation::ok()
}
