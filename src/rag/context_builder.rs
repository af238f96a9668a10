//! Deterministic prompt context from retrieved documents.
//!
//! Formatting is character-based so multi-byte text truncates safely.

use serde_json::{Map, Value};

use crate::rag::store::RetrievedDocument;

/// Maximum snippet length inside the assembled context.
pub const CONTEXT_SNIPPET_MAX: usize = 500;
pub const ELLIPSIS: &str = "...";
const UNKNOWN_TITLE: &str = "Unknown";

/// Parse document metadata, accepting an object or a JSON-encoded string.
/// Anything malformed yields an empty map, never an error.
pub fn parse_metadata(raw: &Value) -> Map<String, Value> {
    match raw {
        Value::Object(map) => map.clone(),
        Value::String(encoded) => serde_json::from_str::<Value>(encoded)
            .ok()
            .and_then(|v| v.as_object().cloned())
            .unwrap_or_default(),
        _ => Map::new(),
    }
}

pub fn document_title(metadata: &Map<String, Value>) -> String {
    metadata
        .get("title")
        .and_then(|t| t.as_str())
        .filter(|t| !t.is_empty())
        .unwrap_or(UNKNOWN_TITLE)
        .to_string()
}

/// Truncate to `max` characters, appending the ellipsis marker only when
/// something was actually cut.
pub fn truncate_chars(text: &str, max: usize) -> String {
    if text.chars().count() <= max {
        return text.to_string();
    }
    let mut snippet: String = text.chars().take(max).collect();
    snippet.push_str(ELLIPSIS);
    snippet
}

/// Assemble the context block: one `[rank] (Source: title)` entry per
/// document at 1-based rank, joined by blank lines. Empty input yields an
/// empty string; the prompt builder substitutes its own marker.
pub fn build_context(docs: &[RetrievedDocument]) -> String {
    docs.iter()
        .enumerate()
        .map(|(i, doc)| {
            let metadata = parse_metadata(&doc.metadata);
            let title = document_title(&metadata);
            let snippet = truncate_chars(&doc.content, CONTEXT_SNIPPET_MAX);
            format!("[{}] (Source: {})\n{}", i + 1, title, snippet)
        })
        .collect::<Vec<_>>()
        .join("\n\n")
}
