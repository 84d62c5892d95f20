//! Snippet extraction from documentation drafts and change records.

use std::collections::HashSet;

use once_cell::sync::Lazy;
use regex::Regex;

use crate::domain::{Snippet, SnippetSource, StructuredChanges};

/// Language assumed for fenced blocks without a language tag.
pub const DEFAULT_FENCE_LANGUAGE: &str = "python";

/// Added lines taken from each change record.
pub const MAX_CHANGE_LINES: usize = 20;

/// Fenced code block with an optional language tag.
static FENCE_REGEX: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"(?s)```(\w+)?\n(.*?)```").expect("fence pattern is a valid literal regex")
});

/// Collect executable snippets for one draft.
///
/// Fenced blocks come first, in document order, with ids `snippet_{i}`.
/// Then one `change_{file_path}` snippet per record that added lines,
/// joining at most [`MAX_CHANGE_LINES`] of them.
pub fn extract(documentation: &str, structured: &StructuredChanges) -> Vec<Snippet> {
    let mut snippets = Vec::new();
    let mut seen = HashSet::new();

    for (i, caps) in FENCE_REGEX.captures_iter(documentation).enumerate() {
        let language = caps
            .get(1)
            .map(|m| m.as_str())
            .unwrap_or(DEFAULT_FENCE_LANGUAGE);
        let code = caps.get(2).map(|m| m.as_str().trim()).unwrap_or_default();
        push_unique(
            &mut snippets,
            &mut seen,
            format!("snippet_{i}"),
            code.to_string(),
            language.to_string(),
            SnippetSource::Documentation,
        );
    }

    for change in structured.changes.iter().filter(|c| !c.lines_added.is_empty()) {
        let take = change.lines_added.len().min(MAX_CHANGE_LINES);
        push_unique(
            &mut snippets,
            &mut seen,
            format!("change_{}", change.file_path),
            change.lines_added[..take].join("\n"),
            change.language.clone(),
            SnippetSource::CodeChange,
        );
    }

    snippets
}

// Ids key the execution-result map, so a repeated file path gets a suffix.
fn push_unique(
    snippets: &mut Vec<Snippet>,
    seen: &mut HashSet<String>,
    id: String,
    code: String,
    language: String,
    source: SnippetSource,
) {
    let mut unique = id.clone();
    let mut n = 1;
    while !seen.insert(unique.clone()) {
        unique = format!("{id}_{n}");
        n += 1;
    }
    snippets.push(Snippet {
        id: unique,
        code,
        language,
        source,
    });
}
