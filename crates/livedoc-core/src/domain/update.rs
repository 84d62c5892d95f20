//! Terminal output of a pipeline run.

use serde::Serialize;

use super::snippet::SnippetRun;

/// Documentation produced for a diff, ready to be handed to a caller.
///
/// `ready_to_commit` is computed at construction from the score and the
/// threshold and cannot be set independently.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct DocumentationUpdate {
    file_path: String,
    content: String,
    code_snippets: Vec<SnippetRun>,
    evaluation_score: f64,
    ready_to_commit: bool,
}

/// Score reported when the diff contained nothing to document.
pub const PLACEHOLDER_SCORE: f64 = 0.5;

impl DocumentationUpdate {
    pub fn new(
        file_path: impl Into<String>,
        content: impl Into<String>,
        code_snippets: Vec<SnippetRun>,
        evaluation_score: f64,
        min_quality_threshold: f64,
    ) -> Self {
        Self {
            file_path: file_path.into(),
            content: content.into(),
            code_snippets,
            evaluation_score,
            ready_to_commit: evaluation_score >= min_quality_threshold,
        }
    }

    /// Fixed result for a diff with no file sections. Never ready to commit.
    pub fn placeholder() -> Self {
        Self {
            file_path: "DOCUMENTATION.md".to_string(),
            content: "# Documentation\n\nNo code changes detected to document.".to_string(),
            code_snippets: Vec::new(),
            evaluation_score: PLACEHOLDER_SCORE,
            ready_to_commit: false,
        }
    }

    pub fn file_path(&self) -> &str {
        &self.file_path
    }

    pub fn content(&self) -> &str {
        &self.content
    }

    pub fn code_snippets(&self) -> &[SnippetRun] {
        &self.code_snippets
    }

    pub fn evaluation_score(&self) -> f64 {
        self.evaluation_score
    }

    pub fn ready_to_commit(&self) -> bool {
        self.ready_to_commit
    }
}
