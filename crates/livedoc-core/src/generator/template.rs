//! Template renderer.

use async_trait::async_trait;

use super::DraftGenerator;
use crate::domain::{EvaluationResult, ServiceError, StructuredChanges};

/// Added lines shown per file in a rendered template.
pub const TEMPLATE_CODE_LINES: usize = 5;

/// Heading of the section a template revision appends.
pub const REVIEW_NOTES_HEADING: &str = "## Review Notes";

/// Render the fixed documentation layout for a set of changes.
pub fn render_template(structured: &StructuredChanges) -> String {
    let mut lines = vec!["# Documentation Update\n".to_string()];

    for change in &structured.changes {
        lines.push(format!("## {}\n", change.file_path));
        lines.push(format!("**Change Type:** {}\n", change.change_type));
        lines.push(format!("**Summary:** {}\n", change.summary));
        lines.push(format!("**Language:** {}\n", change.language));

        if !change.lines_added.is_empty() {
            let fence_tag = if change.language == "unknown" {
                ""
            } else {
                change.language.as_str()
            };
            let take = change.lines_added.len().min(TEMPLATE_CODE_LINES);
            lines.push(format!("\n### Added Code\n```{fence_tag}"));
            lines.push(change.lines_added[..take].join("\n"));
            lines.push("```\n".to_string());
        }
    }

    lines.join("\n")
}

/// Generator that never calls out: drafts with [`render_template`] and
/// revises by attaching the evaluator's findings as review notes.
#[derive(Debug, Default, Clone, Copy)]
pub struct TemplateGenerator;

#[async_trait]
impl DraftGenerator for TemplateGenerator {
    fn name(&self) -> &'static str {
        "template"
    }

    async fn draft(&self, structured: &StructuredChanges) -> Result<String, ServiceError> {
        Ok(render_template(structured))
    }

    async fn revise(
        &self,
        previous: &str,
        evaluation: &EvaluationResult,
    ) -> Result<String, ServiceError> {
        let body = match previous.find(REVIEW_NOTES_HEADING) {
            Some(at) => previous[..at].trim_end(),
            None => previous.trim_end(),
        };

        let mut revised = format!("{body}\n\n{REVIEW_NOTES_HEADING}\n\n");
        for note in evaluation.issues().iter().chain(evaluation.feedback()) {
            revised.push_str(&format!("- {note}\n"));
        }
        Ok(revised)
    }
}
