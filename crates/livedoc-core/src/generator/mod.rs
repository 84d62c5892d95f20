//! Draft generation: turning structured changes into Markdown.
//!
//! - [`gemini`]: Gemini `generateContent` client
//! - [`template`]: deterministic renderer, also the fallback for failed drafts

use async_trait::async_trait;

use crate::domain::{EvaluationResult, ServiceError, StructuredChanges};

pub mod gemini;
pub mod template;

pub use gemini::{GeminiGenerator, DEFAULT_GEMINI_BASE_URL, DEFAULT_GEMINI_MODEL};
pub use template::{render_template, TemplateGenerator, REVIEW_NOTES_HEADING};

/// Produces and revises documentation drafts.
#[async_trait]
pub trait DraftGenerator: Send + Sync {
    /// Short name used in logs.
    fn name(&self) -> &'static str;

    /// First draft for a set of changes.
    async fn draft(&self, structured: &StructuredChanges) -> Result<String, ServiceError>;

    /// Rewrite `previous` to address the evaluation's issues and feedback.
    async fn revise(
        &self,
        previous: &str,
        evaluation: &EvaluationResult,
    ) -> Result<String, ServiceError>;
}
