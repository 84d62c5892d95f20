//! Documentation quality evaluation.
//!
//! - [`heuristic`]: local keyword and structure scoring
//! - [`remote`]: hosted evaluation service over HTTP

use async_trait::async_trait;

use crate::domain::{EvaluationResult, ServiceError, SnippetRun};

pub mod heuristic;
pub mod remote;

pub use heuristic::{HeuristicEvaluator, HeuristicPolicy};
pub use remote::RemoteEvaluator;

/// Scores a documentation draft.
///
/// Results are built through [`EvaluationResult::new`], so `overall_score`
/// is always the mean of the sub-scores and low sub-scores always carry
/// issues and feedback.
#[async_trait]
pub trait QualityEvaluator: Send + Sync {
    /// Short name used in logs.
    fn name(&self) -> &'static str;

    async fn evaluate(
        &self,
        documentation: &str,
        code_context: Option<&str>,
        runs: Option<&[SnippetRun]>,
    ) -> Result<EvaluationResult, ServiceError>;

    /// Evaluate several drafts without context, in order.
    async fn evaluate_batch(
        &self,
        documents: &[String],
    ) -> Result<Vec<EvaluationResult>, ServiceError> {
        let mut results = Vec::with_capacity(documents.len());
        for doc in documents {
            results.push(self.evaluate(doc, None, None).await?);
        }
        Ok(results)
    }
}
