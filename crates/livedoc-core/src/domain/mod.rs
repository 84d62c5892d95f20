//! Domain models for livedoc.
//!
//! Canonical definitions for the records that flow through the pipeline:
//! - `ChangeRecord` / `StructuredChanges`: parsed diff
//! - `Snippet` / `ExecutionResult`: sandbox inputs and outcomes
//! - `EvaluationResult`: quality scores for a draft
//! - `DocumentationUpdate`: the pipeline's terminal output
//! - `PipelineRun`: trace of the correction loop

pub mod change;
pub mod error;
pub mod evaluation;
pub mod run;
pub mod snippet;
pub mod update;

pub use change::{
    detect_language, ChangeAnalysis, ChangeRecord, ChangeType, Complexity, StructuredChanges,
};
pub use error::{LivedocError, Result, ServiceError};
pub use evaluation::{Dimension, EvaluationResult, ACTIONABLE_SCORE};
pub use run::{AttemptRecord, PipelineRun, StopReason};
pub use snippet::{ExecutionResult, Snippet, SnippetRun, SnippetSource};
pub use update::{DocumentationUpdate, PLACEHOLDER_SCORE};
