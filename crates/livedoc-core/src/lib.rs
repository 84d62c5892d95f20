//! livedoc Core Library
//!
//! Documentation pipeline for code changes: a unified diff is structured,
//! drafted into Markdown, its snippets are executed in a sandbox, and the
//! draft is scored and revised until it clears a quality gate.

pub mod config;
pub mod domain;
pub mod evaluator;
pub mod extractor;
pub mod generator;
pub mod git;
mod http;
pub mod metrics;
pub mod obs;
pub mod orchestrator;
pub mod report;
pub mod sandbox;
pub mod structurer;
pub mod telemetry;

pub use config::{
    EvaluatorConfig, EvaluatorKind, GeneratorConfig, GitConfig, LivedocConfig,
    SandboxBackendKind, SandboxSettings,
};

pub use domain::{
    detect_language, AttemptRecord, ChangeAnalysis, ChangeRecord, ChangeType, Complexity,
    Dimension, DocumentationUpdate, EvaluationResult, ExecutionResult, LivedocError, PipelineRun,
    Result, ServiceError, Snippet, SnippetRun, SnippetSource, StopReason, StructuredChanges,
    ACTIONABLE_SCORE, PLACEHOLDER_SCORE,
};

pub use evaluator::{HeuristicEvaluator, HeuristicPolicy, QualityEvaluator, RemoteEvaluator};
pub use extractor::extract;
pub use generator::{render_template, DraftGenerator, GeminiGenerator, TemplateGenerator};
pub use git::{
    capture_head_sha, commit_documentation, diff_against, diff_between, is_git_repo,
    recent_commits, uncommitted_diff, CommitInfo, DEFAULT_COMMIT_MESSAGE,
};
pub use metrics::METRICS;
pub use obs::{
    emit_attempt_evaluated, emit_draft_fallback, emit_pipeline_finished, emit_pipeline_started,
    emit_revision_failed, pipeline_span,
};
pub use orchestrator::{determine_doc_path, Orchestrator, PipelineConfig, DOC_FILE_NAME};
pub use report::{read_run_report, write_run_report, RunReport};
pub use sandbox::{
    DisabledBackend, ExecutionControls, LocalProcessBackend, RemoteSandboxBackend, SandboxBackend,
    SandboxError, SandboxExecutor, SandboxHandle,
};
pub use structurer::structure;
pub use telemetry::init_tracing;

/// Crate version, for `--version` output and reports.
pub const VERSION: &str = env!("CARGO_PKG_VERSION");
