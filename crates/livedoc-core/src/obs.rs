//! Structured observability hooks for pipeline lifecycle events.
//!
//! Every event carries `event = "<name>"` and the run id, so runs can be
//! followed in JSON logs. Use [`pipeline_span`] to tag everything a run emits,
//! including events from the sandbox and collaborators.

use tracing::{info, warn};

use crate::domain::StopReason;

/// Span tagged with the run id, for `tracing::Instrument::instrument`.
pub fn pipeline_span(run_id: &str) -> tracing::Span {
    tracing::info_span!("livedoc.pipeline", run_id = %run_id)
}

pub fn emit_pipeline_started(run_id: &str, repo_path: &str, files: usize, generator: &str) {
    info!(
        event = "pipeline.started",
        run_id = %run_id,
        repo_path = %repo_path,
        files = files,
        generator = %generator,
    );
}

/// The draft call failed and the template renderer was used instead.
pub fn emit_draft_fallback(run_id: &str, generator: &str, error: &dyn std::fmt::Display) {
    warn!(
        event = "pipeline.draft_fallback",
        run_id = %run_id,
        generator = %generator,
        error = %error,
    );
}

pub fn emit_attempt_evaluated(
    run_id: &str,
    attempt: u32,
    overall_score: f64,
    threshold: f64,
    snippets_total: usize,
    snippets_failed: usize,
) {
    info!(
        event = "pipeline.attempt_evaluated",
        run_id = %run_id,
        attempt = attempt,
        overall_score = overall_score,
        threshold = threshold,
        passed = overall_score >= threshold,
        snippets_total = snippets_total,
        snippets_failed = snippets_failed,
    );
}

pub fn emit_revision_failed(run_id: &str, attempt: u32, error: &dyn std::fmt::Display) {
    warn!(
        event = "pipeline.revision_failed",
        run_id = %run_id,
        attempt = attempt,
        error = %error,
    );
}

pub fn emit_pipeline_finished(
    run_id: &str,
    duration_ms: u64,
    revisions_used: u32,
    final_score: f64,
    ready_to_commit: bool,
    stop_reason: StopReason,
) {
    info!(
        event = "pipeline.finished",
        run_id = %run_id,
        duration_ms = duration_ms,
        revisions_used = revisions_used,
        final_score = final_score,
        ready_to_commit = ready_to_commit,
        stop_reason = ?stop_reason,
    );
}
