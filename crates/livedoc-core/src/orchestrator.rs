//! Pipeline orchestrator: diff in, evaluated documentation out.
//!
//! Sequence for one run:
//! 1. structure the diff (no file sections → placeholder, nothing else runs)
//! 2. draft, falling back to the template renderer on error
//! 3. extract snippets, execute them, pair results by id
//! 4. evaluate the draft against the change context and the runs
//! 5. while below threshold and revisions remain: revise, then redo 3–4
//!
//! The orchestrator never writes files; callers persist the update.

use std::sync::Arc;

use chrono::Utc;
use serde::{Deserialize, Serialize};
use tracing::Instrument;

use crate::config::{EvaluatorKind, LivedocConfig, SandboxBackendKind};
use crate::domain::{
    AttemptRecord, DocumentationUpdate, EvaluationResult, LivedocError, PipelineRun, Result,
    SnippetRun, StopReason, StructuredChanges,
};
use crate::evaluator::{HeuristicEvaluator, QualityEvaluator, RemoteEvaluator};
use crate::extractor::extract;
use crate::generator::{render_template, DraftGenerator, GeminiGenerator, TemplateGenerator};
use crate::metrics::METRICS;
use crate::obs;
use crate::sandbox::{
    DisabledBackend, LocalProcessBackend, RemoteSandboxBackend, SandboxBackend, SandboxExecutor,
};
use crate::structurer::structure;

/// Documentation file used when the first changed file has no directory.
pub const DOC_FILE_NAME: &str = "DOCUMENTATION.md";

/// Quality gate and loop bound.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct PipelineConfig {
    /// Score at or above which an update is ready to commit.
    pub min_quality_threshold: f64,
    /// Revisions allowed after the first draft.
    pub max_self_correction_attempts: u32,
}

impl Default for PipelineConfig {
    fn default() -> Self {
        Self {
            min_quality_threshold: 0.7,
            max_self_correction_attempts: 3,
        }
    }
}

impl PipelineConfig {
    pub fn validate(&self) -> Result<()> {
        let t = self.min_quality_threshold;
        if !(0.0..=1.0).contains(&t) {
            return Err(LivedocError::InvalidConfig(format!(
                "min_quality_threshold must be within [0, 1], got {t}"
            )));
        }
        Ok(())
    }
}

/// One evaluated draft: the runs it was scored with and the score.
struct Checked {
    runs: Vec<SnippetRun>,
    evaluation: EvaluationResult,
}

pub struct Orchestrator {
    generator: Arc<dyn DraftGenerator>,
    sandbox: SandboxExecutor,
    evaluator: Arc<dyn QualityEvaluator>,
    config: PipelineConfig,
}

impl Orchestrator {
    pub fn new(
        generator: Arc<dyn DraftGenerator>,
        sandbox: SandboxExecutor,
        evaluator: Arc<dyn QualityEvaluator>,
        config: PipelineConfig,
    ) -> Result<Self> {
        config.validate()?;
        Ok(Self {
            generator,
            sandbox,
            evaluator,
            config,
        })
    }

    /// Wire collaborators from a loaded configuration.
    ///
    /// Without a Gemini key the template generator is used.
    pub fn from_config(config: &LivedocConfig) -> Result<Self> {
        config.validate()?;
        let unavailable = |e: crate::domain::ServiceError| LivedocError::InvalidConfig(e.to_string());

        let generator: Arc<dyn DraftGenerator> = match config.generator.api_key() {
            Some(key) => Arc::new(
                GeminiGenerator::new(key)
                    .map_err(unavailable)?
                    .with_model(&config.generator.model)
                    .with_base_url(&config.generator.base_url),
            ),
            None => Arc::new(TemplateGenerator),
        };

        let sandbox_settings = &config.sandbox;
        let backend: Arc<dyn SandboxBackend> = match sandbox_settings.backend {
            SandboxBackendKind::None => Arc::new(DisabledBackend),
            SandboxBackendKind::Local => Arc::new(LocalProcessBackend::new()),
            SandboxBackendKind::Remote => Arc::new(
                RemoteSandboxBackend::new(
                    sandbox_settings.api_url.as_deref().unwrap_or_default(),
                    sandbox_settings.api_key.clone(),
                )
                .map_err(unavailable)?,
            ),
        };
        let sandbox = SandboxExecutor::new(backend, sandbox_settings.controls.clone());

        let evaluator: Arc<dyn QualityEvaluator> = match config.evaluator.kind {
            EvaluatorKind::Heuristic => {
                Arc::new(HeuristicEvaluator::new(config.evaluator.heuristic.clone()))
            }
            EvaluatorKind::Remote => Arc::new(
                RemoteEvaluator::new(
                    config.evaluator.api_url.as_deref().unwrap_or_default(),
                    config.evaluator.api_key.clone(),
                )
                .map_err(unavailable)?,
            ),
        };

        Self::new(generator, sandbox, evaluator, config.quality)
    }

    pub fn config(&self) -> &PipelineConfig {
        &self.config
    }

    pub fn sandbox(&self) -> &SandboxExecutor {
        &self.sandbox
    }

    /// Run the pipeline for one diff.
    ///
    /// Fails with [`LivedocError::EmptyDiff`] on blank input and with
    /// [`LivedocError::Evaluation`] when the evaluator errors. A score still
    /// below threshold after the last revision is a normal result with
    /// `ready_to_commit == false`.
    pub async fn process(&self, diff_text: &str, repo_path: &str) -> Result<DocumentationUpdate> {
        let (update, _run) = self.process_traced(diff_text, repo_path).await?;
        Ok(update)
    }

    /// Like [`process`](Self::process), also returning the run trace.
    pub async fn process_traced(
        &self,
        diff_text: &str,
        repo_path: &str,
    ) -> Result<(DocumentationUpdate, PipelineRun)> {
        if diff_text.trim().is_empty() {
            return Err(LivedocError::EmptyDiff);
        }
        let run_id = uuid::Uuid::new_v4().to_string();
        let span = obs::pipeline_span(&run_id);
        self.run_pipeline(run_id, diff_text, repo_path)
            .instrument(span)
            .await
    }

    /// Release the sandbox. Idempotent; later runs report snippets as not run.
    pub async fn shutdown(&self) {
        self.sandbox.release().await;
    }

    async fn run_pipeline(
        &self,
        run_id: String,
        diff_text: &str,
        repo_path: &str,
    ) -> Result<(DocumentationUpdate, PipelineRun)> {
        let started_at = Utc::now();
        METRICS.inc_pipelines();

        let structured = structure(diff_text);
        if structured.is_empty() {
            let update = DocumentationUpdate::placeholder();
            let run = PipelineRun {
                run_id,
                repo_path: repo_path.to_string(),
                file_path: update.file_path().to_string(),
                draft_fallback: false,
                attempts: Vec::new(),
                revisions_used: 0,
                stop_reason: StopReason::NoChanges,
                final_score: update.evaluation_score(),
                ready_to_commit: update.ready_to_commit(),
                started_at,
                finished_at: Utc::now(),
            };
            finish(&run);
            return Ok((update, run));
        }

        obs::emit_pipeline_started(
            &run_id,
            repo_path,
            structured.total_changes,
            self.generator.name(),
        );
        let context = structured.to_context_json();

        let (mut documentation, draft_fallback) = match self.generator.draft(&structured).await {
            Ok(doc) => (doc, false),
            Err(err) => {
                obs::emit_draft_fallback(&run_id, self.generator.name(), &err);
                METRICS.inc_draft_fallbacks();
                (render_template(&structured), true)
            }
        };

        let threshold = self.config.min_quality_threshold;
        let mut attempts = Vec::new();
        let mut checked = self
            .check(&run_id, 0, &documentation, &structured, &context, &mut attempts)
            .await?;

        let mut revisions_used = 0u32;
        let stop_reason = loop {
            if checked.evaluation.overall_score() >= threshold {
                break StopReason::QualityMet;
            }
            if revisions_used >= self.config.max_self_correction_attempts {
                break StopReason::AttemptsExhausted;
            }
            revisions_used += 1;
            METRICS.inc_revisions();

            match self.generator.revise(&documentation, &checked.evaluation).await {
                Ok(revised) => documentation = revised,
                Err(err) => {
                    obs::emit_revision_failed(&run_id, revisions_used, &err);
                    break StopReason::RevisionFailed;
                }
            }
            checked = self
                .check(
                    &run_id,
                    revisions_used,
                    &documentation,
                    &structured,
                    &context,
                    &mut attempts,
                )
                .await?;
        };

        let final_score = checked.evaluation.overall_score();
        let update = DocumentationUpdate::new(
            determine_doc_path(&structured),
            documentation,
            checked.runs,
            final_score,
            threshold,
        );
        let run = PipelineRun {
            run_id,
            repo_path: repo_path.to_string(),
            file_path: update.file_path().to_string(),
            draft_fallback,
            attempts,
            revisions_used,
            stop_reason,
            final_score,
            ready_to_commit: update.ready_to_commit(),
            started_at,
            finished_at: Utc::now(),
        };
        finish(&run);
        Ok((update, run))
    }

    /// Extract, execute, and evaluate one draft.
    async fn check(
        &self,
        run_id: &str,
        attempt: u32,
        documentation: &str,
        structured: &StructuredChanges,
        context: &str,
        attempts: &mut Vec<AttemptRecord>,
    ) -> Result<Checked> {
        let snippets = extract(documentation, structured);
        let mut results = self.sandbox.execute_all(&snippets).await;
        let runs: Vec<SnippetRun> = snippets
            .into_iter()
            .map(|snippet| {
                let execution_result = results.remove(&snippet.id);
                SnippetRun {
                    snippet,
                    execution_result,
                }
            })
            .collect();

        let evaluation = self
            .evaluator
            .evaluate(documentation, Some(context), Some(runs.as_slice()))
            .await
            .map_err(LivedocError::Evaluation)?;

        let snippets_failed = runs.iter().filter(|run| !run.succeeded()).count();
        obs::emit_attempt_evaluated(
            run_id,
            attempt,
            evaluation.overall_score(),
            self.config.min_quality_threshold,
            runs.len(),
            snippets_failed,
        );
        attempts.push(AttemptRecord {
            attempt,
            accuracy_score: evaluation.accuracy_score(),
            tone_score: evaluation.tone_score(),
            clarity_score: evaluation.clarity_score(),
            overall_score: evaluation.overall_score(),
            issues: evaluation.issues().to_vec(),
            snippets_total: runs.len(),
            snippets_failed,
        });

        Ok(Checked { runs, evaluation })
    }
}

fn finish(run: &PipelineRun) {
    obs::emit_pipeline_finished(
        &run.run_id,
        run.duration_ms(),
        run.revisions_used,
        run.final_score,
        run.ready_to_commit,
        run.stop_reason,
    );
}

/// Where documentation for a set of changes belongs: `DOCUMENTATION.md` next
/// to the first changed file, or `README.md` when nothing changed.
pub fn determine_doc_path(structured: &StructuredChanges) -> String {
    match structured.changes.first() {
        None => "README.md".to_string(),
        Some(first) => match first.file_path.rsplit_once('/') {
            Some((dir, _)) if !dir.is_empty() => format!("{dir}/{DOC_FILE_NAME}"),
            _ => DOC_FILE_NAME.to_string(),
        },
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::{ChangeRecord, ChangeType};

    fn changes_for(path: &str) -> StructuredChanges {
        StructuredChanges::from_records(vec![ChangeRecord::new(
            path,
            ChangeType::Modified,
            vec![],
            vec![],
        )])
    }

    #[test]
    fn test_doc_path_follows_first_file() {
        assert_eq!(
            determine_doc_path(&changes_for("src/example.py")),
            "src/DOCUMENTATION.md"
        );
        assert_eq!(
            determine_doc_path(&changes_for("a/b/c.rs")),
            "a/b/DOCUMENTATION.md"
        );
        assert_eq!(determine_doc_path(&changes_for("main.go")), "DOCUMENTATION.md");
        assert_eq!(
            determine_doc_path(&StructuredChanges::default()),
            "README.md"
        );
    }

    #[test]
    fn test_pipeline_config_validation() {
        assert!(PipelineConfig::default().validate().is_ok());
        for bad in [-0.1, 1.01, f64::NAN] {
            let config = PipelineConfig {
                min_quality_threshold: bad,
                ..PipelineConfig::default()
            };
            assert!(matches!(
                config.validate(),
                Err(LivedocError::InvalidConfig(_))
            ));
        }
    }

    #[tokio::test]
    async fn test_from_default_config_uses_local_collaborators() {
        let orchestrator = Orchestrator::from_config(&LivedocConfig::default()).unwrap();
        assert_eq!(orchestrator.generator.name(), "template");
        assert_eq!(orchestrator.evaluator.name(), "heuristic");
        assert_eq!(orchestrator.sandbox().backend_name(), "disabled");
    }
}
