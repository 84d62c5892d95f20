//! Trace of one pipeline run: attempts, scores, and why the loop stopped.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Why the self-correction loop ended.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum StopReason {
    /// The diff had no file sections; nothing was drafted.
    NoChanges,
    /// The score met the threshold.
    QualityMet,
    /// `max_self_correction_attempts` revisions were used.
    AttemptsExhausted,
    /// A revision call failed; the previous draft was kept.
    RevisionFailed,
}

/// One evaluated draft. Attempt 0 is the initial draft.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AttemptRecord {
    pub attempt: u32,
    pub accuracy_score: f64,
    pub tone_score: f64,
    pub clarity_score: f64,
    pub overall_score: f64,
    pub issues: Vec<String>,
    pub snippets_total: usize,
    pub snippets_failed: usize,
}

/// Full record of a pipeline run, for logs and report artifacts.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PipelineRun {
    pub run_id: String,
    pub repo_path: String,
    pub file_path: String,
    pub draft_fallback: bool,
    pub attempts: Vec<AttemptRecord>,
    pub revisions_used: u32,
    pub stop_reason: StopReason,
    pub final_score: f64,
    pub ready_to_commit: bool,
    pub started_at: DateTime<Utc>,
    pub finished_at: DateTime<Utc>,
}

impl PipelineRun {
    pub fn duration_ms(&self) -> u64 {
        (self.finished_at - self.started_at)
            .num_milliseconds()
            .max(0) as u64
    }
}
