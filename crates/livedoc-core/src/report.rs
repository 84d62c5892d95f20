//! Run report artifacts with content digests.
//!
//! Layout: `<dir>/<run_id>/report.json` plus `report.digest`, the SHA-256 of
//! the JSON bytes in hex. Reading verifies the digest.

use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};
use sha2::{Digest, Sha256};

use crate::domain::{DocumentationUpdate, LivedocError, PipelineRun, Result};

const REPORT_FILE: &str = "report.json";
const DIGEST_FILE: &str = "report.digest";

/// A finished run and the documentation it produced.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RunReport {
    pub run: PipelineRun,
    pub documentation: String,
}

impl RunReport {
    pub fn new(run: PipelineRun, update: &DocumentationUpdate) -> Self {
        Self {
            run,
            documentation: update.content().to_string(),
        }
    }
}

/// Hex-encoded SHA-256 of `bytes`.
pub fn sha256_hex(bytes: &[u8]) -> String {
    hex::encode(Sha256::digest(bytes))
}

/// Persist a report; returns the path of `report.json`.
pub fn write_run_report(report: &RunReport, dir: &Path) -> Result<PathBuf> {
    let run_dir = dir.join(&report.run.run_id);
    std::fs::create_dir_all(&run_dir)?;

    let report_path = run_dir.join(REPORT_FILE);
    let json = serde_json::to_vec_pretty(report)?;
    std::fs::write(&report_path, &json)?;
    std::fs::write(run_dir.join(DIGEST_FILE), sha256_hex(&json))?;

    tracing::debug!(run_id = %report.run.run_id, path = %report_path.display(), "run report written");
    Ok(report_path)
}

/// Read and verify `<dir>/<run_id>/report.json`.
pub fn read_run_report(run_id: &str, dir: &Path) -> Result<RunReport> {
    let run_dir = dir.join(run_id);
    let json = std::fs::read(run_dir.join(REPORT_FILE))?;
    let expected = std::fs::read_to_string(run_dir.join(DIGEST_FILE))?;
    let expected = expected.trim();

    let actual = sha256_hex(&json);
    if expected != actual {
        return Err(LivedocError::DigestMismatch {
            expected: expected.to_string(),
            actual,
        });
    }

    Ok(serde_json::from_slice(&json)?)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::{AttemptRecord, StopReason};
    use chrono::Utc;

    fn sample_report() -> RunReport {
        let now = Utc::now();
        RunReport {
            run: PipelineRun {
                run_id: "run-1".to_string(),
                repo_path: ".".to_string(),
                file_path: "src/DOCUMENTATION.md".to_string(),
                draft_fallback: true,
                attempts: vec![AttemptRecord {
                    attempt: 0,
                    accuracy_score: 0.9,
                    tone_score: 0.7,
                    clarity_score: 0.8,
                    overall_score: 0.8,
                    issues: vec![],
                    snippets_total: 2,
                    snippets_failed: 0,
                }],
                revisions_used: 0,
                stop_reason: StopReason::QualityMet,
                final_score: 0.8,
                ready_to_commit: true,
                started_at: now,
                finished_at: now,
            },
            documentation: "# Documentation Update\n".to_string(),
        }
    }

    #[test]
    fn test_sha256_hex_known_value() {
        assert_eq!(
            sha256_hex(b""),
            "e3b0c44298fc1c149afbf4c8996fb92427ae41e4649b934ca495991b7852b855"
        );
    }

    #[test]
    fn test_write_then_read_verifies() {
        let dir = tempfile::tempdir().unwrap();
        let report = sample_report();
        let path = write_run_report(&report, dir.path()).unwrap();
        assert!(path.ends_with("run-1/report.json"));

        let back = read_run_report("run-1", dir.path()).unwrap();
        assert_eq!(back, report);
    }

    #[test]
    fn test_tampered_report_is_rejected() {
        let dir = tempfile::tempdir().unwrap();
        let path = write_run_report(&sample_report(), dir.path()).unwrap();

        let tampered = std::fs::read_to_string(&path)
            .unwrap()
            .replace("\"ready_to_commit\": true", "\"ready_to_commit\": false");
        std::fs::write(&path, tampered).unwrap();

        let err = read_run_report("run-1", dir.path()).unwrap_err();
        assert!(matches!(err, LivedocError::DigestMismatch { .. }));
    }

    #[test]
    fn test_missing_report_is_io_error() {
        let dir = tempfile::tempdir().unwrap();
        let err = read_run_report("absent", dir.path()).unwrap_err();
        assert!(matches!(err, LivedocError::Io(_)));
    }
}
