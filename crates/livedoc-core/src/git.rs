//! Git integration: reading diffs and committing documentation.
//!
//! Shells out to the `git` binary. Every function takes the repository
//! directory explicitly; nothing here is called by the pipeline itself.

use std::path::{Component, Path};
use std::process::Command;

use chrono::{DateTime, FixedOffset};
use serde::{Deserialize, Serialize};

use crate::domain::{LivedocError, Result};

/// Default message for documentation commits.
pub const DEFAULT_COMMIT_MESSAGE: &str = "docs: Update documentation";

const FIELD_SEP: char = '\u{1f}';
const RECORD_SEP: char = '\u{1e}';

/// One entry from `git log`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CommitInfo {
    pub hash: String,
    pub message: String,
    pub author: String,
    pub date: DateTime<FixedOffset>,
}

fn git(repo_dir: &Path, args: &[&str]) -> Result<String> {
    let output = Command::new("git")
        .args(args)
        .current_dir(repo_dir)
        .output()
        .map_err(|e| LivedocError::GitError(format!("failed to run git: {e}")))?;

    if !output.status.success() {
        let stderr = String::from_utf8_lossy(&output.stderr);
        return Err(LivedocError::GitError(format!(
            "git {} failed: {}",
            args.first().copied().unwrap_or_default(),
            stderr.trim()
        )));
    }

    Ok(String::from_utf8_lossy(&output.stdout).into_owned())
}

/// Check whether a directory is inside a git work tree.
pub fn is_git_repo(dir: &Path) -> bool {
    Command::new("git")
        .args(["rev-parse", "--is-inside-work-tree"])
        .current_dir(dir)
        .output()
        .map(|o| o.status.success())
        .unwrap_or(false)
}

/// Capture the HEAD commit SHA.
pub fn capture_head_sha(repo_dir: &Path) -> Result<String> {
    let sha = git(repo_dir, &["rev-parse", "HEAD"])?.trim().to_string();
    if sha.is_empty() {
        return Err(LivedocError::GitError(
            "git rev-parse HEAD returned empty output".to_string(),
        ));
    }
    Ok(sha)
}

/// Diff of the working tree against `branch`.
pub fn diff_against(repo_dir: &Path, branch: &str) -> Result<String> {
    git(repo_dir, &["diff", branch])
}

/// Diff between two revisions (`from` → `to`).
pub fn diff_between(repo_dir: &Path, from: &str, to: &str) -> Result<String> {
    git(repo_dir, &["diff", from, to])
}

/// Unstaged changes in the working tree.
pub fn uncommitted_diff(repo_dir: &Path) -> Result<String> {
    git(repo_dir, &["diff"])
}

/// Write `content` to `rel_path`, stage it, and commit only that file.
///
/// Returns the new HEAD SHA. `rel_path` must stay inside the repository.
pub fn commit_documentation(
    repo_dir: &Path,
    rel_path: &str,
    content: &str,
    message: &str,
) -> Result<String> {
    let rel = Path::new(rel_path);
    let escapes = rel
        .components()
        .any(|c| !matches!(c, Component::Normal(_) | Component::CurDir));
    if rel_path.trim().is_empty() || escapes {
        return Err(LivedocError::GitError(format!(
            "documentation path must be relative to the repository: {rel_path}"
        )));
    }

    let full_path = repo_dir.join(rel);
    if let Some(parent) = full_path.parent() {
        std::fs::create_dir_all(parent)?;
    }
    std::fs::write(&full_path, content)?;

    git(repo_dir, &["add", "--", rel_path])?;
    git(repo_dir, &["commit", "-m", message, "--", rel_path])?;
    let sha = capture_head_sha(repo_dir)?;
    tracing::info!(path = %rel_path, sha = %sha, "documentation committed");
    Ok(sha)
}

/// The `limit` most recent commits reachable from HEAD, newest first.
pub fn recent_commits(repo_dir: &Path, limit: usize) -> Result<Vec<CommitInfo>> {
    let max_count = format!("--max-count={limit}");
    let format = format!("--format=%H{FIELD_SEP}%an{FIELD_SEP}%cI{FIELD_SEP}%B{RECORD_SEP}");
    let raw = git(repo_dir, &["log", &max_count, &format])?;

    raw.split(RECORD_SEP)
        .map(str::trim)
        .filter(|record| !record.is_empty())
        .map(parse_commit)
        .collect()
}

fn parse_commit(record: &str) -> Result<CommitInfo> {
    let mut fields = record.splitn(4, FIELD_SEP);
    let (Some(hash), Some(author), Some(date), Some(message)) =
        (fields.next(), fields.next(), fields.next(), fields.next())
    else {
        return Err(LivedocError::GitError(format!(
            "unexpected git log record: {record:?}"
        )));
    };

    let date = DateTime::parse_from_rfc3339(date.trim())
        .map_err(|e| LivedocError::GitError(format!("bad commit date {date:?}: {e}")))?;

    Ok(CommitInfo {
        hash: hash.trim().to_string(),
        message: message.trim().to_string(),
        author: author.to_string(),
        date,
    })
}
