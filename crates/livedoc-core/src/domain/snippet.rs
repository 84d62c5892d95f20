//! Executable snippets and their sandbox outcomes.

use serde::{Deserialize, Serialize};

/// Where a snippet was taken from.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SnippetSource {
    /// A fenced code block in the documentation draft.
    Documentation,
    /// Added lines taken straight from a change record.
    CodeChange,
}

/// A piece of code isolated for sandboxed execution.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Snippet {
    /// Unique within one pipeline run.
    pub id: String,
    pub code: String,
    pub language: String,
    pub source: SnippetSource,
}

/// Outcome of running one snippet.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ExecutionResult {
    pub success: bool,
    pub exit_code: i32,
    pub output: String,
    pub error: Option<String>,
}

impl ExecutionResult {
    /// Result for a finished process; success iff `exit_code == 0`.
    pub fn completed(exit_code: i32, output: impl Into<String>, error: Option<String>) -> Self {
        Self {
            success: exit_code == 0,
            exit_code,
            output: output.into(),
            error,
        }
    }

    /// Result for a snippet that could not be run at all.
    pub fn failed(reason: impl Into<String>) -> Self {
        Self {
            success: false,
            exit_code: -1,
            output: String::new(),
            error: Some(reason.into()),
        }
    }
}

/// A snippet paired with the result of the current iteration's execution.
///
/// `execution_result` is `None` when the executor returned nothing for the
/// snippet id.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SnippetRun {
    #[serde(flatten)]
    pub snippet: Snippet,
    pub execution_result: Option<ExecutionResult>,
}

impl SnippetRun {
    pub fn succeeded(&self) -> bool {
        self.execution_result
            .as_ref()
            .map(|r| r.success)
            .unwrap_or(false)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_completed_success_tracks_exit_code() {
        assert!(ExecutionResult::completed(0, "ok", None).success);
        let failed = ExecutionResult::completed(2, "", Some("boom".to_string()));
        assert!(!failed.success);
        assert_eq!(failed.exit_code, 2);
    }

    #[test]
    fn test_failed_defaults() {
        let result = ExecutionResult::failed("Failed to create sandbox");
        assert!(!result.success);
        assert_eq!(result.exit_code, -1);
        assert!(result.output.is_empty());
        assert_eq!(result.error.as_deref(), Some("Failed to create sandbox"));
    }

    #[test]
    fn test_snippet_run_serializes_flat() {
        let run = SnippetRun {
            snippet: Snippet {
                id: "snippet_0".to_string(),
                code: "print(1)".to_string(),
                language: "python".to_string(),
                source: SnippetSource::Documentation,
            },
            execution_result: None,
        };
        let value = serde_json::to_value(&run).expect("serialize");
        assert_eq!(value["id"], "snippet_0");
        assert_eq!(value["source"], "documentation");
        assert!(value["execution_result"].is_null());
        assert!(!run.succeeded());
    }
}
