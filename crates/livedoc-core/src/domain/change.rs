//! Structured change records produced from a unified diff.

use std::collections::{BTreeMap, BTreeSet};

use serde::{Deserialize, Serialize};

/// Kind of change applied to a file.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ChangeType {
    Added,
    Modified,
    Deleted,
}

impl std::fmt::Display for ChangeType {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let s = match self {
            ChangeType::Added => "added",
            ChangeType::Modified => "modified",
            ChangeType::Deleted => "deleted",
        };
        f.write_str(s)
    }
}

/// Coarse size bucket for a file's change.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Complexity {
    Low,
    Medium,
    High,
}

impl Complexity {
    /// Bucket a total changed-line count: `< 10` low, `< 50` medium, else high.
    pub fn from_changed_lines(total: usize) -> Self {
        if total < 10 {
            Complexity::Low
        } else if total < 50 {
            Complexity::Medium
        } else {
            Complexity::High
        }
    }
}

impl std::fmt::Display for Complexity {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let s = match self {
            Complexity::Low => "low",
            Complexity::Medium => "medium",
            Complexity::High => "high",
        };
        f.write_str(s)
    }
}

/// One file section of a diff.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ChangeRecord {
    pub file_path: String,
    pub change_type: ChangeType,
    pub lines_added: Vec<String>,
    pub lines_removed: Vec<String>,
    pub language: String,
    pub complexity: Complexity,
    pub summary: String,
}

impl ChangeRecord {
    /// Build a record, deriving language, complexity and summary.
    pub fn new(
        file_path: impl Into<String>,
        change_type: ChangeType,
        lines_added: Vec<String>,
        lines_removed: Vec<String>,
    ) -> Self {
        let file_path = file_path.into();
        let language = detect_language(&file_path).to_string();
        let complexity = Complexity::from_changed_lines(lines_added.len() + lines_removed.len());
        let summary = summarize(&lines_added, &lines_removed);
        Self {
            file_path,
            change_type,
            lines_added,
            lines_removed,
            language,
            complexity,
            summary,
        }
    }

    /// Total number of changed lines.
    pub fn changed_lines(&self) -> usize {
        self.lines_added.len() + self.lines_removed.len()
    }
}

/// Map a file path to a language name by extension.
///
/// Unmatched extensions yield `"unknown"`.
pub fn detect_language(file_path: &str) -> &'static str {
    const EXTENSIONS: &[(&str, &str)] = &[
        (".py", "python"),
        (".js", "javascript"),
        (".ts", "typescript"),
        (".java", "java"),
        (".cpp", "cpp"),
        (".c", "c"),
        (".go", "go"),
        (".rs", "rust"),
        (".rb", "ruby"),
        (".php", "php"),
        (".md", "markdown"),
        (".json", "json"),
        (".yaml", "yaml"),
        (".yml", "yaml"),
    ];

    EXTENSIONS
        .iter()
        .find(|(ext, _)| file_path.ends_with(ext))
        .map(|(_, lang)| *lang)
        .unwrap_or("unknown")
}

fn summarize(added: &[String], removed: &[String]) -> String {
    match (added.is_empty(), removed.is_empty()) {
        (true, true) => "No changes detected".to_string(),
        (false, true) => format!("Added {} lines", added.len()),
        (true, false) => format!("Removed {} lines", removed.len()),
        (false, false) => format!(
            "Modified: {} lines added, {} lines removed",
            added.len(),
            removed.len()
        ),
    }
}

/// Aggregate figures over all change records.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ChangeAnalysis {
    pub total_files: usize,
    pub total_lines_added: usize,
    pub total_lines_removed: usize,
    pub languages: BTreeSet<String>,
    pub complexity_counts: BTreeMap<Complexity, usize>,
}

/// Normalized output of the change structurer.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct StructuredChanges {
    pub total_changes: usize,
    pub changes: Vec<ChangeRecord>,
    pub analysis: ChangeAnalysis,
}

impl StructuredChanges {
    /// Wrap records and compute the aggregate analysis.
    pub fn from_records(changes: Vec<ChangeRecord>) -> Self {
        let mut analysis = ChangeAnalysis {
            total_files: changes.len(),
            ..ChangeAnalysis::default()
        };
        for change in &changes {
            analysis.total_lines_added += change.lines_added.len();
            analysis.total_lines_removed += change.lines_removed.len();
            analysis.languages.insert(change.language.clone());
            *analysis
                .complexity_counts
                .entry(change.complexity)
                .or_insert(0) += 1;
        }

        Self {
            total_changes: changes.len(),
            changes,
            analysis,
        }
    }

    pub fn is_empty(&self) -> bool {
        self.changes.is_empty()
    }

    /// JSON rendering passed to the evaluator as code context.
    pub fn to_context_json(&self) -> String {
        serde_json::to_string(self).unwrap_or_default()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn lines(n: usize) -> Vec<String> {
        (0..n).map(|i| format!("line {i}")).collect()
    }

    #[test]
    fn test_complexity_thresholds_are_exact() {
        assert_eq!(Complexity::from_changed_lines(0), Complexity::Low);
        assert_eq!(Complexity::from_changed_lines(9), Complexity::Low);
        assert_eq!(Complexity::from_changed_lines(10), Complexity::Medium);
        assert_eq!(Complexity::from_changed_lines(49), Complexity::Medium);
        assert_eq!(Complexity::from_changed_lines(50), Complexity::High);
    }

    #[test]
    fn test_detect_language() {
        assert_eq!(detect_language("src/example.py"), "python");
        assert_eq!(detect_language("config/app.yml"), "yaml");
        assert_eq!(detect_language("lib/main.rs"), "rust");
        assert_eq!(detect_language("Makefile"), "unknown");
    }

    #[test]
    fn test_summary_variants() {
        let rec = ChangeRecord::new("a.py", ChangeType::Modified, vec![], vec![]);
        assert_eq!(rec.summary, "No changes detected");

        let rec = ChangeRecord::new("a.py", ChangeType::Added, lines(2), vec![]);
        assert_eq!(rec.summary, "Added 2 lines");

        let rec = ChangeRecord::new("a.py", ChangeType::Deleted, vec![], lines(4));
        assert_eq!(rec.summary, "Removed 4 lines");

        let rec = ChangeRecord::new("a.py", ChangeType::Modified, lines(3), lines(1));
        assert_eq!(rec.summary, "Modified: 3 lines added, 1 lines removed");
    }

    #[test]
    fn test_complexity_counts_both_directions() {
        let rec = ChangeRecord::new("a.go", ChangeType::Modified, lines(5), lines(5));
        assert_eq!(rec.changed_lines(), 10);
        assert_eq!(rec.complexity, Complexity::Medium);
    }

    #[test]
    fn test_analysis_aggregates_records() {
        let structured = StructuredChanges::from_records(vec![
            ChangeRecord::new("a.py", ChangeType::Modified, lines(3), lines(1)),
            ChangeRecord::new("b.py", ChangeType::Added, lines(60), vec![]),
            ChangeRecord::new("c.ts", ChangeType::Modified, lines(1), vec![]),
        ]);

        assert_eq!(structured.total_changes, 3);
        assert_eq!(structured.analysis.total_files, 3);
        assert_eq!(structured.analysis.total_lines_added, 64);
        assert_eq!(structured.analysis.total_lines_removed, 1);
        assert_eq!(
            structured.analysis.languages.iter().collect::<Vec<_>>(),
            vec!["python", "typescript"]
        );
        assert_eq!(structured.analysis.complexity_counts[&Complexity::Low], 2);
        assert_eq!(structured.analysis.complexity_counts[&Complexity::High], 1);
        assert!(!structured
            .analysis
            .complexity_counts
            .contains_key(&Complexity::Medium));
    }

    #[test]
    fn test_context_json_uses_snake_case_enums() {
        let structured = StructuredChanges::from_records(vec![ChangeRecord::new(
            "a.py",
            ChangeType::Modified,
            lines(1),
            vec![],
        )]);
        let json = structured.to_context_json();
        assert!(json.contains("\"change_type\":\"modified\""));
        assert!(json.contains("\"complexity_counts\":{\"low\":1}"));
    }
}
