//! Local heuristic evaluator.
//!
//! Scores come from fixed keyword and structure checks; every constant lives
//! in [`HeuristicPolicy`] so deployments can tune them.

use async_trait::async_trait;
use serde::{Deserialize, Serialize};

use super::QualityEvaluator;
use crate::domain::{EvaluationResult, ServiceError, SnippetRun};

/// Weights and word lists used by [`HeuristicEvaluator`].
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct HeuristicPolicy {
    pub accuracy_base: f64,
    pub snippet_success_bonus: f64,
    pub snippet_failure_penalty: f64,
    pub code_mention_bonus: f64,

    pub tone_base: f64,
    pub professional_words: Vec<String>,
    pub professional_bonus: f64,
    pub unprofessional_words: Vec<String>,
    pub unprofessional_penalty: f64,

    pub clarity_base: f64,
    pub heading_bonus: f64,
    pub example_bonus: f64,
    pub length_bonus: f64,
    pub min_words: usize,
    pub max_words: usize,
}

impl Default for HeuristicPolicy {
    fn default() -> Self {
        Self {
            accuracy_base: 0.8,
            snippet_success_bonus: 0.05,
            snippet_failure_penalty: 0.1,
            code_mention_bonus: 0.05,
            tone_base: 0.7,
            professional_words: ["function", "method", "parameter", "returns", "example"]
                .map(String::from)
                .to_vec(),
            professional_bonus: 0.02,
            unprofessional_words: ["gonna", "wanna", "kinda", "yeah"]
                .map(String::from)
                .to_vec(),
            unprofessional_penalty: 0.05,
            clarity_base: 0.7,
            heading_bonus: 0.1,
            example_bonus: 0.1,
            length_bonus: 0.05,
            min_words: 50,
            max_words: 1000,
        }
    }
}

#[derive(Debug, Clone, Default)]
pub struct HeuristicEvaluator {
    policy: HeuristicPolicy,
}

impl HeuristicEvaluator {
    pub fn new(policy: HeuristicPolicy) -> Self {
        Self { policy }
    }

    pub fn policy(&self) -> &HeuristicPolicy {
        &self.policy
    }

    fn accuracy(&self, doc: &str, runs: Option<&[SnippetRun]>) -> f64 {
        let p = &self.policy;
        let mut score = p.accuracy_base;
        for run in runs.unwrap_or_default() {
            match &run.execution_result {
                Some(result) if result.success => score += p.snippet_success_bonus,
                Some(_) => score -= p.snippet_failure_penalty,
                None => {}
            }
        }
        if doc.contains("```") || doc.to_lowercase().contains("code") {
            score += p.code_mention_bonus;
        }
        score
    }

    fn tone(&self, doc: &str) -> f64 {
        let p = &self.policy;
        let lower = doc.to_lowercase();
        let hits = |words: &[String]| words.iter().filter(|w| lower.contains(w.as_str())).count();

        p.tone_base + hits(&p.professional_words) as f64 * p.professional_bonus
            - hits(&p.unprofessional_words) as f64 * p.unprofessional_penalty
    }

    fn clarity(&self, doc: &str) -> f64 {
        let p = &self.policy;
        let mut score = p.clarity_base;
        if doc.contains("# ") || doc.contains("## ") {
            score += p.heading_bonus;
        }
        if doc.to_lowercase().contains("example") || doc.contains("```") {
            score += p.example_bonus;
        }
        let words = doc.split_whitespace().count();
        if (p.min_words..=p.max_words).contains(&words) {
            score += p.length_bonus;
        }
        score
    }
}

#[async_trait]
impl QualityEvaluator for HeuristicEvaluator {
    fn name(&self) -> &'static str {
        "heuristic"
    }

    async fn evaluate(
        &self,
        documentation: &str,
        _code_context: Option<&str>,
        runs: Option<&[SnippetRun]>,
    ) -> Result<EvaluationResult, ServiceError> {
        Ok(EvaluationResult::new(
            self.accuracy(documentation, runs),
            self.tone(documentation),
            self.clarity(documentation),
            Vec::new(),
            Vec::new(),
        ))
    }
}
