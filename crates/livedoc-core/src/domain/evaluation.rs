//! Quality evaluation result for a documentation draft.

use serde::Serialize;

/// Sub-scores below this value must come with actionable issues and feedback.
pub const ACTIONABLE_SCORE: f64 = 0.7;

/// Quality dimensions scored by an evaluator.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Dimension {
    Accuracy,
    Tone,
    Clarity,
}

impl Dimension {
    /// Generic issue used when an evaluator reports a low score without one.
    pub fn default_issue(self) -> &'static str {
        match self {
            Dimension::Accuracy => "Documentation may contain inaccuracies",
            Dimension::Tone => "Tone may not be appropriate",
            Dimension::Clarity => "Documentation clarity could be improved",
        }
    }

    /// Generic feedback used when an evaluator reports a low score without any.
    pub fn default_feedback(self) -> &'static str {
        match self {
            Dimension::Accuracy => "Review code examples for correctness",
            Dimension::Tone => "Consider making the tone more professional and clear",
            Dimension::Clarity => "Add more examples and explanations",
        }
    }
}

/// Scores and findings for one draft.
///
/// Only constructible through [`EvaluationResult::new`], which clamps every
/// sub-score into `[0, 1]`, sets `overall_score` to their mean, and fills in
/// generic issues/feedback for low scores the evaluator left unexplained.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct EvaluationResult {
    accuracy_score: f64,
    tone_score: f64,
    clarity_score: f64,
    overall_score: f64,
    feedback: Vec<String>,
    issues: Vec<String>,
}

impl EvaluationResult {
    pub fn new(
        accuracy: f64,
        tone: f64,
        clarity: f64,
        feedback: Vec<String>,
        issues: Vec<String>,
    ) -> Self {
        let accuracy_score = clamp_unit(accuracy);
        let tone_score = clamp_unit(tone);
        let clarity_score = clamp_unit(clarity);
        let overall_score = (accuracy_score + tone_score + clarity_score) / 3.0;

        let mut result = Self {
            accuracy_score,
            tone_score,
            clarity_score,
            overall_score,
            feedback,
            issues,
        };
        result.fill_missing_findings();
        result
    }

    pub fn accuracy_score(&self) -> f64 {
        self.accuracy_score
    }

    pub fn tone_score(&self) -> f64 {
        self.tone_score
    }

    pub fn clarity_score(&self) -> f64 {
        self.clarity_score
    }

    /// Mean of the three sub-scores.
    pub fn overall_score(&self) -> f64 {
        self.overall_score
    }

    pub fn feedback(&self) -> &[String] {
        &self.feedback
    }

    pub fn issues(&self) -> &[String] {
        &self.issues
    }

    /// Dimensions scoring below [`ACTIONABLE_SCORE`].
    pub fn low_dimensions(&self) -> Vec<Dimension> {
        [
            (Dimension::Accuracy, self.accuracy_score),
            (Dimension::Tone, self.tone_score),
            (Dimension::Clarity, self.clarity_score),
        ]
        .into_iter()
        .filter(|(_, score)| *score < ACTIONABLE_SCORE)
        .map(|(dim, _)| dim)
        .collect()
    }

    fn fill_missing_findings(&mut self) {
        let low = self.low_dimensions();
        if low.is_empty() {
            return;
        }
        if self.issues.is_empty() {
            self.issues = low.iter().map(|d| d.default_issue().to_string()).collect();
        }
        if self.feedback.is_empty() {
            self.feedback = low
                .iter()
                .map(|d| d.default_feedback().to_string())
                .collect();
        }
    }
}

fn clamp_unit(score: f64) -> f64 {
    if score.is_nan() {
        0.0
    } else {
        score.clamp(0.0, 1.0)
    }
}
