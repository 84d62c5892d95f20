//! Google Gemini generator.
//!
//! Sends one-shot prompts to the `generateContent` REST endpoint and returns
//! the concatenated text parts of the first candidate.

use std::time::Duration;

use async_trait::async_trait;
use reqwest::Client;
use serde::{Deserialize, Serialize};

use super::DraftGenerator;
use crate::domain::{EvaluationResult, ServiceError, StructuredChanges};
use crate::http::{build_client, read_json, trim_base_url, REQUEST_TIMEOUT_SECS};

pub const DEFAULT_GEMINI_BASE_URL: &str = "https://generativelanguage.googleapis.com/v1beta";
pub const DEFAULT_GEMINI_MODEL: &str = "gemini-2.0-flash";

#[derive(Debug, Serialize)]
struct GenerateRequest {
    contents: Vec<Content>,
}

#[derive(Debug, Serialize, Deserialize)]
struct Content {
    #[serde(default)]
    parts: Vec<Part>,
}

#[derive(Debug, Serialize, Deserialize)]
struct Part {
    #[serde(default)]
    text: String,
}

#[derive(Debug, Deserialize)]
struct GenerateResponse {
    #[serde(default)]
    candidates: Vec<Candidate>,
}

#[derive(Debug, Deserialize)]
struct Candidate {
    content: Content,
}

/// Draft generator backed by the Gemini API.
#[derive(Clone)]
pub struct GeminiGenerator {
    client: Client,
    api_key: String,
    model: String,
    base_url: String,
}

impl GeminiGenerator {
    pub fn new(api_key: impl Into<String>) -> Result<Self, ServiceError> {
        let api_key = api_key.into();
        if api_key.trim().is_empty() {
            return Err(ServiceError::Unavailable("Gemini API key not set".into()));
        }
        Ok(Self {
            client: build_client(Duration::from_secs(REQUEST_TIMEOUT_SECS))?,
            api_key,
            model: DEFAULT_GEMINI_MODEL.to_string(),
            base_url: DEFAULT_GEMINI_BASE_URL.to_string(),
        })
    }

    pub fn with_model(mut self, model: impl Into<String>) -> Self {
        self.model = model.into();
        self
    }

    pub fn with_base_url(mut self, base_url: &str) -> Self {
        self.base_url = trim_base_url(base_url);
        self
    }

    pub fn model(&self) -> &str {
        &self.model
    }

    async fn generate(&self, prompt: String) -> Result<String, ServiceError> {
        let url = format!(
            "{}/models/{}:generateContent?key={}",
            self.base_url, self.model, self.api_key
        );
        let request = GenerateRequest {
            contents: vec![Content {
                parts: vec![Part { text: prompt }],
            }],
        };

        tracing::debug!(model = %self.model, "sending request to Gemini API");
        let response = self
            .client
            .post(&url)
            .header("content-type", "application/json")
            .json(&request)
            .send()
            .await?;
        let generated: GenerateResponse = read_json(response).await?;

        let text = generated
            .candidates
            .into_iter()
            .next()
            .map(|c| {
                c.content
                    .parts
                    .into_iter()
                    .map(|p| p.text)
                    .collect::<String>()
            })
            .unwrap_or_default();

        if text.trim().is_empty() {
            return Err(ServiceError::InvalidResponse(
                "Gemini returned no text".into(),
            ));
        }
        Ok(text)
    }
}

#[async_trait]
impl DraftGenerator for GeminiGenerator {
    fn name(&self) -> &'static str {
        "gemini"
    }

    async fn draft(&self, structured: &StructuredChanges) -> Result<String, ServiceError> {
        self.generate(draft_prompt(structured)?).await
    }

    async fn revise(
        &self,
        previous: &str,
        evaluation: &EvaluationResult,
    ) -> Result<String, ServiceError> {
        self.generate(revision_prompt(previous, evaluation)).await
    }
}

pub(crate) fn draft_prompt(structured: &StructuredChanges) -> Result<String, ServiceError> {
    let changes = serde_json::to_string_pretty(structured)
        .map_err(|e| ServiceError::InvalidResponse(format!("cannot encode changes: {e}")))?;
    Ok(format!(
        "You are a technical documentation expert. Generate clear, accurate documentation \
for the following code changes:

{changes}

Requirements:
1. Write clear, professional documentation
2. Include code examples where relevant
3. Explain what changed and why
4. Use proper markdown formatting
5. Include code snippets in markdown code blocks

Generate the documentation:"
    ))
}

pub(crate) fn revision_prompt(previous: &str, evaluation: &EvaluationResult) -> String {
    format!(
        "The following documentation was evaluated and received a score of {score:.2}.

Issues identified:
{issues}

Feedback:
{feedback}

Original documentation:
{previous}

Please revise the documentation to address these issues. Generate improved documentation:",
        score = evaluation.overall_score(),
        issues = evaluation.issues().join("\n"),
        feedback = evaluation.feedback().join("\n"),
    )
}
