//! Remote evaluation service client.
//!
//! `POST {base}/evaluate` with the draft, optional code context and snippet
//! runs. The service's own `overall_score` is ignored; scores go through
//! [`EvaluationResult::new`] like every other evaluator's.

use std::time::Duration;

use async_trait::async_trait;
use reqwest::Client;
use serde::{Deserialize, Serialize};

use super::QualityEvaluator;
use crate::domain::{EvaluationResult, ServiceError, SnippetRun};
use crate::http::{build_client, read_json, trim_base_url, REQUEST_TIMEOUT_SECS};

#[derive(Debug, Serialize)]
struct EvaluateRequest<'a> {
    documentation: &'a str,
    #[serde(skip_serializing_if = "Option::is_none")]
    code_context: Option<&'a str>,
    #[serde(skip_serializing_if = "Option::is_none")]
    code_snippets: Option<&'a [SnippetRun]>,
}

#[derive(Debug, Deserialize)]
struct EvaluateResponse {
    accuracy_score: f64,
    tone_score: f64,
    clarity_score: f64,
    #[serde(default)]
    feedback: Vec<String>,
    #[serde(default)]
    issues: Vec<String>,
}

#[derive(Clone)]
pub struct RemoteEvaluator {
    client: Client,
    base_url: String,
    api_key: Option<String>,
}

impl RemoteEvaluator {
    pub fn new(base_url: &str, api_key: Option<String>) -> Result<Self, ServiceError> {
        if base_url.trim().is_empty() {
            return Err(ServiceError::Unavailable("evaluator API URL not set".into()));
        }
        Ok(Self {
            client: build_client(Duration::from_secs(REQUEST_TIMEOUT_SECS))?,
            base_url: trim_base_url(base_url),
            api_key,
        })
    }
}

#[async_trait]
impl QualityEvaluator for RemoteEvaluator {
    fn name(&self) -> &'static str {
        "remote"
    }

    async fn evaluate(
        &self,
        documentation: &str,
        code_context: Option<&str>,
        runs: Option<&[SnippetRun]>,
    ) -> Result<EvaluationResult, ServiceError> {
        let url = format!("{}/evaluate", self.base_url);
        let mut request = self.client.post(&url).json(&EvaluateRequest {
            documentation,
            code_context,
            code_snippets: runs,
        });
        if let Some(key) = &self.api_key {
            request = request.bearer_auth(key);
        }

        let response = request.send().await?;
        let scored: EvaluateResponse = read_json(response).await?;
        Ok(into_result(scored))
    }
}

fn into_result(scored: EvaluateResponse) -> EvaluationResult {
    EvaluationResult::new(
        scored.accuracy_score,
        scored.tone_score,
        scored.clarity_score,
        scored.feedback,
        scored.issues,
    )
}
