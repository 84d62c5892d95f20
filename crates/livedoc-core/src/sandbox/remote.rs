//! Remote sandbox service backend.
//!
//! Talks to a sandbox service over HTTP:
//! `POST {base}/sandboxes` creates, `POST {base}/sandboxes/{id}/execute`
//! runs one snippet, `DELETE {base}/sandboxes/{id}` tears down.

use std::time::Duration;

use async_trait::async_trait;
use reqwest::{Client, RequestBuilder};
use serde::{Deserialize, Serialize};

use super::backend::{SandboxBackend, SandboxHandle};
use crate::domain::{ExecutionResult, ServiceError, Snippet};
use crate::http::{build_client, check_status, read_json, trim_base_url, REQUEST_TIMEOUT_SECS};

#[derive(Debug, Serialize)]
struct CreateRequest<'a> {
    language: &'a str,
}

#[derive(Debug, Deserialize)]
struct CreateResponse {
    id: String,
}

#[derive(Debug, Serialize)]
struct ExecuteRequest<'a> {
    code: &'a str,
    language: &'a str,
}

#[derive(Debug, Deserialize)]
struct ExecuteResponse {
    exit_code: i32,
    #[serde(default, alias = "result")]
    output: String,
    #[serde(default)]
    error: Option<String>,
}

/// HTTP client for a hosted sandbox service.
#[derive(Clone)]
pub struct RemoteSandboxBackend {
    client: Client,
    base_url: String,
    api_key: Option<String>,
}

impl RemoteSandboxBackend {
    pub fn new(base_url: &str, api_key: Option<String>) -> Result<Self, ServiceError> {
        Self::with_timeout(base_url, api_key, Duration::from_secs(REQUEST_TIMEOUT_SECS))
    }

    pub fn with_timeout(
        base_url: &str,
        api_key: Option<String>,
        timeout: Duration,
    ) -> Result<Self, ServiceError> {
        if base_url.trim().is_empty() {
            return Err(ServiceError::Unavailable("sandbox API URL not set".into()));
        }
        Ok(Self {
            client: build_client(timeout)?,
            base_url: trim_base_url(base_url),
            api_key,
        })
    }

    fn authorized(&self, request: RequestBuilder) -> RequestBuilder {
        match &self.api_key {
            Some(key) => request.bearer_auth(key),
            None => request,
        }
    }
}

#[async_trait]
impl SandboxBackend for RemoteSandboxBackend {
    fn name(&self) -> &'static str {
        "remote"
    }

    async fn create(&self) -> Result<SandboxHandle, ServiceError> {
        let url = format!("{}/sandboxes", self.base_url);
        let response = self
            .authorized(self.client.post(&url))
            .json(&CreateRequest { language: "python" })
            .send()
            .await?;
        let created: CreateResponse = read_json(response).await?;
        tracing::debug!(sandbox_id = %created.id, "remote sandbox created");
        Ok(SandboxHandle { id: created.id })
    }

    async fn run(
        &self,
        handle: &SandboxHandle,
        snippet: &Snippet,
    ) -> Result<ExecutionResult, ServiceError> {
        let url = format!("{}/sandboxes/{}/execute", self.base_url, handle.id);
        let response = self
            .authorized(self.client.post(&url))
            .json(&ExecuteRequest {
                code: &snippet.code,
                language: &snippet.language,
            })
            .send()
            .await?;
        let executed: ExecuteResponse = read_json(response).await?;
        Ok(ExecutionResult::completed(
            executed.exit_code,
            executed.output,
            executed.error,
        ))
    }

    async fn destroy(&self, handle: &SandboxHandle) -> Result<(), ServiceError> {
        let url = format!("{}/sandboxes/{}", self.base_url, handle.id);
        let response = self.authorized(self.client.delete(&url)).send().await?;
        check_status(response).await?;
        tracing::debug!(sandbox_id = %handle.id, "remote sandbox deleted");
        Ok(())
    }
}
