//! Shared plumbing for the HTTP collaborators.

use std::time::Duration;

use reqwest::{Client, Response};
use serde::de::DeserializeOwned;

use crate::domain::ServiceError;

/// Default per-request timeout for remote collaborators.
pub const REQUEST_TIMEOUT_SECS: u64 = 60;

pub(crate) fn build_client(timeout: Duration) -> Result<Client, ServiceError> {
    Client::builder()
        .timeout(timeout)
        .build()
        .map_err(|e| ServiceError::Transport(format!("failed to create HTTP client: {e}")))
}

/// Turn a non-success status into `ServiceError::Http` carrying the body.
pub(crate) async fn check_status(response: Response) -> Result<Response, ServiceError> {
    let status = response.status();
    if status.is_success() {
        return Ok(response);
    }
    let body = response.text().await.unwrap_or_default();
    Err(ServiceError::Http {
        status: status.as_u16(),
        body,
    })
}

pub(crate) async fn read_json<T: DeserializeOwned>(response: Response) -> Result<T, ServiceError> {
    let response = check_status(response).await?;
    response
        .json::<T>()
        .await
        .map_err(|e| ServiceError::InvalidResponse(e.to_string()))
}

pub(crate) fn trim_base_url(url: &str) -> String {
    url.trim_end_matches('/').to_string()
}
