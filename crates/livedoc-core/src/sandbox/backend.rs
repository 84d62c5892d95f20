//! Sandbox backend seam.

use async_trait::async_trait;

use crate::domain::{ExecutionResult, ServiceError, Snippet};

/// Identifies one live sandbox environment within a backend.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SandboxHandle {
    pub id: String,
}

/// An isolated environment that can run snippets.
///
/// `run` returns `Ok` for any snippet the backend managed to execute, even
/// when the snippet itself exited non-zero. `Err` means the backend could not
/// run it at all, and is what the retry and breaker controls react to.
#[async_trait]
pub trait SandboxBackend: Send + Sync {
    /// Short name used in logs.
    fn name(&self) -> &'static str;

    async fn create(&self) -> Result<SandboxHandle, ServiceError>;

    async fn run(
        &self,
        handle: &SandboxHandle,
        snippet: &Snippet,
    ) -> Result<ExecutionResult, ServiceError>;

    async fn destroy(&self, handle: &SandboxHandle) -> Result<(), ServiceError>;
}

/// Backend for deployments without a sandbox: creation always fails, so
/// every snippet is reported as not run.
#[derive(Debug, Default, Clone, Copy)]
pub struct DisabledBackend;

#[async_trait]
impl SandboxBackend for DisabledBackend {
    fn name(&self) -> &'static str {
        "disabled"
    }

    async fn create(&self) -> Result<SandboxHandle, ServiceError> {
        Err(ServiceError::Unavailable("sandbox backend disabled".into()))
    }

    async fn run(
        &self,
        _handle: &SandboxHandle,
        _snippet: &Snippet,
    ) -> Result<ExecutionResult, ServiceError> {
        Err(ServiceError::Unavailable("sandbox backend disabled".into()))
    }

    async fn destroy(&self, _handle: &SandboxHandle) -> Result<(), ServiceError> {
        Ok(())
    }
}
