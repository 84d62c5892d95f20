//! Sandbox executor: lazy sandbox lifecycle plus batched, controlled runs.

use std::collections::HashMap;
use std::sync::Arc;
use std::time::Duration;

use futures::stream::{self, StreamExt};
use tokio::sync::Mutex;
use tracing::{debug, info, warn};

use super::backend::{DisabledBackend, SandboxBackend, SandboxHandle};
use super::error::{SandboxError, SandboxResult};
use super::execution::{run_with_controls, CircuitBreaker, ExecutionControls};
use crate::domain::{ExecutionResult, Snippet};
use crate::metrics::METRICS;

/// Error text for snippets that could not run because no sandbox exists.
pub const CREATE_FAILED: &str = "Failed to create sandbox";

#[derive(Debug)]
enum SandboxState {
    Idle,
    Ready(SandboxHandle),
    Released,
}

/// Owns one sandbox for the lifetime of an orchestrator.
///
/// The sandbox is created on the first batch that has snippets. Creation is
/// serialized by the state mutex, so concurrent batches share one sandbox.
/// After [`release`](Self::release) the executor is closed and every further
/// snippet is reported as failed.
pub struct SandboxExecutor {
    backend: Arc<dyn SandboxBackend>,
    controls: ExecutionControls,
    breaker: CircuitBreaker,
    state: Mutex<SandboxState>,
}

impl SandboxExecutor {
    pub fn new(backend: Arc<dyn SandboxBackend>, controls: ExecutionControls) -> Self {
        let breaker = CircuitBreaker::new(controls.breaker_threshold);
        Self {
            backend,
            controls,
            breaker,
            state: Mutex::new(SandboxState::Idle),
        }
    }

    /// Executor whose snippets always fail with [`CREATE_FAILED`].
    pub fn disabled() -> Self {
        Self::new(Arc::new(DisabledBackend), ExecutionControls::default())
    }

    pub fn backend_name(&self) -> &'static str {
        self.backend.name()
    }

    /// `true` while a sandbox is live.
    pub async fn is_active(&self) -> bool {
        matches!(*self.state.lock().await, SandboxState::Ready(_))
    }

    /// Run every snippet and key the outcomes by snippet id.
    ///
    /// Never fails as a whole: each snippet gets a result, and a snippet that
    /// could not run gets an `exit_code` of -1 with the reason in `error`.
    pub async fn execute_all(&self, snippets: &[Snippet]) -> HashMap<String, ExecutionResult> {
        if snippets.is_empty() {
            return HashMap::new();
        }

        let handle = match self.acquire().await {
            Ok(handle) => handle,
            Err(err) => {
                let reason = match &err {
                    SandboxError::Released => err.to_string(),
                    _ => format!("{CREATE_FAILED}: {err}"),
                };
                warn!(
                    backend = self.backend.name(),
                    error = %err,
                    snippets = snippets.len(),
                    "sandbox unavailable, snippets not run"
                );
                return snippets
                    .iter()
                    .map(|snippet| {
                        METRICS.record_snippet(false);
                        (snippet.id.clone(), ExecutionResult::failed(reason.clone()))
                    })
                    .collect();
            }
        };

        // Breaker state is per batch.
        self.breaker.record_success();

        let handle = &handle;
        stream::iter(snippets)
            .map(|snippet| async move { (snippet.id.clone(), self.run_one(handle, snippet).await) })
            .buffer_unordered(self.controls.max_concurrency.max(1))
            .collect()
            .await
    }

    /// Destroy the sandbox if one was created. Idempotent.
    pub async fn release(&self) {
        let previous = std::mem::replace(&mut *self.state.lock().await, SandboxState::Released);
        if let SandboxState::Ready(handle) = previous {
            match self.backend.destroy(&handle).await {
                Ok(()) => info!(backend = self.backend.name(), sandbox_id = %handle.id, "sandbox released"),
                Err(err) => warn!(
                    backend = self.backend.name(),
                    sandbox_id = %handle.id,
                    error = %err,
                    "sandbox release failed"
                ),
            }
        }
    }

    async fn acquire(&self) -> SandboxResult<SandboxHandle> {
        let mut state = self.state.lock().await;
        match &*state {
            SandboxState::Ready(handle) => return Ok(handle.clone()),
            SandboxState::Released => return Err(SandboxError::Released),
            SandboxState::Idle => {}
        }

        let limit = Duration::from_millis(self.controls.timeout_ms);
        let handle = match tokio::time::timeout(limit, self.backend.create()).await {
            Ok(created) => created?,
            Err(_elapsed) => {
                return Err(SandboxError::Timeout {
                    limit_ms: self.controls.timeout_ms,
                })
            }
        };
        info!(backend = self.backend.name(), sandbox_id = %handle.id, "sandbox created");
        *state = SandboxState::Ready(handle.clone());
        Ok(handle)
    }

    async fn run_one(&self, handle: &SandboxHandle, snippet: &Snippet) -> ExecutionResult {
        let result = match run_with_controls(&self.controls, &self.breaker, || {
            self.backend.run(handle, snippet)
        })
        .await
        {
            Ok(controlled) => controlled.value,
            Err(err) => ExecutionResult::failed(err.to_string()),
        };

        METRICS.record_snippet(result.success);
        debug!(
            snippet_id = %snippet.id,
            language = %snippet.language,
            success = result.success,
            exit_code = result.exit_code,
            "snippet executed"
        );
        result
    }
}

impl Drop for SandboxExecutor {
    fn drop(&mut self) {
        let state = std::mem::replace(self.state.get_mut(), SandboxState::Released);
        let SandboxState::Ready(handle) = state else {
            return;
        };

        let backend = Arc::clone(&self.backend);
        match tokio::runtime::Handle::try_current() {
            Ok(runtime) => {
                runtime.spawn(async move {
                    if let Err(err) = backend.destroy(&handle).await {
                        warn!(sandbox_id = %handle.id, error = %err, "sandbox release on drop failed");
                    }
                });
            }
            Err(_) => warn!(sandbox_id = %handle.id, "no runtime to release sandbox on drop"),
        }
    }
}
