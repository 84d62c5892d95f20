//! Error types for the sandbox module.

use crate::domain::ServiceError;

/// Errors produced by the sandbox layer.
#[derive(Debug, thiserror::Error)]
pub enum SandboxError {
    #[error("snippet execution timed out (limit {limit_ms}ms)")]
    Timeout { limit_ms: u64 },

    #[error("snippet execution failed after {attempts} attempt(s): {reason}")]
    ExecutionFailed { attempts: u32, reason: String },

    #[error(
        "circuit breaker open: {consecutive_failures} consecutive failures (threshold {threshold})"
    )]
    CircuitBreakerOpen {
        consecutive_failures: u32,
        threshold: u32,
    },

    #[error("sandbox released")]
    Released,

    #[error("invalid sandbox configuration: {0}")]
    InvalidConfig(String),

    #[error("sandbox service error: {0}")]
    Service(#[from] ServiceError),
}

/// Result type for sandbox operations.
pub type SandboxResult<T> = std::result::Result<T, SandboxError>;
