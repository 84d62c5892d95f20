//! Execution controls: timeout, retry with exponential backoff, circuit breaker.

use std::fmt::Display;
use std::future::Future;
use std::sync::atomic::{AtomicU32, Ordering};
use std::time::Duration;

use serde::{Deserialize, Serialize};

use super::error::{SandboxError, SandboxResult};

/// Limits applied to every call into a sandbox backend.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(default)]
pub struct ExecutionControls {
    /// Maximum wall-clock time for a single attempt (milliseconds).
    pub timeout_ms: u64,
    /// Maximum number of retries (0 = no retries, run once).
    pub max_retries: u32,
    /// Base delay for exponential backoff between retries (milliseconds).
    pub backoff_base_ms: u64,
    /// Consecutive failures after which remaining calls are short-circuited.
    pub breaker_threshold: u32,
    /// Snippets of one batch running at the same time.
    pub max_concurrency: usize,
}

impl Default for ExecutionControls {
    fn default() -> Self {
        Self {
            timeout_ms: 30_000,
            max_retries: 2,
            backoff_base_ms: 500,
            breaker_threshold: 5,
            max_concurrency: 4,
        }
    }
}

impl ExecutionControls {
    pub fn validate(&self) -> SandboxResult<()> {
        if self.timeout_ms == 0 {
            return Err(SandboxError::InvalidConfig(
                "timeout_ms must be greater than zero".into(),
            ));
        }
        if self.breaker_threshold == 0 {
            return Err(SandboxError::InvalidConfig(
                "breaker_threshold must be greater than zero".into(),
            ));
        }
        if self.max_concurrency == 0 {
            return Err(SandboxError::InvalidConfig(
                "max_concurrency must be greater than zero".into(),
            ));
        }
        Ok(())
    }

    fn backoff(&self, attempt: u32) -> Duration {
        let factor = 2u64.saturating_pow(attempt.saturating_sub(1));
        Duration::from_millis(self.backoff_base_ms.saturating_mul(factor))
    }
}

/// Atomic circuit breaker that opens after N consecutive failures.
///
/// Thread-safe via `AtomicU32`. Resets on success.
#[derive(Debug)]
pub struct CircuitBreaker {
    consecutive_failures: AtomicU32,
    threshold: u32,
}

impl CircuitBreaker {
    pub fn new(threshold: u32) -> Self {
        Self {
            consecutive_failures: AtomicU32::new(0),
            threshold,
        }
    }

    /// Returns `true` if the breaker is open (too many consecutive failures).
    pub fn is_open(&self) -> bool {
        self.consecutive_failures.load(Ordering::Relaxed) >= self.threshold
    }

    /// Record a failure. Returns current consecutive failure count.
    pub fn record_failure(&self) -> u32 {
        self.consecutive_failures.fetch_add(1, Ordering::Relaxed) + 1
    }

    pub fn record_success(&self) {
        self.consecutive_failures.store(0, Ordering::Relaxed);
    }

    pub fn failure_count(&self) -> u32 {
        self.consecutive_failures.load(Ordering::Relaxed)
    }

    pub fn threshold(&self) -> u32 {
        self.threshold
    }
}

/// Value returned by a controlled call and the attempts it took.
#[derive(Debug, Clone, PartialEq)]
pub struct Controlled<T> {
    pub value: T,
    /// Number of attempts made (1 = no retries used).
    pub attempts: u32,
}

/// Run `op` with timeout, retry, and circuit-breaker controls.
///
/// The breaker is checked before each attempt and updated after. A call that
/// fails on every attempt yields `ExecutionFailed`, or `Timeout` when the last
/// attempt timed out.
pub async fn run_with_controls<F, Fut, T, E>(
    controls: &ExecutionControls,
    breaker: &CircuitBreaker,
    op: F,
) -> SandboxResult<Controlled<T>>
where
    F: Fn() -> Fut,
    Fut: Future<Output = Result<T, E>>,
    E: Display,
{
    let max_attempts = controls.max_retries + 1;
    let timeout = Duration::from_millis(controls.timeout_ms);
    let mut last_failure = SandboxError::ExecutionFailed {
        attempts: 0,
        reason: "no attempt made".into(),
    };

    for attempt in 1..=max_attempts {
        if breaker.is_open() {
            return Err(SandboxError::CircuitBreakerOpen {
                consecutive_failures: breaker.failure_count(),
                threshold: breaker.threshold(),
            });
        }

        match tokio::time::timeout(timeout, op()).await {
            Ok(Ok(value)) => {
                breaker.record_success();
                return Ok(Controlled {
                    value,
                    attempts: attempt,
                });
            }
            Ok(Err(err)) => {
                breaker.record_failure();
                tracing::debug!(attempt, error = %err, "sandbox call failed");
                last_failure = SandboxError::ExecutionFailed {
                    attempts: attempt,
                    reason: err.to_string(),
                };
            }
            Err(_elapsed) => {
                breaker.record_failure();
                tracing::debug!(attempt, limit_ms = controls.timeout_ms, "sandbox call timed out");
                last_failure = SandboxError::Timeout {
                    limit_ms: controls.timeout_ms,
                };
            }
        }

        if attempt < max_attempts {
            tokio::time::sleep(controls.backoff(attempt)).await;
        }
    }

    Err(last_failure)
}
