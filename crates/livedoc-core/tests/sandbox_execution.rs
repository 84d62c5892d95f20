//! Integration tests for the sandbox executor: lifecycle, retries, the
//! circuit breaker and bounded concurrency.

use std::sync::atomic::{AtomicU32, AtomicUsize, Ordering};
use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;

use livedoc_core::sandbox::{
    run_with_controls, CircuitBreaker, ExecutionControls, LocalProcessBackend, SandboxBackend,
    SandboxError, SandboxExecutor, SandboxHandle, CREATE_FAILED,
};
use livedoc_core::{ExecutionResult, ServiceError, Snippet, SnippetSource};

fn snippet(id: &str, language: &str, code: &str) -> Snippet {
    Snippet {
        id: id.to_string(),
        code: code.to_string(),
        language: language.to_string(),
        source: SnippetSource::Documentation,
    }
}

fn batch(n: usize) -> Vec<Snippet> {
    (0..n)
        .map(|i| snippet(&format!("snippet_{i}"), "python", "print(1)"))
        .collect()
}

fn fast(max_retries: u32) -> ExecutionControls {
    ExecutionControls {
        timeout_ms: 1000,
        max_retries,
        backoff_base_ms: 1,
        ..ExecutionControls::default()
    }
}

/// Backend with configurable failure modes.
#[derive(Default)]
struct FakeBackend {
    created: AtomicUsize,
    destroyed: AtomicUsize,
    run_calls: AtomicU32,
    /// Transport failures before each snippet's first success.
    flaky_failures: u32,
    always_fail: bool,
    fail_create: bool,
    run_delay: Option<Duration>,
    in_flight: AtomicUsize,
    peak_in_flight: AtomicUsize,
}

#[async_trait]
impl SandboxBackend for FakeBackend {
    fn name(&self) -> &'static str {
        "fake"
    }

    async fn create(&self) -> Result<SandboxHandle, ServiceError> {
        if self.fail_create {
            return Err(ServiceError::Http {
                status: 401,
                body: "bad key".to_string(),
            });
        }
        self.created.fetch_add(1, Ordering::SeqCst);
        Ok(SandboxHandle {
            id: "sbx-1".to_string(),
        })
    }

    async fn run(
        &self,
        _handle: &SandboxHandle,
        snippet: &Snippet,
    ) -> Result<ExecutionResult, ServiceError> {
        let call = self.run_calls.fetch_add(1, Ordering::SeqCst);
        let now = self.in_flight.fetch_add(1, Ordering::SeqCst) + 1;
        self.peak_in_flight.fetch_max(now, Ordering::SeqCst);
        if let Some(delay) = self.run_delay {
            tokio::time::sleep(delay).await;
        }
        self.in_flight.fetch_sub(1, Ordering::SeqCst);

        if self.always_fail || call < self.flaky_failures {
            return Err(ServiceError::Transport("connection reset".to_string()));
        }
        Ok(ExecutionResult::completed(0, snippet.code.clone(), None))
    }

    async fn destroy(&self, _handle: &SandboxHandle) -> Result<(), ServiceError> {
        self.destroyed.fetch_add(1, Ordering::SeqCst);
        Ok(())
    }
}

// ---------------------------------------------------------------------------
// Lifecycle
// ---------------------------------------------------------------------------

#[tokio::test]
async fn test_every_snippet_gets_a_result_keyed_by_id() {
    let backend = Arc::new(FakeBackend::default());
    let executor = SandboxExecutor::new(backend.clone(), fast(0));

    let results = executor.execute_all(&batch(6)).await;
    assert_eq!(results.len(), 6);
    for i in 0..6 {
        let result = &results[&format!("snippet_{i}")];
        assert!(result.success);
        assert_eq!(result.output, "print(1)");
    }
    assert_eq!(backend.created.load(Ordering::SeqCst), 1);
}

#[tokio::test]
async fn test_create_failure_marks_all_snippets_failed() {
    let backend = Arc::new(FakeBackend {
        fail_create: true,
        ..FakeBackend::default()
    });
    let executor = SandboxExecutor::new(backend.clone(), fast(0));

    let results = executor.execute_all(&batch(3)).await;
    assert_eq!(results.len(), 3);
    for result in results.values() {
        assert!(!result.success);
        assert_eq!(result.exit_code, -1);
        let error = result.error.as_deref().unwrap();
        assert!(error.starts_with(CREATE_FAILED), "{error}");
        assert!(error.contains("401"), "{error}");
    }
    assert_eq!(backend.run_calls.load(Ordering::SeqCst), 0);
    assert!(!executor.is_active().await);
}

#[tokio::test]
async fn test_release_is_idempotent_and_closes_executor() {
    let backend = Arc::new(FakeBackend::default());
    let executor = SandboxExecutor::new(backend.clone(), fast(0));

    // Releasing before any use destroys nothing.
    executor.release().await;
    assert_eq!(backend.destroyed.load(Ordering::SeqCst), 0);

    let results = executor.execute_all(&batch(1)).await;
    assert_eq!(
        results["snippet_0"].error.as_deref(),
        Some("sandbox released")
    );
    assert_eq!(backend.created.load(Ordering::SeqCst), 0);
}

#[tokio::test]
async fn test_release_destroys_live_sandbox_once() {
    let backend = Arc::new(FakeBackend::default());
    let executor = SandboxExecutor::new(backend.clone(), fast(0));
    executor.execute_all(&batch(2)).await;
    assert!(executor.is_active().await);

    executor.release().await;
    executor.release().await;
    assert_eq!(backend.destroyed.load(Ordering::SeqCst), 1);
}

#[tokio::test]
async fn test_drop_releases_live_sandbox() {
    let backend = Arc::new(FakeBackend::default());
    {
        let executor = SandboxExecutor::new(backend.clone(), fast(0));
        executor.execute_all(&batch(1)).await;
    }
    // Destroy runs on a spawned task.
    for _ in 0..50 {
        if backend.destroyed.load(Ordering::SeqCst) == 1 {
            break;
        }
        tokio::time::sleep(Duration::from_millis(10)).await;
    }
    assert_eq!(backend.destroyed.load(Ordering::SeqCst), 1);
}

// ---------------------------------------------------------------------------
// Controls
// ---------------------------------------------------------------------------

#[tokio::test]
async fn test_transient_failures_are_retried() {
    let backend = Arc::new(FakeBackend {
        flaky_failures: 2,
        ..FakeBackend::default()
    });
    let executor = SandboxExecutor::new(backend.clone(), fast(2));

    let results = executor.execute_all(&batch(1)).await;
    assert!(results["snippet_0"].success);
    assert_eq!(backend.run_calls.load(Ordering::SeqCst), 3);
}

#[tokio::test]
async fn test_exhausted_retries_fail_only_that_snippet() {
    let backend = Arc::new(FakeBackend {
        always_fail: true,
        ..FakeBackend::default()
    });
    let executor = SandboxExecutor::new(backend.clone(), fast(1));

    let results = executor.execute_all(&batch(1)).await;
    let result = &results["snippet_0"];
    assert!(!result.success);
    assert_eq!(result.exit_code, -1);
    assert!(result
        .error
        .as_deref()
        .unwrap()
        .contains("failed after 2 attempt(s)"));
}

#[tokio::test]
async fn test_breaker_short_circuits_rest_of_batch() {
    let backend = Arc::new(FakeBackend {
        always_fail: true,
        ..FakeBackend::default()
    });
    let controls = ExecutionControls {
        breaker_threshold: 2,
        max_concurrency: 1,
        ..fast(0)
    };
    let executor = SandboxExecutor::new(backend.clone(), controls);

    let results = executor.execute_all(&batch(5)).await;
    assert_eq!(results.len(), 5);
    assert!(results.values().all(|r| !r.success));
    assert_eq!(backend.run_calls.load(Ordering::SeqCst), 2);
    let open = results
        .values()
        .filter(|r| r.error.as_deref().unwrap().contains("circuit breaker open"))
        .count();
    assert_eq!(open, 3);

    // A new batch starts with a closed breaker.
    let before = backend.run_calls.load(Ordering::SeqCst);
    executor.execute_all(&batch(1)).await;
    assert_eq!(backend.run_calls.load(Ordering::SeqCst), before + 1);
}

#[tokio::test]
async fn test_concurrency_stays_within_limit() {
    let backend = Arc::new(FakeBackend {
        run_delay: Some(Duration::from_millis(20)),
        ..FakeBackend::default()
    });
    let controls = ExecutionControls {
        max_concurrency: 2,
        ..fast(0)
    };
    let executor = SandboxExecutor::new(backend.clone(), controls);

    let results = executor.execute_all(&batch(8)).await;
    assert_eq!(results.len(), 8);
    let peak = backend.peak_in_flight.load(Ordering::SeqCst);
    assert!(peak <= 2, "peak in flight was {peak}");
    assert!(peak >= 1);
}

#[tokio::test]
async fn test_slow_snippet_times_out() {
    let backend = Arc::new(FakeBackend {
        run_delay: Some(Duration::from_millis(200)),
        ..FakeBackend::default()
    });
    let controls = ExecutionControls {
        timeout_ms: 20,
        ..fast(0)
    };
    let executor = SandboxExecutor::new(backend, controls);

    let results = executor.execute_all(&batch(1)).await;
    let error = results["snippet_0"].error.clone().unwrap();
    assert!(error.contains("timed out"), "{error}");
}

#[tokio::test]
async fn test_run_with_controls_counts_attempts() {
    let calls = Arc::new(AtomicU32::new(0));
    let breaker = CircuitBreaker::new(5);
    let c = calls.clone();

    let controlled = run_with_controls(&fast(3), &breaker, || {
        let c = c.clone();
        async move {
            if c.fetch_add(1, Ordering::SeqCst) == 0 {
                Err("first call fails")
            } else {
                Ok(42)
            }
        }
    })
    .await
    .unwrap();

    assert_eq!(controlled.value, 42);
    assert_eq!(controlled.attempts, 2);
    assert_eq!(breaker.failure_count(), 0);
}

#[tokio::test]
async fn test_run_with_controls_open_breaker_skips_call() {
    let breaker = CircuitBreaker::new(1);
    breaker.record_failure();
    let calls = Arc::new(AtomicU32::new(0));
    let c = calls.clone();

    let err = run_with_controls(&fast(2), &breaker, || {
        let c = c.clone();
        async move {
            c.fetch_add(1, Ordering::SeqCst);
            Ok::<_, String>(())
        }
    })
    .await
    .unwrap_err();

    assert!(matches!(err, SandboxError::CircuitBreakerOpen { threshold: 1, .. }));
    assert_eq!(calls.load(Ordering::SeqCst), 0);
}

// ---------------------------------------------------------------------------
// Local process backend
// ---------------------------------------------------------------------------

#[tokio::test]
async fn test_local_backend_through_executor() {
    let backend = Arc::new(LocalProcessBackend::new());
    let executor = SandboxExecutor::new(backend.clone(), fast(0));

    let snippets = vec![
        snippet("ok", "bash", "echo hello"),
        snippet("fails", "bash", "echo oops >&2; exit 3"),
        snippet("unknown", "cobol", "DISPLAY 'HI'."),
    ];
    let results = executor.execute_all(&snippets).await;

    assert!(results["ok"].success);
    assert_eq!(results["ok"].output.trim(), "hello");

    assert!(!results["fails"].success);
    assert_eq!(results["fails"].exit_code, 3);
    assert_eq!(results["fails"].error.as_deref().map(str::trim), Some("oops"));

    assert!(!results["unknown"].success);
    assert_eq!(results["unknown"].exit_code, -1);

    assert_eq!(backend.live_sandboxes(), 1);
    executor.release().await;
    assert_eq!(backend.live_sandboxes(), 0);
}
