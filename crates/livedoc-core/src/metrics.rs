//! Global atomic counters for livedoc observability.
//!
//! Counters are incremented silently at the call site. Call
//! [`Metrics::flush`] to emit current values as a single
//! `tracing::info!` event (e.g. at the end of a CLI invocation).

use std::sync::atomic::{AtomicU64, Ordering};

/// Global metrics singleton.
pub static METRICS: Metrics = Metrics::new();

pub struct Metrics {
    pipelines_run: AtomicU64,
    revisions: AtomicU64,
    draft_fallbacks: AtomicU64,
    snippets_executed: AtomicU64,
    snippet_failures: AtomicU64,
}

impl Default for Metrics {
    fn default() -> Self {
        Self::new()
    }
}

impl Metrics {
    pub const fn new() -> Self {
        Self {
            pipelines_run: AtomicU64::new(0),
            revisions: AtomicU64::new(0),
            draft_fallbacks: AtomicU64::new(0),
            snippets_executed: AtomicU64::new(0),
            snippet_failures: AtomicU64::new(0),
        }
    }

    pub fn inc_pipelines(&self) {
        self.pipelines_run.fetch_add(1, Ordering::Relaxed);
        tracing::trace!(metric = "pipelines_run", "counter incremented");
    }

    pub fn inc_revisions(&self) {
        self.revisions.fetch_add(1, Ordering::Relaxed);
        tracing::trace!(metric = "revisions", "counter incremented");
    }

    pub fn inc_draft_fallbacks(&self) {
        self.draft_fallbacks.fetch_add(1, Ordering::Relaxed);
        tracing::trace!(metric = "draft_fallbacks", "counter incremented");
    }

    /// Count one executed snippet, and one failure unless it succeeded.
    pub fn record_snippet(&self, success: bool) {
        self.snippets_executed.fetch_add(1, Ordering::Relaxed);
        if !success {
            self.snippet_failures.fetch_add(1, Ordering::Relaxed);
        }
        tracing::trace!(metric = "snippets_executed", success, "counter incremented");
    }

    /// Emit all current counter values as a single `info!` event.
    pub fn flush(&self) {
        tracing::info!(
            metric = "flush",
            pipelines_run = self.pipelines_run(),
            revisions = self.revisions(),
            draft_fallbacks = self.draft_fallbacks(),
            snippets_executed = self.snippets_executed(),
            snippet_failures = self.snippet_failures(),
        );
    }

    pub fn pipelines_run(&self) -> u64 {
        self.pipelines_run.load(Ordering::Relaxed)
    }

    pub fn revisions(&self) -> u64 {
        self.revisions.load(Ordering::Relaxed)
    }

    pub fn draft_fallbacks(&self) -> u64 {
        self.draft_fallbacks.load(Ordering::Relaxed)
    }

    pub fn snippets_executed(&self) -> u64 {
        self.snippets_executed.load(Ordering::Relaxed)
    }

    pub fn snippet_failures(&self) -> u64 {
        self.snippet_failures.load(Ordering::Relaxed)
    }

    /// Reset all counters to zero (useful in tests).
    pub fn reset(&self) {
        self.pipelines_run.store(0, Ordering::Relaxed);
        self.revisions.store(0, Ordering::Relaxed);
        self.draft_fallbacks.store(0, Ordering::Relaxed);
        self.snippets_executed.store(0, Ordering::Relaxed);
        self.snippet_failures.store(0, Ordering::Relaxed);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn counters_increment() {
        let m = Metrics::new();
        m.inc_pipelines();
        m.inc_revisions();
        m.inc_revisions();
        m.inc_draft_fallbacks();
        m.record_snippet(true);
        m.record_snippet(false);

        assert_eq!(m.pipelines_run(), 1);
        assert_eq!(m.revisions(), 2);
        assert_eq!(m.draft_fallbacks(), 1);
        assert_eq!(m.snippets_executed(), 2);
        assert_eq!(m.snippet_failures(), 1);
    }

    #[test]
    fn reset_zeroes_all() {
        let m = Metrics::new();
        m.inc_pipelines();
        m.record_snippet(false);
        m.reset();
        assert_eq!(m.pipelines_run(), 0);
        assert_eq!(m.snippets_executed(), 0);
        assert_eq!(m.snippet_failures(), 0);
    }
}
