//! Metrics collection for worker operations

/// Counters collected across worker cycles
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct WorkerMetrics {
    /// Cycles completed
    pub cycles: usize,

    /// Cycles that found no queued job
    pub idle_cycles: usize,

    /// Failed jobs returned to the queue by the backoff sweep
    pub requeued: usize,

    /// Jobs that materialized a new source
    pub succeeded: usize,

    /// Jobs resolved to an existing source
    pub deduped: usize,

    /// Jobs whose processing failed
    pub failed: usize,

    /// Swallowed indexing failures
    pub index_failures: usize,

    /// Commitments persisted
    pub commitments_created: usize,

    /// Risk flags persisted
    pub risk_flags_created: usize,
}

impl WorkerMetrics {
    /// Create new empty metrics
    pub fn new() -> Self {
        Self::default()
    }

    /// Record a completed cycle
    pub fn record_cycle(&mut self) {
        self.cycles += 1;
    }

    /// Record a cycle that had nothing to claim
    pub fn record_idle(&mut self) {
        self.idle_cycles += 1;
    }

    /// Record jobs put back in the queue
    pub fn record_requeued(&mut self, count: usize) {
        self.requeued += count;
    }

    /// Record a job that created a source
    pub fn record_success(&mut self, commitments: usize, risk_flags: usize) {
        self.succeeded += 1;
        self.commitments_created += commitments;
        self.risk_flags_created += risk_flags;
    }

    /// Record a job that resolved to an existing source
    pub fn record_dedup(&mut self) {
        self.deduped += 1;
    }

    /// Record a failed job
    pub fn record_failure(&mut self) {
        self.failed += 1;
    }

    /// Record a swallowed indexing failure
    pub fn record_index_failure(&mut self) {
        self.index_failures += 1;
    }

    /// Jobs that reached a terminal outcome
    pub fn total_processed(&self) -> usize {
        self.succeeded + self.deduped + self.failed
    }

    /// Reset all metrics
    pub fn reset(&mut self) {
        *self = Self::default();
    }

    /// Generate a summary report of metrics
    pub fn summary(&self) -> String {
        let mut lines = vec![
            "Worker Metrics Summary".to_string(),
            "======================".to_string(),
            format!("Cycles: {} ({} idle)", self.cycles, self.idle_cycles),
            format!("Requeued: {}", self.requeued),
            String::new(),
            "Jobs:".to_string(),
            format!("  Succeeded: {}", self.succeeded),
            format!("  Deduped: {}", self.deduped),
            format!("  Failed: {}", self.failed),
            format!("  Total: {}", self.total_processed()),
        ];

        if self.commitments_created > 0 || self.risk_flags_created > 0 {
            lines.push(String::new());
            lines.push(format!("Commitments created: {}", self.commitments_created));
            lines.push(format!("Risk flags created: {}", self.risk_flags_created));
        }

        if self.index_failures > 0 {
            lines.push(String::new());
            lines.push(format!("Indexing failures: {}", self.index_failures));
        }

        lines.join("\n")
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_metrics_creation() {
        let metrics = WorkerMetrics::new();
        assert_eq!(metrics.cycles, 0);
        assert_eq!(metrics.total_processed(), 0);
    }

    #[test]
    fn test_record_outcomes() {
        let mut metrics = WorkerMetrics::new();
        metrics.record_success(2, 1);
        metrics.record_success(1, 0);
        metrics.record_dedup();
        metrics.record_failure();

        assert_eq!(metrics.succeeded, 2);
        assert_eq!(metrics.commitments_created, 3);
        assert_eq!(metrics.risk_flags_created, 1);
        assert_eq!(metrics.total_processed(), 4);
    }

    #[test]
    fn test_reset() {
        let mut metrics = WorkerMetrics::new();
        metrics.record_cycle();
        metrics.record_requeued(3);
        metrics.record_index_failure();
        metrics.reset();
        assert_eq!(metrics, WorkerMetrics::default());
    }

    #[test]
    fn test_summary() {
        let mut metrics = WorkerMetrics::new();
        metrics.record_cycle();
        metrics.record_success(2, 1);
        metrics.record_index_failure();

        let summary = metrics.summary();
        assert!(summary.contains("Cycles: 1"));
        assert!(summary.contains("Succeeded: 1"));
        assert!(summary.contains("Commitments created: 2"));
        assert!(summary.contains("Indexing failures: 1"));
    }
}
