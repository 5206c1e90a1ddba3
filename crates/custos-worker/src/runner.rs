//! Background loop for continuous worker operation

use std::fmt::Display;

use custos_domain::traits::{Indexer, IngestionStore, MeetingDirectory};
use custos_domain::{Clock, SystemClock};
use tokio::time::{interval, Duration};

use crate::{CycleOutcome, Worker, WorkerConfig, WorkerError, WorkerMetrics};

/// Background loop that drives [`Worker::run_once`] on a fixed interval
///
/// # Examples
///
/// ```no_run
/// use custos_memory::MemoryIndex;
/// use custos_store::SqliteStore;
/// use custos_worker::{WorkerConfig, WorkerLoop};
///
/// #[tokio::main]
/// async fn main() -> Result<(), Box<dyn std::error::Error>> {
///     let mut store = SqliteStore::new("custos.db")?;
///     let mut worker = WorkerLoop::new(WorkerConfig::default(), MemoryIndex::default());
///
///     // Run until Ctrl+C
///     worker.run(&mut store).await?;
///     Ok(())
/// }
/// ```
pub struct WorkerLoop<I, C = SystemClock> {
    worker: Worker<I>,
    clock: C,
    interval: Duration,
}

impl<I> WorkerLoop<I, SystemClock>
where
    I: Indexer,
    I::Error: Display,
{
    /// Create a loop reading the wall clock
    pub fn new(config: WorkerConfig, indexer: I) -> Self {
        Self::with_clock(config, indexer, SystemClock)
    }
}

impl<I, C> WorkerLoop<I, C>
where
    I: Indexer,
    I::Error: Display,
    C: Clock,
{
    /// Create a loop reading time from `clock`
    pub fn with_clock(config: WorkerConfig, indexer: I, clock: C) -> Self {
        let interval = config.poll_interval();
        Self {
            worker: Worker::new(config, indexer),
            clock,
            interval,
        }
    }

    fn log_cycle(cycle: &CycleOutcome) {
        if cycle.requeued > 0 {
            tracing::info!("Requeued {} failed jobs", cycle.requeued);
        }
        if let Some(processed) = &cycle.processed {
            tracing::debug!(
                "Processed job {} ({})",
                processed.job_id,
                processed.outcome.error_code().unwrap_or("succeeded")
            );
        }
    }

    /// Run the worker until a shutdown signal (Ctrl+C) is received
    ///
    /// A failed cycle is logged and the loop carries on with the next tick.
    pub async fn run<S>(&mut self, store: &mut S) -> Result<(), WorkerError>
    where
        S: IngestionStore + MeetingDirectory,
        S::Error: Display,
    {
        let mut ticker = interval(self.interval);

        tracing::info!("Ingestion worker started (interval: {:?})", self.interval);

        loop {
            tokio::select! {
                _ = ticker.tick() => {
                    match self.worker.run_once(store, &self.clock) {
                        Ok(cycle) => Self::log_cycle(&cycle),
                        Err(e) => tracing::error!("Worker cycle failed: {}", e),
                    }
                }
                _ = tokio::signal::ctrl_c() => {
                    tracing::info!("Shutdown signal received, stopping worker");
                    break;
                }
            }
        }

        tracing::info!("Worker stopped. Final metrics:\n{}", self.worker.metrics().summary());

        Ok(())
    }

    /// Run for a specific number of cycles, stopping at the first failed one
    pub async fn run_cycles<S>(&mut self, store: &mut S, cycles: usize) -> Result<(), WorkerError>
    where
        S: IngestionStore + MeetingDirectory,
        S::Error: Display,
    {
        let mut ticker = interval(self.interval);

        tracing::info!(
            "Ingestion worker started for {} cycles (interval: {:?})",
            cycles,
            self.interval
        );

        for cycle in 0..cycles {
            ticker.tick().await;

            tracing::debug!("Starting worker cycle {}/{}", cycle + 1, cycles);

            match self.worker.run_once(store, &self.clock) {
                Ok(outcome) => Self::log_cycle(&outcome),
                Err(e) => {
                    tracing::error!("Worker cycle {}/{} failed: {}", cycle + 1, cycles, e);
                    return Err(e);
                }
            }
        }

        tracing::info!(
            "Worker finished {} cycles. Final metrics:\n{}",
            cycles,
            self.worker.metrics().summary()
        );

        Ok(())
    }

    /// Get a reference to the worker's current metrics
    pub fn metrics(&self) -> &WorkerMetrics {
        self.worker.metrics()
    }

    /// Reset the worker's metrics counters
    pub fn reset_metrics(&mut self) {
        self.worker.reset_metrics();
    }
}
