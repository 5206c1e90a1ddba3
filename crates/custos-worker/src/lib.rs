//! Custos Worker
//!
//! The ingestion worker: drives queued capture jobs to a terminal outcome.
//!
//! # Overview
//!
//! Each cycle:
//! - **Backoff sweep**: failed jobs older than the backoff window go back to the queue
//! - **Claim**: the oldest queued job moves to running, committed on its own
//! - **Dedup**: a recently succeeded twin, then an existing source with the same
//!   fingerprint, resolves the job as deduped
//! - **Materialize**: a new source, best-effort indexing, commitment and risk flag
//!   extraction, participant linking, all in one transaction
//!
//! A processing failure rolls the transaction back and records the job as
//! failed with `processing_error`; the backoff sweep retries it later.
//!
//! # Usage
//!
//! ## One cycle
//!
//! ```no_run
//! use custos_domain::SystemClock;
//! use custos_memory::MemoryIndex;
//! use custos_store::SqliteStore;
//! use custos_worker::{Worker, WorkerConfig};
//!
//! # fn main() -> Result<(), Box<dyn std::error::Error>> {
//! let mut store = SqliteStore::new("custos.db")?;
//! let mut worker = Worker::new(WorkerConfig::default(), MemoryIndex::default());
//!
//! let cycle = worker.run_once(&mut store, &SystemClock)?;
//! println!("requeued {}, idle {}", cycle.requeued, cycle.is_idle());
//! # Ok(())
//! # }
//! ```
//!
//! ## Background loop
//!
//! ```no_run
//! use custos_memory::NoopIndexer;
//! use custos_store::SqliteStore;
//! use custos_worker::{WorkerConfig, WorkerLoop};
//!
//! #[tokio::main]
//! async fn main() -> Result<(), Box<dyn std::error::Error>> {
//!     let mut store = SqliteStore::new("custos.db")?;
//!     let mut worker = WorkerLoop::new(WorkerConfig::default(), NoopIndexer);
//!
//!     // Run indefinitely (until Ctrl+C)
//!     worker.run(&mut store).await?;
//!     Ok(())
//! }
//! ```
//!
//! # Configuration
//!
//! ```toml
//! [worker]
//! poll_interval_secs = 2
//! backoff_secs = 30
//! recent_success_window_secs = 300
//! excerpt_chars = 200
//! ```

#![warn(missing_docs)]

mod config;
mod error;
mod maintenance;
mod metrics;
mod runner;
mod worker;

pub use config::WorkerConfig;
pub use error::WorkerError;
pub use maintenance::{DedupeSummary, Maintenance, RepairSummary};
pub use metrics::WorkerMetrics;
pub use runner::WorkerLoop;
pub use worker::{CycleOutcome, ProcessedJob, Worker};
