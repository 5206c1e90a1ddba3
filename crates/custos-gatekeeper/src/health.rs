//! Pipeline health summary

use std::fmt::Display;

use custos_domain::traits::{IngestionStore, JobQuery};
use custos_domain::JobStatus;

use crate::gate::store_error;
use crate::GatekeeperError;

/// Overall pipeline condition
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum HealthState {
    /// No failed jobs
    Healthy,

    /// At least one job is failed and waiting for retry
    Attention,
}

impl HealthState {
    /// Name as reported to operators
    pub fn as_str(&self) -> &'static str {
        match self {
            HealthState::Healthy => "healthy",
            HealthState::Attention => "attention",
        }
    }
}

/// Ingestion health as shown on the status surface
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct IngestionHealth {
    /// Most recent job start
    pub last_run: Option<u64>,

    /// Most recent successful completion
    pub last_success: Option<u64>,

    /// Jobs currently failed
    pub error_count: usize,

    /// Derived condition
    pub health: HealthState,
}

/// Summarize the job table
pub fn ingestion_health<S>(store: &S) -> Result<IngestionHealth, GatekeeperError>
where
    S: IngestionStore,
    S::Error: Display,
{
    let jobs = store.query_jobs(&JobQuery::default()).map_err(store_error)?;

    let last_run = jobs.iter().filter_map(|job| job.started_at).max();
    let last_success = jobs
        .iter()
        .filter(|job| job.status() == JobStatus::Succeeded)
        .filter_map(|job| job.completed_at)
        .max();
    let error_count = jobs
        .iter()
        .filter(|job| job.status() == JobStatus::Failed)
        .count();

    Ok(IngestionHealth {
        last_run,
        last_success,
        error_count,
        health: if error_count > 0 {
            HealthState::Attention
        } else {
            HealthState::Healthy
        },
    })
}
