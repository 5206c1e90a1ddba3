//! Submission admission and job control

use std::fmt::Display;

use custos_domain::traits::{IngestionStore, JobQuery, MeetingDirectory, Transactional};
use custos_domain::{
    normalize_payload, people_key, CaptureKind, Clock, IngestionJob, JobId, JobStatus,
    JobStatusReport, MeetingId, NewJob, PersonId,
};
use tracing::{info, warn};

use crate::{AdmissionConfig, GatekeeperError};

/// A capture submitted by a caller
#[derive(Debug, Clone, Default)]
pub struct SubmitRequest {
    /// Meeting the capture belongs to
    pub meeting_id: String,

    /// Capture kind name (`notes`, `transcript`, `decision`, `follow-up`, `reflection`)
    pub capture_kind: String,

    /// Raw payload text
    pub payload: String,

    /// Referenced people; unknown ids are dropped
    pub person_ids: Vec<String>,

    /// Future-relevance timestamp
    pub relevant_at: Option<u64>,

    /// Due date for extracted commitments
    pub commitment_due_by: Option<u64>,

    /// Explicit index-in-memory override
    pub index_in_memory: Option<bool>,
}

/// Result of a submission
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Admission {
    /// The job representing this capture
    pub job_id: JobId,

    /// `true` when an existing job was returned instead of creating one
    pub replayed: bool,
}

/// Validates submissions and writes queued jobs
pub struct AdmissionGate {
    config: AdmissionConfig,
}

pub(crate) fn store_error<E: Display>(err: E) -> GatekeeperError {
    GatekeeperError::Store(err.to_string())
}

/// Run `op` inside a store transaction, rolling back on failure
pub(crate) fn in_transaction<S, T, F>(store: &mut S, op: F) -> Result<T, GatekeeperError>
where
    S: Transactional,
    S::Error: Display,
    F: FnOnce(&mut S) -> Result<T, S::Error>,
{
    store.begin().map_err(store_error)?;
    match op(store) {
        Ok(value) => {
            store.commit().map_err(store_error)?;
            Ok(value)
        }
        Err(e) => {
            if let Err(rollback) = store.rollback() {
                warn!(error = %rollback, "Rollback failed");
            }
            Err(store_error(e))
        }
    }
}

impl AdmissionGate {
    /// Create a new gate with the given configuration
    pub fn new(config: AdmissionConfig) -> Self {
        Self { config }
    }

    /// Create a gate with default configuration
    pub fn default_config() -> Self {
        Self::new(AdmissionConfig::default())
    }

    /// Admit a capture
    ///
    /// Returns the id of a newly queued job, or of an existing job when the
    /// same logical capture was submitted within the lookback window.
    pub fn submit<S, C>(
        &self,
        store: &mut S,
        clock: &C,
        request: SubmitRequest,
    ) -> Result<Admission, GatekeeperError>
    where
        S: IngestionStore + MeetingDirectory,
        S::Error: Display,
        C: Clock,
    {
        let meeting_id = request.meeting_id.trim();
        if meeting_id.is_empty() {
            return Err(GatekeeperError::InvalidArgument(
                "meeting_id is required".to_string(),
            ));
        }
        let meeting_id = MeetingId::new(meeting_id);

        let capture_kind = CaptureKind::parse(&request.capture_kind).ok_or_else(|| {
            GatekeeperError::InvalidArgument(format!(
                "Invalid capture kind: {}",
                request.capture_kind
            ))
        })?;

        if store.meeting(&meeting_id).map_err(store_error)?.is_none() {
            return Err(GatekeeperError::NotFound(format!(
                "Meeting not found: {}",
                meeting_id
            )));
        }

        let requested: Vec<PersonId> = request.person_ids.into_iter().map(PersonId::new).collect();
        let person_ids = store.existing_people(&requested).map_err(store_error)?;

        let now = clock.now();
        let job = IngestionJob::queued(
            NewJob {
                meeting_id,
                payload: request.payload,
                capture_kind,
                person_ids,
                relevant_at: request.relevant_at,
                commitment_due_by: request.commitment_due_by,
                index_in_memory: request
                    .index_in_memory
                    .unwrap_or_else(|| capture_kind.indexed_by_default()),
            },
            now,
        );

        // Lookup and insert share one write transaction so concurrent
        // admissions of the same capture serialize on the database lock
        let check_replay = !normalize_payload(&job.payload).is_empty();
        let replayed = in_transaction(store, |s| {
            if check_replay {
                if let Some(existing) = self.find_replay(s, &job, now)? {
                    return Ok(Some(existing));
                }
            }
            s.insert_job(&job)?;
            Ok(None)
        })?;

        if let Some(existing) = replayed {
            info!(job_id = %existing.id, meeting_id = %job.meeting_id, "Replayed ingestion submission");
            return Ok(Admission {
                job_id: existing.id,
                replayed: true,
            });
        }

        info!(
            job_id = %job.id,
            meeting_id = %job.meeting_id,
            capture_kind = %job.capture_kind,
            "Queued ingestion job"
        );

        Ok(Admission {
            job_id: job.id,
            replayed: false,
        })
    }

    /// Find a job for the same logical capture created within the lookback window
    fn find_replay<S>(
        &self,
        store: &S,
        candidate: &IngestionJob,
        now: u64,
    ) -> Result<Option<IngestionJob>, S::Error>
    where
        S: IngestionStore,
    {
        let query = JobQuery {
            meeting_id: Some(candidate.meeting_id.clone()),
            capture_kind: Some(candidate.capture_kind),
            fingerprint: Some(candidate.fingerprint.clone()),
            created_since: Some(now.saturating_sub(self.config.lookback_secs)),
            ..JobQuery::default()
        };

        let people = people_key(&candidate.person_ids);
        let payload = normalize_payload(&candidate.payload);

        let existing = store
            .query_jobs(&query)?
            .into_iter()
            .find(|job| {
                people_key(&job.person_ids) == people
                    && job.relevant_at == candidate.relevant_at
                    && normalize_payload(&job.payload) == payload
            });

        Ok(existing)
    }

    /// Status snapshot of a job
    pub fn job_status<S>(&self, store: &S, job_id: &JobId) -> Result<JobStatusReport, GatekeeperError>
    where
        S: IngestionStore,
        S::Error: Display,
    {
        store
            .get_job(job_id)
            .map_err(store_error)?
            .map(|job| job.status_report())
            .ok_or_else(|| GatekeeperError::NotFound(format!("Ingestion job not found: {}", job_id)))
    }

    /// Force a job back to queued with its error cleared, whatever its state
    pub fn retry_job<S>(&self, store: &mut S, job_id: &JobId) -> Result<(), GatekeeperError>
    where
        S: IngestionStore,
        S::Error: Display,
    {
        let mut job = store
            .get_job(job_id)
            .map_err(store_error)?
            .ok_or_else(|| GatekeeperError::NotFound(format!("Ingestion job not found: {}", job_id)))?;

        let previous = job.status();
        job.requeue();
        in_transaction(store, |s| s.update_job(&job))?;

        info!(job_id = %job.id, previous = %previous, "Requeued ingestion job on request");
        Ok(())
    }

    /// Most recent jobs first, optionally filtered by status
    pub fn list_jobs<S>(
        &self,
        store: &S,
        status: Option<JobStatus>,
        limit: usize,
    ) -> Result<Vec<IngestionJob>, GatekeeperError>
    where
        S: IngestionStore,
        S::Error: Display,
    {
        store
            .query_jobs(&JobQuery {
                status,
                newest_first: true,
                limit: Some(limit),
                ..JobQuery::default()
            })
            .map_err(store_error)
    }
}
