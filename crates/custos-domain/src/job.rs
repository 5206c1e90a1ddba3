//! Ingestion jobs and their state machine
//!
//! ```text
//! queued ──claim──▶ running ──▶ succeeded (Succeeded | Deduped)
//!    ▲                   │
//!    └──backoff sweep── failed (ProcessingError)
//! ```
//!
//! A failed job is not terminal: the worker's backoff sweep puts it back in
//! the queue once its completion time is old enough.

use crate::{CaptureKind, Fingerprint, FingerprintInput, JobId, MeetingId, PersonId, SourceId};

/// Coarse lifecycle status, as reported to callers
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum JobStatus {
    /// Waiting to be claimed
    Queued,

    /// Claimed by the worker
    Running,

    /// Resolved to a source record (new or existing)
    Succeeded,

    /// Processing failed; will be requeued after backoff
    Failed,
}

impl JobStatus {
    /// Get the status name as stored
    pub fn as_str(&self) -> &'static str {
        match self {
            JobStatus::Queued => "queued",
            JobStatus::Running => "running",
            JobStatus::Succeeded => "succeeded",
            JobStatus::Failed => "failed",
        }
    }

    /// Parse a status from its stored name
    pub fn parse(s: &str) -> Option<Self> {
        match s {
            "queued" => Some(JobStatus::Queued),
            "running" => Some(JobStatus::Running),
            "succeeded" => Some(JobStatus::Succeeded),
            "failed" => Some(JobStatus::Failed),
            _ => None,
        }
    }
}

impl std::fmt::Display for JobStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Why a job failed
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum FailureReason {
    /// Any error while deduplicating, materializing, extracting or linking
    ProcessingError,
}

impl FailureReason {
    /// Error code recorded on the job
    pub fn code(&self) -> &'static str {
        match self {
            FailureReason::ProcessingError => "processing_error",
        }
    }

    /// Parse a stored error code
    pub fn parse(s: &str) -> Option<Self> {
        match s {
            "processing_error" => Some(FailureReason::ProcessingError),
            _ => None,
        }
    }
}

/// How a finished job resolved
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum JobOutcome {
    /// A new source record was materialized for this job
    Succeeded {
        /// The source created by this job
        source_id: SourceId,
    },

    /// The capture already existed; the job points at the canonical source
    Deduped {
        /// The source that already represents this capture
        canonical_source_id: SourceId,
    },

    /// Processing failed
    Failed {
        /// Failure classification
        reason: FailureReason,
    },
}

impl JobOutcome {
    /// Error code stored alongside the status (`deduped` is not a failure)
    pub fn error_code(&self) -> Option<&'static str> {
        match self {
            JobOutcome::Succeeded { .. } => None,
            JobOutcome::Deduped { .. } => Some("deduped"),
            JobOutcome::Failed { reason } => Some(reason.code()),
        }
    }

    /// The source this outcome links to, if any
    pub fn source_id(&self) -> Option<&SourceId> {
        match self {
            JobOutcome::Succeeded { source_id } => Some(source_id),
            JobOutcome::Deduped { canonical_source_id } => Some(canonical_source_id),
            JobOutcome::Failed { .. } => None,
        }
    }
}

/// Full job state
///
/// Keeps outcome data attached to the state it belongs to, so a queued job
/// can never carry a source link and a succeeded job can never lack one.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum JobState {
    /// Waiting to be claimed
    Queued,

    /// Claimed by the worker
    Running,

    /// Processing finished with an outcome
    Finished(JobOutcome),
}

impl JobState {
    /// Coarse status for reporting
    pub fn status(&self) -> JobStatus {
        match self {
            JobState::Queued => JobStatus::Queued,
            JobState::Running => JobStatus::Running,
            JobState::Finished(JobOutcome::Failed { .. }) => JobStatus::Failed,
            JobState::Finished(_) => JobStatus::Succeeded,
        }
    }
}

/// A capture accepted for processing, before it has a job row
#[derive(Debug, Clone)]
pub struct NewJob {
    /// Meeting the capture belongs to
    pub meeting_id: MeetingId,

    /// Raw payload as submitted
    pub payload: String,

    /// Capture kind
    pub capture_kind: CaptureKind,

    /// Referenced people that exist in the person store
    pub person_ids: Vec<PersonId>,

    /// Future-relevance timestamp
    pub relevant_at: Option<u64>,

    /// Due date applied to extracted commitments
    pub commitment_due_by: Option<u64>,

    /// Whether the worker submits the payload to the memory index
    pub index_in_memory: bool,
}

/// One submitted capture request
#[derive(Debug, Clone, PartialEq)]
pub struct IngestionJob {
    /// Unique identifier
    pub id: JobId,

    /// Meeting the capture belongs to
    pub meeting_id: MeetingId,

    /// Raw payload as submitted
    pub payload: String,

    /// Capture kind
    pub capture_kind: CaptureKind,

    /// Referenced people
    pub person_ids: Vec<PersonId>,

    /// Future-relevance timestamp
    pub relevant_at: Option<u64>,

    /// Due date applied to extracted commitments
    pub commitment_due_by: Option<u64>,

    /// Whether the payload goes to the memory index
    pub index_in_memory: bool,

    /// Fingerprint computed at admission
    pub fingerprint: Fingerprint,

    /// Lifecycle state
    pub state: JobState,

    /// When the job was admitted (seconds since Unix epoch)
    pub created_at: u64,

    /// When the worker last claimed the job
    pub started_at: Option<u64>,

    /// When the last attempt finished
    pub completed_at: Option<u64>,
}

impl IngestionJob {
    /// Create a queued job from an admitted capture
    pub fn queued(new_job: NewJob, created_at: u64) -> Self {
        let fingerprint = Fingerprint::derive(&FingerprintInput {
            meeting_id: &new_job.meeting_id,
            capture_kind: new_job.capture_kind,
            payload: &new_job.payload,
            person_ids: &new_job.person_ids,
            relevant_at: new_job.relevant_at,
        });

        Self {
            id: JobId::new(),
            meeting_id: new_job.meeting_id,
            payload: new_job.payload,
            capture_kind: new_job.capture_kind,
            person_ids: new_job.person_ids,
            relevant_at: new_job.relevant_at,
            commitment_due_by: new_job.commitment_due_by,
            index_in_memory: new_job.index_in_memory,
            fingerprint,
            state: JobState::Queued,
            created_at,
            started_at: None,
            completed_at: None,
        }
    }

    /// Recompute the fingerprint from the job's current fields
    pub fn derive_fingerprint(&self) -> Fingerprint {
        Fingerprint::derive(&FingerprintInput {
            meeting_id: &self.meeting_id,
            capture_kind: self.capture_kind,
            payload: &self.payload,
            person_ids: &self.person_ids,
            relevant_at: self.relevant_at,
        })
    }

    /// Coarse status
    pub fn status(&self) -> JobStatus {
        self.state.status()
    }

    /// Stored error code (`deduped`, `processing_error`) or none
    pub fn error_code(&self) -> Option<&'static str> {
        match &self.state {
            JobState::Finished(outcome) => outcome.error_code(),
            _ => None,
        }
    }

    /// Source record this job resolved to
    pub fn source_id(&self) -> Option<&SourceId> {
        match &self.state {
            JobState::Finished(outcome) => outcome.source_id(),
            _ => None,
        }
    }

    /// Transition to running and stamp the start time
    pub fn start(&mut self, now: u64) {
        self.state = JobState::Running;
        self.started_at = Some(now);
    }

    /// Record an outcome and stamp the completion time
    pub fn finish(&mut self, outcome: JobOutcome, now: u64) {
        self.state = JobState::Finished(outcome);
        self.completed_at = Some(now);
    }

    /// Put the job back in the queue, clearing any outcome
    pub fn requeue(&mut self) {
        self.state = JobState::Queued;
    }

    /// Snapshot for status polling
    pub fn status_report(&self) -> JobStatusReport {
        JobStatusReport {
            id: self.id.clone(),
            status: self.status(),
            started_at: self.started_at,
            completed_at: self.completed_at,
            error: self.error_code().map(str::to_string),
            source_id: self.source_id().cloned(),
        }
    }
}

/// Status snapshot returned to pollers
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct JobStatusReport {
    /// Job identifier
    pub id: JobId,

    /// Coarse status
    pub status: JobStatus,

    /// Start of the most recent attempt
    pub started_at: Option<u64>,

    /// End of the most recent attempt
    pub completed_at: Option<u64>,

    /// Error code, if any
    pub error: Option<String>,

    /// Linked source record, if any
    pub source_id: Option<SourceId>,
}

#[cfg(test)]
mod tests {
    use super::*;

    fn new_job(kind: CaptureKind) -> NewJob {
        NewJob {
            meeting_id: MeetingId::from("m_1"),
            payload: "Plan next steps".to_string(),
            capture_kind: kind,
            person_ids: Vec::new(),
            relevant_at: None,
            commitment_due_by: None,
            index_in_memory: false,
        }
    }

    #[test]
    fn test_queued_job_has_fingerprint() {
        let job = IngestionJob::queued(new_job(CaptureKind::Notes), 1_000);
        assert_eq!(job.status(), JobStatus::Queued);
        assert_eq!(job.fingerprint, job.derive_fingerprint());
        assert_eq!(job.created_at, 1_000);
        assert!(job.source_id().is_none());
    }

    #[test]
    fn test_success_links_source() {
        let mut job = IngestionJob::queued(new_job(CaptureKind::Notes), 1_000);
        job.start(1_001);
        assert_eq!(job.status(), JobStatus::Running);

        let source_id = SourceId::new();
        job.finish(JobOutcome::Succeeded { source_id: source_id.clone() }, 1_002);

        assert_eq!(job.status(), JobStatus::Succeeded);
        assert_eq!(job.source_id(), Some(&source_id));
        assert_eq!(job.error_code(), None);
        assert_eq!(job.completed_at, Some(1_002));
    }

    #[test]
    fn test_deduped_is_a_success() {
        let mut job = IngestionJob::queued(new_job(CaptureKind::Notes), 1_000);
        let canonical = SourceId::new();
        job.finish(JobOutcome::Deduped { canonical_source_id: canonical.clone() }, 1_005);

        let report = job.status_report();
        assert_eq!(report.status, JobStatus::Succeeded);
        assert_eq!(report.error.as_deref(), Some("deduped"));
        assert_eq!(report.source_id, Some(canonical));
    }

    #[test]
    fn test_failure_then_requeue_clears_error() {
        let mut job = IngestionJob::queued(new_job(CaptureKind::Decision), 1_000);
        job.start(1_001);
        job.finish(JobOutcome::Failed { reason: FailureReason::ProcessingError }, 1_002);
        assert_eq!(job.status(), JobStatus::Failed);
        assert_eq!(job.error_code(), Some("processing_error"));

        job.requeue();
        assert_eq!(job.status(), JobStatus::Queued);
        assert_eq!(job.error_code(), None);
    }

    #[test]
    fn test_status_parse_round_trip() {
        for status in [JobStatus::Queued, JobStatus::Running, JobStatus::Succeeded, JobStatus::Failed] {
            assert_eq!(JobStatus::parse(status.as_str()), Some(status));
        }
        assert_eq!(JobStatus::parse("done"), None);
    }
}
