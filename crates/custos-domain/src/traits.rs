//! Trait definitions for external interactions
//!
//! These traits define the boundaries between the pipeline and its storage,
//! its collaborators and the semantic index. Implementations live in other
//! crates (`custos-store`, `custos-memory`).

use crate::{
    AuditEntry, CaptureKind, Commitment, CommitmentId, Fingerprint, IngestionJob, JobId,
    JobStatus, Meeting, MeetingId, PersonId, RiskFlag, SourceId, SourceRecord,
};

/// Explicit transaction boundaries
///
/// The worker commits the running transition on its own, then wraps all
/// processing writes for one job in a single transaction.
pub trait Transactional {
    /// Error type for store operations
    type Error;

    /// Open a transaction
    fn begin(&mut self) -> Result<(), Self::Error>;

    /// Commit the open transaction
    fn commit(&mut self) -> Result<(), Self::Error>;

    /// Discard the open transaction
    fn rollback(&mut self) -> Result<(), Self::Error>;
}

/// Durable storage for jobs, sources and extracted artifacts
///
/// Implemented by the infrastructure layer (custos-store)
pub trait IngestionStore: Transactional {
    /// Insert a new job
    fn insert_job(&mut self, job: &IngestionJob) -> Result<(), Self::Error>;

    /// Overwrite a job's mutable fields (state, timestamps)
    fn update_job(&mut self, job: &IngestionJob) -> Result<(), Self::Error>;

    /// Get a job by ID
    fn get_job(&self, id: &JobId) -> Result<Option<IngestionJob>, Self::Error>;

    /// Query jobs matching criteria
    fn query_jobs(&self, query: &JobQuery) -> Result<Vec<IngestionJob>, Self::Error>;

    /// Insert a source record (fingerprints are unique)
    fn insert_source(&mut self, source: &SourceRecord) -> Result<(), Self::Error>;

    /// Get a source by ID
    fn get_source(&self, id: &SourceId) -> Result<Option<SourceRecord>, Self::Error>;

    /// Find the source carrying a fingerprint
    fn find_source_by_fingerprint(
        &self,
        fingerprint: &Fingerprint,
    ) -> Result<Option<SourceRecord>, Self::Error>;

    /// Delete a source together with its commitments and risk flags
    fn delete_source(&mut self, id: &SourceId) -> Result<(), Self::Error>;

    /// Persist a commitment
    fn insert_commitment(&mut self, commitment: &Commitment) -> Result<(), Self::Error>;

    /// Commitments owned by a source, oldest first
    fn commitments_for_source(&self, id: &SourceId) -> Result<Vec<Commitment>, Self::Error>;

    /// Remove a single commitment
    fn delete_commitment(&mut self, id: &CommitmentId) -> Result<(), Self::Error>;

    /// Persist a risk flag
    fn insert_risk_flag(&mut self, flag: &RiskFlag) -> Result<(), Self::Error>;

    /// Risk flags owned by a source
    fn risk_flags_for_source(&self, id: &SourceId) -> Result<Vec<RiskFlag>, Self::Error>;
}

/// Meeting, person and participant lookups owned by external collaborators
pub trait MeetingDirectory: Transactional {
    /// Look up a meeting
    fn meeting(&self, id: &MeetingId) -> Result<Option<Meeting>, Self::Error>;

    /// The subset of `ids` that exist in the person store, in input order
    fn existing_people(&self, ids: &[PersonId]) -> Result<Vec<PersonId>, Self::Error>;

    /// Link a person to a meeting; returns `true` if the link was created
    fn link_participant(
        &mut self,
        meeting_id: &MeetingId,
        person_id: &PersonId,
    ) -> Result<bool, Self::Error>;

    /// Stamp `last_interaction_at` on every participant of a meeting
    ///
    /// Returns the people that were touched.
    fn touch_participants(
        &mut self,
        meeting_id: &MeetingId,
        at: u64,
    ) -> Result<Vec<PersonId>, Self::Error>;
}

/// Append-only audit trail
pub trait AuditLog: Transactional {
    /// Append an entry inside the current transaction, if any
    fn append_audit(&mut self, entry: &AuditEntry) -> Result<(), Self::Error>;

    /// Entries, oldest first, optionally limited to one entity
    fn list_audit(&self, entity_id: Option<&str>) -> Result<Vec<AuditEntry>, Self::Error>;
}

/// Best-effort semantic index
///
/// Callers must log and swallow failures; indexing never decides a job's outcome.
pub trait Indexer {
    /// Error type for index operations
    type Error;

    /// Index a document under `id`
    fn index(&self, document: &str, metadata: &IndexMetadata, id: &str) -> Result<(), Self::Error>;
}

/// Metadata envelope submitted alongside an indexed document
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct IndexMetadata {
    /// Source record the document belongs to
    pub source_id: SourceId,

    /// Owning meeting
    pub meeting_id: MeetingId,

    /// Meeting title at indexing time
    pub meeting_title: String,

    /// Capture timestamp of the source
    pub captured_at: u64,

    /// Capture kind
    pub capture_kind: CaptureKind,

    /// Truncated preview of the document
    pub excerpt: String,
}

/// Marker appended to truncated excerpts
pub const EXCERPT_ELLIPSIS: &str = "...";

/// Cap `text` at `max_chars` characters, appending an ellipsis when cut
pub fn excerpt(text: &str, max_chars: usize) -> String {
    if text.chars().count() <= max_chars {
        return text.to_string();
    }
    let mut cut: String = text.chars().take(max_chars).collect();
    cut.push_str(EXCERPT_ELLIPSIS);
    cut
}

/// Query criteria for retrieving jobs
///
/// Results are ordered by creation time (then id), oldest first unless
/// `newest_first` is set.
#[derive(Debug, Clone, Default)]
pub struct JobQuery {
    /// Filter by meeting
    pub meeting_id: Option<MeetingId>,

    /// Filter by capture kind
    pub capture_kind: Option<CaptureKind>,

    /// Filter by status
    pub status: Option<JobStatus>,

    /// Filter by fingerprint
    pub fingerprint: Option<Fingerprint>,

    /// Filter by linked source
    pub source_id: Option<SourceId>,

    /// Only jobs created at or after this time
    pub created_since: Option<u64>,

    /// Only jobs completed at or after this time
    pub completed_since: Option<u64>,

    /// Only jobs completed at or before this time
    pub completed_before: Option<u64>,

    /// Reverse the ordering
    pub newest_first: bool,

    /// Maximum results to return
    pub limit: Option<usize>,
}

impl JobQuery {
    /// Queued jobs, oldest first
    pub fn queued() -> Self {
        Self {
            status: Some(JobStatus::Queued),
            ..Self::default()
        }
    }

    /// Jobs in a given status
    pub fn with_status(status: JobStatus) -> Self {
        Self {
            status: Some(status),
            ..Self::default()
        }
    }
}
