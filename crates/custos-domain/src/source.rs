//! Source records and the artifacts extracted from them

use crate::{CaptureKind, CommitmentId, Fingerprint, MeetingId, RiskFlagId, SourceId};

/// One durable, deduplicated unit of captured context
///
/// At most one source exists per fingerprint. Commitments and risk flags are
/// owned by their source and deleted with it.
#[derive(Debug, Clone, PartialEq)]
pub struct SourceRecord {
    /// Unique identifier
    pub id: SourceId,

    /// Owning meeting
    pub meeting_id: MeetingId,

    /// Capture kind
    pub capture_kind: CaptureKind,

    /// When the source was materialized
    pub captured_at: u64,

    /// Future-relevance timestamp
    pub relevant_at: Option<u64>,

    /// Capture fingerprint (unique across sources)
    pub fingerprint: Fingerprint,

    /// Whether the payload was submitted to the memory index
    pub indexed: bool,

    /// Opaque storage locator
    pub uri: String,
}

impl SourceRecord {
    /// Build a source with a fresh id and a local storage locator
    pub fn new(
        meeting_id: MeetingId,
        capture_kind: CaptureKind,
        captured_at: u64,
        relevant_at: Option<u64>,
        fingerprint: Fingerprint,
        indexed: bool,
    ) -> Self {
        let id = SourceId::new();
        let uri = Self::local_uri(&id);
        Self {
            id,
            meeting_id,
            capture_kind,
            captured_at,
            relevant_at,
            fingerprint,
            indexed,
            uri,
        }
    }

    /// Storage locator for a source kept in the local store
    pub fn local_uri(id: &SourceId) -> String {
        format!("local://sources/{}", id)
    }
}

/// An actionable statement extracted from a source
#[derive(Debug, Clone, PartialEq)]
pub struct Commitment {
    /// Unique identifier
    pub id: CommitmentId,

    /// Owning source
    pub source_id: SourceId,

    /// Commitment text as extracted
    pub text: String,

    /// Extraction rule that produced it
    pub rule_id: String,

    /// Due date (from the job's commitment-due-by field)
    pub due_at: Option<u64>,

    /// Set by UI actions, never by the pipeline
    pub acknowledged: bool,

    /// When the commitment was persisted
    pub created_at: u64,
}

/// Kind of risk flag
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum RiskFlagKind {
    /// The text references a deadline ("by", "due")
    DeadlineReference,

    /// The text references a blocker ("blocked", "risk")
    BlockerReference,
}

impl RiskFlagKind {
    /// Get the kind name as stored
    pub fn as_str(&self) -> &'static str {
        match self {
            RiskFlagKind::DeadlineReference => "deadline_reference",
            RiskFlagKind::BlockerReference => "blocker_reference",
        }
    }

    /// Parse a kind from its stored name
    pub fn parse(s: &str) -> Option<Self> {
        match s {
            "deadline_reference" => Some(RiskFlagKind::DeadlineReference),
            "blocker_reference" => Some(RiskFlagKind::BlockerReference),
            _ => None,
        }
    }
}

/// A warning extracted from a source's text
///
/// At most one flag of each kind exists per source.
#[derive(Debug, Clone, PartialEq)]
pub struct RiskFlag {
    /// Unique identifier
    pub id: RiskFlagId,

    /// Owning source
    pub source_id: SourceId,

    /// Flag kind
    pub kind: RiskFlagKind,

    /// Extraction rule that produced it
    pub rule_id: String,

    /// The full line that matched
    pub excerpt: String,

    /// Capture time of the owning source
    pub captured_at: u64,
}
