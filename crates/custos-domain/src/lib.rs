//! Custos Domain Layer
//!
//! Core model for the meeting-capture ingestion pipeline. This crate holds no
//! I/O: it defines the records the pipeline produces, the job state machine,
//! the capture fingerprint, and the trait seams that the store, indexer and
//! worker crates plug into.
//!
//! ## Key Concepts
//!
//! - **Capture**: one unit of meeting text (notes, transcript, decision, follow-up, reflection)
//! - **IngestionJob**: a submitted capture and its lifecycle (queued → running → succeeded | failed)
//! - **Fingerprint**: deterministic SHA-256 over the normalized capture fields
//! - **SourceRecord**: the durable, deduplicated fact a job resolves to
//! - **Commitment / RiskFlag**: artifacts extracted from a source's text
//!
//! ## Architecture
//!
//! - Pure business logic only
//! - Infrastructure implementations live in other crates
//! - Trait definitions for all external interactions

#![warn(missing_docs)]
#![warn(clippy::all)]

pub mod audit;
pub mod capture;
pub mod clock;
pub mod fingerprint;
pub mod ids;
pub mod job;
pub mod meeting;
pub mod source;
pub mod traits;

// Re-exports for convenience
pub use audit::{AuditAction, AuditEntry};
pub use capture::CaptureKind;
pub use clock::{Clock, ManualClock, SystemClock};
pub use fingerprint::{normalize_payload, normalize_text, people_key, Fingerprint, FingerprintInput};
pub use ids::{AuditId, CommitmentId, JobId, MeetingId, PersonId, RiskFlagId, SourceId};
pub use job::{FailureReason, IngestionJob, JobOutcome, JobState, JobStatus, JobStatusReport, NewJob};
pub use meeting::{Meeting, Person};
pub use source::{Commitment, RiskFlag, RiskFlagKind, SourceRecord};
pub use traits::{
    excerpt, AuditLog, IndexMetadata, Indexer, IngestionStore, JobQuery, MeetingDirectory,
    Transactional,
};
