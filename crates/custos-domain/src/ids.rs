//! Identifiers for pipeline records
//!
//! Records created by the pipeline (jobs, sources, commitments, risk flags,
//! audit entries) get a short type prefix followed by a UUIDv7 in simple hex
//! form, e.g. `j_01927c6e4f7a7cc1a0f3f1b2c3d4e5f6`. UUIDv7 keeps ids
//! chronologically sortable without coordination.
//!
//! Meetings and people are owned by external collaborators, so their ids are
//! opaque strings handed to us by callers.

use std::fmt;

macro_rules! generated_id {
    ($(#[$meta:meta])* $name:ident, $prefix:literal) => {
        $(#[$meta])*
        #[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash)]
        pub struct $name(String);

        impl $name {
            /// Prefix that every generated id of this type carries
            pub const PREFIX: &'static str = $prefix;

            /// Generate a fresh UUIDv7-backed id
            pub fn new() -> Self {
                Self(format!("{}{}", $prefix, uuid::Uuid::now_v7().simple()))
            }

            /// Wrap an id read back from storage
            pub fn from_string(value: impl Into<String>) -> Self {
                Self(value.into())
            }

            /// Borrow the id as a string slice
            pub fn as_str(&self) -> &str {
                &self.0
            }
        }

        impl Default for $name {
            fn default() -> Self {
                Self::new()
            }
        }

        impl fmt::Display for $name {
            fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
                f.write_str(&self.0)
            }
        }
    };
}

macro_rules! external_id {
    ($(#[$meta:meta])* $name:ident) => {
        $(#[$meta])*
        #[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash)]
        pub struct $name(String);

        impl $name {
            /// Wrap an id issued by the owning collaborator
            pub fn new(value: impl Into<String>) -> Self {
                Self(value.into())
            }

            /// Borrow the id as a string slice
            pub fn as_str(&self) -> &str {
                &self.0
            }
        }

        impl From<&str> for $name {
            fn from(value: &str) -> Self {
                Self(value.to_string())
            }
        }

        impl fmt::Display for $name {
            fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
                f.write_str(&self.0)
            }
        }
    };
}

generated_id!(
    /// Identifier of an ingestion job
    JobId,
    "j_"
);

generated_id!(
    /// Identifier of a source record
    SourceId,
    "s_"
);

generated_id!(
    /// Identifier of a persisted commitment
    CommitmentId,
    "c_"
);

generated_id!(
    /// Identifier of a persisted risk flag
    RiskFlagId,
    "rf_"
);

generated_id!(
    /// Identifier of an audit log entry
    AuditId,
    "al_"
);

external_id!(
    /// Identifier of a meeting owned by the meeting store
    MeetingId
);

external_id!(
    /// Identifier of a person owned by the person store
    PersonId
);
