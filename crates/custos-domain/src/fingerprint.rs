//! Capture fingerprints
//!
//! A fingerprint is the SHA-256 hex digest of five normalized fields:
//! meeting id, capture kind, normalized payload, people key and relevant-at.
//! Submission time never participates, so the same logical capture always
//! hashes to the same value. Both admission-time and processing-time
//! deduplication rely on it.

use crate::{CaptureKind, MeetingId, PersonId};
use sha2::{Digest, Sha256};
use std::fmt;

/// Separator between fingerprint fields (ASCII unit separator)
const FIELD_SEPARATOR: char = '\u{1f}';

/// Collapse whitespace runs to single spaces, trim, and lowercase
///
/// # Examples
///
/// ```
/// use custos_domain::normalize_payload;
///
/// assert_eq!(normalize_payload("  Send\tthe\n\nSUMMARY "), "send the summary");
/// ```
pub fn normalize_payload(payload: &str) -> String {
    payload.split_whitespace().collect::<Vec<_>>().join(" ").to_lowercase()
}

/// Normalize commitment text for duplicate checks
///
/// Same rules as payload normalization: case and whitespace insensitive.
pub fn normalize_text(text: &str) -> String {
    normalize_payload(text)
}

/// Serialize a referenced-people set: sorted, deduplicated, comma-joined
pub fn people_key(person_ids: &[PersonId]) -> String {
    let mut ids: Vec<&str> = person_ids.iter().map(PersonId::as_str).collect();
    ids.sort_unstable();
    ids.dedup();
    ids.join(",")
}

/// Fields that identify one logical capture
#[derive(Debug, Clone, Copy)]
pub struct FingerprintInput<'a> {
    /// Meeting the capture belongs to
    pub meeting_id: &'a MeetingId,

    /// Capture kind
    pub capture_kind: CaptureKind,

    /// Raw payload (normalized during derivation)
    pub payload: &'a str,

    /// Referenced people (order and duplicates do not matter)
    pub person_ids: &'a [PersonId],

    /// Future-relevance timestamp, if any
    pub relevant_at: Option<u64>,
}

/// Deterministic 64-character hex fingerprint of a capture
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct Fingerprint(String);

impl Fingerprint {
    /// Derive the fingerprint for a capture
    ///
    /// # Examples
    ///
    /// ```
    /// use custos_domain::{CaptureKind, Fingerprint, FingerprintInput, MeetingId};
    ///
    /// let meeting = MeetingId::from("m_1");
    /// let a = Fingerprint::derive(&FingerprintInput {
    ///     meeting_id: &meeting,
    ///     capture_kind: CaptureKind::Notes,
    ///     payload: "Ship it",
    ///     person_ids: &[],
    ///     relevant_at: None,
    /// });
    /// let b = Fingerprint::derive(&FingerprintInput {
    ///     meeting_id: &meeting,
    ///     capture_kind: CaptureKind::Notes,
    ///     payload: "  ship   IT ",
    ///     person_ids: &[],
    ///     relevant_at: None,
    /// });
    /// assert_eq!(a, b);
    /// assert_eq!(a.as_str().len(), 64);
    /// ```
    pub fn derive(input: &FingerprintInput<'_>) -> Self {
        let relevant_at = input
            .relevant_at
            .map(|ts| ts.to_string())
            .unwrap_or_default();

        let fields = [
            input.meeting_id.as_str().to_string(),
            input.capture_kind.as_str().to_string(),
            normalize_payload(input.payload),
            people_key(input.person_ids),
            relevant_at,
        ];
        let joined = fields.join(&FIELD_SEPARATOR.to_string());

        let mut hasher = Sha256::new();
        hasher.update(joined.as_bytes());
        Self(hex::encode(hasher.finalize()))
    }

    /// Wrap a fingerprint read back from storage
    pub fn from_string(value: impl Into<String>) -> Self {
        Self(value.into())
    }

    /// Borrow the hex digest
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for Fingerprint {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}
