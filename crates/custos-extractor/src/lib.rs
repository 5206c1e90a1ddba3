//! Custos Extractor
//!
//! Deterministic rules that turn a capture's raw text into commitment and
//! risk-flag candidates.
//!
//! # Overview
//!
//! Both extractors read the same input: the payload split into lines, each
//! line trimmed, blank lines dropped. Nothing here touches storage; the worker
//! decides which candidates to persist.
//!
//! # Architecture
//!
//! ```text
//! payload → lines → commitment rules → [CommitmentCandidate]
//!                 → keyword rules    → [RiskFlagCandidate] (≤ 1 per kind)
//! ```
//!
//! # Example Usage
//!
//! ```
//! use custos_extractor::{extract_commitments, extract_risk_flags};
//!
//! let commitments = extract_commitments("Plan next steps\n- Send summary");
//! assert_eq!(commitments.len(), 2);
//!
//! let flags = extract_risk_flags("Blocked by vendor");
//! assert_eq!(flags.len(), 2);
//! ```

#![warn(missing_docs)]

mod rules;
mod types;

#[cfg(test)]
mod tests;

pub use rules::{
    extract_commitments, extract_risk_flags, BULLET_MARKERS, COMMITMENT_RULE_BULLET,
    COMMITMENT_RULE_FIRST_LINE, COMMITMENT_RULE_PLACEHOLDER, FLAG_RULE_BLOCKER,
    FLAG_RULE_DEADLINE, PLACEHOLDER_COMMITMENT,
};
pub use types::{CommitmentCandidate, RiskFlagCandidate};
