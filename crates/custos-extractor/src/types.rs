//! Candidate types produced by the rules

use custos_domain::RiskFlagKind;

/// A commitment the worker may persist
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CommitmentCandidate {
    /// Commitment text
    pub text: String,

    /// Rule that produced it
    pub rule_id: &'static str,
}

/// A risk flag the worker will persist
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RiskFlagCandidate {
    /// Flag kind
    pub kind: RiskFlagKind,

    /// Rule that produced it
    pub rule_id: &'static str,

    /// The full matching line
    pub excerpt: String,
}
