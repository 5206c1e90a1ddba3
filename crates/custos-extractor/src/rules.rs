//! Commitment and risk-flag rules

use std::collections::HashSet;

use custos_domain::RiskFlagKind;
use once_cell::sync::Lazy;
use regex::Regex;

use crate::types::{CommitmentCandidate, RiskFlagCandidate};

/// First non-blank line of the payload
pub const COMMITMENT_RULE_FIRST_LINE: &str = "commitment_first_line";

/// A bulleted line
pub const COMMITMENT_RULE_BULLET: &str = "commitment_bullet";

/// Emitted when the payload is empty
pub const COMMITMENT_RULE_PLACEHOLDER: &str = "commitment_placeholder";

/// Deadline keyword ("by", "due")
pub const FLAG_RULE_DEADLINE: &str = "flag_deadline_keyword";

/// Blocker keyword ("blocked", "risk")
pub const FLAG_RULE_BLOCKER: &str = "flag_blocker_keyword";

/// Text of the placeholder commitment
pub const PLACEHOLDER_COMMITMENT: &str = "Review meeting context";

/// Line prefixes treated as bullets
pub const BULLET_MARKERS: [&str; 3] = ["- ", "* ", "• "];

static DEADLINE_PATTERN: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"(?i)\b(by|due)\b").expect("deadline keyword regex"));

static BLOCKER_PATTERN: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"(?i)\b(blocked|risk)\b").expect("blocker keyword regex"));

/// Trimmed, non-blank lines
fn content_lines(payload: &str) -> impl Iterator<Item = &str> {
    payload.lines().map(str::trim).filter(|line| !line.is_empty())
}

fn strip_bullet(line: &str) -> Option<&str> {
    BULLET_MARKERS
        .iter()
        .find_map(|marker| line.strip_prefix(marker))
        .map(str::trim)
}

/// Derive commitment candidates from a payload
///
/// An empty payload yields the single placeholder candidate. Otherwise the
/// first line is always a candidate and every bulleted line contributes its
/// text without the marker. Candidates are deduplicated case-insensitively,
/// keeping the first occurrence.
pub fn extract_commitments(payload: &str) -> Vec<CommitmentCandidate> {
    if payload.is_empty() {
        return vec![CommitmentCandidate {
            text: PLACEHOLDER_COMMITMENT.to_string(),
            rule_id: COMMITMENT_RULE_PLACEHOLDER,
        }];
    }

    let mut candidates = Vec::new();
    let mut lines = content_lines(payload).peekable();

    if let Some(first) = lines.peek() {
        candidates.push(CommitmentCandidate {
            text: first.to_string(),
            rule_id: COMMITMENT_RULE_FIRST_LINE,
        });
    }

    for line in lines {
        if let Some(text) = strip_bullet(line) {
            if !text.is_empty() {
                candidates.push(CommitmentCandidate {
                    text: text.to_string(),
                    rule_id: COMMITMENT_RULE_BULLET,
                });
            }
        }
    }

    let mut seen = HashSet::new();
    candidates.retain(|candidate| seen.insert(candidate.text.to_lowercase()));
    candidates
}

/// Derive risk-flag candidates from a payload
///
/// Each kind is scanned independently and stops at its first matching line,
/// so the result holds at most one deadline flag and one blocker flag, in
/// that order.
pub fn extract_risk_flags(payload: &str) -> Vec<RiskFlagCandidate> {
    let rules = [
        (&DEADLINE_PATTERN, RiskFlagKind::DeadlineReference, FLAG_RULE_DEADLINE),
        (&BLOCKER_PATTERN, RiskFlagKind::BlockerReference, FLAG_RULE_BLOCKER),
    ];

    rules
        .into_iter()
        .filter_map(|(pattern, kind, rule_id)| {
            content_lines(payload)
                .find(|line| pattern.is_match(line))
                .map(|line| RiskFlagCandidate {
                    kind,
                    rule_id,
                    excerpt: line.to_string(),
                })
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_keyword_patterns_compile_and_match() {
        assert!(DEADLINE_PATTERN.is_match("Due Friday"));
        assert!(DEADLINE_PATTERN.is_match("ship it by noon"));
        assert!(!DEADLINE_PATTERN.is_match("standby"));
        assert!(BLOCKER_PATTERN.is_match("RISK: vendor"));
        assert!(!BLOCKER_PATTERN.is_match("unblocked"));
    }
}
