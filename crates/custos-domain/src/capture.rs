//! Capture kinds accepted by the pipeline

/// Kind of meeting capture
///
/// The kind drives two processing rules:
/// - reflections are indexed into memory by default
/// - reflections never yield commitments
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum CaptureKind {
    /// Free-form meeting notes
    Notes,

    /// Verbatim or machine transcript
    Transcript,

    /// A recorded decision
    Decision,

    /// Follow-up items after a meeting
    FollowUp,

    /// Personal reflection on a meeting
    Reflection,
}

impl CaptureKind {
    /// Every recognized kind, in display order
    pub const ALL: [CaptureKind; 5] = [
        CaptureKind::Notes,
        CaptureKind::Transcript,
        CaptureKind::Decision,
        CaptureKind::FollowUp,
        CaptureKind::Reflection,
    ];

    /// Get the kind name as stored and submitted
    pub fn as_str(&self) -> &'static str {
        match self {
            CaptureKind::Notes => "notes",
            CaptureKind::Transcript => "transcript",
            CaptureKind::Decision => "decision",
            CaptureKind::FollowUp => "follow-up",
            CaptureKind::Reflection => "reflection",
        }
    }

    /// Parse a kind from its stored name
    ///
    /// Matching is case-sensitive. `follow_up` is accepted as an alias of
    /// `follow-up`.
    pub fn parse(s: &str) -> Option<Self> {
        match s {
            "notes" => Some(CaptureKind::Notes),
            "transcript" => Some(CaptureKind::Transcript),
            "decision" => Some(CaptureKind::Decision),
            "follow-up" | "follow_up" => Some(CaptureKind::FollowUp),
            "reflection" => Some(CaptureKind::Reflection),
            _ => None,
        }
    }

    /// Whether captures of this kind go to the memory index when the caller gives no override
    pub fn indexed_by_default(&self) -> bool {
        matches!(self, CaptureKind::Reflection)
    }

    /// Whether commitment extraction runs for this kind
    pub fn yields_commitments(&self) -> bool {
        !matches!(self, CaptureKind::Reflection)
    }
}

impl std::str::FromStr for CaptureKind {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::parse(s).ok_or_else(|| format!("Invalid capture kind: {}", s))
    }
}

impl std::fmt::Display for CaptureKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_round_trip() {
        for kind in CaptureKind::ALL {
            assert_eq!(CaptureKind::parse(kind.as_str()), Some(kind));
        }
    }

    #[test]
    fn test_parse_rejects_unknown() {
        assert_eq!(CaptureKind::parse("memo"), None);
        assert_eq!(CaptureKind::parse("Notes"), None);
        assert!("".parse::<CaptureKind>().is_err());
    }

    #[test]
    fn test_follow_up_spellings() {
        assert_eq!(CaptureKind::FollowUp.as_str(), "follow-up");
        assert_eq!(CaptureKind::parse("follow-up"), Some(CaptureKind::FollowUp));
        assert_eq!(CaptureKind::parse("follow_up"), Some(CaptureKind::FollowUp));
        assert_eq!(CaptureKind::parse("followup"), None);
    }

    #[test]
    fn test_reflection_rules() {
        assert!(CaptureKind::Reflection.indexed_by_default());
        assert!(!CaptureKind::Reflection.yields_commitments());
        assert!(!CaptureKind::Notes.indexed_by_default());
        assert!(CaptureKind::Decision.yields_commitments());
    }
}
