//! Rule tests for the extractor

#[cfg(test)]
mod tests {
    use crate::{
        extract_commitments, extract_risk_flags, COMMITMENT_RULE_BULLET,
        COMMITMENT_RULE_FIRST_LINE, COMMITMENT_RULE_PLACEHOLDER, FLAG_RULE_BLOCKER,
        FLAG_RULE_DEADLINE, PLACEHOLDER_COMMITMENT,
    };
    use custos_domain::RiskFlagKind;

    fn texts(payload: &str) -> Vec<String> {
        extract_commitments(payload).into_iter().map(|c| c.text).collect()
    }

    #[test]
    fn test_empty_payload_yields_placeholder() {
        let result = extract_commitments("");
        assert_eq!(result.len(), 1);
        assert_eq!(result[0].rule_id, COMMITMENT_RULE_PLACEHOLDER);
        assert_eq!(result[0].text, PLACEHOLDER_COMMITMENT);
    }

    #[test]
    fn test_blank_payload_yields_nothing() {
        assert!(extract_commitments("   \n\n  ").is_empty());
    }

    #[test]
    fn test_first_line_and_bullets_deduplicated() {
        let result = extract_commitments("Plan next steps\n- Send summary\n- Send summary");
        assert_eq!(
            result.iter().map(|c| c.text.as_str()).collect::<Vec<_>>(),
            vec!["Plan next steps", "Send summary"]
        );
        assert_eq!(result[0].rule_id, COMMITMENT_RULE_FIRST_LINE);
        assert_eq!(result[1].rule_id, COMMITMENT_RULE_BULLET);
    }

    #[test]
    fn test_all_bullet_markers() {
        assert_eq!(
            texts("Agenda\n- one\n* two\n• three\n+ four"),
            vec!["Agenda", "one", "two", "three"]
        );
    }

    #[test]
    fn test_first_line_bullet_keeps_first_occurrence() {
        // The first line is itself a bullet: the raw line wins, the stripped text follows
        let result = extract_commitments("- Ship it\nmore");
        assert_eq!(result.len(), 2);
        assert_eq!(result[0].text, "- Ship it");
        assert_eq!(result[1].text, "Ship it");
    }

    #[test]
    fn test_dedup_is_case_insensitive() {
        assert_eq!(texts("Follow up\n- follow UP\n- Call Sam"), vec!["Follow up", "Call Sam"]);
    }

    #[test]
    fn test_empty_bullet_ignored() {
        assert_eq!(texts("Header\n-  \n- real"), vec!["Header", "real"]);
    }

    #[test]
    fn test_lines_are_trimmed() {
        assert_eq!(texts("\n   Leading space  \n   - indented bullet"), vec!["Leading space", "indented bullet"]);
    }

    #[test]
    fn test_risk_flags_one_per_kind() {
        let flags = extract_risk_flags("Blocked by vendor\nDue Friday");
        assert_eq!(flags.len(), 2);

        assert_eq!(flags[0].kind, RiskFlagKind::DeadlineReference);
        assert_eq!(flags[0].rule_id, FLAG_RULE_DEADLINE);
        assert_eq!(flags[0].excerpt, "Blocked by vendor");

        assert_eq!(flags[1].kind, RiskFlagKind::BlockerReference);
        assert_eq!(flags[1].rule_id, FLAG_RULE_BLOCKER);
        assert_eq!(flags[1].excerpt, "Blocked by vendor");
    }

    #[test]
    fn test_risk_flags_whole_words_only() {
        assert!(extract_risk_flags("Bypass the due-diligence? no: overdue, risky, unblocked").len() == 1);
        assert!(extract_risk_flags("Nearby standby overdue risky").is_empty());
    }

    #[test]
    fn test_risk_flags_case_insensitive() {
        let flags = extract_risk_flags("RISK: supplier\nfinish BY monday");
        assert_eq!(flags.len(), 2);
        assert_eq!(flags[0].excerpt, "finish BY monday");
        assert_eq!(flags[1].excerpt, "RISK: supplier");
    }

    #[test]
    fn test_risk_flags_empty_payload() {
        assert!(extract_risk_flags("").is_empty());
        assert!(extract_risk_flags("Nothing alarming here").is_empty());
    }
}
