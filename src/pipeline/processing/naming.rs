use regex::Regex;
use std::sync::OnceLock;

use crate::constants::ISSUE_COLUMN_PREFIX;

fn separator_runs() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| Regex::new(r"[^0-9A-Za-z]+").expect("static regex"))
}

/// Derive the analytic column name for an issue topic.
///
/// Every run of characters outside `[0-9A-Za-z]` collapses to a single `_`,
/// separators at either end are dropped, then `score_` is prefixed. The
/// mapping is total and not injective: `"Gun Control"` and `"Gun-Control!!"`
/// share `score_Gun_Control`.
pub fn issue_column(topic: &str) -> String {
    let body = separator_runs().replace_all(topic, "_");
    format!("{}{}", ISSUE_COLUMN_PREFIX, body.trim_matches('_'))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_issue_column_collapses_runs() {
        assert_eq!(issue_column("Gun Control"), "score_Gun_Control");
        assert_eq!(issue_column("LGBTQ+"), "score_LGBTQ");
        assert_eq!(issue_column("Civil  --  Rights"), "score_Civil_Rights");
        assert_eq!(issue_column("Bullying"), "score_Bullying");
        assert_eq!(issue_column("substance_abuse"), "score_substance_abuse");
    }

    #[test]
    fn test_issue_column_collisions() {
        assert_eq!(issue_column("Gun Control"), issue_column("Gun-Control!!"));
        assert_eq!(issue_column("  Gun Control"), "score_Gun_Control");
        assert_ne!(issue_column("Gun Control"), issue_column("GunControl"));
    }

    #[test]
    fn test_issue_column_is_total() {
        assert_eq!(issue_column(""), "score_");
        assert_eq!(issue_column("!!!"), "score_");
        assert_eq!(issue_column("Ünïcode Topic"), "score_n_code_Topic");
    }
}
