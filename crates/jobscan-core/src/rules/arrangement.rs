//! Work arrangement normalization.

use super::NormalizeResult;
use crate::models::entity::NormalizedValue;

/// Synonym stems and the canonical arrangement they map to, checked in order.
const ARRANGEMENTS: &[(&[&str], &str)] = &[
    (&["hybrid"], "hybrid"),
    (&["remote", "from home", "from-home", "wfh", "telecommut", "telework"], "remote"),
    (&["site", "person", "office"], "onsite"),
    (&["full"], "full-time"),
    (&["part"], "part-time"),
    (&["contract", "freelance", "temporary"], "contract"),
];

/// Map a matched arrangement phrase to remote, hybrid, onsite, full-time,
/// part-time or contract.
pub fn normalize_arrangement(raw: &str) -> NormalizeResult {
    let text = raw.trim().to_lowercase();
    Ok(ARRANGEMENTS
        .iter()
        .find(|(stems, _)| stems.iter().any(|s| text.contains(s)))
        .map(|(_, canonical)| NormalizedValue::text(*canonical)))
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    fn arrangement(raw: &str) -> Option<NormalizedValue> {
        normalize_arrangement(raw).unwrap()
    }

    #[test]
    fn test_synonyms() {
        assert_eq!(arrangement("Work From Home"), Some(NormalizedValue::text("remote")));
        assert_eq!(arrangement("wfh"), Some(NormalizedValue::text("remote")));
        assert_eq!(arrangement("in-person"), Some(NormalizedValue::text("onsite")));
        assert_eq!(arrangement("full time"), Some(NormalizedValue::text("full-time")));
        assert_eq!(arrangement("freelance"), Some(NormalizedValue::text("contract")));
    }

    #[test]
    fn test_unrecognized() {
        assert_eq!(arrangement("flexible"), None);
    }
}
