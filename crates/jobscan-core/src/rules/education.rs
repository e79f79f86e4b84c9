//! Education level normalization.

use super::NormalizeResult;
use crate::models::entity::NormalizedValue;

/// Map a matched degree phrase to high-school, associate, bachelor, master
/// or doctorate.
pub fn normalize_education(raw: &str) -> NormalizeResult {
    let text = raw.trim().to_lowercase();
    let words: Vec<&str> = text
        .split(|c: char| !c.is_alphanumeric())
        .filter(|w| !w.is_empty())
        .collect();
    let has = |stems: &[&str]| words.iter().any(|w| stems.iter().any(|s| w.starts_with(s)));

    let level = if has(&["phd", "doctor"]) || text.contains("ph.d") {
        "doctorate"
    } else if has(&["bachelor", "undergraduate", "bsc"]) {
        "bachelor"
    } else if has(&["master", "mba", "msc"]) {
        "master"
    } else if has(&["associate"]) {
        "associate"
    } else if text.contains("high school") || has(&["ged"]) {
        "high-school"
    } else {
        return Ok(None);
    };

    Ok(Some(NormalizedValue::text(level)))
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    fn level(raw: &str) -> Option<NormalizedValue> {
        normalize_education(raw).unwrap()
    }

    #[test]
    fn test_levels() {
        assert_eq!(level("Bachelor's degree"), Some(NormalizedValue::text("bachelor")));
        assert_eq!(level("masters"), Some(NormalizedValue::text("master")));
        assert_eq!(level("Ph.D"), Some(NormalizedValue::text("doctorate")));
        assert_eq!(level("associate degree"), Some(NormalizedValue::text("associate")));
        assert_eq!(level("high school diploma"), Some(NormalizedValue::text("high-school")));
    }

    #[test]
    fn test_undergraduate_is_bachelor() {
        assert_eq!(level("undergraduate degree"), Some(NormalizedValue::text("bachelor")));
    }
}
