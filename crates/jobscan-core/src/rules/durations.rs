//! Duration normalization for experience, contract and plain periods.

use super::patterns::NUMBER;
use super::{parse_number, NormalizeResult};
use crate::models::entity::{DurationKind, DurationValue, NormalizedValue, TimeUnit};

/// Normalize a matched duration such as "5+ years" or "3 to 5 years of experience".
pub fn normalize_duration(raw: &str) -> NormalizeResult {
    let text = raw.trim().to_lowercase();

    let numbers = NUMBER
        .find_iter(&text)
        .map(|m| parse_number("duration", m.as_str()))
        .collect::<Result<Vec<u32>, _>>()?;

    let Some(&first) = numbers.first() else {
        return Ok(None);
    };

    let (min, max) = match numbers.get(1).copied() {
        Some(second) if second < first => (second, Some(first)),
        Some(second) => (first, Some(second)),
        None => (first, None),
    };

    let unit = text
        .split(|c: char| !c.is_alphabetic())
        .filter(|w| !w.is_empty())
        .find_map(TimeUnit::parse)
        .unwrap_or(TimeUnit::Years);

    let kind = if text.contains("contract") {
        DurationKind::Contract
    } else if text.contains("exp") || text.contains("kinh nghiệm") {
        DurationKind::Experience
    } else {
        DurationKind::Plain
    };

    Ok(Some(NormalizedValue::Duration(DurationValue {
        min,
        max,
        open_ended: text.contains('+'),
        unit,
        kind,
    })))
}
