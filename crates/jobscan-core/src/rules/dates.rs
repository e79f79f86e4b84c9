//! Date normalization for posting, start and deadline dates.

use chrono::NaiveDate;

use super::patterns::{DATE_IMMEDIATE, DATE_ISO, DATE_MONTH_YEAR, DATE_NUMERIC, DATE_WITHIN};
use super::{parse_number, NormalizeResult};
use crate::models::entity::{DateValue, NormalizedValue, TimeUnit};

/// Normalize a matched date expression.
///
/// Numeric dates are read day-first unless only the month-first reading
/// is valid. Impossible calendar dates yield `Ok(None)`.
pub fn normalize_date(raw: &str) -> NormalizeResult {
    let text = raw.trim().to_lowercase();

    if let Some(caps) = DATE_ISO.captures(&text) {
        let year = parse_number("date", &caps[1])? as i32;
        let month = parse_number("date", &caps[2])?;
        let day = parse_number("date", &caps[3])?;
        return Ok(absolute(year, month, day));
    }

    if let Some(caps) = DATE_NUMERIC.captures(&text) {
        let first = parse_number("date", &caps[1])?;
        let second = parse_number("date", &caps[2])?;
        let year = parse_number("date", &caps[3])? as i32;
        let (day, month) = if first <= 12 && second > 12 {
            (second, first)
        } else {
            (first, second)
        };
        return Ok(absolute(year, month, day));
    }

    if let Some(caps) = DATE_MONTH_YEAR.captures(&text) {
        let Some(month) = month_number(&caps[2]) else {
            return Ok(None);
        };
        let year = parse_number("date", &caps[4])? as i32;
        let day = caps.get(1).or_else(|| caps.get(3));
        return match day {
            Some(day) => Ok(absolute(year, month, parse_number("date", day.as_str())?)),
            None => Ok(Some(NormalizedValue::Date(DateValue::MonthYear { year, month }))),
        };
    }

    if let Some(caps) = DATE_WITHIN.captures(&text) {
        let amount = parse_number("date", &caps[1])?;
        let Some(unit) = TimeUnit::parse(&caps[2]) else {
            return Ok(None);
        };
        return Ok(Some(NormalizedValue::Date(DateValue::Within { amount, unit })));
    }

    if DATE_IMMEDIATE.is_match(&text) {
        return Ok(Some(NormalizedValue::Date(DateValue::Immediate)));
    }

    Ok(None)
}

fn absolute(year: i32, month: u32, day: u32) -> Option<NormalizedValue> {
    NaiveDate::from_ymd_opt(year, month, day)
        .map(|date| NormalizedValue::Date(DateValue::Absolute { date }))
}

/// Convert an English month name or abbreviation to its number.
pub fn month_number(name: &str) -> Option<u32> {
    let prefix: String = name.trim().to_lowercase().chars().take(3).collect();
    match prefix.as_str() {
        "jan" => Some(1),
        "feb" => Some(2),
        "mar" => Some(3),
        "apr" => Some(4),
        "may" => Some(5),
        "jun" => Some(6),
        "jul" => Some(7),
        "aug" => Some(8),
        "sep" => Some(9),
        "oct" => Some(10),
        "nov" => Some(11),
        "dec" => Some(12),
        _ => None,
    }
}
