//! Salary normalization for dollar, USD and Vietnamese dong amounts.

use std::str::FromStr;

use rust_decimal::Decimal;

use super::patterns::AMOUNT;
use super::NormalizeResult;
use crate::error::ExtractionError;
use crate::models::entity::{NormalizedValue, PayPeriod, SalaryValue};

const THOUSAND: i64 = 1_000;
const MILLION: i64 = 1_000_000;

/// Normalize a matched salary expression into a range.
///
/// Handles "$50,000-70,000", "$50k-70k", "10-15 triệu vnd", "15.000.000 vnd"
/// and "$25/hour".
pub fn normalize_salary(raw: &str) -> NormalizeResult {
    let text = raw.trim().to_lowercase();

    let currency = detect_currency(&text);
    let vnd = currency.as_deref() == Some("VND");
    let millions = ["triệu", "million"].iter().any(|w| text.contains(w)) || has_word(&text, "tr");

    let mut amounts = Vec::new();
    let mut any_k = false;
    for caps in AMOUNT.captures_iter(&text) {
        let value = parse_amount(&caps[1], vnd)?;
        let k = caps.get(2).is_some();
        any_k |= k;
        amounts.push((value, k));
    }

    if amounts.is_empty() {
        return Ok(None);
    }

    // "$50-70k" applies the suffix to both bounds.
    let scaled = amounts
        .iter()
        .map(|&(value, k)| {
            let factor = if millions {
                MILLION
            } else if k || (any_k && value < Decimal::from(THOUSAND)) {
                THOUSAND
            } else {
                1
            };
            value
                .checked_mul(Decimal::from(factor))
                .ok_or_else(|| ExtractionError::normalize("salary", raw, "amount overflows"))
        })
        .collect::<Result<Vec<Decimal>, _>>()?;

    let first = scaled[0];
    let (min, max) = match scaled.get(1).copied() {
        Some(second) if second < first => (second, Some(first)),
        Some(second) => (first, Some(second)),
        None => (first, None),
    };

    let period = detect_period(&text, millions && vnd);

    Ok(Some(NormalizedValue::Salary(SalaryValue {
        min,
        max,
        currency,
        period,
    })))
}

fn detect_currency(text: &str) -> Option<String> {
    if text.contains('$') || text.contains("usd") || text.contains("dollar") {
        Some("USD".to_string())
    } else if ["vnd", "vnđ", "đồng", "triệu"].iter().any(|w| text.contains(w)) || has_word(text, "tr") {
        Some("VND".to_string())
    } else {
        None
    }
}

fn detect_period(text: &str, monthly_default: bool) -> PayPeriod {
    if text.contains("hour") || text.contains("/hr") {
        PayPeriod::Hour
    } else if text.contains("month") || text.contains("/mo") {
        PayPeriod::Month
    } else if text.contains("year") || text.contains("annum") || text.contains("annually") || text.contains("/yr") {
        PayPeriod::Year
    } else if monthly_default {
        PayPeriod::Month
    } else {
        PayPeriod::Unspecified
    }
}

/// Whole-word check that also finds "tr" in "10tr".
fn has_word(text: &str, word: &str) -> bool {
    text.split(|c: char| !c.is_alphabetic()).any(|w| w == word)
}

/// Parse "50,000", "15.000.000", "1.5" or "15,5" into a decimal.
///
/// Separators followed by exactly three digits are thousands separators.
/// Dots are only read as thousands separators for dong amounts or when
/// they repeat.
fn parse_amount(raw: &str, vnd: bool) -> Result<Decimal, ExtractionError> {
    let grouped = |sep: char| raw.split(sep).skip(1).all(|g| g.len() == 3);

    let mut number = raw.to_string();
    if number.contains(',') {
        number = if grouped(',') {
            number.replace(',', "")
        } else {
            number.replace(',', ".")
        };
    }

    let dots = number.matches('.').count();
    if dots > 0 && (vnd || dots > 1) && number.split('.').skip(1).all(|g| g.len() == 3) {
        number = number.replace('.', "");
    }

    Decimal::from_str(&number)
        .map_err(|e| ExtractionError::normalize("salary", raw, e.to_string()))
}
