//! Contact normalization: emails, phone numbers and URLs.

use super::NormalizeResult;
use crate::models::entity::NormalizedValue;

const URL_TRAILING: &[char] = &['.', ',', ';', ':', '!', '?', ')', '\'', '"'];

pub fn normalize_email(raw: &str) -> NormalizeResult {
    let email = raw.trim().to_lowercase();
    if email.contains('@') {
        Ok(Some(NormalizedValue::Text(email)))
    } else {
        Ok(None)
    }
}

/// Runs of whitespace become a single `-`.
pub fn normalize_phone(raw: &str) -> NormalizeResult {
    let phone = raw.split_whitespace().collect::<Vec<_>>().join("-");
    let digits = phone.chars().filter(|c| c.is_ascii_digit()).count();
    if digits < 7 {
        return Ok(None);
    }
    Ok(Some(NormalizedValue::Text(phone)))
}

pub fn normalize_url(raw: &str) -> NormalizeResult {
    let url = raw.trim().trim_end_matches(URL_TRAILING);
    if url.is_empty() {
        return Ok(None);
    }
    Ok(Some(NormalizedValue::Text(url.to_string())))
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    fn text(result: NormalizeResult) -> Option<String> {
        match result.unwrap() {
            Some(NormalizedValue::Text(t)) => Some(t),
            _ => None,
        }
    }

    #[test]
    fn test_email_is_lowercased() {
        assert_eq!(text(normalize_email("Careers@Company.COM")), Some("careers@company.com".to_string()));
    }

    #[test]
    fn test_phone_whitespace_runs() {
        assert_eq!(text(normalize_phone("+84  912 345\t678")), Some("+84-912-345-678".to_string()));
        assert_eq!(text(normalize_phone("(555) 123-4567")), Some("(555)-123-4567".to_string()));
    }

    #[test]
    fn test_url_trailing_punctuation() {
        assert_eq!(
            text(normalize_url("https://jobs.example.com/apply).")),
            Some("https://jobs.example.com/apply".to_string())
        );
    }
}
