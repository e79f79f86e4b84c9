//! Raw posting cleanup: HTML removal, whitespace, bullets and section headings.

use std::ops::Range;

use lazy_static::lazy_static;
use regex::Regex;
use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::error::ValidationError;
use crate::models::config::PreprocessingConfig;

lazy_static! {
    static ref BLOCK_TAG: Regex = Regex::new(
        r"(?i)</?(?:br|p|div|ul|ol|h[1-6]|tr|table|section|article)\b[^>]*>"
    ).unwrap();

    static ref LIST_ITEM: Regex = Regex::new(r"(?i)<li\b[^>]*>").unwrap();

    static ref LIST_ITEM_END: Regex = Regex::new(r"(?i)</li\s*>").unwrap();

    static ref TAG: Regex = Regex::new(r"<[^>]*>").unwrap();

    static ref ENTITY: Regex = Regex::new(r"&(?:#(\d{1,6})|#[xX]([0-9a-fA-F]{1,6})|([a-zA-Z]{2,8}));").unwrap();

    static ref BULLET: Regex = Regex::new(r"(?m)^[ \t]*(?:[•·▪▫◦‣⁃●○■□➢➤►*]|-[ \t]|\d{1,2}[.)][ \t])[ \t]*").unwrap();

    static ref HORIZONTAL_SPACE: Regex = Regex::new(r"[ \t\x{a0}\x{2000}-\x{200b}\x{3000}]+").unwrap();

    static ref HEADING: Regex = Regex::new(
        r"(?m)^[ \t]*(requirements?|qualifications?|what you(?:'ll)? need|must haves?|skills(?: required)?|responsibilities|duties|what you(?:'ll)? do|the role|benefits?|perks?|what we offer|we offer|compensation|about us|about the company|who we are|job description|description|overview)[ \t]*:?[ \t]*$"
    ).unwrap();
}

/// Recognized section headings.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SectionKind {
    Requirements,
    Responsibilities,
    Benefits,
    About,
    Description,
}

impl SectionKind {
    fn from_heading(heading: &str) -> Self {
        let h = heading.trim();
        if h.starts_with("require")
            || h.starts_with("qualif")
            || h.starts_with("must")
            || h.starts_with("skills")
            || h.contains("need")
        {
            SectionKind::Requirements
        } else if h.starts_with("respons") || h.starts_with("duties") || h.contains("do") || h == "the role" {
            SectionKind::Responsibilities
        } else if h.starts_with("benefit") || h.starts_with("perk") || h.contains("offer") || h == "compensation" {
            SectionKind::Benefits
        } else if h.starts_with("about") || h == "who we are" {
            SectionKind::About
        } else {
            SectionKind::Description
        }
    }
}

/// A heading and the body that follows it, as byte ranges of the cleaned text.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Section {
    pub kind: SectionKind,
    pub heading: Range<usize>,
    pub body: Range<usize>,
}

/// Cleaned, lowercased posting text.
#[derive(Debug, Clone, PartialEq)]
pub struct CleanedText {
    pub text: String,
    pub sections: Vec<Section>,
}

impl CleanedText {
    /// First section of the given kind.
    pub fn section(&self, kind: SectionKind) -> Option<&Section> {
        self.sections.iter().find(|s| s.kind == kind)
    }

    /// Body text of the first section of the given kind.
    pub fn section_text(&self, kind: SectionKind) -> Option<&str> {
        self.section(kind).and_then(|s| self.text.get(s.body.clone()))
    }
}

/// Trait for posting text cleaners.
pub trait Preprocessor: Send + Sync {
    /// Clean raw posting text, rejecting empty or too short input.
    fn clean(&self, raw: &str) -> Result<CleanedText, ValidationError>;
}

/// Default cleaner driven by [`PreprocessingConfig`].
pub struct TextPreprocessor {
    remove_html: bool,
    normalize_whitespace: bool,
    min_length: usize,
}

impl TextPreprocessor {
    /// Create a preprocessor with default settings.
    pub fn new() -> Self {
        Self::from_config(&PreprocessingConfig::default())
    }

    pub fn from_config(config: &PreprocessingConfig) -> Self {
        Self {
            remove_html: config.remove_html,
            normalize_whitespace: config.normalize_whitespace,
            min_length: config.min_length,
        }
    }

    /// Set the minimum cleaned length.
    pub fn with_min_length(mut self, min_length: usize) -> Self {
        self.min_length = min_length;
        self
    }

    fn strip_html(&self, text: &str) -> String {
        let text = LIST_ITEM.replace_all(text, "\n• ");
        let text = LIST_ITEM_END.replace_all(&text, "\n");
        let text = BLOCK_TAG.replace_all(&text, "\n");
        let text = TAG.replace_all(&text, " ");
        decode_entities(&text)
    }

    fn collapse_whitespace(&self, text: &str) -> String {
        text.lines()
            .map(|line| HORIZONTAL_SPACE.replace_all(line, " ").trim().to_string())
            .filter(|line| !line.is_empty())
            .collect::<Vec<_>>()
            .join("\n")
    }
}

impl Default for TextPreprocessor {
    fn default() -> Self {
        Self::new()
    }
}

impl Preprocessor for TextPreprocessor {
    fn clean(&self, raw: &str) -> Result<CleanedText, ValidationError> {
        if raw.trim().is_empty() {
            return Err(ValidationError::Empty);
        }

        let mut text = raw.replace("\r\n", "\n").replace('\r', "\n");
        if self.remove_html {
            text = self.strip_html(&text);
        }
        text = BULLET.replace_all(&text, "• ").into_owned();
        if self.normalize_whitespace {
            text = self.collapse_whitespace(&text);
        } else {
            text = text.trim().to_string();
        }
        let text = text.to_lowercase();

        if text.is_empty() {
            return Err(ValidationError::Empty);
        }

        let length = text.chars().count();
        if length < self.min_length {
            return Err(ValidationError::TooShort {
                length,
                min_length: self.min_length,
            });
        }

        let sections = find_sections(&text);
        debug!("Cleaned {} chars into {} chars, {} sections", raw.len(), text.len(), sections.len());

        Ok(CleanedText { text, sections })
    }
}

fn find_sections(text: &str) -> Vec<Section> {
    let headings: Vec<(SectionKind, Range<usize>)> = HEADING
        .captures_iter(text)
        .filter_map(|caps| {
            let whole = caps.get(0)?;
            let name = caps.get(1)?;
            Some((SectionKind::from_heading(name.as_str()), whole.start()..whole.end()))
        })
        .collect();

    headings
        .iter()
        .enumerate()
        .map(|(i, (kind, heading))| {
            let body_start = (heading.end + 1).min(text.len());
            let body_end = headings
                .get(i + 1)
                .map(|(_, next)| next.start.saturating_sub(1).max(body_start))
                .unwrap_or(text.len());
            Section {
                kind: *kind,
                heading: heading.clone(),
                body: body_start..body_end,
            }
        })
        .collect()
}

fn decode_entities(text: &str) -> String {
    ENTITY
        .replace_all(text, |caps: &regex::Captures| {
            let decoded = if let Some(dec) = caps.get(1) {
                dec.as_str().parse::<u32>().ok().and_then(char::from_u32)
            } else if let Some(hex) = caps.get(2) {
                u32::from_str_radix(hex.as_str(), 16).ok().and_then(char::from_u32)
            } else {
                caps.get(3).and_then(|name| named_entity(name.as_str()))
            };
            match decoded {
                Some(c) => c.to_string(),
                None => caps[0].to_string(),
            }
        })
        .into_owned()
}

fn named_entity(name: &str) -> Option<char> {
    match name.to_lowercase().as_str() {
        "amp" => Some('&'),
        "lt" => Some('<'),
        "gt" => Some('>'),
        "quot" => Some('"'),
        "apos" => Some('\''),
        "nbsp" => Some(' '),
        "ndash" => Some('–'),
        "mdash" => Some('—'),
        "bull" => Some('•'),
        "hellip" => Some('…'),
        "rsquo" | "lsquo" => Some('\''),
        "rdquo" | "ldquo" => Some('"'),
        _ => None,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    #[test]
    fn test_strips_html_and_lowercases() {
        let cleaned = TextPreprocessor::new()
            .clean("<p>Senior <b>Rust</b> Engineer</p><ul><li>Tokio &amp; Serde</li><li>CI/CD</li></ul>")
            .unwrap();
        assert_eq!(cleaned.text, "senior rust engineer\n• tokio & serde\n• ci/cd");
    }

    #[test]
    fn test_collapses_whitespace() {
        let cleaned = TextPreprocessor::new()
            .clean("  Python   developer \n\n\n  Remote\u{a0}work  ")
            .unwrap();
        assert_eq!(cleaned.text, "python developer\nremote work");
    }

    #[test]
    fn test_normalizes_bullets() {
        let cleaned = TextPreprocessor::new()
            .clean("Skills:\n* Python\n- SQL\n1. Docker")
            .unwrap();
        assert_eq!(cleaned.text, "skills:\n• python\n• sql\n• docker");
    }

    #[test]
    fn test_bare_dash_line_keeps_its_line_break() {
        let cleaned = TextPreprocessor::new()
            .clean("Skills:\n-\nPython developer\n2.\nRemote")
            .unwrap();
        assert_eq!(cleaned.text, "skills:\n-\npython developer\n2.\nremote");
    }

    #[test]
    fn test_empty_input() {
        assert_eq!(TextPreprocessor::new().clean("   \n\t"), Err(ValidationError::Empty));
        assert_eq!(TextPreprocessor::new().clean("<br/><p></p>"), Err(ValidationError::Empty));
    }

    #[test]
    fn test_too_short() {
        assert_eq!(
            TextPreprocessor::new().clean("Rust"),
            Err(ValidationError::TooShort { length: 4, min_length: 10 })
        );
    }

    #[test]
    fn test_html_kept_when_disabled() {
        let config = PreprocessingConfig {
            remove_html: false,
            ..PreprocessingConfig::default()
        };
        let cleaned = TextPreprocessor::from_config(&config)
            .clean("<b>Rust</b> developer")
            .unwrap();
        assert_eq!(cleaned.text, "<b>rust</b> developer");
    }

    #[test]
    fn test_sections() {
        let cleaned = TextPreprocessor::new()
            .clean("About Us\nWe build tools.\nResponsibilities:\nShip features\nRequirements\n3+ years of Go\nBenefits\nRemote work")
            .unwrap();

        let kinds: Vec<SectionKind> = cleaned.sections.iter().map(|s| s.kind).collect();
        assert_eq!(
            kinds,
            vec![
                SectionKind::About,
                SectionKind::Responsibilities,
                SectionKind::Requirements,
                SectionKind::Benefits,
            ]
        );
        assert_eq!(cleaned.section_text(SectionKind::Requirements), Some("3+ years of go"));
        assert_eq!(cleaned.section_text(SectionKind::Benefits), Some("remote work"));
    }

    #[test]
    fn test_numeric_entities() {
        assert_eq!(decode_entities("it&#39;s &#x41;"), "it's A");
        assert_eq!(decode_entities("&unknown;"), "&unknown;");
    }
}
