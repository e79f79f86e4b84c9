//! Labeled span types for recognizer output.

use serde::{Deserialize, Serialize};

use crate::{NerError, Result};

/// Entity label attached to a recognized span.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum EntityLabel {
    Skill,
    Technology,
    Role,
    Responsibility,
    Qualification,
    Benefit,
    Date,
    Organization,
    Location,
    /// Any model label without a dedicated variant.
    Other(String),
}

impl EntityLabel {
    /// Map a raw model label (spaCy-style upper-case names) to a label.
    pub fn from_model_label(label: &str) -> Self {
        match label.trim().to_uppercase().as_str() {
            "SKILL" | "PROGRAMMING_SKILL" | "SOFT_SKILL" => EntityLabel::Skill,
            "TECH" | "TECHNOLOGY" | "PRODUCT" => EntityLabel::Technology,
            "ROLE" | "JOB_ROLE" | "JOB_TITLE" => EntityLabel::Role,
            "RESPONSIBILITY" => EntityLabel::Responsibility,
            "QUALIFICATION" => EntityLabel::Qualification,
            "BENEFIT" => EntityLabel::Benefit,
            "DATE" => EntityLabel::Date,
            "ORG" | "ORGANIZATION" => EntityLabel::Organization,
            "GPE" | "LOC" | "LOCATION" => EntityLabel::Location,
            other => EntityLabel::Other(other.to_string()),
        }
    }
}

/// A labeled substring of the recognizer input.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct EntitySpan {
    /// Byte offset of the first character.
    pub start: usize,
    /// Byte offset one past the last character.
    pub end: usize,
    /// Text covered by the span.
    pub text: String,
    /// Entity label.
    pub label: EntityLabel,
    /// Recognizer score (0.0 - 1.0).
    pub score: f32,
}

impl EntitySpan {
    pub fn new(start: usize, end: usize, text: impl Into<String>, label: EntityLabel, score: f32) -> Self {
        Self {
            start,
            end,
            text: text.into(),
            label,
            score: score.clamp(0.0, 1.0),
        }
    }

    /// Check that the span is non-empty and addresses valid positions of `source`.
    pub fn validate(&self, source: &str) -> Result<()> {
        let valid = self.start < self.end
            && self.end <= source.len()
            && source.is_char_boundary(self.start)
            && source.is_char_boundary(self.end);

        if valid {
            Ok(())
        } else {
            Err(NerError::InvalidSpan {
                start: self.start,
                end: self.end,
                len: source.len(),
            })
        }
    }
}
