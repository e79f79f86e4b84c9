//! Error types for the jobscan-core library.

use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Main error type for the jobscan library.
#[derive(Error, Debug)]
pub enum JobscanError {
    /// Input rejected before extraction.
    #[error("validation error: {0}")]
    Validation(#[from] ValidationError),

    /// Invalid configuration, dictionary or rule table.
    #[error("configuration error: {0}")]
    Config(#[from] ConfigError),

    /// I/O error.
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// Output serialization error.
    #[error("serialization error: {0}")]
    Serialization(#[from] serde_json::Error),
}

/// Errors raised while validating raw posting text.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum ValidationError {
    /// Input is empty or whitespace only.
    #[error("input text is empty")]
    Empty,

    /// Cleaned text is shorter than the configured minimum.
    #[error("cleaned text is too short: {length} characters (minimum {min_length})")]
    TooShort { length: usize, min_length: usize },
}

/// Errors related to configuration, dictionaries and rule tables.
#[derive(Error, Debug)]
pub enum ConfigError {
    /// A numeric setting is outside its allowed range.
    #[error("{key} is out of range: {value} (expected {expected})")]
    OutOfRange {
        key: String,
        value: f64,
        expected: &'static str,
    },

    /// A field type name could not be resolved.
    #[error("unknown field type: {0}")]
    UnknownFieldType(String),

    /// A category name could not be resolved.
    #[error("unknown category: {0}")]
    UnknownCategory(String),

    /// Dictionary file is malformed or inconsistent.
    #[error("invalid dictionary: {0}")]
    Dictionary(String),

    /// A rule pattern failed to compile or can match empty text.
    #[error("invalid rule '{id}': {reason}")]
    Rule { id: String, reason: String },

    /// Failed to read a configuration or dictionary file.
    #[error("failed to read configuration: {0}")]
    Io(#[from] std::io::Error),

    /// Failed to parse a configuration or dictionary file.
    #[error("failed to parse configuration: {0}")]
    Parse(#[from] serde_json::Error),
}

/// Errors raised inside a single extraction stage.
///
/// These never abort processing. The pipeline converts them into
/// [`ExtractionWarning`]s and empties the affected field.
#[derive(Error, Debug, Clone, PartialEq)]
pub enum ExtractionError {
    /// A rule matched but its value could not be normalized.
    #[error("failed to normalize {field} value '{value}': {reason}")]
    Normalize {
        field: String,
        value: String,
        reason: String,
    },

    /// The entity recognizer failed on this input.
    #[error("entity recognizer error: {0}")]
    Recognizer(#[from] jobscan_ner::NerError),
}

impl ExtractionError {
    pub fn normalize(field: impl Into<String>, value: impl Into<String>, reason: impl Into<String>) -> Self {
        ExtractionError::Normalize {
            field: field.into(),
            value: value.into(),
            reason: reason.into(),
        }
    }
}

/// Stage that produced a warning.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Stage {
    Rules,
    Ner,
}

/// Non-fatal problem recorded in the output metadata.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ExtractionWarning {
    /// Stage that raised the warning.
    pub stage: Stage,
    /// Affected field or category, if any.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub field: Option<String>,
    /// Human readable description.
    pub message: String,
}

impl ExtractionWarning {
    pub fn new(stage: Stage, message: impl Into<String>) -> Self {
        Self {
            stage,
            field: None,
            message: message.into(),
        }
    }

    pub fn with_field(mut self, field: impl Into<String>) -> Self {
        self.field = Some(field.into());
        self
    }
}

/// Result type for the jobscan library.
pub type Result<T> = std::result::Result<T, JobscanError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_warning_document() {
        let warning = ExtractionWarning::new(Stage::Rules, "overflow").with_field("salary");
        let doc = serde_json::to_value(&warning).unwrap();
        assert_eq!(doc["stage"], "rules");
        assert_eq!(doc["field"], "salary");

        let doc = serde_json::to_value(ExtractionWarning::new(Stage::Ner, "timeout")).unwrap();
        assert_eq!(doc["stage"], "ner");
        assert!(doc.get("field").is_none());
    }
}
