//! Error types for the recognition layer.

use thiserror::Error;

/// Errors that can occur while resolving or running a recognizer.
#[derive(Error, Debug, Clone, PartialEq)]
pub enum NerError {
    /// The recognizer is down, disabled, or its model is not installed.
    #[error("recognizer unavailable: {0}")]
    Unavailable(String),

    /// The recognizer did not answer in time.
    #[error("recognizer timed out after {0}ms")]
    Timeout(u64),

    /// Recognition ran but failed on this input.
    #[error("recognition failed: {0}")]
    Failed(String),

    /// The recognizer returned a span outside the input text.
    #[error("invalid span {start}..{end} for text of length {len}")]
    InvalidSpan { start: usize, end: usize, len: usize },
}

impl NerError {
    /// Whether the error means the oracle cannot be used at all,
    /// as opposed to failing on a single text.
    pub fn is_unavailable(&self) -> bool {
        matches!(self, NerError::Unavailable(_))
    }
}
