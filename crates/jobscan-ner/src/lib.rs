//! Named-entity recognition layer for jobscan.
//!
//! This crate provides a unified interface for entity recognizers that label
//! spans of job-posting text:
//! - [`EntityRecognizer`], the oracle seam the extraction pipeline calls
//! - [`PatternRecognizer`], a built-in token-pattern recognizer
//! - [`create_recognizer`], which resolves a configured model name

mod error;
mod recognizer;
mod span;

pub use error::NerError;
pub use recognizer::pattern::PatternRecognizer;
pub use recognizer::{create_recognizer, EntityRecognizer};
pub use span::{EntityLabel, EntitySpan};

/// Result type for recognition operations.
pub type Result<T> = std::result::Result<T, NerError>;
