//! Embedded data for standalone distribution.
//!
//! The default keyword dictionary is compiled into the binary so the
//! pipeline works without any files on disk.

/// Embedded default keyword dictionary (JSON).
pub static DEFAULT_DICTIONARY: &str = include_str!("../../data/default_dictionary.json");
