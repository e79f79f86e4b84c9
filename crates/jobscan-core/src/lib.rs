//! Core library for job posting analysis.
//!
//! This crate provides:
//! - Posting cleanup and section detection
//! - Rule-based extraction of dates, durations, contacts, salaries,
//!   work arrangements and education levels
//! - Dictionary keyword matching with fuzzy similarity
//! - Merging of rule, recognizer and dictionary evidence with per-category
//!   confidence
//! - Batch processing and result sinks

pub mod batch;
pub mod coordinator;
pub mod dictionary;
pub mod error;
pub mod matcher;
pub mod models;
pub mod pipeline;
pub mod preprocess;
pub mod rules;
pub mod scorer;
pub mod sink;
pub mod text;

pub use batch::{BatchOutcome, BatchReport, BatchRunner, CancelHandle};
pub use coordinator::{EntityCoordinator, MergedEntity, UnifiedEntities};
pub use dictionary::{DictionaryEntry, DictionaryStore, KeywordCategory};
pub use error::{ConfigError, ExtractionWarning, JobscanError, Result, Stage, ValidationError};
pub use matcher::{FuzzyMatcher, MatchKind, MatchResult};
pub use models::config::{JobscanConfig, LabelPolicy};
pub use models::entity::{Category, FieldType, NormalizedValue, Source, Span};
pub use models::result::{ExtractedValue, ExtractionSummary, ProcessedJobInfo, RequirementsInfo};
pub use pipeline::JobProcessor;
pub use preprocess::{CleanedText, Preprocessor, SectionKind, TextPreprocessor};
pub use rules::{RuleExtractor, RuleRegistry};
pub use scorer::{ConfidenceReport, ConfidenceScorer};
pub use sink::{JsonLinesSink, ResultSink, VecSink};

/// Re-export recognizer types.
pub use jobscan_ner::{create_recognizer, EntityLabel, EntityRecognizer, EntitySpan, NerError};
