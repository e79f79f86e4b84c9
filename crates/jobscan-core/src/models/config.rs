//! Configuration structures for the job posting pipeline.

use std::collections::BTreeMap;
use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};

use crate::error::ConfigError;
use crate::models::entity::{Category, FieldType};

/// Main configuration for the jobscan pipeline.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct JobscanConfig {
    /// Text cleaning configuration.
    pub preprocessing: PreprocessingConfig,

    /// Rule extractor configuration.
    pub rules: RulesConfig,

    /// Entity recognizer configuration.
    pub ner: NerConfig,

    /// Dictionary and fuzzy matching configuration.
    pub keywords: KeywordConfig,

    /// Entity merge configuration.
    pub merge: MergeConfig,

    /// Confidence scoring configuration.
    pub scoring: ScoringConfig,

    /// Batch processing configuration.
    pub batch: BatchConfig,
}

/// Text cleaning configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct PreprocessingConfig {
    /// Strip HTML tags and decode entities.
    pub remove_html: bool,

    /// Collapse runs of spaces and blank lines.
    pub normalize_whitespace: bool,

    /// Minimum cleaned length in characters.
    pub min_length: usize,
}

impl Default for PreprocessingConfig {
    fn default() -> Self {
        Self {
            remove_html: true,
            normalize_whitespace: true,
            min_length: 10,
        }
    }
}

/// Rule extractor configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct RulesConfig {
    pub extract_dates: bool,
    pub extract_durations: bool,
    pub extract_emails: bool,
    pub extract_urls: bool,
    pub extract_phone: bool,
    pub extract_salary: bool,
    pub extract_work_arrangement: bool,
    pub extract_education: bool,

    /// Extra patterns appended after the built-in rules of their field.
    pub custom: Vec<CustomRuleConfig>,
}

impl Default for RulesConfig {
    fn default() -> Self {
        Self {
            extract_dates: true,
            extract_durations: true,
            extract_emails: true,
            extract_urls: true,
            extract_phone: true,
            extract_salary: true,
            extract_work_arrangement: true,
            extract_education: true,
            custom: Vec::new(),
        }
    }
}

impl RulesConfig {
    /// Whether built-in rules for `field` are enabled.
    pub fn is_enabled(&self, field: FieldType) -> bool {
        match field {
            FieldType::Date => self.extract_dates,
            FieldType::Duration => self.extract_durations,
            FieldType::Email => self.extract_emails,
            FieldType::Url => self.extract_urls,
            FieldType::Phone => self.extract_phone,
            FieldType::Salary => self.extract_salary,
            FieldType::WorkArrangement => self.extract_work_arrangement,
            FieldType::EducationLevel => self.extract_education,
        }
    }
}

/// User supplied extraction rule.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CustomRuleConfig {
    /// Unique rule identifier.
    pub id: String,

    /// Field type name, e.g. "salary" or "work_arrangement".
    pub field: String,

    /// Regular expression. Must not match empty text.
    pub pattern: String,

    /// Score assigned to matches (0.0 - 1.0).
    #[serde(default = "default_custom_rule_score")]
    pub score: f32,
}

fn default_custom_rule_score() -> f32 {
    0.8
}

/// Entity recognizer configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct NerConfig {
    /// Model name resolved by the recognizer factory. "none" disables it.
    pub model_name: String,

    /// Spans scored below this are discarded before merge.
    pub confidence_threshold: f32,

    /// Enable job-specific entity patterns.
    pub custom_entities: bool,
}

impl Default for NerConfig {
    fn default() -> Self {
        Self {
            model_name: "en_core_web_sm".to_string(),
            confidence_threshold: 0.7,
            custom_entities: true,
        }
    }
}

/// Dictionary and fuzzy matching configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct KeywordConfig {
    /// Dictionary file. The embedded dictionary is used when unset.
    pub dictionary_path: Option<PathBuf>,

    /// Enable the approximate matching pass.
    pub fuzzy_matching: bool,

    /// Minimum similarity for a fuzzy match (0.0 - 1.0).
    pub similarity_threshold: f32,

    /// Longest n-gram considered, in tokens.
    pub max_phrase_len: usize,

    /// Candidates shorter than this (in characters) are never fuzzy matched.
    pub min_fuzzy_len: usize,
}

impl Default for KeywordConfig {
    fn default() -> Self {
        Self {
            dictionary_path: None,
            fuzzy_matching: true,
            similarity_threshold: 0.8,
            max_phrase_len: 4,
            min_fuzzy_len: 6,
        }
    }
}

/// How open-vocabulary label disagreements between the dictionary and the
/// recognizer are settled.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum LabelPolicy {
    /// Keep both labels, each value appears under each category.
    #[default]
    Union,
    /// The dictionary category wins on overlapping spans.
    PreferDictionary,
    /// The recognizer label wins on overlapping spans.
    PreferNer,
}

/// Entity merge configuration.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct MergeConfig {
    pub label_policy: LabelPolicy,
}

/// Confidence scoring configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct ScoringConfig {
    /// Weight of the mean span score.
    pub evidence_weight: f32,

    /// Weight of the fraction of values confirmed by two or more sources.
    pub agreement_weight: f32,

    /// Per-category weights for the overall score. Missing categories weigh 1.0.
    pub category_weights: BTreeMap<String, f32>,
}

impl Default for ScoringConfig {
    fn default() -> Self {
        Self {
            evidence_weight: 0.8,
            agreement_weight: 0.2,
            category_weights: BTreeMap::new(),
        }
    }
}

/// Batch processing configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct BatchConfig {
    /// Maximum postings processed at once.
    pub concurrency: usize,
}

impl Default for BatchConfig {
    fn default() -> Self {
        Self { concurrency: 4 }
    }
}

impl JobscanConfig {
    /// Load configuration from a JSON file.
    pub fn from_file(path: &Path) -> Result<Self, ConfigError> {
        let content = std::fs::read_to_string(path)?;
        let config: Self = serde_json::from_str(&content)?;
        config.validate()?;
        Ok(config)
    }

    /// Save configuration to a JSON file.
    pub fn save(&self, path: &Path) -> Result<(), ConfigError> {
        let content = serde_json::to_string_pretty(self)?;
        std::fs::write(path, content)?;
        Ok(())
    }

    /// Check ranges and names. Called by the processor before any text is seen.
    pub fn validate(&self) -> Result<(), ConfigError> {
        check_unit("ner.confidence_threshold", self.ner.confidence_threshold)?;
        check_unit("keywords.similarity_threshold", self.keywords.similarity_threshold)?;
        check_weight("scoring.evidence_weight", self.scoring.evidence_weight)?;
        check_weight("scoring.agreement_weight", self.scoring.agreement_weight)?;

        let total = self.scoring.evidence_weight + self.scoring.agreement_weight;
        if total > 1.0 + f32::EPSILON {
            return Err(ConfigError::OutOfRange {
                key: "scoring.evidence_weight + scoring.agreement_weight".to_string(),
                value: total as f64,
                expected: "a sum of at most 1",
            });
        }

        if self.keywords.max_phrase_len == 0 {
            return Err(ConfigError::OutOfRange {
                key: "keywords.max_phrase_len".to_string(),
                value: 0.0,
                expected: "at least 1",
            });
        }

        if self.batch.concurrency == 0 {
            return Err(ConfigError::OutOfRange {
                key: "batch.concurrency".to_string(),
                value: 0.0,
                expected: "at least 1",
            });
        }

        for (name, weight) in &self.scoring.category_weights {
            name.parse::<Category>()?;
            if !weight.is_finite() || *weight < 0.0 {
                return Err(ConfigError::OutOfRange {
                    key: format!("scoring.category_weights.{}", name),
                    value: *weight as f64,
                    expected: "a non-negative number",
                });
            }
        }

        for rule in &self.rules.custom {
            rule.field.parse::<FieldType>()?;
            check_unit(&format!("rules.custom.{}.score", rule.id), rule.score)?;
        }

        Ok(())
    }
}

fn check_weight(key: &str, value: f32) -> Result<(), ConfigError> {
    if value > 0.0 && value <= 1.0 {
        Ok(())
    } else {
        Err(ConfigError::OutOfRange {
            key: key.to_string(),
            value: value as f64,
            expected: "a value within (0, 1]",
        })
    }
}

fn check_unit(key: &str, value: f32) -> Result<(), ConfigError> {
    if (0.0..=1.0).contains(&value) {
        Ok(())
    } else {
        Err(ConfigError::OutOfRange {
            key: key.to_string(),
            value: value as f64,
            expected: "a value within [0, 1]",
        })
    }
}
