//! Processed posting output, the document handed to storage.

use std::collections::BTreeMap;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::coordinator::MergedEntity;
use crate::error::{ExtractionWarning, Result};
use crate::matcher::MatchResult;
use crate::models::entity::{Category, NormalizedValue, Source};
use crate::preprocess::SectionKind;

/// One extracted value of a category.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ExtractedValue {
    /// Text of the first occurrence.
    pub text: String,

    /// Canonical string form the value was deduplicated on.
    pub normalized: String,

    /// Typed value.
    pub value: NormalizedValue,

    /// Highest contributing score (0.0 - 1.0).
    pub score: f32,

    /// Stages that produced this value.
    pub sources: Vec<Source>,

    /// Byte offsets of the first occurrence in the cleaned text.
    pub start: usize,
    pub end: usize,
}

impl From<&MergedEntity> for ExtractedValue {
    fn from(entity: &MergedEntity) -> Self {
        Self {
            text: entity.text.clone(),
            normalized: entity.key.clone(),
            value: entity.value.clone(),
            score: entity.score,
            sources: entity.sources.iter().copied().collect(),
            start: entity.start,
            end: entity.end,
        }
    }
}

/// Values found inside the requirements section.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct RequirementsInfo {
    /// Experience and other durations.
    pub experience: Vec<ExtractedValue>,

    /// Education levels.
    pub education: Vec<ExtractedValue>,

    /// Work arrangements.
    pub work_arrangements: Vec<ExtractedValue>,
}

impl RequirementsInfo {
    pub fn is_empty(&self) -> bool {
        self.experience.is_empty() && self.education.is_empty() && self.work_arrangements.is_empty()
    }
}

/// Metadata about how a posting was processed.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ProcessingMetadata {
    /// Recoverable problems hit while extracting.
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub warnings: Vec<ExtractionWarning>,

    /// Whether the entity recognizer contributed.
    pub ner_available: bool,

    /// Name of the recognizer used.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub ner_model: Option<String>,

    /// Version of the keyword dictionary.
    pub dictionary_version: String,

    /// Sections found in the cleaned text, in order.
    #[serde(default)]
    pub sections: Vec<SectionKind>,
}

/// Everything extracted from one posting.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ProcessedJobInfo {
    /// Input as given.
    pub original_text: String,

    /// Text after cleaning; all offsets point into it.
    pub cleaned_text: String,

    pub skills: Vec<ExtractedValue>,
    pub technologies: Vec<ExtractedValue>,
    pub soft_skills: Vec<ExtractedValue>,
    pub industry_terms: Vec<ExtractedValue>,
    pub roles: Vec<ExtractedValue>,
    pub seniority_levels: Vec<ExtractedValue>,
    pub responsibilities: Vec<ExtractedValue>,
    pub qualifications: Vec<ExtractedValue>,
    pub benefits: Vec<ExtractedValue>,
    pub dates: Vec<ExtractedValue>,
    pub durations: Vec<ExtractedValue>,
    pub emails: Vec<ExtractedValue>,
    pub phone_numbers: Vec<ExtractedValue>,
    pub urls: Vec<ExtractedValue>,
    pub salaries: Vec<ExtractedValue>,
    pub work_arrangements: Vec<ExtractedValue>,
    pub education_levels: Vec<ExtractedValue>,
    pub vietnamese_keywords: Vec<ExtractedValue>,

    /// Dictionary hits per keyword, highest score first.
    pub matched_skills: Vec<MatchResult>,
    pub matched_technologies: Vec<MatchResult>,
    pub matched_soft_skills: Vec<MatchResult>,
    pub matched_industry_terms: Vec<MatchResult>,
    pub matched_vietnamese_keywords: Vec<MatchResult>,

    /// Requirements section breakdown, when the posting has one.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub requirements: Option<RequirementsInfo>,

    /// Confidence per category plus `"overall"`.
    pub confidence_scores: BTreeMap<String, f32>,

    /// Wall time in seconds.
    pub processing_time: f64,

    /// When processing finished.
    pub timestamp: DateTime<Utc>,

    pub metadata: ProcessingMetadata,
}

impl ProcessedJobInfo {
    /// Create an empty result for the given texts.
    pub fn new(original_text: impl Into<String>, cleaned_text: impl Into<String>) -> Self {
        Self {
            original_text: original_text.into(),
            cleaned_text: cleaned_text.into(),
            skills: Vec::new(),
            technologies: Vec::new(),
            soft_skills: Vec::new(),
            industry_terms: Vec::new(),
            roles: Vec::new(),
            seniority_levels: Vec::new(),
            responsibilities: Vec::new(),
            qualifications: Vec::new(),
            benefits: Vec::new(),
            dates: Vec::new(),
            durations: Vec::new(),
            emails: Vec::new(),
            phone_numbers: Vec::new(),
            urls: Vec::new(),
            salaries: Vec::new(),
            work_arrangements: Vec::new(),
            education_levels: Vec::new(),
            vietnamese_keywords: Vec::new(),
            matched_skills: Vec::new(),
            matched_technologies: Vec::new(),
            matched_soft_skills: Vec::new(),
            matched_industry_terms: Vec::new(),
            matched_vietnamese_keywords: Vec::new(),
            requirements: None,
            confidence_scores: BTreeMap::new(),
            processing_time: 0.0,
            timestamp: Utc::now(),
            metadata: ProcessingMetadata::default(),
        }
    }

    /// Values of one category.
    pub fn values(&self, category: Category) -> &[ExtractedValue] {
        match category {
            Category::Skills => &self.skills,
            Category::Technologies => &self.technologies,
            Category::SoftSkills => &self.soft_skills,
            Category::IndustryTerms => &self.industry_terms,
            Category::Roles => &self.roles,
            Category::SeniorityLevels => &self.seniority_levels,
            Category::Responsibilities => &self.responsibilities,
            Category::Qualifications => &self.qualifications,
            Category::Benefits => &self.benefits,
            Category::Dates => &self.dates,
            Category::Durations => &self.durations,
            Category::Emails => &self.emails,
            Category::PhoneNumbers => &self.phone_numbers,
            Category::Urls => &self.urls,
            Category::Salaries => &self.salaries,
            Category::WorkArrangements => &self.work_arrangements,
            Category::EducationLevels => &self.education_levels,
            Category::VietnameseKeywords => &self.vietnamese_keywords,
        }
    }

    pub(crate) fn values_mut(&mut self, category: Category) -> &mut Vec<ExtractedValue> {
        match category {
            Category::Skills => &mut self.skills,
            Category::Technologies => &mut self.technologies,
            Category::SoftSkills => &mut self.soft_skills,
            Category::IndustryTerms => &mut self.industry_terms,
            Category::Roles => &mut self.roles,
            Category::SeniorityLevels => &mut self.seniority_levels,
            Category::Responsibilities => &mut self.responsibilities,
            Category::Qualifications => &mut self.qualifications,
            Category::Benefits => &mut self.benefits,
            Category::Dates => &mut self.dates,
            Category::Durations => &mut self.durations,
            Category::Emails => &mut self.emails,
            Category::PhoneNumbers => &mut self.phone_numbers,
            Category::Urls => &mut self.urls,
            Category::Salaries => &mut self.salaries,
            Category::WorkArrangements => &mut self.work_arrangements,
            Category::EducationLevels => &mut self.education_levels,
            Category::VietnameseKeywords => &mut self.vietnamese_keywords,
        }
    }

    /// Normalized strings of one category, in output order.
    pub fn normalized(&self, category: Category) -> Vec<&str> {
        self.values(category).iter().map(|v| v.normalized.as_str()).collect()
    }

    /// Confidence of one category, 0.0 when missing.
    pub fn confidence(&self, category: Category) -> f32 {
        self.confidence_scores.get(category.as_str()).copied().unwrap_or(0.0)
    }

    /// Serialize to a key/value document for storage.
    pub fn to_document(&self) -> Result<serde_json::Value> {
        Ok(serde_json::to_value(self)?)
    }

    /// Per-category counts and headline numbers.
    pub fn summary(&self) -> ExtractionSummary {
        let counts: BTreeMap<String, usize> = Category::ALL
            .iter()
            .map(|c| (c.as_str().to_string(), self.values(*c).len()))
            .collect();
        let total_entities = counts.values().sum();

        ExtractionSummary {
            counts,
            total_entities,
            overall_confidence: self.confidence_scores.get(crate::scorer::OVERALL).copied().unwrap_or(0.0),
            has_requirements: self.requirements.is_some(),
            warnings: self.metadata.warnings.len(),
            processing_time: self.processing_time,
        }
    }
}

/// Compact overview of a processed posting.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ExtractionSummary {
    /// Number of values per category.
    pub counts: BTreeMap<String, usize>,
    pub total_entities: usize,
    pub overall_confidence: f32,
    pub has_requirements: bool,
    pub warnings: usize,
    pub processing_time: f64,
}
