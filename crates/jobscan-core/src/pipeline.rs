//! Job posting processor combining rules, recognizer and dictionary evidence.

use std::collections::HashSet;
use std::path::Path;
use std::sync::Arc;
use std::time::Instant;

use chrono::Utc;
use tracing::{debug, info, warn};

use jobscan_ner::{create_recognizer, EntityRecognizer};

use crate::coordinator::{spans_from_matches, spans_from_recognizer, EntityCoordinator};
use crate::dictionary::DictionaryStore;
use crate::error::{ExtractionError, ExtractionWarning, Result, Stage};
use crate::matcher::{FuzzyMatcher, MatchResult};
use crate::models::config::JobscanConfig;
use crate::models::entity::{Category, Span};
use crate::models::result::{ExtractedValue, ProcessedJobInfo, ProcessingMetadata, RequirementsInfo};
use crate::preprocess::{CleanedText, Preprocessor, SectionKind, TextPreprocessor};
use crate::rules::{RuleExtractor, RuleRegistry};
use crate::scorer::ConfidenceScorer;

/// Processes raw posting text into a [`ProcessedJobInfo`].
///
/// All components are read-only after construction, so one processor can be
/// shared across threads behind an `Arc`.
pub struct JobProcessor {
    config: JobscanConfig,
    preprocessor: Box<dyn Preprocessor>,
    rules: RuleExtractor,
    dictionary: Arc<DictionaryStore>,
    matcher: FuzzyMatcher,
    recognizer: Option<Arc<dyn EntityRecognizer>>,
    coordinator: EntityCoordinator,
    scorer: ConfidenceScorer,
}

impl JobProcessor {
    /// Build a processor from configuration.
    ///
    /// Configuration and dictionary problems are fatal. An unavailable
    /// recognizer is not: the processor runs on rules and dictionary alone.
    pub fn new(config: JobscanConfig) -> Result<Self> {
        config.validate()?;

        let dictionary = match &config.keywords.dictionary_path {
            Some(path) => DictionaryStore::load(path)?,
            None => DictionaryStore::builtin()?,
        };

        let registry = RuleRegistry::from_config(&config.rules)?;

        let recognizer = match create_recognizer(&config.ner.model_name, config.ner.custom_entities) {
            Ok(recognizer) => Some(recognizer),
            Err(e) => {
                warn!("Entity recognizer unavailable, running without it: {}", e);
                None
            }
        };

        info!(
            "Initialized processor: {} rules, {} dictionary entries (version {})",
            registry.len(),
            dictionary.len(),
            dictionary.version()
        );

        Ok(Self {
            preprocessor: Box::new(TextPreprocessor::from_config(&config.preprocessing)),
            rules: RuleExtractor::new(registry),
            dictionary: Arc::new(dictionary),
            matcher: FuzzyMatcher::from_config(&config.keywords),
            recognizer,
            coordinator: EntityCoordinator::from_config(&config.merge),
            scorer: ConfidenceScorer::from_config(&config.scoring)?,
            config,
        })
    }

    /// Use a specific recognizer.
    pub fn with_recognizer(mut self, recognizer: Arc<dyn EntityRecognizer>) -> Self {
        self.recognizer = Some(recognizer);
        self
    }

    /// Run on rules and dictionary only.
    pub fn without_recognizer(mut self) -> Self {
        self.recognizer = None;
        self
    }

    /// Use a specific dictionary.
    pub fn with_dictionary(mut self, dictionary: Arc<DictionaryStore>) -> Self {
        self.dictionary = dictionary;
        self
    }

    /// Use a custom text cleaner.
    pub fn with_preprocessor(mut self, preprocessor: Box<dyn Preprocessor>) -> Self {
        self.preprocessor = preprocessor;
        self
    }

    /// Load a dictionary file and swap it in.
    ///
    /// The current dictionary stays in place when loading fails.
    pub fn reload_dictionary(&mut self, path: &Path) -> Result<()> {
        let dictionary = DictionaryStore::load(path)?;
        info!(
            "Reloaded dictionary from {:?}: {} entries (version {})",
            path,
            dictionary.len(),
            dictionary.version()
        );
        self.dictionary = Arc::new(dictionary);
        Ok(())
    }

    pub fn config(&self) -> &JobscanConfig {
        &self.config
    }

    pub fn dictionary(&self) -> &DictionaryStore {
        &self.dictionary
    }

    /// Whether a recognizer is configured.
    pub fn has_recognizer(&self) -> bool {
        self.recognizer.is_some()
    }

    /// Process one posting.
    pub fn process(&self, raw: &str) -> Result<ProcessedJobInfo> {
        let start = Instant::now();
        info!("Processing posting of {} characters", raw.len());

        let cleaned = self.preprocessor.clean(raw)?;
        let text = cleaned.text.as_str();
        let mut warnings = Vec::new();

        let extraction = self.rules.extract(text);
        warnings.extend(extraction.warnings.iter().cloned());

        let (recognized, ner_available) = self.recognize(text, &mut warnings);

        let matches = self.matcher.match_text(text, &self.dictionary);
        let matched = spans_from_matches(&matches);

        let entities = self.coordinator.merge(&extraction, &recognized, &matched);
        let report = self.scorer.score(&entities, ner_available);

        let mut result = ProcessedJobInfo::new(raw, text);
        for (category, found) in entities.iter() {
            *result.values_mut(category) = found.iter().map(ExtractedValue::from).collect();
        }
        result.matched_skills = matched_in(&matches, Category::Skills);
        result.matched_technologies = matched_in(&matches, Category::Technologies);
        result.matched_soft_skills = matched_in(&matches, Category::SoftSkills);
        result.matched_industry_terms = matched_in(&matches, Category::IndustryTerms);
        result.matched_vietnamese_keywords = matched_in(&matches, Category::VietnameseKeywords);
        result.requirements = self.requirements(&cleaned);
        result.confidence_scores = report.to_map();
        result.metadata = ProcessingMetadata {
            warnings,
            ner_available,
            ner_model: self.recognizer.as_ref().map(|r| r.name().to_string()),
            dictionary_version: self.dictionary.version().to_string(),
            sections: cleaned.sections.iter().map(|s| s.kind).collect(),
        };
        result.processing_time = start.elapsed().as_secs_f64();
        result.timestamp = Utc::now();

        info!(
            "Extracted {} entities in {:.3}s (overall confidence {:.2})",
            entities.len(),
            result.processing_time,
            report.overall
        );

        Ok(result)
    }

    /// Process postings one after another.
    ///
    /// Each item succeeds or fails on its own.
    pub fn process_batch(&self, texts: &[&str]) -> Vec<Result<ProcessedJobInfo>> {
        texts.iter().map(|text| self.process(text)).collect()
    }

    /// Run the recognizer, returning its spans and whether it contributed.
    fn recognize(&self, text: &str, warnings: &mut Vec<ExtractionWarning>) -> (Vec<Span>, bool) {
        let Some(recognizer) = &self.recognizer else {
            return (Vec::new(), false);
        };

        match recognizer.recognize(text) {
            Ok(entities) => {
                let (spans, rejected) = spans_from_recognizer(
                    text,
                    &entities,
                    &self.dictionary,
                    self.config.ner.confidence_threshold,
                );
                debug!("Recognizer {} kept {} of {} spans", recognizer.name(), spans.len(), entities.len());
                warnings.extend(rejected);
                (spans, true)
            }
            Err(e) if e.is_unavailable() => {
                warn!("Entity recognizer {} unavailable: {}", recognizer.name(), e);
                warnings.push(ExtractionWarning::new(Stage::Ner, e.to_string()));
                (Vec::new(), false)
            }
            Err(e) => {
                let e = ExtractionError::from(e);
                warn!("Entity recognizer failed on this input: {}", e);
                warnings.push(ExtractionWarning::new(Stage::Ner, e.to_string()));
                (Vec::new(), true)
            }
        }
    }

    fn requirements(&self, cleaned: &CleanedText) -> Option<RequirementsInfo> {
        cleaned.section(SectionKind::Requirements)?;

        let extraction = self.rules.extract_requirements_section(cleaned);
        let merged = self.coordinator.merge(&extraction, &[], &[]);
        let values = |category: Category| -> Vec<ExtractedValue> {
            merged.get(category).iter().map(ExtractedValue::from).collect()
        };

        Some(RequirementsInfo {
            experience: values(Category::Durations),
            education: values(Category::EducationLevels),
            work_arrangements: values(Category::WorkArrangements),
        })
    }
}

/// Highest scoring hit per keyword of one group, best first.
fn matched_in(matches: &[MatchResult], group: Category) -> Vec<MatchResult> {
    let mut seen = HashSet::new();
    matches
        .iter()
        .filter(|m| m.group == group && seen.insert(m.keyword.clone()))
        .cloned()
        .collect()
}
