//! Per-category confidence from merged evidence.

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

use crate::coordinator::UnifiedEntities;
use crate::error::ConfigError;
use crate::models::config::ScoringConfig;
use crate::models::entity::Category;

/// Key of the aggregate score in the flattened score map.
pub const OVERALL: &str = "overall";

/// Confidence per category plus the weighted aggregate.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ConfidenceReport {
    /// Every category, including those with nothing extracted (0.0).
    pub categories: BTreeMap<Category, f32>,
    pub overall: f32,
}

impl ConfidenceReport {
    pub fn get(&self, category: Category) -> f32 {
        self.categories.get(&category).copied().unwrap_or(0.0)
    }

    /// Flatten to category names plus `"overall"`.
    pub fn to_map(&self) -> BTreeMap<String, f32> {
        let mut map: BTreeMap<String, f32> = self
            .categories
            .iter()
            .map(|(category, score)| (category.as_str().to_string(), *score))
            .collect();
        map.insert(OVERALL.to_string(), self.overall);
        map
    }
}

/// Combines mean evidence score with cross-source agreement.
#[derive(Debug, Clone)]
pub struct ConfidenceScorer {
    evidence_weight: f32,
    agreement_weight: f32,
    category_weights: BTreeMap<Category, f32>,
}

impl ConfidenceScorer {
    pub fn new() -> Self {
        Self {
            evidence_weight: 0.8,
            agreement_weight: 0.2,
            category_weights: BTreeMap::new(),
        }
    }

    pub fn from_config(config: &ScoringConfig) -> Result<Self, ConfigError> {
        let category_weights = config
            .category_weights
            .iter()
            .map(|(name, weight)| Ok((name.parse::<Category>()?, *weight)))
            .collect::<Result<BTreeMap<_, _>, ConfigError>>()?;

        Ok(Self {
            evidence_weight: config.evidence_weight,
            agreement_weight: config.agreement_weight,
            category_weights,
        })
    }

    /// Weight of a category in the aggregate, 1.0 unless configured.
    pub fn weight(&self, category: Category) -> f32 {
        self.category_weights.get(&category).copied().unwrap_or(1.0)
    }

    /// Score every category.
    ///
    /// With `ner_available == false` the categories only the recognizer can
    /// produce report 0.0 regardless of content.
    pub fn score(&self, entities: &UnifiedEntities, ner_available: bool) -> ConfidenceReport {
        let categories: BTreeMap<Category, f32> = Category::ALL
            .iter()
            .map(|&category| {
                let score = if !ner_available && category.is_recognizer_only() {
                    0.0
                } else {
                    self.category_score(entities, category)
                };
                (category, score)
            })
            .collect();

        let overall = self.overall(&categories);
        ConfidenceReport { categories, overall }
    }

    fn category_score(&self, entities: &UnifiedEntities, category: Category) -> f32 {
        let found = entities.get(category);
        if found.is_empty() {
            return 0.0;
        }

        let count = found.len() as f32;
        let mean = found.iter().map(|e| e.score).sum::<f32>() / count;
        let agreed = found.iter().filter(|e| e.is_agreed()).count() as f32 / count;

        (self.evidence_weight * mean + self.agreement_weight * agreed).clamp(0.0, 1.0)
    }

    fn overall(&self, categories: &BTreeMap<Category, f32>) -> f32 {
        let (weighted, total) = categories
            .iter()
            .fold((0.0f32, 0.0f32), |(sum, total), (category, score)| {
                let weight = self.weight(*category);
                (sum + weight * score, total + weight)
            });

        if total > 0.0 {
            (weighted / total).clamp(0.0, 1.0)
        } else {
            0.0
        }
    }
}

impl Default for ConfidenceScorer {
    fn default() -> Self {
        Self::new()
    }
}
