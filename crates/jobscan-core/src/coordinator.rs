//! Merges rule, recognizer and dictionary spans into one entity set per category.
//!
//! The merge only depends on the spans, never on the order the stages
//! delivered them, so running the stages in any order gives the same result.

use std::cmp::Ordering;
use std::collections::{BTreeMap, BTreeSet, HashMap};

use serde::{Deserialize, Serialize};
use tracing::debug;

use jobscan_ner::{EntityLabel, EntitySpan};

use crate::dictionary::DictionaryStore;
use crate::error::{ExtractionWarning, Stage};
use crate::matcher::MatchResult;
use crate::models::config::{LabelPolicy, MergeConfig};
use crate::models::entity::{Category, NormalizedValue, Source, Span};
use crate::rules::{normalize_date, RuleExtraction};
use crate::text::normalize_form;

/// A deduplicated value with the sources that produced it.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MergedEntity {
    /// Text of the first occurrence.
    pub text: String,
    /// Canonical key the entity was deduplicated on.
    pub key: String,
    pub value: NormalizedValue,
    /// Byte range of the first occurrence.
    pub start: usize,
    pub end: usize,
    /// Highest score among contributing spans.
    pub score: f32,
    pub sources: BTreeSet<Source>,
}

impl MergedEntity {
    fn from_span(span: &Span, sources: BTreeSet<Source>) -> Self {
        Self {
            text: span.text.clone(),
            key: span.value.canonical_key(),
            value: span.value.clone(),
            start: span.start,
            end: span.end,
            score: span.score,
            sources,
        }
    }

    /// Confirmed by two or more independent sources.
    pub fn is_agreed(&self) -> bool {
        self.sources.len() >= 2
    }
}

/// Merged entities keyed by output category.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct UnifiedEntities {
    categories: BTreeMap<Category, Vec<MergedEntity>>,
}

impl UnifiedEntities {
    /// Entities of one category in order of first occurrence.
    pub fn get(&self, category: Category) -> &[MergedEntity] {
        self.categories.get(&category).map(Vec::as_slice).unwrap_or(&[])
    }

    pub fn iter(&self) -> impl Iterator<Item = (Category, &[MergedEntity])> {
        self.categories.iter().map(|(c, e)| (*c, e.as_slice()))
    }

    /// Total number of entities across categories.
    pub fn len(&self) -> usize {
        self.categories.values().map(Vec::len).sum()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

/// Convert recognizer output into spans.
///
/// Invalid offsets produce a warning, low scores and labels without an
/// output category are dropped. Open-vocabulary text found in the dictionary
/// takes its canonical form.
pub fn spans_from_recognizer(
    text: &str,
    entities: &[EntitySpan],
    dictionary: &DictionaryStore,
    threshold: f32,
) -> (Vec<Span>, Vec<ExtractionWarning>) {
    let mut spans = Vec::new();
    let mut warnings = Vec::new();

    for entity in entities {
        if let Err(e) = entity.validate(text) {
            warnings.push(ExtractionWarning::new(Stage::Ner, e.to_string()));
            continue;
        }
        if entity.score < threshold {
            continue;
        }
        let Some(category) = label_category(&entity.label) else {
            continue;
        };

        let surface = &text[entity.start..entity.end];
        let value = if category == Category::Dates {
            match normalize_date(surface) {
                Ok(Some(value)) => value,
                _ => NormalizedValue::text(normalize_form(surface)),
            }
        } else {
            let canonical = dictionary
                .canonicalize(surface)
                .map(|entry| entry.term.to_lowercase())
                .unwrap_or_else(|| normalize_form(surface));
            NormalizedValue::text(canonical)
        };

        if value.canonical_key().is_empty() {
            continue;
        }

        spans.push(Span::new(
            entity.start,
            entity.end,
            surface,
            category,
            value,
            Source::Ner,
            entity.score,
        ));
    }

    (spans, warnings)
}

/// Convert dictionary matches into spans under their output group.
///
/// The span score is the match score scaled by the entry weight, capped at 1.
pub fn spans_from_matches(matches: &[MatchResult]) -> Vec<Span> {
    matches
        .iter()
        .map(|m| {
            Span::new(
                m.start,
                m.end,
                m.matched_text.clone(),
                m.group,
                NormalizedValue::text(m.keyword.clone()),
                Source::Dictionary,
                (m.score * m.weight).clamp(0.0, 1.0),
            )
        })
        .collect()
}

fn label_category(label: &EntityLabel) -> Option<Category> {
    match label {
        EntityLabel::Skill => Some(Category::Skills),
        EntityLabel::Technology => Some(Category::Technologies),
        EntityLabel::Role => Some(Category::Roles),
        EntityLabel::Responsibility => Some(Category::Responsibilities),
        EntityLabel::Qualification => Some(Category::Qualifications),
        EntityLabel::Benefit => Some(Category::Benefits),
        EntityLabel::Date => Some(Category::Dates),
        EntityLabel::Organization | EntityLabel::Location | EntityLabel::Other(_) => None,
    }
}

/// Total order over spans so sorting never depends on input order.
fn span_order(a: &Span, b: &Span) -> Ordering {
    a.start
        .cmp(&b.start)
        .then(a.source.cmp(&b.source))
        .then(b.end.cmp(&a.end))
        .then(b.score.total_cmp(&a.score))
        .then_with(|| a.value.canonical_key().cmp(&b.value.canonical_key()))
        .then_with(|| a.text.cmp(&b.text))
}

/// Overlap priority for structured categories: rule before recognizer before
/// dictionary, then the longer span, then the higher score.
fn structured_order(a: &Span, b: &Span) -> Ordering {
    a.source
        .cmp(&b.source)
        .then(b.len().cmp(&a.len()))
        .then(b.score.total_cmp(&a.score))
        .then_with(|| span_order(a, b))
}

/// Merges spans from all stages.
pub struct EntityCoordinator {
    policy: LabelPolicy,
}

impl EntityCoordinator {
    pub fn new(policy: LabelPolicy) -> Self {
        Self { policy }
    }

    pub fn from_config(config: &MergeConfig) -> Self {
        Self::new(config.label_policy)
    }

    pub fn policy(&self) -> LabelPolicy {
        self.policy
    }

    /// Merge rule spans, recognizer spans and dictionary spans.
    pub fn merge(&self, rules: &RuleExtraction, recognized: &[Span], matched: &[Span]) -> UnifiedEntities {
        let mut spans: Vec<Span> = rules
            .all_spans()
            .chain(recognized)
            .chain(matched)
            .cloned()
            .collect();
        spans.sort_by(span_order);

        self.apply_label_policy(&mut spans);
        let spans = prune_contained(spans);

        let mut grouped: BTreeMap<Category, Vec<Span>> = BTreeMap::new();
        for span in spans {
            grouped.entry(span.category).or_default().push(span);
        }

        let categories = grouped
            .into_iter()
            .map(|(category, spans)| {
                let entities = if category.is_structured() {
                    merge_structured(spans)
                } else {
                    merge_open(spans)
                };
                (category, entities)
            })
            .collect();

        let unified = UnifiedEntities { categories };
        debug!("Merged into {} entities", unified.len());
        unified
    }

    /// Settle open-vocabulary label disagreements between the recognizer
    /// and the dictionary on overlapping ranges.
    fn apply_label_policy(&self, spans: &mut [Span]) {
        let (winner, loser) = match self.policy {
            LabelPolicy::Union => return,
            LabelPolicy::PreferDictionary => (Source::Dictionary, Source::Ner),
            LabelPolicy::PreferNer => (Source::Ner, Source::Dictionary),
        };

        let winners: Vec<Span> = spans
            .iter()
            .filter(|s| s.source == winner && !s.category.is_structured())
            .cloned()
            .collect();

        for span in spans.iter_mut() {
            if span.source != loser || span.category.is_structured() {
                continue;
            }
            let best = winners
                .iter()
                .filter(|w| w.overlaps(span) && w.category != span.category)
                .max_by(|a, b| {
                    overlap(a, span)
                        .cmp(&overlap(b, span))
                        .then_with(|| span_order(b, a))
                });
            if let Some(best) = best {
                span.category = best.category;
                if winner == Source::Dictionary {
                    span.value = best.value.clone();
                }
            }
        }
    }
}

fn overlap(a: &Span, b: &Span) -> usize {
    a.end.min(b.end).saturating_sub(a.start.max(b.start))
}

/// Drop spans of exclusive categories that sit strictly inside a longer span
/// of a different exclusive category.
fn prune_contained(spans: Vec<Span>) -> Vec<Span> {
    let exclusive: Vec<(usize, usize, Category)> = spans
        .iter()
        .filter(|s| s.category.is_exclusive())
        .map(|s| (s.start, s.end, s.category))
        .collect();

    spans
        .into_iter()
        .filter(|span| {
            !span.category.is_exclusive()
                || !exclusive.iter().any(|&(start, end, category)| {
                    category != span.category
                        && start <= span.start
                        && span.end <= end
                        && end - start > span.len()
                })
        })
        .collect()
}

/// Resolve overlaps by source priority, then deduplicate.
///
/// An overridden span with the same key as its winner still counts as
/// agreement for the winner.
fn merge_structured(mut spans: Vec<Span>) -> Vec<MergedEntity> {
    spans.sort_by(structured_order);

    let mut accepted: Vec<(Span, BTreeSet<Source>)> = Vec::new();
    for span in spans {
        let key = span.value.canonical_key();
        let overlapping: Vec<usize> = accepted
            .iter()
            .enumerate()
            .filter(|(_, (a, _))| a.overlaps(&span))
            .map(|(i, _)| i)
            .collect();

        if overlapping.is_empty() {
            accepted.push((span.clone(), BTreeSet::from([span.source])));
            continue;
        }

        for i in overlapping {
            if accepted[i].0.value.canonical_key() == key {
                accepted[i].1.insert(span.source);
                if span.score > accepted[i].0.score {
                    accepted[i].0.score = span.score;
                }
            }
        }
    }

    accepted.sort_by(|a, b| span_order(&a.0, &b.0));
    dedupe(accepted)
}

fn merge_open(mut spans: Vec<Span>) -> Vec<MergedEntity> {
    spans.sort_by(span_order);
    dedupe(
        spans
            .into_iter()
            .map(|s| {
                let source = s.source;
                (s, BTreeSet::from([source]))
            })
            .collect(),
    )
}

fn dedupe(spans: Vec<(Span, BTreeSet<Source>)>) -> Vec<MergedEntity> {
    let mut entities: Vec<MergedEntity> = Vec::new();
    let mut index: HashMap<String, usize> = HashMap::new();

    for (span, sources) in spans {
        let key = span.value.canonical_key();
        match index.get(&key) {
            Some(&i) => {
                let entity = &mut entities[i];
                entity.sources.extend(sources);
                if span.score > entity.score {
                    entity.score = span.score;
                }
            }
            None => {
                index.insert(key, entities.len());
                entities.push(MergedEntity::from_span(&span, sources));
            }
        }
    }

    entities
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::entity::{DateValue, FieldType};
    use pretty_assertions::assert_eq;

    fn span(start: usize, end: usize, category: Category, key: &str, source: Source, score: f32) -> Span {
        Span::new(start, end, key, category, NormalizedValue::text(key), source, score)
    }

    fn rules_with(spans: Vec<Span>) -> RuleExtraction {
        let mut rules = RuleExtraction::default();
        for s in spans {
            let field = FieldType::ALL
                .into_iter()
                .find(|f| f.category() == s.category)
                .unwrap();
            rules.spans.entry(field).or_default().push(s);
        }
        rules
    }

    fn keys(unified: &UnifiedEntities, category: Category) -> Vec<&str> {
        unified.get(category).iter().map(|e| e.key.as_str()).collect()
    }

    #[test]
    fn test_dedup_records_agreement() {
        let ner = vec![span(0, 6, Category::Skills, "python", Source::Ner, 0.8)];
        let dict = vec![
            span(0, 6, Category::Skills, "python", Source::Dictionary, 1.0),
            span(30, 36, Category::Skills, "python", Source::Dictionary, 1.0),
        ];
        let unified = EntityCoordinator::new(LabelPolicy::Union).merge(&RuleExtraction::default(), &ner, &dict);

        let skills = unified.get(Category::Skills);
        assert_eq!(skills.len(), 1);
        assert!(skills[0].is_agreed());
        assert_eq!(skills[0].score, 1.0);
    }

    #[test]
    fn test_rule_overrides_overlapping_ner_date() {
        let rules = rules_with(vec![span(10, 25, Category::Dates, "2025-01", Source::Rule, 0.9)]);
        let ner = vec![
            span(18, 25, Category::Dates, "2025", Source::Ner, 0.95),
            span(40, 48, Category::Dates, "tomorrow", Source::Ner, 0.8),
        ];
        let unified = EntityCoordinator::new(LabelPolicy::Union).merge(&rules, &ner, &[]);
        assert_eq!(keys(&unified, Category::Dates), vec!["2025-01", "tomorrow"]);
        assert_eq!(unified.get(Category::Dates)[0].sources, BTreeSet::from([Source::Rule]));
    }

    #[test]
    fn test_overridden_span_with_same_value_counts_as_agreement() {
        let value = NormalizedValue::Date(DateValue::MonthYear { year: 2025, month: 1 });
        let rule = Span::new(6, 18, "january 2025", Category::Dates, value.clone(), Source::Rule, 0.9);
        let ner = Span::new(6, 13, "january", Category::Dates, value, Source::Ner, 0.8);
        let unified = EntityCoordinator::new(LabelPolicy::Union).merge(&rules_with(vec![rule]), &[ner], &[]);

        let dates = unified.get(Category::Dates);
        assert_eq!(dates.len(), 1);
        assert!(dates[0].is_agreed());
        assert_eq!(dates[0].text, "january 2025");
    }

    #[test]
    fn test_cross_category_containment() {
        let rules = rules_with(vec![
            span(0, 14, Category::Dates, "within 2 weeks", Source::Rule, 0.85),
            span(7, 14, Category::Durations, "2 weeks", Source::Rule, 0.8),
            span(20, 27, Category::WorkArrangements, "remote", Source::Rule, 0.9),
        ]);
        let unified = EntityCoordinator::new(LabelPolicy::Union).merge(&rules, &[], &[]);
        assert_eq!(keys(&unified, Category::Dates), vec!["within 2 weeks"]);
        assert!(unified.get(Category::Durations).is_empty());
        assert_eq!(keys(&unified, Category::WorkArrangements), vec!["remote"]);
    }

    #[test]
    fn test_union_keeps_both_labels() {
        let ner = vec![span(0, 10, Category::Skills, "tensorflow", Source::Ner, 0.8)];
        let dict = vec![span(0, 10, Category::Technologies, "tensorflow", Source::Dictionary, 1.0)];
        let unified = EntityCoordinator::new(LabelPolicy::Union).merge(&RuleExtraction::default(), &ner, &dict);
        assert_eq!(keys(&unified, Category::Skills), vec!["tensorflow"]);
        assert_eq!(keys(&unified, Category::Technologies), vec!["tensorflow"]);
    }

    #[test]
    fn test_prefer_dictionary_relabels_ner() {
        let ner = vec![span(0, 10, Category::Skills, "tensorflow", Source::Ner, 0.8)];
        let dict = vec![span(0, 10, Category::Technologies, "tensorflow", Source::Dictionary, 1.0)];
        let unified = EntityCoordinator::new(LabelPolicy::PreferDictionary).merge(&RuleExtraction::default(), &ner, &dict);
        assert!(unified.get(Category::Skills).is_empty());
        let tech = unified.get(Category::Technologies);
        assert_eq!(tech.len(), 1);
        assert!(tech[0].is_agreed());
    }

    #[test]
    fn test_prefer_ner_relabels_dictionary() {
        let ner = vec![span(0, 10, Category::Skills, "tensorflow", Source::Ner, 0.8)];
        let dict = vec![span(0, 10, Category::Technologies, "tensorflow", Source::Dictionary, 1.0)];
        let unified = EntityCoordinator::new(LabelPolicy::PreferNer).merge(&RuleExtraction::default(), &ner, &dict);
        assert!(unified.get(Category::Technologies).is_empty());
        assert_eq!(keys(&unified, Category::Skills), vec!["tensorflow"]);
    }

    #[test]
    fn test_merge_is_order_independent() {
        let a = vec![
            span(0, 6, Category::Skills, "python", Source::Ner, 0.8),
            span(10, 15, Category::Roles, "lead", Source::Ner, 0.9),
        ];
        let b = vec![
            span(10, 15, Category::Roles, "lead", Source::Ner, 0.9),
            span(0, 6, Category::Skills, "python", Source::Ner, 0.8),
        ];
        let dict = vec![span(0, 6, Category::Skills, "python", Source::Dictionary, 1.0)];
        let coordinator = EntityCoordinator::new(LabelPolicy::Union);
        assert_eq!(
            coordinator.merge(&RuleExtraction::default(), &a, &dict),
            coordinator.merge(&RuleExtraction::default(), &b, &dict)
        );
    }

    #[test]
    fn test_entry_weight_scales_match_score() {
        let dictionary = DictionaryStore::from_json(
            r#"{"categories": {"tool": [{"term": "jira", "weight": 0.5}, {"term": "git", "weight": 2.0}]}}"#,
        )
        .unwrap();
        let matches = crate::matcher::FuzzyMatcher::new().match_text("jira and git", &dictionary);
        let spans = spans_from_matches(&matches);

        let score = |key: &str| {
            spans
                .iter()
                .find(|s| s.value.canonical_key() == key)
                .map(|s| s.score)
                .unwrap()
        };
        assert_eq!(score("jira"), 0.5);
        assert_eq!(score("git"), 1.0);
    }

    #[test]
    fn test_spans_from_recognizer() {
        let text = "skilled in k8s and leadership, starting january 2025";
        let dictionary = DictionaryStore::builtin().unwrap();
        let entities = vec![
            EntitySpan::new(11, 14, "k8s", EntityLabel::Technology, 0.9),
            EntitySpan::new(19, 29, "leadership", EntityLabel::Skill, 0.5),
            EntitySpan::new(40, 52, "january 2025", EntityLabel::Date, 0.9),
            EntitySpan::new(0, 7, "skilled", EntityLabel::Organization, 0.9),
            EntitySpan::new(50, 99, "broken", EntityLabel::Skill, 0.9),
        ];

        let (spans, warnings) = spans_from_recognizer(text, &entities, &dictionary, 0.7);
        assert_eq!(warnings.len(), 1);
        assert_eq!(spans.len(), 2);
        assert_eq!(spans[0].value, NormalizedValue::text("kubernetes"));
        assert_eq!(
            spans[1].value,
            NormalizedValue::Date(DateValue::MonthYear { year: 2025, month: 1 })
        );
    }
}
