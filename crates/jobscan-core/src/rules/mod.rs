//! Rule-based field extraction for job postings.
//!
//! Each field type owns an ordered list of rules. Within a field the longest
//! match wins, ties go to the earlier rule, and accepted spans never overlap.

pub mod arrangement;
pub mod contact;
pub mod dates;
pub mod durations;
pub mod education;
pub mod patterns;
pub mod salary;

use std::collections::BTreeMap;
use std::ops::Range;

use regex::Regex;
use tracing::{debug, warn};

use crate::error::{ConfigError, ExtractionError, ExtractionWarning, Stage};
use crate::models::config::RulesConfig;
use crate::models::entity::{FieldType, NormalizedValue, Source, Span};
use crate::preprocess::{CleanedText, SectionKind};

pub use arrangement::normalize_arrangement;
pub use contact::{normalize_email, normalize_phone, normalize_url};
pub use dates::normalize_date;
pub use durations::normalize_duration;
pub use education::normalize_education;
pub use salary::normalize_salary;

use patterns::*;

/// Outcome of a normalizer. `Ok(None)` means the match is not a valid value.
pub type NormalizeResult = Result<Option<NormalizedValue>, ExtractionError>;

/// Converts matched text into a typed value.
pub type Normalizer = fn(&str) -> NormalizeResult;

/// Sample inputs used to reject patterns that can match empty text.
const EMPTY_MATCH_SAMPLES: &[&str] = &["", " ", "a", "0", "a b", "x-1.y", "\n"];

/// Fields run over the requirements section only.
const REQUIREMENT_FIELDS: &[FieldType] = &[
    FieldType::Duration,
    FieldType::EducationLevel,
    FieldType::WorkArrangement,
];

pub(crate) fn parse_number(field: &str, digits: &str) -> Result<u32, ExtractionError> {
    digits
        .parse()
        .map_err(|_| ExtractionError::normalize(field, digits, "number out of range"))
}

/// Default normalizer for a field type, used by custom rules.
pub fn default_normalizer(field: FieldType) -> Normalizer {
    match field {
        FieldType::Date => normalize_date,
        FieldType::Duration => normalize_duration,
        FieldType::Email => normalize_email,
        FieldType::Phone => normalize_phone,
        FieldType::Url => normalize_url,
        FieldType::Salary => normalize_salary,
        FieldType::WorkArrangement => normalize_arrangement,
        FieldType::EducationLevel => normalize_education,
    }
}

/// A pattern with its field type, normalizer and score.
#[derive(Debug, Clone)]
pub struct ExtractionRule {
    pub id: String,
    pub field: FieldType,
    pub pattern: Regex,
    pub normalizer: Normalizer,
    pub score: f32,
}

impl ExtractionRule {
    /// Compile a rule from pattern text.
    pub fn new(
        id: impl Into<String>,
        field: FieldType,
        pattern: &str,
        normalizer: Normalizer,
        score: f32,
    ) -> Result<Self, ConfigError> {
        let id = id.into();
        let pattern = Regex::new(pattern).map_err(|e| ConfigError::Rule {
            id: id.clone(),
            reason: e.to_string(),
        })?;
        Ok(Self::from_regex(id, field, &pattern, normalizer, score))
    }

    /// Build a rule from an already compiled pattern.
    pub fn from_regex(
        id: impl Into<String>,
        field: FieldType,
        pattern: &Regex,
        normalizer: Normalizer,
        score: f32,
    ) -> Self {
        Self {
            id: id.into(),
            field,
            pattern: pattern.clone(),
            normalizer,
            score: score.clamp(0.0, 1.0),
        }
    }

    fn matches_empty(&self) -> bool {
        EMPTY_MATCH_SAMPLES
            .iter()
            .any(|sample| self.pattern.find_iter(sample).any(|m| m.start() == m.end()))
    }
}

/// Ordered rule table per field type. Position in a field's list is its priority.
#[derive(Debug, Clone, Default)]
pub struct RuleRegistry {
    rules: BTreeMap<FieldType, Vec<ExtractionRule>>,
}

impl RuleRegistry {
    /// Create an empty registry.
    pub fn new() -> Self {
        Self::default()
    }

    /// Registry with every built-in rule.
    pub fn builtin() -> Result<Self, ConfigError> {
        Self::from_config(&RulesConfig::default())
    }

    /// Built-in rules for the enabled fields followed by custom rules.
    pub fn from_config(config: &RulesConfig) -> Result<Self, ConfigError> {
        let mut registry = Self::new();

        for rule in builtin_rules() {
            if config.is_enabled(rule.field) {
                registry.register(rule)?;
            }
        }

        for custom in &config.custom {
            let field: FieldType = custom.field.parse()?;
            let rule = ExtractionRule::new(
                custom.id.clone(),
                field,
                &custom.pattern,
                default_normalizer(field),
                custom.score,
            )?;
            registry.register(rule)?;
        }

        debug!("Rule registry holds {} rules", registry.len());
        Ok(registry)
    }

    /// Append a rule at the lowest priority of its field.
    pub fn register(&mut self, rule: ExtractionRule) -> Result<(), ConfigError> {
        if rule.matches_empty() {
            return Err(ConfigError::Rule {
                id: rule.id,
                reason: "pattern can match empty text".to_string(),
            });
        }
        if self.rules.values().flatten().any(|r| r.id == rule.id) {
            return Err(ConfigError::Rule {
                id: rule.id,
                reason: "duplicate rule id".to_string(),
            });
        }
        self.rules.entry(rule.field).or_default().push(rule);
        Ok(())
    }

    /// Rules for `field`, highest priority first.
    pub fn rules_for(&self, field: FieldType) -> &[ExtractionRule] {
        self.rules.get(&field).map(Vec::as_slice).unwrap_or(&[])
    }

    pub fn len(&self) -> usize {
        self.rules.values().map(Vec::len).sum()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

fn builtin_rules() -> Vec<ExtractionRule> {
    use FieldType::*;

    vec![
        // Dates
        ExtractionRule::from_regex("date-iso", Date, &DATE_ISO, normalize_date, 0.95),
        ExtractionRule::from_regex("date-numeric", Date, &DATE_NUMERIC, normalize_date, 0.9),
        ExtractionRule::from_regex("date-month-year", Date, &DATE_MONTH_YEAR, normalize_date, 0.9),
        ExtractionRule::from_regex("date-within", Date, &DATE_WITHIN, normalize_date, 0.85),
        ExtractionRule::from_regex("date-immediate", Date, &DATE_IMMEDIATE, normalize_date, 0.85),
        // Durations
        ExtractionRule::from_regex("duration-experience", Duration, &DURATION_EXPERIENCE, normalize_duration, 0.95),
        ExtractionRule::from_regex("duration-experience-vi", Duration, &DURATION_EXPERIENCE_VI, normalize_duration, 0.95),
        ExtractionRule::from_regex("duration-contract", Duration, &DURATION_CONTRACT, normalize_duration, 0.9),
        ExtractionRule::from_regex("duration-range", Duration, &DURATION_RANGE, normalize_duration, 0.85),
        ExtractionRule::from_regex("duration-plain", Duration, &DURATION_PLAIN, normalize_duration, 0.8),
        // Contacts
        ExtractionRule::from_regex("email", Email, &EMAIL, normalize_email, 0.95),
        ExtractionRule::from_regex("url-scheme", Url, &URL_SCHEME, normalize_url, 0.95),
        ExtractionRule::from_regex("url-www", Url, &URL_WWW, normalize_url, 0.9),
        ExtractionRule::from_regex("phone-parens", Phone, &PHONE_PARENS, normalize_phone, 0.9),
        ExtractionRule::from_regex("phone-international", Phone, &PHONE_INTERNATIONAL, normalize_phone, 0.9),
        ExtractionRule::from_regex("phone-vietnamese", Phone, &PHONE_VIETNAMESE, normalize_phone, 0.85),
        ExtractionRule::from_regex("phone-north-american", Phone, &PHONE_NORTH_AMERICAN, normalize_phone, 0.8),
        // Salaries
        ExtractionRule::from_regex("salary-dollar", Salary, &SALARY_DOLLAR, normalize_salary, 0.9),
        ExtractionRule::from_regex("salary-usd", Salary, &SALARY_USD_SUFFIX, normalize_salary, 0.9),
        ExtractionRule::from_regex("salary-millions", Salary, &SALARY_MILLIONS, normalize_salary, 0.85),
        ExtractionRule::from_regex("salary-vnd", Salary, &SALARY_VND, normalize_salary, 0.85),
        // Work arrangements
        ExtractionRule::from_regex("work-hybrid", WorkArrangement, &WORK_HYBRID, normalize_arrangement, 0.9),
        ExtractionRule::from_regex("work-remote", WorkArrangement, &WORK_REMOTE, normalize_arrangement, 0.9),
        ExtractionRule::from_regex("work-onsite", WorkArrangement, &WORK_ONSITE, normalize_arrangement, 0.9),
        ExtractionRule::from_regex("work-full-time", WorkArrangement, &WORK_FULL_TIME, normalize_arrangement, 0.9),
        ExtractionRule::from_regex("work-part-time", WorkArrangement, &WORK_PART_TIME, normalize_arrangement, 0.9),
        ExtractionRule::from_regex("work-contract", WorkArrangement, &WORK_CONTRACT, normalize_arrangement, 0.8),
        // Education
        ExtractionRule::from_regex("education-doctorate", EducationLevel, &EDUCATION_DOCTORATE, normalize_education, 0.85),
        ExtractionRule::from_regex("education-master", EducationLevel, &EDUCATION_MASTER, normalize_education, 0.85),
        ExtractionRule::from_regex("education-bachelor", EducationLevel, &EDUCATION_BACHELOR, normalize_education, 0.85),
        ExtractionRule::from_regex("education-associate", EducationLevel, &EDUCATION_ASSOCIATE, normalize_education, 0.85),
        ExtractionRule::from_regex("education-high-school", EducationLevel, &EDUCATION_HIGH_SCHOOL, normalize_education, 0.8),
    ]
}

/// Spans per field type plus warnings for fields that failed.
#[derive(Debug, Clone, Default)]
pub struct RuleExtraction {
    pub spans: BTreeMap<FieldType, Vec<Span>>,
    pub warnings: Vec<ExtractionWarning>,
}

impl RuleExtraction {
    /// Spans of one field type, in text order.
    pub fn get(&self, field: FieldType) -> &[Span] {
        self.spans.get(&field).map(Vec::as_slice).unwrap_or(&[])
    }

    pub fn all_spans(&self) -> impl Iterator<Item = &Span> {
        self.spans.values().flatten()
    }
}

struct Candidate<'r> {
    start: usize,
    end: usize,
    priority: usize,
    rule: &'r ExtractionRule,
    value: NormalizedValue,
}

/// Runs the rule table over cleaned text.
pub struct RuleExtractor {
    registry: RuleRegistry,
}

impl RuleExtractor {
    pub fn new(registry: RuleRegistry) -> Self {
        Self { registry }
    }

    pub fn registry(&self) -> &RuleRegistry {
        &self.registry
    }

    /// Extract every field type. Each field type is present in the result,
    /// possibly empty.
    pub fn extract(&self, text: &str) -> RuleExtraction {
        self.extract_fields(text, 0..text.len(), &FieldType::ALL)
    }

    /// Run duration, education and work arrangement rules over the
    /// requirements section only.
    pub fn extract_requirements_section(&self, cleaned: &CleanedText) -> RuleExtraction {
        match cleaned.section(SectionKind::Requirements) {
            Some(section) => self.extract_fields(&cleaned.text, section.body.clone(), REQUIREMENT_FIELDS),
            None => RuleExtraction::default(),
        }
    }

    /// Extract `fields` from `text[range]`. Offsets stay relative to `text`.
    pub fn extract_fields(&self, text: &str, range: Range<usize>, fields: &[FieldType]) -> RuleExtraction {
        let mut result = RuleExtraction::default();
        let offset = range.start;
        let Some(slice) = text.get(range) else {
            return result;
        };

        for &field in fields {
            match self.extract_field(field, slice) {
                Ok(mut spans) => {
                    for span in &mut spans {
                        span.start += offset;
                        span.end += offset;
                    }
                    result.spans.insert(field, spans);
                }
                Err(e) => {
                    warn!("Dropping {} values: {}", field, e);
                    result
                        .warnings
                        .push(ExtractionWarning::new(Stage::Rules, e.to_string()).with_field(field.as_str()));
                    result.spans.insert(field, Vec::new());
                }
            }
        }

        result
    }

    fn extract_field(&self, field: FieldType, text: &str) -> Result<Vec<Span>, ExtractionError> {
        let mut candidates = Vec::new();

        for (priority, rule) in self.registry.rules_for(field).iter().enumerate() {
            for m in rule.pattern.find_iter(text) {
                if m.start() == m.end() {
                    continue;
                }
                if let Some(value) = (rule.normalizer)(m.as_str())? {
                    candidates.push(Candidate {
                        start: m.start(),
                        end: m.end(),
                        priority,
                        rule,
                        value,
                    });
                }
            }
        }

        candidates.sort_by(|a, b| {
            (b.end - b.start)
                .cmp(&(a.end - a.start))
                .then(a.priority.cmp(&b.priority))
                .then(a.start.cmp(&b.start))
        });

        let mut accepted: Vec<Candidate> = Vec::new();
        for candidate in candidates {
            if accepted
                .iter()
                .all(|a| candidate.end <= a.start || a.end <= candidate.start)
            {
                accepted.push(candidate);
            }
        }
        accepted.sort_by_key(|c| c.start);

        Ok(accepted
            .into_iter()
            .map(|c| {
                Span::new(
                    c.start,
                    c.end,
                    &text[c.start..c.end],
                    field.category(),
                    c.value,
                    Source::Rule,
                    c.rule.score,
                )
            })
            .collect())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::config::CustomRuleConfig;
    use crate::models::entity::{DurationKind, DurationValue, TimeUnit};
    use pretty_assertions::assert_eq;
    use crate::preprocess::Preprocessor;

    fn extractor() -> RuleExtractor {
        RuleExtractor::new(RuleRegistry::builtin().unwrap())
    }

    fn keys(result: &RuleExtraction, field: FieldType) -> Vec<String> {
        result.get(field).iter().map(|s| s.value.canonical_key()).collect()
    }

    #[test]
    fn test_builtin_rules_register() {
        let registry = RuleRegistry::builtin().unwrap();
        assert_eq!(registry.len(), builtin_rules().len());
    }

    #[test]
    fn test_empty_text_has_every_field() {
        let result = extractor().extract("");
        assert_eq!(result.spans.len(), FieldType::ALL.len());
        assert!(result.all_spans().next().is_none());
    }

    #[test]
    fn test_longest_match_wins() {
        let text = "5+ years experience with python";
        let result = extractor().extract(text);
        let spans = result.get(FieldType::Duration);
        assert_eq!(spans.len(), 1);
        assert_eq!(spans[0].text, "5+ years experience");
        assert_eq!(
            spans[0].value,
            NormalizedValue::Duration(DurationValue {
                min: 5,
                max: None,
                open_ended: true,
                unit: TimeUnit::Years,
                kind: DurationKind::Experience,
            })
        );
    }

    #[test]
    fn test_vietnamese_experience_duration() {
        let result = extractor().extract("yêu cầu 2 năm kinh nghiệm python");
        let spans = result.get(FieldType::Duration);
        assert_eq!(spans.len(), 1);
        assert_eq!(spans[0].text, "2 năm kinh nghiệm");
        assert_eq!(spans[0].value.canonical_key(), "2 years experience");
    }

    #[test]
    fn test_spans_do_not_overlap_within_field() {
        let text = "call (555) 123-4567 or +1 555 123 4567 or 0912345678";
        let result = extractor().extract(text);
        let spans = result.get(FieldType::Phone);
        assert_eq!(spans.len(), 3);
        for pair in spans.windows(2) {
            assert!(pair[0].end <= pair[1].start);
        }
    }

    #[test]
    fn test_contacts() {
        let text = "apply at https://jobs.example.com/123. or mail hr@example.com";
        let result = extractor().extract(text);
        assert_eq!(keys(&result, FieldType::Url), vec!["https://jobs.example.com/123"]);
        assert_eq!(keys(&result, FieldType::Email), vec!["hr@example.com"]);
    }

    #[test]
    fn test_salaries() {
        let result = extractor().extract("salary: $50k-70k per year, or 10-15 triệu vnd");
        assert_eq!(
            keys(&result, FieldType::Salary),
            vec!["usd 50000-70000/year", "vnd 10000000-15000000/month"]
        );
    }

    #[test]
    fn test_work_arrangement_and_education() {
        let result = extractor().extract("hybrid, full-time. bachelor's degree in cs required");
        assert_eq!(keys(&result, FieldType::WorkArrangement), vec!["hybrid", "full-time"]);
        assert_eq!(keys(&result, FieldType::EducationLevel), vec!["bachelor"]);
    }

    #[test]
    fn test_invalid_date_is_skipped() {
        let result = extractor().extract("start 31/02/2024 or 01/03/2024");
        assert_eq!(keys(&result, FieldType::Date), vec!["2024-03-01"]);
    }

    #[test]
    fn test_normalizer_failure_empties_field() {
        let mut registry = RuleRegistry::new();
        registry
            .register(
                ExtractionRule::new("big-duration", FieldType::Duration, r"\d+ decades", normalize_duration, 0.5).unwrap(),
            )
            .unwrap();
        registry
            .register(ExtractionRule::new("mail", FieldType::Email, r"\S+@\S+", normalize_email, 0.5).unwrap())
            .unwrap();

        let result = RuleExtractor::new(registry).extract("99999999999 decades, a@b.io");
        assert!(result.get(FieldType::Duration).is_empty());
        assert_eq!(result.get(FieldType::Email).len(), 1);
        assert_eq!(result.warnings.len(), 1);
        assert_eq!(result.warnings[0].field.as_deref(), Some("duration"));
    }

    #[test]
    fn test_register_rejects_zero_width() {
        let mut registry = RuleRegistry::new();
        let rule = ExtractionRule::new("maybe-remote", FieldType::WorkArrangement, r"(?:remote)?", normalize_arrangement, 0.5).unwrap();
        assert!(matches!(registry.register(rule), Err(ConfigError::Rule { .. })));

        let rule = ExtractionRule::new("boundary", FieldType::WorkArrangement, r"\b", normalize_arrangement, 0.5).unwrap();
        assert!(registry.register(rule).is_err());
    }

    #[test]
    fn test_register_rejects_duplicate_id() {
        let mut registry = RuleRegistry::builtin().unwrap();
        let rule = ExtractionRule::new("email", FieldType::Email, r"\S+@\S+", normalize_email, 0.5).unwrap();
        assert!(registry.register(rule).is_err());
    }

    #[test]
    fn test_invalid_regex_is_config_error() {
        let err = ExtractionRule::new("broken", FieldType::Date, r"(unclosed", normalize_date, 0.5).unwrap_err();
        assert!(matches!(err, ConfigError::Rule { .. }));
    }

    #[test]
    fn test_custom_rule_from_config() {
        let mut config = RulesConfig::default();
        config.extract_salary = false;
        config.custom.push(CustomRuleConfig {
            id: "salary-gbp".to_string(),
            field: "salary".to_string(),
            pattern: r"£\d+(?:,\d{3})*".to_string(),
            score: 0.7,
        });

        let extractor = RuleExtractor::new(RuleRegistry::from_config(&config).unwrap());
        assert_eq!(extractor.registry().rules_for(FieldType::Salary).len(), 1);

        let result = extractor.extract("pay £40,000 or $50,000");
        let spans = result.get(FieldType::Salary);
        assert_eq!(spans.len(), 1);
        assert_eq!(spans[0].text, "£40,000");
        assert_eq!(spans[0].score, 0.7);
    }

    #[test]
    fn test_requirements_section_only() {
        let cleaned = crate::preprocess::TextPreprocessor::new()
            .clean("About us\nWe have 10 years of history.\nRequirements\n3+ years experience, master's degree, remote ok")
            .unwrap();
        let result = extractor().extract_requirements_section(&cleaned);
        assert_eq!(keys(&result, FieldType::Duration), vec!["3+ years experience"]);
        assert_eq!(keys(&result, FieldType::EducationLevel), vec!["master"]);
        assert_eq!(keys(&result, FieldType::WorkArrangement), vec!["remote"]);
        assert!(result.get(FieldType::Email).is_empty());

        let span = &result.get(FieldType::Duration)[0];
        assert_eq!(&cleaned.text[span.start..span.end], "3+ years experience");
    }
}
