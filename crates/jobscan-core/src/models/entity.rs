//! Span, category and normalized value types shared by every stage.

use std::fmt;
use std::str::FromStr;

use chrono::NaiveDate;
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

use crate::error::ConfigError;

/// Structured field types produced by the rule extractor.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum FieldType {
    Date,
    Duration,
    Email,
    Phone,
    Url,
    Salary,
    WorkArrangement,
    EducationLevel,
}

impl FieldType {
    pub const ALL: [FieldType; 8] = [
        FieldType::Date,
        FieldType::Duration,
        FieldType::Email,
        FieldType::Phone,
        FieldType::Url,
        FieldType::Salary,
        FieldType::WorkArrangement,
        FieldType::EducationLevel,
    ];

    pub fn as_str(self) -> &'static str {
        match self {
            FieldType::Date => "date",
            FieldType::Duration => "duration",
            FieldType::Email => "email",
            FieldType::Phone => "phone",
            FieldType::Url => "url",
            FieldType::Salary => "salary",
            FieldType::WorkArrangement => "work_arrangement",
            FieldType::EducationLevel => "education_level",
        }
    }

    /// Output category that collects values of this field type.
    pub fn category(self) -> Category {
        match self {
            FieldType::Date => Category::Dates,
            FieldType::Duration => Category::Durations,
            FieldType::Email => Category::Emails,
            FieldType::Phone => Category::PhoneNumbers,
            FieldType::Url => Category::Urls,
            FieldType::Salary => Category::Salaries,
            FieldType::WorkArrangement => Category::WorkArrangements,
            FieldType::EducationLevel => Category::EducationLevels,
        }
    }
}

impl fmt::Display for FieldType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for FieldType {
    type Err = ConfigError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let name = s.trim().to_lowercase().replace(['-', ' '], "_");
        FieldType::ALL
            .into_iter()
            .find(|f| f.as_str() == name)
            .ok_or_else(|| ConfigError::UnknownFieldType(s.to_string()))
    }
}

/// Output categories of a processed posting.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Category {
    Skills,
    Technologies,
    SoftSkills,
    IndustryTerms,
    Roles,
    SeniorityLevels,
    Responsibilities,
    Qualifications,
    Benefits,
    Dates,
    Durations,
    Emails,
    PhoneNumbers,
    Urls,
    Salaries,
    WorkArrangements,
    EducationLevels,
    VietnameseKeywords,
}

impl Category {
    pub const ALL: [Category; 18] = [
        Category::Skills,
        Category::Technologies,
        Category::SoftSkills,
        Category::IndustryTerms,
        Category::Roles,
        Category::SeniorityLevels,
        Category::Responsibilities,
        Category::Qualifications,
        Category::Benefits,
        Category::Dates,
        Category::Durations,
        Category::Emails,
        Category::PhoneNumbers,
        Category::Urls,
        Category::Salaries,
        Category::WorkArrangements,
        Category::EducationLevels,
        Category::VietnameseKeywords,
    ];

    pub fn as_str(self) -> &'static str {
        match self {
            Category::Skills => "skills",
            Category::Technologies => "technologies",
            Category::SoftSkills => "soft_skills",
            Category::IndustryTerms => "industry_terms",
            Category::Roles => "roles",
            Category::SeniorityLevels => "seniority_levels",
            Category::Responsibilities => "responsibilities",
            Category::Qualifications => "qualifications",
            Category::Benefits => "benefits",
            Category::Dates => "dates",
            Category::Durations => "durations",
            Category::Emails => "emails",
            Category::PhoneNumbers => "phone_numbers",
            Category::Urls => "urls",
            Category::Salaries => "salaries",
            Category::WorkArrangements => "work_arrangements",
            Category::EducationLevels => "education_levels",
            Category::VietnameseKeywords => "vietnamese_keywords",
        }
    }

    /// Structured categories hold at most one value per text range.
    pub fn is_structured(self) -> bool {
        matches!(
            self,
            Category::Dates
                | Category::Durations
                | Category::Emails
                | Category::PhoneNumbers
                | Category::Urls
                | Category::Salaries
                | Category::WorkArrangements
                | Category::EducationLevels
        )
    }

    /// Categories whose spans are pruned when contained in a span of
    /// another member of this set.
    pub fn is_exclusive(self) -> bool {
        matches!(
            self,
            Category::Dates
                | Category::Durations
                | Category::Salaries
                | Category::PhoneNumbers
                | Category::Emails
                | Category::Urls
        )
    }

    /// Categories only the entity recognizer can fill.
    pub fn is_recognizer_only(self) -> bool {
        matches!(
            self,
            Category::Responsibilities | Category::Qualifications | Category::Benefits
        )
    }
}

impl fmt::Display for Category {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Category {
    type Err = ConfigError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let name = s.trim().to_lowercase().replace(['-', ' '], "_");
        Category::ALL
            .into_iter()
            .find(|c| c.as_str() == name)
            .ok_or_else(|| ConfigError::UnknownCategory(s.to_string()))
    }
}

/// Stage that produced a span. Ordering is merge priority, strongest first.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Source {
    Rule,
    Ner,
    Dictionary,
}

/// Calendar units used by dates and durations.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum TimeUnit {
    Days,
    Weeks,
    Months,
    Years,
}

impl TimeUnit {
    /// Parse unit words such as "yrs", "month", "weeks" or "năm".
    pub fn parse(word: &str) -> Option<Self> {
        let w = word.trim().to_lowercase();
        match w.as_str() {
            "ngày" => return Some(TimeUnit::Days),
            "tuần" => return Some(TimeUnit::Weeks),
            "tháng" => return Some(TimeUnit::Months),
            "năm" => return Some(TimeUnit::Years),
            _ => {}
        }
        if w.starts_with("day") {
            Some(TimeUnit::Days)
        } else if w.starts_with("week") || w.starts_with("wk") {
            Some(TimeUnit::Weeks)
        } else if w.starts_with("month") || w == "mo" || w == "mos" {
            Some(TimeUnit::Months)
        } else if w.starts_with("year") || w.starts_with("yr") {
            Some(TimeUnit::Years)
        } else {
            None
        }
    }

    pub fn as_str(self) -> &'static str {
        match self {
            TimeUnit::Days => "days",
            TimeUnit::Weeks => "weeks",
            TimeUnit::Months => "months",
            TimeUnit::Years => "years",
        }
    }
}

/// Normalized date value.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum DateValue {
    /// A full calendar date.
    Absolute { date: NaiveDate },
    /// Month precision, e.g. "january 2025".
    MonthYear { year: i32, month: u32 },
    /// "immediately", "asap".
    Immediate,
    /// Relative start, e.g. "within 2 weeks".
    Within { amount: u32, unit: TimeUnit },
}

impl fmt::Display for DateValue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            DateValue::Absolute { date } => write!(f, "{}", date.format("%Y-%m-%d")),
            DateValue::MonthYear { year, month } => write!(f, "{:04}-{:02}", year, month),
            DateValue::Immediate => f.write_str("immediate"),
            DateValue::Within { amount, unit } => write!(f, "within {} {}", amount, unit.as_str()),
        }
    }
}

/// What a duration measures.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum DurationKind {
    Experience,
    Contract,
    Plain,
}

/// Normalized duration, e.g. "5+ years experience" or "2-3 years".
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DurationValue {
    pub min: u32,
    pub max: Option<u32>,
    /// Set for "5+ years" style lower bounds.
    pub open_ended: bool,
    pub unit: TimeUnit,
    pub kind: DurationKind,
}

impl fmt::Display for DurationValue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self.max {
            Some(max) if max != self.min => write!(f, "{}-{}", self.min, max)?,
            _ => write!(f, "{}", self.min)?,
        }
        if self.open_ended {
            f.write_str("+")?;
        }
        write!(f, " {}", self.unit.as_str())?;
        match self.kind {
            DurationKind::Experience => f.write_str(" experience"),
            DurationKind::Contract => f.write_str(" contract"),
            DurationKind::Plain => Ok(()),
        }
    }
}

/// Salary period.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum PayPeriod {
    Hour,
    Month,
    Year,
    Unspecified,
}

/// Normalized salary range.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SalaryValue {
    pub min: Decimal,
    pub max: Option<Decimal>,
    /// ISO 4217 code when one could be detected.
    pub currency: Option<String>,
    pub period: PayPeriod,
}

impl fmt::Display for SalaryValue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if let Some(currency) = &self.currency {
            write!(f, "{} ", currency.to_lowercase())?;
        }
        write!(f, "{}", self.min.normalize())?;
        if let Some(max) = self.max {
            write!(f, "-{}", max.normalize())?;
        }
        match self.period {
            PayPeriod::Hour => f.write_str("/hour"),
            PayPeriod::Month => f.write_str("/month"),
            PayPeriod::Year => f.write_str("/year"),
            PayPeriod::Unspecified => Ok(()),
        }
    }
}

/// Typed value carried by a span after normalization.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "kind", content = "value", rename_all = "snake_case")]
pub enum NormalizedValue {
    Text(String),
    Date(DateValue),
    Duration(DurationValue),
    Salary(SalaryValue),
}

impl NormalizedValue {
    pub fn text(value: impl Into<String>) -> Self {
        NormalizedValue::Text(value.into())
    }

    /// String form used to deduplicate values within a category.
    pub fn canonical_key(&self) -> String {
        match self {
            NormalizedValue::Text(text) => text.clone(),
            NormalizedValue::Date(date) => date.to_string(),
            NormalizedValue::Duration(duration) => duration.to_string(),
            NormalizedValue::Salary(salary) => salary.to_string(),
        }
    }
}

/// A typed, normalized substring of the cleaned text.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Span {
    /// Byte offset of the first character.
    pub start: usize,
    /// Byte offset one past the last character.
    pub end: usize,
    /// Matched text.
    pub text: String,
    pub category: Category,
    pub value: NormalizedValue,
    pub source: Source,
    /// Confidence (0.0 - 1.0).
    pub score: f32,
}

impl Span {
    pub fn new(
        start: usize,
        end: usize,
        text: impl Into<String>,
        category: Category,
        value: NormalizedValue,
        source: Source,
        score: f32,
    ) -> Self {
        Self {
            start,
            end,
            text: text.into(),
            category,
            value,
            source,
            score: score.clamp(0.0, 1.0),
        }
    }

    pub fn len(&self) -> usize {
        self.end - self.start
    }

    pub fn is_empty(&self) -> bool {
        self.start >= self.end
    }

    pub fn overlaps(&self, other: &Span) -> bool {
        self.start < other.end && other.start < self.end
    }

    /// True when `other` lies entirely within this span.
    pub fn contains(&self, other: &Span) -> bool {
        self.start <= other.start && other.end <= self.end
    }
}
