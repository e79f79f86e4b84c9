//! Token-pattern recognizer for job-posting entities.

use lazy_static::lazy_static;
use regex::Regex;
use tracing::debug;

use crate::span::{EntityLabel, EntitySpan};
use crate::{EntityRecognizer, Result};

lazy_static! {
    static ref TOKEN: Regex = Regex::new(
        r"[\p{L}\p{N}][\p{L}\p{N}+#]*(?:[./\-][\p{L}\p{N}+#]+)*"
    ).unwrap();

    // "experience with python, sql and docker"
    static ref SKILL_CONTEXT: Regex = Regex::new(
        r"(?i)\b(?:experience with|knowledge of|proficient in|skilled in|expert in)\s+([^.\n]+)"
    ).unwrap();

    static ref LIST_SEPARATOR: Regex = Regex::new(
        r"(?i),|;|\band\b|\bor\b"
    ).unwrap();
}

const MULTI_TOKEN_SCORE: f32 = 0.9;
const SINGLE_TOKEN_SCORE: f32 = 0.8;
const CONTEXTUAL_SCORE: f32 = 0.7;

/// Maximum items captured after a single skill context phrase.
const MAX_CONTEXT_ITEMS: usize = 3;

const CONTEXT_STOPWORDS: &[&str] = &["and", "or", "the", "of", "in", "to", "for", "a", "an"];

const MONTHS: &[&str] = &[
    "january", "february", "march", "april", "may", "june", "july", "august",
    "september", "october", "november", "december", "jan", "feb", "mar", "apr",
    "jun", "jul", "aug", "sep", "sept", "oct", "nov", "dec",
];

/// A single token constraint inside a phrase pattern.
#[derive(Debug, Clone, Copy)]
enum TokenMatch {
    Word(&'static str),
    AnyOf(&'static [&'static str]),
    Year,
}

impl TokenMatch {
    fn matches(&self, token: &str) -> bool {
        match self {
            TokenMatch::Word(w) => token == *w,
            TokenMatch::AnyOf(words) => words.contains(&token),
            TokenMatch::Year => token.len() == 4 && token.chars().all(|c| c.is_ascii_digit()),
        }
    }
}

#[derive(Debug, Clone)]
struct PhrasePattern {
    label: EntityLabel,
    tokens: Vec<TokenMatch>,
}

fn phrase(label: EntityLabel, tokens: &[TokenMatch]) -> PhrasePattern {
    PhrasePattern {
        label,
        tokens: tokens.to_vec(),
    }
}

fn default_patterns() -> Vec<PhrasePattern> {
    use EntityLabel::*;
    use TokenMatch::{AnyOf, Word, Year};

    vec![
        // Programming and data skills
        phrase(Skill, &[AnyOf(&["python", "java", "javascript", "c++", "c#", "php", "ruby", "go", "rust", "swift"])]),
        phrase(Skill, &[Word("machine"), Word("learning")]),
        phrase(Skill, &[Word("data"), Word("science")]),
        phrase(Skill, &[Word("artificial"), Word("intelligence")]),
        phrase(Skill, &[Word("deep"), Word("learning")]),
        phrase(Skill, &[Word("natural"), Word("language"), Word("processing")]),
        phrase(Skill, &[Word("computer"), Word("vision")]),
        phrase(Skill, &[Word("big"), Word("data")]),
        phrase(Skill, &[Word("data"), Word("analysis")]),
        phrase(Skill, &[Word("data"), Word("visualization")]),
        // Soft skills
        phrase(Skill, &[Word("problem"), Word("solving")]),
        phrase(Skill, &[Word("critical"), Word("thinking")]),
        phrase(Skill, &[Word("team"), Word("work")]),
        phrase(Skill, &[Word("communication"), Word("skills")]),
        phrase(Skill, &[Word("leadership")]),
        phrase(Skill, &[Word("project"), Word("management")]),
        phrase(Skill, &[Word("time"), Word("management")]),
        // Roles
        phrase(Role, &[AnyOf(&["developer", "engineer", "programmer", "architect", "analyst", "scientist"])]),
        phrase(Role, &[Word("software"), AnyOf(&["developer", "engineer"])]),
        phrase(Role, &[Word("data"), AnyOf(&["scientist", "engineer", "analyst"])]),
        phrase(Role, &[Word("machine"), Word("learning"), Word("engineer")]),
        phrase(Role, &[Word("full"), Word("stack"), Word("developer")]),
        phrase(Role, &[Word("frontend"), Word("developer")]),
        phrase(Role, &[Word("backend"), Word("developer")]),
        phrase(Role, &[Word("devops"), Word("engineer")]),
        phrase(Role, &[Word("product"), Word("manager")]),
        phrase(Role, &[Word("project"), Word("manager")]),
        phrase(Role, &[Word("tech"), Word("lead")]),
        phrase(Role, &[Word("team"), Word("lead")]),
        // Technologies
        phrase(Technology, &[AnyOf(&["react", "angular", "vue", "django", "flask", "spring", "laravel", "express"])]),
        phrase(Technology, &[AnyOf(&["react.js", "reactjs", "node.js", "nodejs", "vue.js", "vuejs"])]),
        phrase(Technology, &[AnyOf(&["mysql", "postgresql", "mongodb", "redis", "elasticsearch", "cassandra"])]),
        phrase(Technology, &[Word("sql"), Word("server")]),
        phrase(Technology, &[AnyOf(&["aws", "azure", "gcp", "docker", "kubernetes"])]),
        phrase(Technology, &[Word("amazon"), Word("web"), Word("services")]),
        phrase(Technology, &[Word("google"), Word("cloud"), Word("platform")]),
        phrase(Technology, &[AnyOf(&["git", "jenkins", "jira", "confluence", "slack", "tableau", "powerbi"])]),
        // Responsibilities
        phrase(Responsibility, &[AnyOf(&["develop", "design", "implement", "maintain", "create", "build"])]),
        phrase(Responsibility, &[Word("work"), Word("with")]),
        phrase(Responsibility, &[Word("collaborate"), Word("with")]),
        phrase(Responsibility, &[Word("responsible"), Word("for")]),
        phrase(Responsibility, &[AnyOf(&["manage", "lead", "coordinate", "ensure", "support"])]),
        phrase(Responsibility, &[Word("participate"), Word("in")]),
        // Qualifications
        phrase(Qualification, &[Word("bachelor"), Word("degree")]),
        phrase(Qualification, &[Word("master"), Word("degree")]),
        phrase(Qualification, &[Word("phd")]),
        phrase(Qualification, &[AnyOf(&["years", "year"]), Word("experience")]),
        phrase(Qualification, &[Word("experience"), Word("in")]),
        phrase(Qualification, &[Word("knowledge"), Word("of")]),
        phrase(Qualification, &[Word("familiar"), Word("with")]),
        phrase(Qualification, &[Word("proficient"), Word("in")]),
        phrase(Qualification, &[Word("expert"), Word("in")]),
        // Benefits
        phrase(Benefit, &[Word("health"), Word("insurance")]),
        phrase(Benefit, &[Word("paid"), Word("time"), Word("off")]),
        phrase(Benefit, &[Word("stock"), Word("options")]),
        phrase(Benefit, &[AnyOf(&["annual", "performance", "yearly"]), Word("bonus")]),
        phrase(Benefit, &[Word("flexible"), AnyOf(&["hours", "schedule"])]),
        phrase(Benefit, &[Word("training"), Word("budget")]),
        phrase(Benefit, &[Word("13th"), Word("month"), Word("salary")]),
        phrase(Benefit, &[Word("bảo"), Word("hiểm")]),
        phrase(Benefit, &[Word("lương"), Word("cạnh"), Word("tranh")]),
        phrase(Benefit, &[Word("lương"), Word("tháng"), Word("13")]),
        // Month-year dates
        phrase(Date, &[AnyOf(MONTHS), Year]),
    ]
}

#[derive(Debug)]
struct Token {
    lower: String,
    start: usize,
    end: usize,
}

fn tokenize(text: &str) -> Vec<Token> {
    TOKEN
        .find_iter(text)
        .map(|m| Token {
            lower: m.as_str().to_lowercase(),
            start: m.start(),
            end: m.end(),
        })
        .collect()
}

/// Recognizer built from token phrase patterns and skill-context capture.
pub struct PatternRecognizer {
    name: String,
    patterns: Vec<PhrasePattern>,
    contextual_skills: bool,
}

impl PatternRecognizer {
    /// Create a recognizer with the default job-posting patterns.
    pub fn new() -> Self {
        Self {
            name: "pattern".to_string(),
            patterns: default_patterns(),
            contextual_skills: true,
        }
    }

    /// Set the reported recognizer name.
    pub fn with_name(mut self, name: impl Into<String>) -> Self {
        self.name = name.into();
        self
    }

    /// Enable or disable skill capture after phrases like "experience with".
    pub fn with_contextual_skills(mut self, enabled: bool) -> Self {
        self.contextual_skills = enabled;
        self
    }

    fn match_phrases(&self, text: &str, tokens: &[Token]) -> Vec<EntitySpan> {
        let mut spans = Vec::new();

        for i in 0..tokens.len() {
            for pattern in &self.patterns {
                let len = pattern.tokens.len();
                if i + len > tokens.len() {
                    continue;
                }

                let window = &tokens[i..i + len];
                let tokens_match = window
                    .iter()
                    .zip(pattern.tokens.iter())
                    .all(|(token, matcher)| matcher.matches(&token.lower));
                // Phrases must not run across punctuation.
                let contiguous = window
                    .windows(2)
                    .all(|pair| text[pair[0].end..pair[1].start].trim().is_empty());

                if tokens_match && contiguous {
                    let start = window[0].start;
                    let end = window[len - 1].end;
                    let score = if len > 1 { MULTI_TOKEN_SCORE } else { SINGLE_TOKEN_SCORE };
                    spans.push(EntitySpan::new(
                        start,
                        end,
                        &text[start..end],
                        pattern.label.clone(),
                        score,
                    ));
                }
            }
        }

        spans
    }

    fn match_skill_contexts(&self, text: &str) -> Vec<EntitySpan> {
        let mut spans = Vec::new();

        for caps in SKILL_CONTEXT.captures_iter(text) {
            let Some(list) = caps.get(1) else { continue };
            let base = list.start();
            let list_text = list.as_str();

            let mut piece_start = 0;
            let mut pieces = Vec::new();
            for sep in LIST_SEPARATOR.find_iter(list_text) {
                pieces.push((piece_start, sep.start()));
                piece_start = sep.end();
            }
            pieces.push((piece_start, list_text.len()));

            let mut taken = 0;
            for (from, to) in pieces {
                if taken == MAX_CONTEXT_ITEMS {
                    break;
                }
                let raw = &list_text[from..to];
                let item = raw.trim();
                if item.chars().count() <= 2 || CONTEXT_STOPWORDS.contains(&item.to_lowercase().as_str()) {
                    continue;
                }

                let leading = raw.len() - raw.trim_start().len();
                let start = base + from + leading;
                spans.push(EntitySpan::new(
                    start,
                    start + item.len(),
                    item,
                    EntityLabel::Skill,
                    CONTEXTUAL_SCORE,
                ));
                taken += 1;
            }
        }

        spans
    }
}

impl Default for PatternRecognizer {
    fn default() -> Self {
        Self::new()
    }
}

impl EntityRecognizer for PatternRecognizer {
    fn name(&self) -> &str {
        &self.name
    }

    fn recognize(&self, text: &str) -> Result<Vec<EntitySpan>> {
        let tokens = tokenize(text);
        let mut spans = self.match_phrases(text, &tokens);

        if self.contextual_skills {
            spans.extend(self.match_skill_contexts(text));
        }

        let spans = prune_contained(spans);
        debug!("Pattern recognizer labeled {} spans over {} tokens", spans.len(), tokens.len());

        Ok(spans)
    }
}

/// Drop spans covered by a longer (or equal, higher-scored) span of the same label.
fn prune_contained(mut spans: Vec<EntitySpan>) -> Vec<EntitySpan> {
    spans.sort_by(|a, b| {
        a.start
            .cmp(&b.start)
            .then((b.end - b.start).cmp(&(a.end - a.start)))
            .then(b.score.total_cmp(&a.score))
            .then(a.label.cmp(&b.label))
    });

    let mut kept: Vec<EntitySpan> = Vec::with_capacity(spans.len());
    for span in spans {
        let covered = kept
            .iter()
            .any(|k| k.label == span.label && k.start <= span.start && span.end <= k.end);
        if !covered {
            kept.push(span);
        }
    }

    kept
}
