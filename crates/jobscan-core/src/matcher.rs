//! Exact and fuzzy keyword matching against the dictionary.

use std::cmp::Ordering;

use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::dictionary::{DictionaryForm, DictionaryStore, KeywordCategory};
use crate::models::config::KeywordConfig;
use crate::models::entity::Category;
use crate::text::{joinable, tokenize, Token};

/// How a keyword was matched.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum MatchKind {
    Exact,
    Fuzzy,
}

/// A dictionary hit in the text.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MatchResult {
    pub category: KeywordCategory,
    /// Output category the match is reported under.
    pub group: Category,
    /// Canonical dictionary term.
    pub keyword: String,
    /// Text as it appears in the input.
    pub matched_text: String,
    pub start: usize,
    pub end: usize,
    /// 1.0 for exact matches, the similarity for fuzzy ones.
    pub score: f32,
    pub kind: MatchKind,
    /// Matched through a synonym rather than the canonical form.
    pub via_synonym: bool,
    /// Entry weight from the dictionary, applied when the match becomes a span.
    pub weight: f32,
}

/// Dictionary matcher with an optional approximate pass.
pub struct FuzzyMatcher {
    fuzzy: bool,
    threshold: f32,
    max_phrase_len: usize,
    min_fuzzy_len: usize,
}

impl FuzzyMatcher {
    /// Create a matcher with default settings.
    pub fn new() -> Self {
        Self::from_config(&KeywordConfig::default())
    }

    pub fn from_config(config: &KeywordConfig) -> Self {
        Self {
            fuzzy: config.fuzzy_matching,
            threshold: config.similarity_threshold,
            max_phrase_len: config.max_phrase_len.max(1),
            min_fuzzy_len: config.min_fuzzy_len,
        }
    }

    /// Enable or disable fuzzy matching.
    pub fn with_fuzzy(mut self, fuzzy: bool) -> Self {
        self.fuzzy = fuzzy;
        self
    }

    /// Set the minimum similarity for fuzzy matches.
    pub fn with_threshold(mut self, threshold: f32) -> Self {
        self.threshold = threshold;
        self
    }

    /// Find dictionary terms in `text`.
    ///
    /// Exact matches are taken first, longest phrase first. Fuzzy matches
    /// only consider tokens no exact match covers. Results are ordered by
    /// score, then position.
    pub fn match_text(&self, text: &str, dictionary: &DictionaryStore) -> Vec<MatchResult> {
        let tokens = tokenize(text);
        if tokens.is_empty() || dictionary.is_empty() {
            return Vec::new();
        }

        let max_len = self.max_phrase_len.min(dictionary.max_words()).max(1);
        let mut covered = vec![false; tokens.len()];
        let mut results = Vec::new();

        for len in (1..=max_len).rev() {
            for i in 0..tokens.len().saturating_sub(len - 1) {
                let Some(phrase) = phrase_at(text, &tokens, &covered, i, len) else {
                    continue;
                };

                let forms = dictionary.lookup(&phrase);
                if forms.is_empty() {
                    continue;
                }

                covered[i..i + len].iter_mut().for_each(|c| *c = true);
                for form in forms {
                    if let Some(m) = self.build(text, &tokens[i], &tokens[i + len - 1], form, 1.0, MatchKind::Exact, dictionary) {
                        results.push(m);
                    }
                }
            }
        }

        let exact = results.len();

        if self.fuzzy {
            for len in (1..=max_len).rev() {
                for i in 0..tokens.len().saturating_sub(len - 1) {
                    let Some(phrase) = phrase_at(text, &tokens, &covered, i, len) else {
                        continue;
                    };
                    if !self.is_fuzzy_candidate(&phrase) {
                        continue;
                    }

                    if let Some((form, similarity)) = self.best_fuzzy(&phrase, len, dictionary) {
                        covered[i..i + len].iter_mut().for_each(|c| *c = true);
                        if let Some(m) = self.build(text, &tokens[i], &tokens[i + len - 1], form, similarity, MatchKind::Fuzzy, dictionary) {
                            results.push(m);
                        }
                    }
                }
            }
        }

        debug!(
            "Matched {} exact and {} fuzzy keywords",
            exact,
            results.len() - exact
        );

        results.sort_by(|a, b| {
            b.score
                .total_cmp(&a.score)
                .then(a.start.cmp(&b.start))
                .then(a.keyword.cmp(&b.keyword))
        });
        results
    }

    fn is_fuzzy_candidate(&self, phrase: &str) -> bool {
        phrase.chars().count() >= self.min_fuzzy_len
            && phrase.chars().any(|c| c.is_alphabetic())
    }

    /// Closest form with the same token count, if it clears the threshold.
    ///
    /// Entries marked `fuzzy: false` are skipped. Ties prefer the shorter
    /// canonical term, then the earlier entry.
    fn best_fuzzy<'d>(
        &self,
        phrase: &str,
        words: usize,
        dictionary: &'d DictionaryStore,
    ) -> Option<(&'d DictionaryForm, f32)> {
        let mut best: Option<(&DictionaryForm, f32)> = None;

        for form in dictionary.forms_with_word_count(words) {
            if form.form.chars().count() < self.min_fuzzy_len {
                continue;
            }
            if !dictionary.entry(form.entry).is_some_and(|e| e.fuzzy) {
                continue;
            }
            let similarity = strsim::normalized_levenshtein(phrase, &form.form) as f32;
            if similarity < self.threshold {
                continue;
            }

            let better = match best {
                None => true,
                Some((current, score)) => match similarity.total_cmp(&score) {
                    Ordering::Greater => true,
                    Ordering::Less => false,
                    Ordering::Equal => {
                        let term_len = |f: &DictionaryForm| {
                            dictionary.entry(f.entry).map(|e| e.term.len()).unwrap_or(usize::MAX)
                        };
                        (term_len(form), form.entry) < (term_len(current), current.entry)
                    }
                },
            };
            if better {
                best = Some((form, similarity));
            }
        }

        best
    }

    #[allow(clippy::too_many_arguments)]
    fn build(
        &self,
        text: &str,
        first: &Token,
        last: &Token,
        form: &DictionaryForm,
        score: f32,
        kind: MatchKind,
        dictionary: &DictionaryStore,
    ) -> Option<MatchResult> {
        let entry = dictionary.entry(form.entry)?;
        Some(MatchResult {
            category: entry.category,
            group: entry.category.group(),
            keyword: entry.term.to_lowercase(),
            matched_text: text.get(first.start..last.end)?.to_string(),
            start: first.start,
            end: last.end,
            score,
            kind,
            via_synonym: form.synonym,
            weight: entry.weight,
        })
    }
}

impl Default for FuzzyMatcher {
    fn default() -> Self {
        Self::new()
    }
}

/// Phrase of `len` tokens starting at `i`, if none is covered and the run
/// does not cross punctuation.
fn phrase_at(text: &str, tokens: &[Token], covered: &[bool], i: usize, len: usize) -> Option<String> {
    if covered[i..i + len].iter().any(|&c| c) {
        return None;
    }
    if tokens[i..i + len].windows(2).any(|w| !joinable(text, &w[0], &w[1])) {
        return None;
    }
    Some(
        tokens[i..i + len]
            .iter()
            .map(|t| t.text.as_str())
            .collect::<Vec<_>>()
            .join(" "),
    )
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    fn builtin() -> DictionaryStore {
        DictionaryStore::builtin().unwrap()
    }

    fn keywords(results: &[MatchResult]) -> Vec<&str> {
        let mut k: Vec<&str> = results.iter().map(|m| m.keyword.as_str()).collect();
        k.sort();
        k
    }

    #[test]
    fn test_exact_matches_with_synonyms() {
        let results = FuzzyMatcher::new().match_text("we use golang, k8s and react.js daily", &builtin());
        assert_eq!(keywords(&results), vec!["go", "kubernetes", "react"]);
        assert!(results.iter().all(|m| m.kind == MatchKind::Exact && m.score == 1.0));
        assert!(results.iter().all(|m| m.via_synonym));
    }

    #[test]
    fn test_longest_phrase_wins() {
        let results = FuzzyMatcher::new()
            .with_fuzzy(false)
            .match_text("hiring a machine learning engineer", &builtin());
        assert_eq!(keywords(&results), vec!["machine learning engineer"]);
        assert_eq!(results[0].group, Category::Roles);
    }

    #[test]
    fn test_phrases_do_not_cross_punctuation() {
        let results = FuzzyMatcher::new()
            .with_fuzzy(false)
            .match_text("machine, learning", &builtin());
        assert!(results.is_empty());
    }

    #[test]
    fn test_fuzzy_match_on_typo() {
        let results = FuzzyMatcher::new().match_text("experience with kubernets", &builtin());
        let m = results.iter().find(|m| m.keyword == "kubernetes").unwrap();
        assert_eq!(m.kind, MatchKind::Fuzzy);
        assert!(m.score >= 0.8 && m.score < 1.0);
        assert_eq!(m.matched_text, "kubernets");
    }

    #[test]
    fn test_fuzzy_disabled() {
        let results = FuzzyMatcher::new()
            .with_fuzzy(false)
            .match_text("experience with kubernets", &builtin());
        assert!(results.iter().all(|m| m.keyword != "kubernetes"));
    }

    #[test]
    fn test_short_tokens_never_fuzzy_match() {
        // "jav" is one edit from "java" but below the fuzzy length floor.
        let results = FuzzyMatcher::new()
            .with_threshold(0.5)
            .match_text("jav", &builtin());
        assert!(results.is_empty());
    }

    #[test]
    fn test_common_words_do_not_fuzzy_match() {
        let results = FuzzyMatcher::new()
            .match_text("we value trust and reach across every team we shift priorities to scale", &builtin());
        assert!(results.is_empty(), "unexpected matches: {:?}", keywords(&results));
    }

    #[test]
    fn test_entries_can_opt_out_of_fuzzy_matching() {
        let dictionary = DictionaryStore::from_json(
            r#"{"categories": {"framework": [{"term": "spring", "fuzzy": false}, {"term": "pandas"}]}}"#,
        )
        .unwrap();
        let results = FuzzyMatcher::new().match_text("string handling with pandass", &dictionary);
        assert_eq!(keywords(&results), vec!["pandas"]);
        assert_eq!(results[0].kind, MatchKind::Fuzzy);
    }

    #[test]
    fn test_numbers_never_fuzzy_match() {
        let results = FuzzyMatcher::new()
            .with_threshold(0.1)
            .match_text("2024 1234", &builtin());
        assert!(results.is_empty());
    }

    #[test]
    fn test_offsets_point_into_text() {
        let text = "strong python skills";
        let results = FuzzyMatcher::new().match_text(text, &builtin());
        let m = results.iter().find(|m| m.keyword == "python").unwrap();
        assert_eq!(&text[m.start..m.end], "python");
    }

    #[test]
    fn test_empty_text() {
        assert!(FuzzyMatcher::new().match_text("", &builtin()).is_empty());
    }
}
