//! Tokenization shared by the dictionary and the keyword matcher.

use lazy_static::lazy_static;
use regex::Regex;

lazy_static! {
    // Words keep inner "+", "#", ".", "/" and "-" so "c++", "node.js",
    // "ci/cd" and "problem-solving" stay single tokens.
    static ref TOKEN: Regex = Regex::new(
        r"[\p{L}\p{N}][\p{L}\p{N}+#]*(?:[./\-][\p{L}\p{N}+#]+)*"
    ).unwrap();
}

/// A lowercase token with its byte range in the source text.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Token {
    pub text: String,
    pub start: usize,
    pub end: usize,
}

/// Split `text` into lowercase tokens.
pub fn tokenize(text: &str) -> Vec<Token> {
    TOKEN
        .find_iter(text)
        .map(|m| Token {
            text: m.as_str().to_lowercase(),
            start: m.start(),
            end: m.end(),
        })
        .collect()
}

/// Whether two consecutive tokens may belong to one phrase.
///
/// Phrases never cross punctuation or line breaks.
pub fn joinable(text: &str, left: &Token, right: &Token) -> bool {
    text.get(left.end..right.start)
        .map(|gap| !gap.is_empty() && gap.chars().all(|c| c == ' ' || c == '\t'))
        .unwrap_or(false)
}

/// Lowercase `form` and rejoin its tokens with single spaces.
pub fn normalize_form(form: &str) -> String {
    tokenize(form)
        .into_iter()
        .map(|t| t.text)
        .collect::<Vec<_>>()
        .join(" ")
}
