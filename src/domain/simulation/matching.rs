//! Phrase matching strategy shared by the emotion tracker and assessment.
//!
//! Matching is approximate. A classifier can replace it by implementing
//! [`TriggerMatcher`].

use std::collections::BTreeSet;

/// Finds which of a set of phrases occur in a trainee message.
pub trait TriggerMatcher: Send + Sync {
    /// Returns the distinct phrases from `phrases` present in `message`.
    ///
    /// The result must not depend on the order of `phrases`.
    fn find_matches(&self, message: &str, phrases: &[&str]) -> BTreeSet<String>;
}

/// Borrows a phrase collection in the form [`TriggerMatcher`] expects.
pub fn phrase_refs<'a>(phrases: impl IntoIterator<Item = &'a String>) -> Vec<&'a str> {
    phrases.into_iter().map(String::as_str).collect()
}

/// Case-insensitive phrase matcher.
///
/// Phrases are normalised to lowercase with collapsed whitespace, so
/// `"Calm  Down"` in a vignette matches "please calm down" in a message.
/// A phrase that starts or ends with a letter or digit must sit on a word
/// boundary there: `"safe"` does not match "unsafe".
#[derive(Debug, Clone, Copy, Default)]
pub struct KeywordTriggerMatcher;

impl KeywordTriggerMatcher {
    /// Creates a new matcher.
    pub fn new() -> Self {
        Self
    }
}

fn normalize(text: &str) -> String {
    text.split_whitespace()
        .collect::<Vec<_>>()
        .join(" ")
        .to_lowercase()
}

fn is_word_char(c: char) -> bool {
    c.is_alphanumeric() || c == '_'
}

/// Returns true if `phrase` occurs in `haystack` on word boundaries.
fn contains_phrase(haystack: &str, phrase: &str) -> bool {
    let needs_left = phrase.chars().next().is_some_and(is_word_char);
    let needs_right = phrase.chars().next_back().is_some_and(is_word_char);

    haystack.match_indices(phrase).any(|(start, matched)| {
        let end = start + matched.len();
        let left_ok = !needs_left || !haystack[..start].chars().next_back().is_some_and(is_word_char);
        let right_ok = !needs_right || !haystack[end..].chars().next().is_some_and(is_word_char);
        left_ok && right_ok
    })
}

impl TriggerMatcher for KeywordTriggerMatcher {
    fn find_matches(&self, message: &str, phrases: &[&str]) -> BTreeSet<String> {
        let haystack = normalize(message);
        phrases
            .iter()
            .map(|p| normalize(p))
            .filter(|p| !p.is_empty() && contains_phrase(&haystack, p))
            .collect()
    }
}
