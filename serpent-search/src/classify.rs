//! Text classification shared by every engine: ad detection, keyword
//! extraction and word-count gating.

use regex::Regex;
use std::collections::BTreeSet;
use std::sync::LazyLock;

/// Case-insensitive sponsored-content markers matched against title and
/// description.
pub const AD_PATTERNS: &[&str] = &[
    r"(?i)sponsored",
    r"(?i)advertisement",
    r"(?i)^ad\s",
    r"(?i)promoted",
];

static AD_REGEXES: LazyLock<Vec<Regex>> =
    LazyLock::new(|| AD_PATTERNS.iter().filter_map(|p| Regex::new(p).ok()).collect());

/// Whether `title` or `description` carries a sponsored-content marker.
pub fn looks_like_ad(title: &str, description: &str) -> bool {
    AD_REGEXES
        .iter()
        .any(|re| re.is_match(title) || re.is_match(description))
}

/// Query terms longer than three characters that occur in `text`,
/// lowercased. Matching is a case-insensitive substring scan.
pub fn extract_keywords(query: &str, text: &str) -> BTreeSet<String> {
    let haystack = text.to_lowercase();
    query
        .split_whitespace()
        .map(str::to_lowercase)
        .filter(|term| term.chars().count() > 3)
        .filter(|term| haystack.contains(term.as_str()))
        .collect()
}

/// Whitespace-separated word count.
pub fn word_count(text: &str) -> usize {
    text.split_whitespace().count()
}

/// Optional inclusive word-count bounds.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct WordBounds {
    pub min: Option<usize>,
    pub max: Option<usize>,
}

impl WordBounds {
    pub fn new(min: Option<usize>, max: Option<usize>) -> Self {
        Self { min, max }
    }

    /// Whether `text` is within bounds.
    pub fn accepts(&self, text: &str) -> bool {
        let count = word_count(text);
        self.min.is_none_or(|min| count >= min) && self.max.is_none_or(|max| count <= max)
    }
}
