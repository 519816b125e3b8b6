//! Post-hoc result filters.
//!
//! Every filter is stateless and order-preserving: it only ever drops
//! results. [`FilterPipeline`] applies the configured filters in a fixed
//! order (domain, keyword, result type, word count) regardless of the
//! order in which they were set.

use crate::classify::word_count;
use crate::types::{ResultType, SearchResult};

/// A stateless predicate over results.
pub trait ResultFilter: Send + Sync {
    /// Whether `result` survives this filter.
    fn keep(&self, result: &SearchResult) -> bool;

    /// Retain the results this filter keeps, preserving their order.
    fn apply(&self, mut results: Vec<SearchResult>) -> Vec<SearchResult> {
        results.retain(|r| self.keep(r));
        results
    }
}

/// Whether a [`DomainFilter`] keeps or drops matching domains.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DomainMode {
    Include,
    Exclude,
}

/// Keep (or drop) results whose domain contains a pattern.
#[derive(Debug, Clone)]
pub struct DomainFilter {
    pattern: String,
    mode: DomainMode,
}

impl DomainFilter {
    pub fn include(pattern: impl Into<String>) -> Self {
        Self {
            pattern: pattern.into().to_lowercase(),
            mode: DomainMode::Include,
        }
    }

    pub fn exclude(pattern: impl Into<String>) -> Self {
        Self {
            pattern: pattern.into().to_lowercase(),
            mode: DomainMode::Exclude,
        }
    }
}

impl ResultFilter for DomainFilter {
    fn keep(&self, result: &SearchResult) -> bool {
        let matched = result
            .metadata
            .domain
            .to_lowercase()
            .contains(&self.pattern);
        match self.mode {
            DomainMode::Include => matched,
            DomainMode::Exclude => !matched,
        }
    }
}

/// Keep results with an extracted keyword containing `term`, ignoring case.
#[derive(Debug, Clone)]
pub struct KeywordFilter {
    term: String,
}

impl KeywordFilter {
    pub fn new(term: impl Into<String>) -> Self {
        Self {
            term: term.into().to_lowercase(),
        }
    }
}

impl ResultFilter for KeywordFilter {
    fn keep(&self, result: &SearchResult) -> bool {
        result
            .keywords
            .iter()
            .any(|k| k.to_lowercase().contains(&self.term))
    }
}

/// Keep results of exactly one [`ResultType`].
#[derive(Debug, Clone, Copy)]
pub struct ResultTypeFilter {
    result_type: ResultType,
}

impl ResultTypeFilter {
    pub fn new(result_type: ResultType) -> Self {
        Self { result_type }
    }
}

impl ResultFilter for ResultTypeFilter {
    fn keep(&self, result: &SearchResult) -> bool {
        result.metadata.result_type == self.result_type
    }
}

/// Keep results whose description word count lies in `[min, max]`.
/// A bound `<= 0` leaves that side open.
#[derive(Debug, Clone, Copy)]
pub struct WordCountFilter {
    min: i64,
    max: i64,
}

impl WordCountFilter {
    pub fn new(min: i64, max: i64) -> Self {
        Self { min, max }
    }
}

impl ResultFilter for WordCountFilter {
    fn keep(&self, result: &SearchResult) -> bool {
        let words = i64::try_from(word_count(&result.description)).unwrap_or(i64::MAX);
        (self.min <= 0 || words >= self.min) && (self.max <= 0 || words <= self.max)
    }
}

/// The fixed-order filter chain applied to merged results.
///
/// ```
/// use serpent_search::filter::FilterPipeline;
/// use serpent_search::types::ResultType;
///
/// let pipeline = FilterPipeline::new()
///     .result_type(ResultType::Organic)
///     .exclude_domain("pinterest");
/// assert!(!pipeline.is_empty());
/// ```
#[derive(Debug, Clone, Default)]
pub struct FilterPipeline {
    domain: Option<DomainFilter>,
    keyword: Option<KeywordFilter>,
    result_type: Option<ResultTypeFilter>,
    word_count: Option<WordCountFilter>,
}

impl FilterPipeline {
    /// An empty pipeline that passes everything through.
    pub fn new() -> Self {
        Self::default()
    }

    pub fn include_domain(mut self, pattern: impl Into<String>) -> Self {
        self.domain = Some(DomainFilter::include(pattern));
        self
    }

    pub fn exclude_domain(mut self, pattern: impl Into<String>) -> Self {
        self.domain = Some(DomainFilter::exclude(pattern));
        self
    }

    pub fn keyword(mut self, term: impl Into<String>) -> Self {
        self.keyword = Some(KeywordFilter::new(term));
        self
    }

    pub fn result_type(mut self, result_type: ResultType) -> Self {
        self.result_type = Some(ResultTypeFilter::new(result_type));
        self
    }

    pub fn word_count(mut self, min: i64, max: i64) -> Self {
        self.word_count = Some(WordCountFilter::new(min, max));
        self
    }

    /// Whether no filter is configured.
    pub fn is_empty(&self) -> bool {
        self.domain.is_none()
            && self.keyword.is_none()
            && self.result_type.is_none()
            && self.word_count.is_none()
    }

    /// Run the configured filters in order.
    pub fn apply(&self, results: Vec<SearchResult>) -> Vec<SearchResult> {
        if self.is_empty() {
            return results;
        }
        let before = results.len();
        let stages: [Option<&dyn ResultFilter>; 4] = [
            self.domain.as_ref().map(|f| f as &dyn ResultFilter),
            self.keyword.as_ref().map(|f| f as &dyn ResultFilter),
            self.result_type.as_ref().map(|f| f as &dyn ResultFilter),
            self.word_count.as_ref().map(|f| f as &dyn ResultFilter),
        ];
        let filtered = stages
            .into_iter()
            .flatten()
            .fold(results, |acc, filter| filter.apply(acc));
        tracing::debug!(before, after = filtered.len(), "applied result filters");
        filtered
    }
}
