//! Core types for search results and provider identification.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::collections::BTreeSet;
use std::fmt;
use std::str::FromStr;

use crate::error::SearchError;

/// A single structured result extracted from a provider's result page.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SearchResult {
    /// The title of the result.
    pub title: String,
    /// Canonical destination URL (redirect wrappers already removed). Never empty.
    pub url: String,
    /// The snippet shown under the result.
    pub description: String,
    /// Whether the result was classified as sponsored.
    pub is_ad: bool,
    /// 1-based position within the originating provider's accepted output.
    pub rank: usize,
    /// Query terms found in the description.
    pub keywords: BTreeSet<String>,
    /// Provenance and classification details.
    pub metadata: ResultMetadata,
}

/// Provenance and classification details attached to every result.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ResultMetadata {
    /// Host of the result URL.
    pub domain: String,
    /// When the result page was fetched.
    pub fetched_at: DateTime<Utc>,
    /// How the result was located on the page.
    pub result_type: ResultType,
    /// Special search feature the result belongs to, if any.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub search_feature: Option<SearchFeature>,
    /// Name of the provider that returned the result.
    pub provider: String,
    /// Sub-page links shown beneath the result (Bing deeplink clusters).
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub deeplinks: Vec<String>,
}

/// Classification of a result by how it was found.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ResultType {
    /// A regular ranked result.
    Organic,
    /// A result carrying a special search feature (knowledge panel, snippet…).
    Special,
    /// Recovered by the generic hyperlink pass after container extraction failed.
    Fallback,
    /// A regular result with a cluster of sub-page links.
    WithDeeplinks,
}

impl ResultType {
    /// Stable wire name of this result type.
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Organic => "organic",
            Self::Special => "special",
            Self::Fallback => "fallback",
            Self::WithDeeplinks => "with_deeplinks",
        }
    }
}

impl fmt::Display for ResultType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for ResultType {
    type Err = SearchError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "organic" => Ok(Self::Organic),
            "special" => Ok(Self::Special),
            "fallback" => Ok(Self::Fallback),
            "with_deeplinks" => Ok(Self::WithDeeplinks),
            other => Err(SearchError::InvalidConfiguration(format!(
                "unknown result type '{other}'"
            ))),
        }
    }
}

/// Special search-page features a result can belong to.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SearchFeature {
    KnowledgePanel,
    FeaturedSnippet,
    Video,
    Review,
    InstantAnswer,
}

impl SearchFeature {
    /// Stable wire name of this feature.
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::KnowledgePanel => "knowledge_panel",
            Self::FeaturedSnippet => "featured_snippet",
            Self::Video => "video",
            Self::Review => "review",
            Self::InstantAnswer => "instant_answer",
        }
    }
}

impl fmt::Display for SearchFeature {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Search providers with a built-in extraction engine.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum ProviderKind {
    /// Google: richest result page, most aggressive bot detection.
    Google,
    /// Bing: independent index with deeplink clusters.
    Bing,
    /// DuckDuckGo: HTML-only endpoint, tolerant of automated requests.
    DuckDuckGo,
}

impl ProviderKind {
    /// Returns the human-readable name of this provider.
    pub fn name(&self) -> &'static str {
        match self {
            Self::Google => "Google",
            Self::Bing => "Bing",
            Self::DuckDuckGo => "DuckDuckGo",
        }
    }

    /// Capabilities declared by this provider's engine.
    pub fn capabilities(&self) -> Vec<String> {
        let extra: &[&str] = match self {
            Self::Google => &["knowledge_graph", "featured_snippets", "videos"],
            Self::Bing => &["deeplinks", "entity_info"],
            Self::DuckDuckGo => &["privacy_focused", "instant_answers"],
        };
        ["basic", "text"]
            .iter()
            .chain(extra)
            .map(|c| (*c).to_string())
            .collect()
    }

    /// Origin used to resolve relative links on the provider's pages.
    pub fn base_url(&self) -> &'static str {
        match self {
            Self::Google => "https://www.google.com",
            Self::Bing => "https://www.bing.com",
            Self::DuckDuckGo => "https://html.duckduckgo.com",
        }
    }

    /// Returns all built-in providers.
    pub fn all() -> &'static [ProviderKind] {
        &[Self::Google, Self::Bing, Self::DuckDuckGo]
    }
}

impl fmt::Display for ProviderKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

impl FromStr for ProviderKind {
    type Err = SearchError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "google" => Ok(Self::Google),
            "bing" => Ok(Self::Bing),
            "duckduckgo" | "ddg" => Ok(Self::DuckDuckGo),
            _ => Err(SearchError::InvalidConfiguration(format!(
                "unknown provider '{s}'"
            ))),
        }
    }
}

/// Capability descriptor reported by a registered provider.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ProviderInfo {
    /// Display name; lookups compare it case-insensitively.
    pub name: String,
    /// Declared capability set.
    pub capabilities: Vec<String>,
    /// Current requests-per-minute limit (≤ 0 means unthrottled).
    pub rate_limit: i32,
}

#[cfg(test)]
mod tests {
    use super::*;

    fn sample_result() -> SearchResult {
        SearchResult {
            title: "Example".into(),
            url: "https://example.com".into(),
            description: "An example page".into(),
            is_ad: false,
            rank: 1,
            keywords: BTreeSet::from(["example".to_string()]),
            metadata: ResultMetadata {
                domain: "example.com".into(),
                fetched_at: Utc::now(),
                result_type: ResultType::Organic,
                search_feature: None,
                provider: "Google".into(),
                deeplinks: Vec::new(),
            },
        }
    }

    #[test]
    fn result_type_wire_names() {
        assert_eq!(ResultType::Organic.to_string(), "organic");
        assert_eq!(ResultType::WithDeeplinks.to_string(), "with_deeplinks");
        let json = serde_json::to_string(&ResultType::Fallback).expect("serialize");
        assert_eq!(json, "\"fallback\"");
    }

    #[test]
    fn result_type_parses_wire_names() {
        for ty in [
            ResultType::Organic,
            ResultType::Special,
            ResultType::Fallback,
            ResultType::WithDeeplinks,
        ] {
            assert_eq!(ty.as_str().parse::<ResultType>().ok(), Some(ty));
        }
        assert!("sponsored".parse::<ResultType>().is_err());
    }

    #[test]
    fn serialization_omits_empty_optional_metadata() {
        let json = serde_json::to_value(sample_result()).expect("serialize");
        let metadata = &json["metadata"];
        assert!(metadata.get("search_feature").is_none());
        assert!(metadata.get("deeplinks").is_none());
        assert_eq!(metadata["result_type"], "organic");
    }

    #[test]
    fn provider_names() {
        assert_eq!(ProviderKind::Google.to_string(), "Google");
        assert_eq!(ProviderKind::Bing.to_string(), "Bing");
        assert_eq!(ProviderKind::DuckDuckGo.to_string(), "DuckDuckGo");
    }

    #[test]
    fn provider_parse_is_case_insensitive() {
        assert_eq!("GOOGLE".parse::<ProviderKind>().ok(), Some(ProviderKind::Google));
        assert_eq!("bing".parse::<ProviderKind>().ok(), Some(ProviderKind::Bing));
        assert_eq!(
            "DuckDuckGo".parse::<ProviderKind>().ok(),
            Some(ProviderKind::DuckDuckGo)
        );
        let err = "yahoo".parse::<ProviderKind>().unwrap_err();
        assert!(err.to_string().contains("yahoo"));
    }

    #[test]
    fn provider_capabilities_extend_base_set() {
        let google = ProviderKind::Google.capabilities();
        assert!(google.contains(&"basic".to_string()));
        assert!(google.contains(&"knowledge_graph".to_string()));
        assert!(ProviderKind::Bing
            .capabilities()
            .contains(&"deeplinks".to_string()));
        assert!(ProviderKind::DuckDuckGo
            .capabilities()
            .contains(&"privacy_focused".to_string()));
    }

    #[test]
    fn provider_all() {
        assert_eq!(ProviderKind::all().len(), 3);
    }
}
