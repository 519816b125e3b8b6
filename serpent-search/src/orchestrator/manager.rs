//! Provider registry and concurrent fan-out.
//!
//! [`SearchManager`] owns the registered providers and the attempt
//! counters. A single-provider search runs inline; an all-providers search
//! spawns one task per provider against a shared deadline, keeps whatever
//! finished before it, and fails only when every provider failed.

use futures::stream::{FuturesUnordered, StreamExt};
use std::collections::{BTreeMap, BTreeSet, HashMap};
use std::sync::{Arc, RwLock};
use tokio::time::Instant;
use tokio_util::sync::CancellationToken;

use crate::engine::SearchProvider;
use crate::error::SearchError;
use crate::filter::FilterPipeline;
use crate::request::{ProviderTarget, SearchRequest};
use crate::types::{ProviderInfo, SearchResult};

use super::dedup;
use super::metrics::{Metrics, MetricsSnapshot};

/// Registry of providers plus the metrics of every attempt made through it.
///
/// Registration and lookup are allowed while searches are in flight; a
/// fan-out works on the providers registered when it started.
#[derive(Default)]
pub struct SearchManager {
    providers: RwLock<HashMap<String, Arc<dyn SearchProvider>>>,
    metrics: Metrics,
}

impl std::fmt::Debug for SearchManager {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("SearchManager")
            .field("providers", &self.provider_names())
            .field("metrics", &self.metrics.snapshot())
            .finish()
    }
}

impl SearchManager {
    /// An empty manager.
    pub fn new() -> Self {
        Self::default()
    }

    /// Register `provider` under its name, case-insensitively. Returns the
    /// provider it replaced, if any.
    pub fn register(&self, provider: Arc<dyn SearchProvider>) -> Option<Arc<dyn SearchProvider>> {
        let key = provider.name().to_lowercase();
        tracing::info!(provider = provider.name(), "registered search provider");
        self.providers
            .write()
            .unwrap_or_else(|e| e.into_inner())
            .insert(key, provider)
    }

    /// Look up a provider by name, ignoring case.
    pub fn get(&self, name: &str) -> Option<Arc<dyn SearchProvider>> {
        self.providers
            .read()
            .unwrap_or_else(|e| e.into_inner())
            .get(&name.to_lowercase())
            .cloned()
    }

    /// Display names of the registered providers, sorted.
    pub fn provider_names(&self) -> Vec<String> {
        let mut names: Vec<String> = self
            .providers
            .read()
            .unwrap_or_else(|e| e.into_inner())
            .values()
            .map(|p| p.name().to_string())
            .collect();
        names.sort();
        names
    }

    /// Capability descriptors of the registered providers, sorted by name.
    pub fn capabilities(&self) -> Vec<ProviderInfo> {
        let mut infos: Vec<ProviderInfo> = self.snapshot().iter().map(|p| p.info()).collect();
        infos.sort_by(|a, b| a.name.cmp(&b.name));
        infos
    }

    pub fn len(&self) -> usize {
        self.providers.read().unwrap_or_else(|e| e.into_inner()).len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Counters for every attempt made through this manager.
    pub fn metrics(&self) -> MetricsSnapshot {
        self.metrics.snapshot()
    }

    fn snapshot(&self) -> Vec<Arc<dyn SearchProvider>> {
        self.providers
            .read()
            .unwrap_or_else(|e| e.into_inner())
            .values()
            .cloned()
            .collect()
    }

    /// Dispatch `request` by its target, merge, and run `filters` over the
    /// merged results.
    ///
    /// # Errors
    ///
    /// As [`Self::search_one`] or [`Self::search_all`].
    pub async fn search(
        &self,
        request: &SearchRequest,
        filters: &FilterPipeline,
    ) -> Result<Vec<SearchResult>, SearchError> {
        let results = match &request.target {
            ProviderTarget::All => Self::deduplicate(self.search_all(request).await?),
            ProviderTarget::Named(name) => self.search_one(name, request).await?,
        };
        Ok(filters.apply(results))
    }

    /// Search one provider inline.
    ///
    /// # Errors
    ///
    /// Returns [`SearchError::InvalidConfiguration`] for an invalid request or
    /// an unknown provider, before any I/O. Otherwise the provider's own error.
    pub async fn search_one(
        &self,
        name: &str,
        request: &SearchRequest,
    ) -> Result<Vec<SearchResult>, SearchError> {
        request.validate()?;
        let provider = self.get(name).ok_or_else(|| {
            SearchError::InvalidConfiguration(format!("unknown provider '{name}'"))
        })?;

        let outcome = provider.search(request).await;
        self.metrics.record(outcome.is_ok());
        match &outcome {
            Ok(results) => {
                tracing::debug!(provider = provider.name(), count = results.len(), "provider returned results");
            }
            Err(err) => {
                tracing::warn!(provider = provider.name(), error = %err, "provider search failed");
            }
        }
        outcome
    }

    /// Search every registered provider concurrently.
    ///
    /// All tasks share one deadline, `request.timeout` from now. Providers
    /// still running when it expires are cancelled and counted as timed out;
    /// results from providers that already finished are kept. A panicking
    /// provider counts as a failure.
    ///
    /// # Errors
    ///
    /// Returns [`SearchError::InvalidConfiguration`] for an invalid request or
    /// an empty registry, and [`SearchError::AllProvidersFailed`] naming each
    /// provider and its failure when none succeeded.
    pub async fn search_all(
        &self,
        request: &SearchRequest,
    ) -> Result<BTreeMap<String, Vec<SearchResult>>, SearchError> {
        request.validate()?;
        let providers = self.snapshot();
        if providers.is_empty() {
            return Err(SearchError::InvalidConfiguration(
                "no providers registered".into(),
            ));
        }

        let deadline = Instant::now() + request.timeout;
        let cancel = CancellationToken::new();
        // Stop every task if this future is dropped before they finish.
        let _cancel_on_drop = cancel.clone().drop_guard();
        let shared = Arc::new(request.clone());

        let mut outstanding = BTreeSet::new();
        let mut pending = FuturesUnordered::new();
        for provider in providers {
            let name = provider.name().to_string();
            outstanding.insert(name.clone());

            let token = cancel.child_token();
            let request = Arc::clone(&shared);
            let timeout = request.timeout;
            let handle = tokio::spawn(async move {
                tokio::select! {
                    _ = token.cancelled() => Err(SearchError::Timeout(format!("cancelled after {timeout:?}"))),
                    outcome = provider.search(&request) => outcome,
                }
            });
            pending.push(async move { (name, handle.await) });
        }

        let mut succeeded = BTreeMap::new();
        let mut failed: Vec<(String, String)> = Vec::new();

        loop {
            match tokio::time::timeout_at(deadline, pending.next()).await {
                Ok(Some((name, joined))) => {
                    outstanding.remove(&name);
                    let outcome = joined.unwrap_or_else(|e| {
                        Err(SearchError::Transport(format!("provider task failed: {e}")))
                    });
                    self.metrics.record(outcome.is_ok());
                    match outcome {
                        Ok(results) => {
                            tracing::debug!(provider = %name, count = results.len(), "provider returned results");
                            succeeded.insert(name, results);
                        }
                        Err(err) => {
                            tracing::warn!(provider = %name, error = %err, "provider search failed");
                            failed.push((name, err.to_string()));
                        }
                    }
                }
                Ok(None) => break,
                Err(_) => {
                    cancel.cancel();
                    let err = SearchError::Timeout(format!(
                        "no response within {:?}",
                        request.timeout
                    ));
                    for name in std::mem::take(&mut outstanding) {
                        self.metrics.record(false);
                        tracing::warn!(provider = %name, error = %err, "provider search failed");
                        failed.push((name, err.to_string()));
                    }
                    break;
                }
            }
        }

        if succeeded.is_empty() {
            failed.sort();
            let detail = failed
                .iter()
                .map(|(name, err)| format!("{name}: {err}"))
                .collect::<Vec<_>>()
                .join("; ");
            return Err(SearchError::AllProvidersFailed(detail));
        }

        tracing::debug!(
            succeeded = succeeded.len(),
            failed = failed.len(),
            "fan-out complete"
        );
        Ok(succeeded)
    }

    /// Flatten per-provider results in provider-name order and drop
    /// duplicates by normalised URL, keeping first occurrences.
    pub fn deduplicate(results: BTreeMap<String, Vec<SearchResult>>) -> Vec<SearchResult> {
        dedup::deduplicate(results.into_values().flatten().collect())
    }
}
