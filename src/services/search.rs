use futures::future::join_all;
use std::sync::Arc;
use std::time::Duration;
use thiserror::Error;

use crate::core::Ranker;
use crate::models::{Place, PlaceSource, SearchQuery};
use crate::services::adapters::{fetch_with_timeout, SourceAdapter, SourceRequest};
use crate::services::cache::{CacheKey, ResultCache};

/// Default deadline for each source call
pub const DEFAULT_SOURCE_TIMEOUT: Duration = Duration::from_secs(10);

/// Faults that abort a whole search
#[derive(Debug, Error)]
pub enum SearchError {
    #[error("Invalid search query: {0}")]
    InvalidQuery(String),
}

/// How one source contributed to a search
#[derive(Debug, Clone)]
pub struct SourceReport {
    pub source: PlaceSource,
    pub places: usize,
    pub error: Option<String>,
}

/// Ranked places plus how they were obtained
#[derive(Debug, Clone, Default)]
pub struct SearchOutcome {
    pub places: Vec<Arc<Place>>,
    /// True when a source failed or the search itself failed
    pub fallback: bool,
    pub from_cache: bool,
    pub sources: Vec<SourceReport>,
}

/// Aggregates places from every source into one ranked, budgeted list
///
/// # Pipeline Stages
/// 1. Cache lookup by query fingerprint
/// 2. Concurrent fan-out to all adapters, each under a deadline
/// 3. Deduplicate, score and sort, truncate to the time budget
/// 4. Cache store
pub struct PlaceSearchService {
    adapters: Vec<Arc<dyn SourceAdapter>>,
    cache: Arc<ResultCache>,
    ranker: Ranker,
    source_timeout: Duration,
}

impl PlaceSearchService {
    pub fn new(
        adapters: Vec<Arc<dyn SourceAdapter>>,
        cache: Arc<ResultCache>,
        ranker: Ranker,
        source_timeout: Duration,
    ) -> Self {
        Self {
            adapters,
            cache,
            ranker,
            source_timeout,
        }
    }

    pub fn cache(&self) -> &ResultCache {
        &self.cache
    }

    /// Ranked places for a query, empty when the search fails
    pub async fn search(&self, query: &SearchQuery) -> Vec<Arc<Place>> {
        self.search_with_report(query).await.places
    }

    /// Like [`search`](Self::search), also reporting degraded sources
    pub async fn search_with_report(&self, query: &SearchQuery) -> SearchOutcome {
        match self.try_search(query).await {
            Ok(outcome) => outcome,
            Err(e) => {
                tracing::warn!("Place search failed, returning no results: {}", e);
                SearchOutcome {
                    fallback: true,
                    ..Default::default()
                }
            }
        }
    }

    async fn try_search(&self, query: &SearchQuery) -> Result<SearchOutcome, SearchError> {
        if !query.center.is_valid() {
            return Err(SearchError::InvalidQuery(format!(
                "center ({}, {}) is out of range",
                query.center.latitude, query.center.longitude
            )));
        }
        if query.radius_m == 0 {
            return Err(SearchError::InvalidQuery("radius must be positive".to_string()));
        }

        let cache_key = CacheKey::search(query);
        if let Some(entry) = self.cache.get(&cache_key).await {
            return Ok(SearchOutcome {
                places: entry.results,
                fallback: entry.degraded,
                from_cache: true,
                sources: Vec::new(),
            });
        }

        let requests: Vec<SourceRequest> = self
            .adapters
            .iter()
            .map(|adapter| SourceRequest {
                center: query.center,
                radius_m: query.radius_m,
                types: adapter.translate_interests(&query.interests),
            })
            .collect();

        let outcomes = join_all(
            self.adapters
                .iter()
                .zip(&requests)
                .map(|(adapter, request)| fetch_with_timeout(adapter.as_ref(), request, self.source_timeout)),
        )
        .await;

        let mut fallback = false;
        let mut sources = Vec::with_capacity(outcomes.len());
        let mut candidates = Vec::new();

        for outcome in outcomes {
            fallback |= outcome.is_degraded();
            let source = outcome.source;
            let error = outcome.result.as_ref().err().map(|e| e.to_string());
            let places = outcome.into_places();
            sources.push(SourceReport {
                source,
                places: places.len(),
                error,
            });
            candidates.extend(places);
        }

        let result = self
            .ranker
            .rank(candidates, &query.interests, query.time_budget_hours);

        tracing::debug!(
            "Ranked {} unique of {} candidates, kept {}",
            result.unique_candidates,
            result.total_candidates,
            result.places.len()
        );

        let places: Vec<Arc<Place>> = result.places.into_iter().map(Arc::new).collect();
        self.cache.set(&cache_key, places.clone(), fallback).await;

        Ok(SearchOutcome {
            places,
            fallback,
            from_cache: false,
            sources,
        })
    }
}
