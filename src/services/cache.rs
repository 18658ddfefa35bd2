use chrono::{DateTime, Utc};
use mockable::Clock;
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use std::time::Duration;

use crate::models::{Place, SearchQuery};

/// Default lifetime of a cached search
pub const DEFAULT_TTL: Duration = Duration::from_secs(24 * 60 * 60);

/// A cached search result and when it was stored
#[derive(Debug, Clone)]
pub struct CacheEntry {
    pub results: Vec<Arc<Place>>,
    /// A source failed while this result set was built
    pub degraded: bool,
    pub timestamp: DateTime<Utc>,
}

/// In-memory memoization of full searches
///
/// Validity is judged against the injected clock: an entry is served only
/// while `now - timestamp < ttl`. The backing moka cache bounds memory and
/// evicts by wall time as a backstop.
pub struct ResultCache {
    entries: moka::future::Cache<String, CacheEntry>,
    ttl: Duration,
    clock: Arc<dyn Clock>,
}

impl ResultCache {
    pub fn new(capacity: u64, ttl: Duration, clock: Arc<dyn Clock>) -> Self {
        let entries = moka::future::CacheBuilder::new(capacity)
            .time_to_live(ttl)
            .build();

        Self { entries, ttl, clock }
    }

    pub fn ttl(&self) -> Duration {
        self.ttl
    }

    /// Get a non-expired entry
    pub async fn get(&self, key: &str) -> Option<CacheEntry> {
        let entry = self.entries.get(key).await?;

        if self.is_fresh(&entry) {
            tracing::trace!("Cache hit: {}", key);
            Some(entry)
        } else {
            tracing::trace!("Cache entry expired: {}", key);
            self.entries.invalidate(key).await;
            None
        }
    }

    /// Store a result set stamped with the current time
    pub async fn set(&self, key: &str, results: Vec<Arc<Place>>, degraded: bool) {
        let entry = CacheEntry {
            results,
            degraded,
            timestamp: self.clock.utc(),
        };
        self.entries.insert(key.to_string(), entry).await;
        tracing::trace!("Cache set: {}", key);
    }

    pub fn invalidate_all(&self) {
        self.entries.invalidate_all();
    }

    /// Get cache statistics
    pub fn stats(&self) -> CacheStats {
        CacheStats {
            entries: self.entries.entry_count(),
            ttl_secs: self.ttl.as_secs(),
        }
    }

    fn is_fresh(&self, entry: &CacheEntry) -> bool {
        match (self.clock.utc() - entry.timestamp).to_std() {
            Ok(age) => age < self.ttl,
            // Stored "in the future" relative to the clock: still fresh
            Err(_) => true,
        }
    }
}

/// Cache statistics
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CacheStats {
    pub entries: u64,
    pub ttl_secs: u64,
}

/// Cache key builder
pub struct CacheKey;

impl CacheKey {
    /// Fingerprint of a search's input parameters
    ///
    /// Coordinates are fixed to 6 decimals (~0.1 m); interests come from an
    /// ordered set so their request order does not matter.
    pub fn search(query: &SearchQuery) -> String {
        let interests = query
            .interests
            .iter()
            .map(|c| c.as_str())
            .collect::<Vec<_>>()
            .join(",");

        format!(
            "places:{:.6}:{:.6}:{}:{}:{}",
            query.center.latitude, query.center.longitude, query.radius_m, interests, query.time_budget_hours
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::{Category, Coordinates};
    use chrono::{Local, TimeDelta, TimeZone};
    use std::collections::BTreeSet;
    use std::sync::Mutex;

    struct MutableClock(Mutex<DateTime<Utc>>);

    impl MutableClock {
        fn advance(&self, delta: TimeDelta) {
            *self.0.lock().unwrap() += delta;
        }
    }

    impl Clock for MutableClock {
        fn local(&self) -> DateTime<Local> {
            self.utc().with_timezone(&Local)
        }

        fn utc(&self) -> DateTime<Utc> {
            *self.0.lock().unwrap()
        }
    }

    fn query(interests: &[Category], time: u32) -> SearchQuery {
        SearchQuery {
            center: Coordinates::new(4.4399, -75.2050),
            radius_m: 2000,
            interests: interests.iter().copied().collect::<BTreeSet<_>>(),
            time_budget_hours: time,
        }
    }

    #[test]
    fn test_cache_key_builder() {
        assert_eq!(
            CacheKey::search(&query(&[Category::Nature, Category::Gastro], 2)),
            "places:4.439900:-75.205000:2000:gastro,nature:2"
        );
        assert_eq!(
            CacheKey::search(&query(&[Category::Gastro, Category::Nature], 2)),
            CacheKey::search(&query(&[Category::Nature, Category::Gastro], 2))
        );
        assert_ne!(
            CacheKey::search(&query(&[Category::Gastro], 2)),
            CacheKey::search(&query(&[Category::Gastro], 4))
        );
    }

    #[tokio::test]
    async fn test_entries_expire_by_clock() {
        let clock = Arc::new(MutableClock(Mutex::new(Utc.with_ymd_and_hms(2026, 1, 1, 8, 0, 0).unwrap())));
        let cache = ResultCache::new(100, DEFAULT_TTL, clock.clone());

        cache.set("k", Vec::new(), true).await;
        assert!(cache.get("k").await.is_some_and(|entry| entry.degraded));

        clock.advance(TimeDelta::hours(23));
        assert!(cache.get("k").await.is_some());

        clock.advance(TimeDelta::hours(1));
        assert!(cache.get("k").await.is_none());
        assert!(cache.get("k").await.is_none());
    }

    #[tokio::test]
    async fn test_missing_key() {
        let clock = Arc::new(MutableClock(Mutex::new(Utc::now())));
        let cache = ResultCache::new(10, Duration::from_secs(60), clock);
        assert!(cache.get("absent").await.is_none());
        assert_eq!(cache.stats().ttl_secs, 60);
    }
}
