use async_trait::async_trait;
use mockable::Clock;
use std::collections::HashSet;
use std::sync::Arc;
use thiserror::Error;
use uuid::Uuid;

use crate::core::distance::distance_between;
use crate::models::{
    Coordinates, NewRoute, PersistedRoute, Place, PlaceSource, RouteEntry, RouteStats, RouteStop,
    UNNAMED_PLACE, DEFAULT_RATING,
};

/// Walking pace in minutes per kilometer (5 km/h)
pub const WALKING_MINUTES_PER_KM: f64 = 12.0;

/// Time spent at each stop, in minutes
pub const DWELL_MINUTES_PER_PLACE: f64 = 30.0;

/// Minimum number of stops a route needs before it can be saved
pub const MIN_SAVED_PLACES: usize = 2;

/// Errors returned by the route store
#[derive(Debug, Error)]
pub enum RouteStoreError {
    #[error("Route store unreachable: {0}")]
    Transport(String),

    #[error("Route store returned error: {0}")]
    ApiError(String),

    #[error("Not found: {0}")]
    NotFound(String),

    #[error("Invalid response format: {0}")]
    InvalidResponse(String),
}

/// Errors surfaced by route session operations
#[derive(Debug, Error)]
pub enum RouteError {
    #[error("Validation failed: {0}")]
    Validation(String),

    #[error("Index {index} out of range for route of {len} places")]
    IndexOutOfRange { index: usize, len: usize },

    #[error(transparent)]
    Store(#[from] RouteStoreError),
}

/// External persistence for saved routes
#[async_trait]
pub trait RouteStore: Send + Sync {
    /// Persist a new route and return the stored representation
    async fn create_route(&self, route: &NewRoute) -> Result<PersistedRoute, RouteStoreError>;

    /// List every route saved by a user
    async fn list_routes(&self, user_id: &str) -> Result<Vec<PersistedRoute>, RouteStoreError>;

    /// Fetch one saved route
    async fn get_route(&self, route_id: &str) -> Result<PersistedRoute, RouteStoreError>;
}

/// Lifecycle of a planning session
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum RouteStatus {
    Empty,
    Building,
    Saved { route_id: String },
}

/// Compute distance and time totals for an ordered list of stops
pub fn compute_route_stats(entries: &[RouteEntry]) -> RouteStats {
    let total_distance: f64 = entries
        .windows(2)
        .map(|pair| distance_between(&pair[0].place.coordinates, &pair[1].place.coordinates))
        .sum();

    let places_count = entries.len();
    let estimated_time = (total_distance / 1000.0) * WALKING_MINUTES_PER_KM
        + places_count as f64 * DWELL_MINUTES_PER_PLACE;

    RouteStats {
        total_distance,
        estimated_time,
        places_count,
    }
}

impl RouteStats {
    /// Human-readable distance, e.g. "850m" or "1.2km"
    pub fn format_distance(&self) -> String {
        if self.total_distance < 1000.0 {
            format!("{}m", self.total_distance.round())
        } else {
            format!("{:.1}km", self.total_distance / 1000.0)
        }
    }

    /// Human-readable duration, e.g. "45m" or "2h 5m"
    pub fn format_time(&self) -> String {
        let total = self.estimated_time.max(0.0).round() as u64;
        let (hours, minutes) = (total / 60, total % 60);
        if hours > 0 {
            format!("{}h {}m", hours, minutes)
        } else {
            format!("{}m", minutes)
        }
    }
}

/// An itinerary being assembled during one planning session
///
/// Mutations are synchronous and take `&mut self`; one builder belongs to
/// one session. Stats are recomputed in full after every change.
pub struct RouteBuilder {
    session_id: Uuid,
    entries: Vec<RouteEntry>,
    stats: RouteStats,
    status: RouteStatus,
    store: Arc<dyn RouteStore>,
    clock: Arc<dyn Clock>,
}

impl RouteBuilder {
    pub fn new(store: Arc<dyn RouteStore>, clock: Arc<dyn Clock>) -> Self {
        Self {
            session_id: Uuid::new_v4(),
            entries: Vec::new(),
            stats: RouteStats::default(),
            status: RouteStatus::Empty,
            store,
            clock,
        }
    }

    pub fn session_id(&self) -> Uuid {
        self.session_id
    }

    pub fn entries(&self) -> &[RouteEntry] {
        &self.entries
    }

    pub fn stats(&self) -> RouteStats {
        self.stats
    }

    pub fn status(&self) -> &RouteStatus {
        &self.status
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn contains(&self, place_id: &str) -> bool {
        self.entries.iter().any(|entry| entry.place.id == place_id)
    }

    /// 1-based position of a place in the route
    pub fn position_of(&self, place_id: &str) -> Option<usize> {
        self.entries
            .iter()
            .find(|entry| entry.place.id == place_id)
            .map(|entry| entry.order)
    }

    /// Append a place unless it is already in the route
    ///
    /// Returns `true` when the place was added.
    pub fn add_place(&mut self, place: Arc<Place>) -> bool {
        if self.contains(&place.id) {
            return false;
        }

        let order = self.entries.len() + 1;
        self.entries.push(RouteEntry { place, order });
        self.after_mutation();
        true
    }

    /// Remove a place and close the gap in the ordering
    ///
    /// Returns `true` when a place was removed.
    pub fn remove_place(&mut self, place_id: &str) -> bool {
        let before = self.entries.len();
        self.entries.retain(|entry| entry.place.id != place_id);
        if self.entries.len() == before {
            return false;
        }

        self.after_mutation();
        true
    }

    /// Move the entry at `from_index` to `to_index` (both 0-based)
    pub fn reorder(&mut self, from_index: usize, to_index: usize) -> Result<(), RouteError> {
        let len = self.entries.len();
        for index in [from_index, to_index] {
            if index >= len {
                return Err(RouteError::IndexOutOfRange { index, len });
            }
        }

        let entry = self.entries.remove(from_index);
        self.entries.insert(to_index, entry);
        self.after_mutation();
        Ok(())
    }

    /// Discard every stop
    pub fn clear(&mut self) {
        self.entries.clear();
        self.after_mutation();
    }

    /// Rank candidates by proximity to the last stop
    ///
    /// With an empty route the first `max_suggestions` candidates are
    /// returned as given. Otherwise places already in the route are skipped
    /// and the rest are sorted by distance from the last stop.
    pub fn suggest_next(&self, candidates: &[Arc<Place>], max_suggestions: usize) -> Vec<Arc<Place>> {
        let Some(last) = self.entries.last() else {
            return candidates.iter().take(max_suggestions).cloned().collect();
        };

        let in_route: HashSet<&str> = self.entries.iter().map(|entry| entry.place.id.as_str()).collect();

        let mut with_distance: Vec<(f64, &Arc<Place>)> = candidates
            .iter()
            .filter(|place| !in_route.contains(place.id.as_str()))
            .map(|place| (distance_between(&last.place.coordinates, &place.coordinates), place))
            .collect();

        with_distance.sort_by(|a, b| a.0.total_cmp(&b.0));

        with_distance
            .into_iter()
            .take(max_suggestions)
            .map(|(_, place)| Arc::clone(place))
            .collect()
    }

    /// Persist the route under a name for an owner
    pub async fn save(&mut self, route_name: &str, owner_id: &str) -> Result<PersistedRoute, RouteError> {
        let name = route_name.trim();
        if name.is_empty() {
            return Err(RouteError::Validation("route name is required".to_string()));
        }
        if self.entries.len() < MIN_SAVED_PLACES {
            return Err(RouteError::Validation(format!(
                "at least {} places are required, route has {}",
                MIN_SAVED_PLACES,
                self.entries.len()
            )));
        }

        let payload = NewRoute {
            name: name.to_string(),
            user_id: owner_id.to_string(),
            places: self
                .entries
                .iter()
                .map(|entry| RouteStop {
                    place_id: entry.place.id.clone(),
                    order: entry.order,
                    lat: entry.place.coordinates.latitude,
                    lng: entry.place.coordinates.longitude,
                    name: None,
                })
                .collect(),
            total_distance: self.stats.total_distance,
            estimated_time: self.stats.estimated_time,
            created_at: self.clock.utc(),
        };

        let saved = self.store.create_route(&payload).await.map_err(|e| {
            tracing::error!(session = %self.session_id, "Failed to save route '{}': {}", name, e);
            e
        })?;

        tracing::info!(
            session = %self.session_id,
            "Saved route {} with {} places ({}, {})",
            saved.id,
            payload.places.len(),
            self.stats.format_distance(),
            self.stats.format_time()
        );

        self.status = RouteStatus::Saved {
            route_id: saved.id.clone(),
        };
        Ok(saved)
    }

    /// Replace the session's stops with a previously saved route
    pub async fn load(&mut self, route_id: &str) -> Result<PersistedRoute, RouteError> {
        let route = self.store.get_route(route_id).await?;

        let mut stops: Vec<&RouteStop> = route.places.iter().collect();
        stops.sort_by_key(|stop| stop.order);

        let mut seen: HashSet<&str> = HashSet::with_capacity(stops.len());
        self.entries = stops
            .into_iter()
            .filter_map(|stop| {
                if !seen.insert(stop.place_id.as_str()) {
                    tracing::warn!(route = %route.id, "Skipping repeated stop {}", stop.place_id);
                    return None;
                }
                match place_from_stop(stop) {
                    Some(place) => Some(RouteEntry { place: Arc::new(place), order: stop.order }),
                    None => {
                        tracing::warn!(route = %route.id, "Skipping stop {} with invalid coordinates", stop.place_id);
                        None
                    }
                }
            })
            .collect();
        self.after_mutation();

        tracing::debug!(session = %self.session_id, "Loaded route {} with {} places", route.id, self.entries.len());
        Ok(route)
    }

    /// Routes previously saved by a user
    pub async fn list_saved(&self, user_id: &str) -> Result<Vec<PersistedRoute>, RouteError> {
        Ok(self.store.list_routes(user_id).await?)
    }

    fn after_mutation(&mut self) {
        for (index, entry) in self.entries.iter_mut().enumerate() {
            entry.order = index + 1;
        }
        self.stats = compute_route_stats(&self.entries);
        self.status = if self.entries.is_empty() {
            RouteStatus::Empty
        } else {
            RouteStatus::Building
        };
    }
}

/// Rebuild a minimal place from a stored stop
fn place_from_stop(stop: &RouteStop) -> Option<Place> {
    let coordinates = Coordinates::checked(stop.lat, stop.lng)?;
    let source = if stop.place_id.starts_with("google_") {
        PlaceSource::Google
    } else {
        PlaceSource::Osm
    };

    Some(Place {
        id: stop.place_id.clone(),
        name: stop.name.clone().unwrap_or_else(|| UNNAMED_PLACE.to_string()),
        coordinates,
        tags: Default::default(),
        category: crate::models::Category::DEFAULT,
        rating: DEFAULT_RATING,
        verified: source.is_authoritative(),
        source,
        address: String::new(),
        distance_from_query: 0.0,
        relevance_score: 0.0,
        score: 0.0,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::Category;
    use chrono::{DateTime, Local, TimeZone, Utc};
    use std::sync::Mutex;

    struct FixedClock(DateTime<Utc>);

    impl Clock for FixedClock {
        fn local(&self) -> DateTime<Local> {
            self.0.with_timezone(&Local)
        }

        fn utc(&self) -> DateTime<Utc> {
            self.0
        }
    }

    #[derive(Default)]
    struct MemoryStore {
        created: Mutex<Vec<NewRoute>>,
        stored: Mutex<Vec<PersistedRoute>>,
        fail: bool,
    }

    #[async_trait]
    impl RouteStore for MemoryStore {
        async fn create_route(&self, route: &NewRoute) -> Result<PersistedRoute, RouteStoreError> {
            if self.fail {
                return Err(RouteStoreError::ApiError("503 Service Unavailable".to_string()));
            }
            self.created.lock().unwrap().push(route.clone());
            Ok(PersistedRoute {
                id: "r1".to_string(),
                name: route.name.clone(),
                user_id: Some(route.user_id.clone()),
                places: route.places.clone(),
                total_distance: route.total_distance,
                estimated_time: route.estimated_time,
                created_at: Some(route.created_at),
            })
        }

        async fn list_routes(&self, user_id: &str) -> Result<Vec<PersistedRoute>, RouteStoreError> {
            Ok(self
                .stored
                .lock()
                .unwrap()
                .iter()
                .filter(|r| r.user_id.as_deref() == Some(user_id))
                .cloned()
                .collect())
        }

        async fn get_route(&self, route_id: &str) -> Result<PersistedRoute, RouteStoreError> {
            self.stored
                .lock()
                .unwrap()
                .iter()
                .find(|r| r.id == route_id)
                .cloned()
                .ok_or_else(|| RouteStoreError::NotFound(route_id.to_string()))
        }
    }

    fn clock() -> Arc<dyn Clock> {
        Arc::new(FixedClock(Utc.with_ymd_and_hms(2026, 3, 1, 10, 0, 0).unwrap()))
    }

    fn builder_with(store: Arc<MemoryStore>) -> RouteBuilder {
        RouteBuilder::new(store, clock())
    }

    fn place(id: &str, lat: f64, lng: f64) -> Arc<Place> {
        Arc::new(Place {
            id: id.to_string(),
            name: format!("Place {}", id),
            coordinates: Coordinates::new(lat, lng),
            tags: Default::default(),
            category: Category::Services,
            rating: 4.0,
            verified: false,
            source: PlaceSource::Osm,
            address: String::new(),
            distance_from_query: 0.0,
            relevance_score: 0.0,
            score: 0.0,
        })
    }

    fn orders(builder: &RouteBuilder) -> Vec<usize> {
        builder.entries().iter().map(|e| e.order).collect()
    }

    fn ids(builder: &RouteBuilder) -> Vec<String> {
        builder.entries().iter().map(|e| e.place.id.clone()).collect()
    }

    #[test]
    fn test_add_is_idempotent() {
        let mut builder = builder_with(Arc::default());
        let p = place("osm_1", 4.4399, -75.2050);

        assert!(builder.add_place(Arc::clone(&p)));
        assert!(!builder.add_place(p));
        assert_eq!(builder.len(), 1);
        assert!(builder.contains("osm_1"));
        assert!(!builder.contains("osm_2"));
        assert_eq!(builder.status(), &RouteStatus::Building);
    }

    #[test]
    fn test_remove_middle_renumbers() {
        let mut builder = builder_with(Arc::default());
        builder.add_place(place("a", 4.4399, -75.2050));
        builder.add_place(place("b", 4.4420, -75.2050));
        builder.add_place(place("c", 4.4440, -75.2050));

        assert!(builder.remove_place("b"));
        assert_eq!(orders(&builder), vec![1, 2]);
        assert_eq!(ids(&builder), vec!["a", "c"]);
        assert!(!builder.remove_place("missing"));
    }

    #[test]
    fn test_reorder_moves_and_renumbers() {
        let mut builder = builder_with(Arc::default());
        for (i, id) in ["a", "b", "c", "d"].iter().enumerate() {
            builder.add_place(place(id, 4.44 + i as f64 * 0.001, -75.205));
        }

        builder.reorder(0, 2).unwrap();
        assert_eq!(ids(&builder), vec!["b", "c", "a", "d"]);
        assert_eq!(orders(&builder), vec![1, 2, 3, 4]);
        assert_eq!(builder.position_of("a"), Some(3));
        assert_eq!(builder.position_of("zzz"), None);
    }

    #[test]
    fn test_reorder_out_of_range_leaves_route() {
        let mut builder = builder_with(Arc::default());
        builder.add_place(place("a", 4.44, -75.205));
        builder.add_place(place("b", 4.45, -75.205));

        let err = builder.reorder(0, 5).unwrap_err();
        assert!(matches!(err, RouteError::IndexOutOfRange { index: 5, len: 2 }));
        assert_eq!(ids(&builder), vec!["a", "b"]);
    }

    #[test]
    fn test_stats_track_mutations() {
        let mut builder = builder_with(Arc::default());
        assert_eq!(builder.stats(), RouteStats::default());

        let a = place("a", 4.4399, -75.2050);
        let b = place("b", 4.4489, -75.2050);
        let c = place("c", 4.4489, -75.2140);
        builder.add_place(Arc::clone(&a));
        assert_eq!(builder.stats().total_distance, 0.0);
        assert_eq!(builder.stats().estimated_time, 30.0);
        assert_eq!(builder.stats().places_count, 1);
        assert_eq!(builder.stats().format_time(), "30m");

        builder.add_place(Arc::clone(&b));
        builder.add_place(Arc::clone(&c));

        let expected = distance_between(&a.coordinates, &b.coordinates) + distance_between(&b.coordinates, &c.coordinates);
        let stats = builder.stats();
        assert!((stats.total_distance - expected).abs() < 1e-6);
        assert!((stats.estimated_time - (expected / 1000.0 * 12.0 + 90.0)).abs() < 1e-6);
        assert_eq!(stats.places_count, 3);

        builder.clear();
        assert_eq!(builder.stats(), RouteStats::default());
        assert_eq!(builder.status(), &RouteStatus::Empty);
    }

    #[test]
    fn test_suggest_next_empty_route() {
        let builder = builder_with(Arc::default());
        let candidates = vec![place("x", 4.50, -75.2), place("y", 4.40, -75.2), place("z", 4.45, -75.2)];

        let ids: Vec<_> = builder.suggest_next(&candidates, 2).iter().map(|p| p.id.clone()).collect();
        assert_eq!(ids, vec!["x", "y"]);
    }

    #[test]
    fn test_suggest_next_by_proximity() {
        let mut builder = builder_with(Arc::default());
        builder.add_place(place("start", 4.4000, -75.2000));
        builder.add_place(place("last", 4.4400, -75.2000));

        let candidates = vec![
            place("start", 4.4000, -75.2000),
            place("far", 4.4800, -75.2000),
            place("near", 4.4410, -75.2000),
            place("mid", 4.4500, -75.2000),
        ];

        let ids: Vec<_> = builder.suggest_next(&candidates, 3).iter().map(|p| p.id.clone()).collect();
        assert_eq!(ids, vec!["near", "mid", "far"]);
    }

    #[test]
    fn test_format_helpers() {
        let short = RouteStats { total_distance: 849.6, estimated_time: 45.2, places_count: 1 };
        assert_eq!(short.format_distance(), "850m");
        assert_eq!(short.format_time(), "45m");

        let long = RouteStats { total_distance: 1234.0, estimated_time: 125.0, places_count: 4 };
        assert_eq!(long.format_distance(), "1.2km");
        assert_eq!(long.format_time(), "2h 5m");
    }

    #[tokio::test]
    async fn test_save_validation() {
        let store = Arc::new(MemoryStore::default());
        let mut builder = builder_with(Arc::clone(&store));
        builder.add_place(place("a", 4.44, -75.205));
        builder.add_place(place("b", 4.45, -75.205));

        assert!(matches!(builder.save("   ", "u1").await, Err(RouteError::Validation(_))));

        builder.remove_place("b");
        assert!(matches!(builder.save("Centro", "u1").await, Err(RouteError::Validation(_))));
        assert!(store.created.lock().unwrap().is_empty());
    }

    #[tokio::test]
    async fn test_save_submits_payload() {
        let store = Arc::new(MemoryStore::default());
        let mut builder = builder_with(Arc::clone(&store));
        builder.add_place(place("a", 4.44, -75.205));
        builder.add_place(place("b", 4.45, -75.205));

        let saved = builder.save("Centro histórico", "u1").await.unwrap();
        assert_eq!(saved.id, "r1");
        assert_eq!(builder.status(), &RouteStatus::Saved { route_id: "r1".to_string() });

        let created = store.created.lock().unwrap();
        let payload = &created[0];
        assert_eq!(payload.user_id, "u1");
        assert_eq!(payload.places.iter().map(|s| s.order).collect::<Vec<_>>(), vec![1, 2]);
        assert_eq!(payload.total_distance, builder.stats().total_distance);
        assert_eq!(payload.created_at, Utc.with_ymd_and_hms(2026, 3, 1, 10, 0, 0).unwrap());
    }

    #[tokio::test]
    async fn test_save_surfaces_store_errors() {
        let store = Arc::new(MemoryStore { fail: true, ..Default::default() });
        let mut builder = builder_with(store);
        builder.add_place(place("a", 4.44, -75.205));
        builder.add_place(place("b", 4.45, -75.205));

        assert!(matches!(builder.save("Centro", "u1").await, Err(RouteError::Store(_))));
        assert_eq!(builder.status(), &RouteStatus::Building);
    }

    #[tokio::test]
    async fn test_load_restores_order() {
        let store = Arc::new(MemoryStore::default());
        store.stored.lock().unwrap().push(PersistedRoute {
            id: "r9".to_string(),
            name: "Saved".to_string(),
            user_id: Some("u1".to_string()),
            places: vec![
                RouteStop { place_id: "osm_2".to_string(), order: 2, lat: 4.45, lng: -75.2, name: None },
                RouteStop { place_id: "google_1".to_string(), order: 1, lat: 4.44, lng: -75.2, name: Some("Plaza".to_string()) },
            ],
            total_distance: 0.0,
            estimated_time: 0.0,
            created_at: None,
        });

        let mut builder = builder_with(Arc::clone(&store));
        builder.add_place(place("old", 4.0, -75.0));
        builder.load("r9").await.unwrap();

        assert_eq!(ids(&builder), vec!["google_1", "osm_2"]);
        assert_eq!(orders(&builder), vec![1, 2]);
        assert_eq!(builder.entries()[0].place.name, "Plaza");
        assert!(builder.entries()[0].place.verified);
        assert!(builder.stats().total_distance > 0.0);

        assert_eq!(builder.list_saved("u1").await.unwrap().len(), 1);
        assert!(matches!(builder.load("missing").await, Err(RouteError::Store(RouteStoreError::NotFound(_)))));
    }

    #[tokio::test]
    async fn test_load_skips_repeated_and_invalid_stops() {
        let store = Arc::new(MemoryStore::default());
        store.stored.lock().unwrap().push(PersistedRoute {
            id: "r7".to_string(),
            name: "Imported".to_string(),
            user_id: None,
            places: vec![
                RouteStop { place_id: "osm_1".to_string(), order: 1, lat: 4.44, lng: -75.2, name: None },
                RouteStop { place_id: "osm_2".to_string(), order: 2, lat: f64::NAN, lng: -75.2, name: None },
                RouteStop { place_id: "osm_1".to_string(), order: 3, lat: 4.46, lng: -75.2, name: None },
                RouteStop { place_id: "osm_3".to_string(), order: 4, lat: 95.0, lng: -75.2, name: None },
                RouteStop { place_id: "osm_4".to_string(), order: 5, lat: 4.45, lng: -75.2, name: None },
            ],
            total_distance: 0.0,
            estimated_time: 0.0,
            created_at: None,
        });

        let mut builder = builder_with(Arc::clone(&store));
        builder.load("r7").await.unwrap();

        assert_eq!(ids(&builder), vec!["osm_1", "osm_4"]);
        assert_eq!(orders(&builder), vec![1, 2]);
        assert_eq!(builder.entries()[0].place.coordinates.latitude, 4.44);
        assert!(builder.stats().total_distance.is_finite());
        assert!(builder.contains("osm_4"));
        assert!(!builder.contains("osm_2"));
    }
}
