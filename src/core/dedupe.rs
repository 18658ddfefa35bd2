use crate::models::Place;
use std::collections::HashSet;

/// Identity of a place across sources: coordinates at ~11 m resolution plus exact name
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct DedupKey {
    lat_e4: i64,
    lng_e4: i64,
    name: String,
}

impl DedupKey {
    pub fn of(place: &Place) -> Self {
        Self {
            lat_e4: round_e4(place.coordinates.latitude),
            lng_e4: round_e4(place.coordinates.longitude),
            name: place.name.clone(),
        }
    }
}

#[inline]
fn round_e4(value: f64) -> i64 {
    (value * 10_000.0).round() as i64
}

/// Collapse places reported by several sources into one record each
///
/// Places are first ordered by source priority (verified sources first,
/// stable within a source), then the first place seen for each key wins.
/// Ids are unique in the output: a later record reusing an id is dropped
/// even when its name or position differs.
pub fn deduplicate_places(mut places: Vec<Place>) -> Vec<Place> {
    places.sort_by_key(|place| place.source.priority());

    let mut seen_keys = HashSet::with_capacity(places.len());
    let mut seen_ids: HashSet<String> = HashSet::with_capacity(places.len());
    places.retain(|place| {
        if seen_ids.contains(place.id.as_str()) || !seen_keys.insert(DedupKey::of(place)) {
            return false;
        }
        seen_ids.insert(place.id.clone());
        true
    });
    places
}
