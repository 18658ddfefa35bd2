use crate::models::{Category, Place};
use std::collections::BTreeSet;

/// Scoring weights
///
/// Each weight is the maximum number of points its term contributes.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ScoringWeights {
    pub distance: f64,
    pub rating: f64,
    pub relevance: f64,
    pub verified_bonus: f64,
    /// Distance at which the distance term reaches zero
    pub max_distance_m: f64,
}

impl Default for ScoringWeights {
    fn default() -> Self {
        Self {
            distance: 40.0,
            rating: 30.0,
            relevance: 30.0,
            verified_bonus: 5.0,
            max_distance_m: 5000.0,
        }
    }
}

/// Calculate a place's ranking score
///
/// Scoring formula:
/// score = (
///     distance_term +     # linear decay to zero at max_distance_m
///     rating_term +       # rating / 5
///     relevance_term +    # share of interests the place covers
///     verified_bonus      # verified sources only
/// )
///
/// Returns `(score, relevance)`.
pub fn calculate_place_score(
    place: &Place,
    interests: &BTreeSet<Category>,
    weights: &ScoringWeights,
) -> (f64, f64) {
    let relevance = calculate_relevance(&place.tags, interests);

    let score = calculate_distance_score(place.distance_from_query, weights)
        + (place.rating / 5.0) * weights.rating
        + relevance * weights.relevance
        + if place.verified { weights.verified_bonus } else { 0.0 };

    (score, relevance)
}

/// Distance term, clamped at zero beyond the decay distance
#[inline]
fn calculate_distance_score(distance_m: f64, weights: &ScoringWeights) -> f64 {
    (weights.distance - (distance_m / weights.max_distance_m) * weights.distance).max(0.0)
}

/// Share of requested interests present in a place's tags (0-1)
#[inline]
pub fn calculate_relevance(tags: &BTreeSet<Category>, interests: &BTreeSet<Category>) -> f64 {
    let matching = tags.intersection(interests).count() as f64;
    matching / interests.len().max(1) as f64
}

/// Score every place and sort descending by score
///
/// The sort is stable: equal scores keep their incoming order.
pub fn score_and_sort(
    places: Vec<Place>,
    interests: &BTreeSet<Category>,
    weights: &ScoringWeights,
) -> Vec<Place> {
    let mut scored: Vec<Place> = places
        .into_iter()
        .map(|mut place| {
            let (score, relevance) = calculate_place_score(&place, interests, weights);
            place.score = score;
            place.relevance_score = relevance;
            place
        })
        .collect();

    scored.sort_by(|a, b| b.score.total_cmp(&a.score));
    scored
}

/// Maximum number of places that fit a time budget in hours
pub fn max_places_for_time(hours: u32) -> usize {
    match hours {
        1 => 3,
        2 => 5,
        3 => 8,
        4 => 12,
        8 => 20,
        _ => 8,
    }
}
