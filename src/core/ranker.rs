use crate::core::{
    dedupe::deduplicate_places,
    scoring::{max_places_for_time, score_and_sort, ScoringWeights},
};
use crate::models::{Category, Place};
use std::collections::BTreeSet;

/// Result of the ranking process
#[derive(Debug)]
pub struct RankResult {
    pub places: Vec<Place>,
    /// Places received from all sources before deduplication
    pub total_candidates: usize,
    /// Places left after deduplication, before truncation
    pub unique_candidates: usize,
}

/// Ranking orchestrator for aggregated places
///
/// # Pipeline Stages
/// 1. Cross-source deduplication
/// 2. Scoring against the query's interests
/// 3. Stable descending sort
/// 4. Truncation to the time budget
#[derive(Debug, Clone)]
pub struct Ranker {
    weights: ScoringWeights,
}

impl Ranker {
    pub fn new(weights: ScoringWeights) -> Self {
        Self { weights }
    }

    pub fn with_default_weights() -> Self {
        Self {
            weights: ScoringWeights::default(),
        }
    }

    pub fn weights(&self) -> &ScoringWeights {
        &self.weights
    }

    /// Rank places gathered from every source for one query
    ///
    /// # Arguments
    /// * `candidates` - Normalized places from all sources, concatenated
    /// * `interests` - Canonical categories the user asked for
    /// * `time_budget_hours` - Available time, bounds the result length
    pub fn rank(
        &self,
        candidates: Vec<Place>,
        interests: &BTreeSet<Category>,
        time_budget_hours: u32,
    ) -> RankResult {
        let total_candidates = candidates.len();

        let unique = deduplicate_places(candidates);
        let unique_candidates = unique.len();

        let mut places = score_and_sort(unique, interests, &self.weights);
        places.truncate(max_places_for_time(time_budget_hours));

        RankResult {
            places,
            total_candidates,
            unique_candidates,
        }
    }
}

impl Default for Ranker {
    fn default() -> Self {
        Self::with_default_weights()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::{Coordinates, PlaceSource};

    fn create_candidate(id: &str, name: &str, distance_m: f64, source: PlaceSource) -> Place {
        Place {
            id: id.to_string(),
            name: name.to_string(),
            coordinates: Coordinates::new(4.4399 + distance_m / 111_000.0, -75.2050),
            tags: BTreeSet::from([Category::Gastro]),
            category: Category::Gastro,
            rating: 4.0,
            verified: source.is_authoritative(),
            source,
            address: String::new(),
            distance_from_query: distance_m,
            relevance_score: 0.0,
            score: 0.0,
        }
    }

    #[test]
    fn test_rank_dedupes_and_sorts() {
        let ranker = Ranker::with_default_weights();
        let interests = BTreeSet::from([Category::Gastro]);

        let candidates = vec![
            create_candidate("osm_1", "Far", 3000.0, PlaceSource::Osm),
            create_candidate("osm_2", "Near", 100.0, PlaceSource::Osm),
            create_candidate("google_2", "Near", 100.0, PlaceSource::Google),
        ];

        let result = ranker.rank(candidates, &interests, 3);

        assert_eq!(result.total_candidates, 3);
        assert_eq!(result.unique_candidates, 2);
        assert_eq!(result.places[0].id, "google_2");
        assert_eq!(result.places[1].id, "osm_1");
    }

    #[test]
    fn test_respects_time_budget() {
        let ranker = Ranker::with_default_weights();
        let candidates: Vec<Place> = (0..30)
            .map(|i| create_candidate(&format!("osm_{}", i), &format!("Place {}", i), i as f64 * 50.0, PlaceSource::Osm))
            .collect();

        assert_eq!(ranker.rank(candidates.clone(), &BTreeSet::new(), 1).places.len(), 3);
        assert_eq!(ranker.rank(candidates.clone(), &BTreeSet::new(), 8).places.len(), 20);
        assert_eq!(ranker.rank(candidates, &BTreeSet::new(), 6).places.len(), 8);
    }

    #[test]
    fn test_scores_non_increasing() {
        let ranker = Ranker::default();
        let candidates: Vec<Place> = (0..10)
            .map(|i| create_candidate(&format!("osm_{}", i), &format!("P{}", i), ((i * 7) % 10) as f64 * 400.0, PlaceSource::Osm))
            .collect();

        let result = ranker.rank(candidates, &BTreeSet::from([Category::Gastro]), 4);
        for pair in result.places.windows(2) {
            assert!(pair[0].score >= pair[1].score);
        }
    }
}
