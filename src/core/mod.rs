// Core algorithm exports
pub mod categorizer;
pub mod dedupe;
pub mod distance;
pub mod normalize;
pub mod ranker;
pub mod route;
pub mod scoring;

pub use distance::{haversine_distance, calculate_bounding_box, distance_between};
pub use ranker::{Ranker, RankResult};
pub use route::{RouteBuilder, RouteError, RouteStatus, RouteStore, RouteStoreError};
pub use scoring::{max_places_for_time, ScoringWeights};
