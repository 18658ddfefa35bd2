//! Tour Planner - place aggregation and route building for city tours
//!
//! This library gathers points of interest from several geodata sources,
//! merges them into one ranked list sized to the visitor's time budget, and
//! assembles the chosen places into an ordered walking route.

pub mod config;
pub mod core;
pub mod models;
pub mod routes;
pub mod services;

// Re-export commonly used types
pub use core::{Ranker, RouteBuilder, distance::{haversine_distance, calculate_bounding_box}};
pub use models::{Category, Place, PlaceSource, SearchQuery, SearchPlacesRequest, SearchPlacesResponse};
pub use services::{PlaceSearchService, ResultCache};
