use serde::{Deserialize, Serialize};
use std::sync::Arc;
use crate::models::domain::Place;

/// Response for the place search endpoint
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SearchPlacesResponse {
    pub places: Vec<Arc<Place>>,
    /// True when at least one source failed and results may be partial
    pub fallback: bool,
    pub total_results: usize,
}

/// Health check response
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct HealthResponse {
    pub status: String,
    pub version: String,
    /// Searches currently memoized
    pub cache_entries: u64,
    pub timestamp: chrono::DateTime<chrono::Utc>,
}

/// Error response
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ErrorResponse {
    pub error: String,
    pub message: String,
    pub status_code: u16,
}
