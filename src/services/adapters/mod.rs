//! Geodata source adapters.
//!
//! Each adapter talks to one provider and normalizes its records into
//! [`Place`]s. Adapters report failures as [`AdapterError`]; the search
//! service collapses a failed source into an empty contribution through
//! [`AdapterOutcome::into_places`].

pub mod google;
pub mod overpass;

use async_trait::async_trait;
use std::collections::BTreeSet;
use std::time::{Duration, Instant};
use thiserror::Error;

use crate::models::{Category, Coordinates, Place, PlaceSource};

pub use google::GooglePlacesAdapter;
pub use overpass::OverpassAdapter;

/// Errors that can occur while fetching from a source
#[derive(Debug, Error)]
pub enum AdapterError {
    #[error("HTTP request failed: {0}")]
    RequestError(#[from] reqwest::Error),

    #[error("Source returned error: {0}")]
    ApiError(String),

    #[error("Invalid response format: {0}")]
    InvalidResponse(String),

    #[error("No credentials configured for {0}")]
    MissingCredentials(PlaceSource),

    #[error("Timed out after {0:?}")]
    Timeout(Duration),
}

impl AdapterError {
    /// Whether this failure means results are degraded
    ///
    /// An unconfigured source is skipped rather than failed.
    pub fn is_degradation(&self) -> bool {
        !matches!(self, AdapterError::MissingCredentials(_))
    }
}

/// What one source is asked for
#[derive(Debug, Clone)]
pub struct SourceRequest {
    pub center: Coordinates,
    pub radius_m: u32,
    /// Requested interests in the source's own vocabulary
    pub types: Vec<&'static str>,
}

/// A provider of points of interest
#[async_trait]
pub trait SourceAdapter: Send + Sync {
    fn source(&self) -> PlaceSource;

    /// Translate canonical interests into this source's vocabulary
    fn translate_interests(&self, interests: &BTreeSet<Category>) -> Vec<&'static str>;

    /// Fetch and normalize places around the request center
    async fn fetch(&self, request: &SourceRequest) -> Result<Vec<Place>, AdapterError>;
}

/// Settled result of one adapter call
#[derive(Debug)]
pub struct AdapterOutcome {
    pub source: PlaceSource,
    pub elapsed: Duration,
    pub result: Result<Vec<Place>, AdapterError>,
}

impl AdapterOutcome {
    pub fn is_degraded(&self) -> bool {
        matches!(&self.result, Err(e) if e.is_degradation())
    }

    /// Collapse to the places contributed, empty on failure
    pub fn into_places(self) -> Vec<Place> {
        match self.result {
            Ok(places) => {
                tracing::debug!("{} returned {} places in {:?}", self.source, places.len(), self.elapsed);
                places
            }
            Err(AdapterError::MissingCredentials(source)) => {
                tracing::debug!("{} skipped: no credentials configured", source);
                Vec::new()
            }
            Err(e) => {
                tracing::warn!("{} failed after {:?}, contributing no places: {}", self.source, self.elapsed, e);
                Vec::new()
            }
        }
    }
}

/// Run one adapter with a hard deadline
pub async fn fetch_with_timeout(
    adapter: &dyn SourceAdapter,
    request: &SourceRequest,
    timeout: Duration,
) -> AdapterOutcome {
    let started = Instant::now();
    let result = match tokio::time::timeout(timeout, adapter.fetch(request)).await {
        Ok(result) => result,
        Err(_) => Err(AdapterError::Timeout(timeout)),
    };

    AdapterOutcome {
        source: adapter.source(),
        elapsed: started.elapsed(),
        result,
    }
}
