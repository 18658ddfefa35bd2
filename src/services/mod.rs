// Service exports
pub mod adapters;
pub mod cache;
pub mod route_store;
pub mod search;

pub use adapters::{AdapterError, GooglePlacesAdapter, OverpassAdapter, SourceAdapter};
pub use cache::{CacheKey, CacheStats, ResultCache};
pub use route_store::HttpRouteStore;
pub use search::{PlaceSearchService, SearchError, SearchOutcome};
