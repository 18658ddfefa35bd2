// Model exports
pub mod domain;
pub mod requests;
pub mod responses;

pub use domain::{
    BoundingBox, Category, Coordinates, NewRoute, PersistedRoute, Place, PlaceSource, RawPlace,
    RouteEntry, RouteStats, RouteStop, SearchQuery, DEFAULT_RATING, UNNAMED_PLACE,
};
pub use requests::SearchPlacesRequest;
pub use responses::{ErrorResponse, HealthResponse, SearchPlacesResponse};
