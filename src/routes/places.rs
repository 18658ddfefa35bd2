use actix_web::{web, HttpResponse, Responder};
use std::sync::Arc;
use validator::Validate;

use crate::models::{ErrorResponse, HealthResponse, SearchPlacesRequest, SearchPlacesResponse};
use crate::services::PlaceSearchService;

/// Application state shared across all handlers
#[derive(Clone)]
pub struct AppState {
    pub search: Arc<PlaceSearchService>,
}

/// Configure all place-related routes
pub fn configure(cfg: &mut web::ServiceConfig) {
    cfg
        .route("/health", web::get().to(health_check))
        .route("/places/search", web::post().to(search_places))
        .route("/cache/clear", web::post().to(clear_cache));
}

/// Health check endpoint
async fn health_check(state: web::Data<AppState>) -> impl Responder {
    HttpResponse::Ok().json(HealthResponse {
        status: "healthy".to_string(),
        version: env!("CARGO_PKG_VERSION").to_string(),
        cache_entries: state.search.cache().stats().entries,
        timestamp: chrono::Utc::now(),
    })
}

/// Search places endpoint
///
/// POST /api/v1/places/search
///
/// Request body:
/// ```json
/// {
///   "lat": 4.4399,
///   "lng": -75.2050,
///   "radius": 2000,
///   "interests": ["gastro", "cultura"],
///   "time": 3
/// }
/// ```
async fn search_places(
    state: web::Data<AppState>,
    req: web::Json<SearchPlacesRequest>,
) -> impl Responder {
    if let Err(errors) = req.validate() {
        tracing::info!("Validation failed for search request: field_errors={:?}", errors);
        return HttpResponse::BadRequest().json(ErrorResponse {
            error: "Validation failed".to_string(),
            message: errors.to_string(),
            status_code: 400,
        });
    }

    let query = req.to_query();
    tracing::info!(
        "Searching places around ({}, {}), radius: {}m, interests: {:?}, time: {}h",
        query.center.latitude,
        query.center.longitude,
        query.radius_m,
        query.interests,
        query.time_budget_hours
    );

    let outcome = state.search.search_with_report(&query).await;

    if outcome.fallback {
        tracing::warn!("Returning degraded results: {:?}", outcome.sources);
    }
    tracing::info!(
        "Returning {} places (cached: {})",
        outcome.places.len(),
        outcome.from_cache
    );

    HttpResponse::Ok().json(SearchPlacesResponse {
        total_results: outcome.places.len(),
        places: outcome.places,
        fallback: outcome.fallback,
    })
}

/// Drop every memoized search
async fn clear_cache(state: web::Data<AppState>) -> impl Responder {
    state.search.cache().invalidate_all();
    tracing::info!("Search cache cleared");

    HttpResponse::Ok().json(serde_json::json!({ "cleared": true }))
}
