use actix_cors::Cors;
use actix_web::{web, App, HttpServer, HttpResponse, middleware, error, http::StatusCode};
use std::sync::Arc;
use std::time::Duration;
use tracing::{info, error};
use tracing_subscriber::EnvFilter;

use tour_planner::config::{LoggingSettings, Settings};
use tour_planner::core::{Ranker, ScoringWeights};
use tour_planner::routes::{self, places::AppState};
use tour_planner::services::{GooglePlacesAdapter, OverpassAdapter, PlaceSearchService, ResultCache, SourceAdapter};

/// JSON error response for JSON payload errors
#[derive(Debug, serde::Serialize)]
pub struct JsonError {
    pub error: String,
    pub message: String,
    pub status_code: u16,
}

impl std::fmt::Display for JsonError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}: {}", self.error, self.message)
    }
}

impl std::error::Error for JsonError {}

impl error::ResponseError for JsonError {
    fn error_response(&self) -> HttpResponse {
        HttpResponse::build(StatusCode::from_u16(self.status_code).unwrap_or(StatusCode::BAD_REQUEST))
            .json(self)
    }
}

/// Handle JSON payload errors
pub fn handle_json_payload_error(err: error::JsonPayloadError, req: &actix_web::HttpRequest) -> actix_web::Error {
    tracing::info!("JSON payload error on {}: {}", req.path(), err);
    JsonError {
        error: "invalid_json".to_string(),
        message: format!("Invalid JSON: {}", err),
        status_code: 400,
    }
    .into()
}

fn init_logging(logging: &LoggingSettings) {
    // RUST_LOG wins over the configured level
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(&logging.level));

    let subscriber = tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(false)
        .with_level(true);

    if logging.format == "pretty" {
        subscriber.pretty().init();
    } else {
        subscriber.json().init();
    }
}

fn io_error(context: &str, err: impl std::fmt::Display) -> std::io::Error {
    std::io::Error::new(std::io::ErrorKind::Other, format!("{}: {}", context, err))
}

#[actix_web::main]
async fn main() -> std::io::Result<()> {
    // Load .env file if present
    dotenv::dotenv().ok();

    let settings = Settings::load().map_err(|e| {
        eprintln!("Failed to load configuration: {}", e);
        io_error("Configuration error", e)
    })?;

    init_logging(&settings.logging);

    info!("Starting tour planner service...");
    info!("Configuration loaded successfully");

    // Initialize source adapters
    let request_timeout = settings.sources.request_timeout();

    let overpass = OverpassAdapter::new(
        settings.sources.overpass_endpoint.clone(),
        request_timeout,
        settings.sources.overpass_query_timeout_secs,
    )
    .map_err(|e| {
        error!("Failed to build Overpass client: {}", e);
        io_error("HTTP client error", e)
    })?;

    let google = GooglePlacesAdapter::new(
        settings.sources.google_endpoint.clone(),
        settings.sources.google_api_key.clone(),
        request_timeout,
    )
    .map_err(|e| {
        error!("Failed to build Google Places client: {}", e);
        io_error("HTTP client error", e)
    })?;

    if !google.has_credentials() {
        info!("No Google Places API key configured, searching OpenStreetMap only");
    }

    let adapters: Vec<Arc<dyn SourceAdapter>> = vec![Arc::new(google), Arc::new(overpass)];

    // Initialize result cache
    let cache = Arc::new(ResultCache::new(
        settings.cache.capacity,
        Duration::from_secs(settings.cache.ttl_secs),
        Arc::new(mockable::DefaultClock),
    ));

    info!("Result cache initialized ({} entries, TTL: {:?})", settings.cache.capacity, cache.ttl());

    // Initialize ranker with configured weights
    let ranker = Ranker::new(ScoringWeights::from(&settings.scoring.weights));

    info!("Ranker initialized with weights: {:?}", ranker.weights());

    let search = Arc::new(PlaceSearchService::new(adapters, cache, ranker, request_timeout));

    // Build application state
    let app_state = AppState { search };

    // Configure HTTP server
    let host = settings.server.host.clone();
    let port = settings.server.port;
    let workers = settings.server.workers.unwrap_or(4);

    info!("Starting HTTP server on {}:{}", host, port);

    HttpServer::new(move || {
        let cors = Cors::permissive();

        App::new()
            .app_data(web::Data::new(app_state.clone()))
            .app_data(web::JsonConfig::default().error_handler(handle_json_payload_error))
            .wrap(cors)
            .wrap(middleware::Logger::default())
            .wrap(middleware::Compress::default())
            .configure(routes::configure_routes)
    })
    .workers(workers)
    .bind((host, port))?
    .run()
    .await
}
