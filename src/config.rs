use config::{Config, ConfigError, Environment, File};
use serde::Deserialize;
use std::path::Path;
use std::time::Duration;

use crate::core::ScoringWeights;
use crate::services::cache::DEFAULT_TTL;
use crate::services::search::DEFAULT_SOURCE_TIMEOUT;
use crate::services::adapters::google::DEFAULT_GOOGLE_ENDPOINT;
use crate::services::adapters::overpass::{DEFAULT_OVERPASS_ENDPOINT, DEFAULT_QUERY_TIMEOUT_SECS};

/// Application configuration
#[derive(Debug, Clone, Deserialize)]
pub struct Settings {
    #[serde(default)]
    pub server: ServerSettings,
    #[serde(default)]
    pub sources: SourceSettings,
    #[serde(default)]
    pub cache: CacheSettings,
    #[serde(default)]
    pub route_store: RouteStoreSettings,
    #[serde(default)]
    pub scoring: ScoringSettings,
    #[serde(default)]
    pub logging: LoggingSettings,
}

#[derive(Debug, Clone, Deserialize)]
pub struct ServerSettings {
    #[serde(default = "default_host")]
    pub host: String,
    #[serde(default = "default_port")]
    pub port: u16,
    pub workers: Option<usize>,
}

impl Default for ServerSettings {
    fn default() -> Self {
        Self {
            host: default_host(),
            port: default_port(),
            workers: None,
        }
    }
}

fn default_host() -> String { "0.0.0.0".to_string() }
fn default_port() -> u16 { 8080 }

#[derive(Debug, Clone, Deserialize)]
pub struct SourceSettings {
    #[serde(default = "default_overpass_endpoint")]
    pub overpass_endpoint: String,
    #[serde(default = "default_google_endpoint")]
    pub google_endpoint: String,
    /// Google is skipped when no key is configured
    pub google_api_key: Option<String>,
    /// Deadline for each source call, also the HTTP client timeout
    #[serde(default = "default_request_timeout_secs")]
    pub request_timeout_secs: u64,
    #[serde(default = "default_overpass_query_timeout_secs")]
    pub overpass_query_timeout_secs: u32,
}

impl Default for SourceSettings {
    fn default() -> Self {
        Self {
            overpass_endpoint: default_overpass_endpoint(),
            google_endpoint: default_google_endpoint(),
            google_api_key: None,
            request_timeout_secs: default_request_timeout_secs(),
            overpass_query_timeout_secs: default_overpass_query_timeout_secs(),
        }
    }
}

impl SourceSettings {
    pub fn request_timeout(&self) -> Duration {
        Duration::from_secs(self.request_timeout_secs.max(1))
    }
}

fn default_overpass_endpoint() -> String { DEFAULT_OVERPASS_ENDPOINT.to_string() }
fn default_google_endpoint() -> String { DEFAULT_GOOGLE_ENDPOINT.to_string() }
fn default_request_timeout_secs() -> u64 { DEFAULT_SOURCE_TIMEOUT.as_secs() }
fn default_overpass_query_timeout_secs() -> u32 { DEFAULT_QUERY_TIMEOUT_SECS }

#[derive(Debug, Clone, Deserialize)]
pub struct CacheSettings {
    #[serde(default = "default_cache_ttl_secs")]
    pub ttl_secs: u64,
    #[serde(default = "default_cache_capacity")]
    pub capacity: u64,
}

impl Default for CacheSettings {
    fn default() -> Self {
        Self {
            ttl_secs: default_cache_ttl_secs(),
            capacity: default_cache_capacity(),
        }
    }
}

fn default_cache_ttl_secs() -> u64 { DEFAULT_TTL.as_secs() }
fn default_cache_capacity() -> u64 { 1000 }

/// Connection to the external route store
///
/// The HTTP service does not persist routes itself. Code embedding
/// `RouteBuilder` reads this section and builds its store with
/// `HttpRouteStore::from_settings`.
#[derive(Debug, Clone, Deserialize)]
pub struct RouteStoreSettings {
    #[serde(default = "default_route_store_url")]
    pub base_url: String,
    #[serde(default = "default_route_store_timeout_secs")]
    pub timeout_secs: u64,
}

impl Default for RouteStoreSettings {
    fn default() -> Self {
        Self {
            base_url: default_route_store_url(),
            timeout_secs: default_route_store_timeout_secs(),
        }
    }
}

fn default_route_store_url() -> String { "http://localhost:4001/api".to_string() }
fn default_route_store_timeout_secs() -> u64 { 10 }

#[derive(Debug, Clone, Default, Deserialize)]
pub struct ScoringSettings {
    #[serde(default)]
    pub weights: WeightsConfig,
}

#[derive(Debug, Clone, Deserialize)]
pub struct WeightsConfig {
    #[serde(default = "default_distance_weight")]
    pub distance: f64,
    #[serde(default = "default_rating_weight")]
    pub rating: f64,
    #[serde(default = "default_relevance_weight")]
    pub relevance: f64,
    #[serde(default = "default_verified_bonus")]
    pub verified_bonus: f64,
    #[serde(default = "default_max_distance_m")]
    pub max_distance_m: f64,
}

impl Default for WeightsConfig {
    fn default() -> Self {
        Self {
            distance: default_distance_weight(),
            rating: default_rating_weight(),
            relevance: default_relevance_weight(),
            verified_bonus: default_verified_bonus(),
            max_distance_m: default_max_distance_m(),
        }
    }
}

impl From<&WeightsConfig> for ScoringWeights {
    fn from(config: &WeightsConfig) -> Self {
        Self {
            distance: config.distance,
            rating: config.rating,
            relevance: config.relevance,
            verified_bonus: config.verified_bonus,
            max_distance_m: config.max_distance_m,
        }
    }
}

fn default_distance_weight() -> f64 { 40.0 }
fn default_rating_weight() -> f64 { 30.0 }
fn default_relevance_weight() -> f64 { 30.0 }
fn default_verified_bonus() -> f64 { 5.0 }
fn default_max_distance_m() -> f64 { 5000.0 }

#[derive(Debug, Clone, Deserialize)]
pub struct LoggingSettings {
    #[serde(default = "default_log_level")]
    pub level: String,
    #[serde(default = "default_log_format")]
    pub format: String,
}

impl Default for LoggingSettings {
    fn default() -> Self {
        Self {
            level: default_log_level(),
            format: default_log_format(),
        }
    }
}

fn default_log_level() -> String { "info".to_string() }
fn default_log_format() -> String { "json".to_string() }

impl Settings {
    /// Load configuration from file and environment variables
    ///
    /// Configuration is loaded in the following order (later overrides earlier):
    /// 1. Default values in the struct
    /// 2. Configuration files (config/default.toml, config/local.toml)
    /// 3. Environment variables (prefixed with TOUR__)
    /// 4. GOOGLE_PLACES_API_KEY, when set
    pub fn load() -> Result<Self, ConfigError> {
        let settings = Config::builder()
            .add_source(File::with_name("config/default").required(false))
            // Local development overrides
            .add_source(File::with_name("config/local").required(false))
            // e.g., TOUR__SERVER__PORT -> server.port
            .add_source(environment())
            .build()?;

        with_api_key_override(settings)?.try_deserialize()
    }

    /// Load configuration from a custom path
    pub fn load_from<P: AsRef<Path>>(path: P) -> Result<Self, ConfigError> {
        let settings = Config::builder()
            .add_source(File::from(path.as_ref()))
            .add_source(environment())
            .build()?;

        with_api_key_override(settings)?.try_deserialize()
    }
}

fn environment() -> Environment {
    Environment::with_prefix("TOUR")
        .prefix_separator("__")
        .separator("__")
        .try_parsing(true)
}

/// Honor the conventional GOOGLE_PLACES_API_KEY variable
fn with_api_key_override(settings: Config) -> Result<Config, ConfigError> {
    match std::env::var("GOOGLE_PLACES_API_KEY") {
        Ok(key) if !key.trim().is_empty() => Config::builder()
            .add_source(settings)
            .set_override("sources.google_api_key", key)?
            .build(),
        _ => Ok(settings),
    }
}
