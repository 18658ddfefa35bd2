use chrono::{DateTime, Utc};
use serde::{Deserialize, Deserializer, Serialize};
use std::collections::BTreeSet;
use std::fmt;
use std::str::FromStr;
use std::sync::Arc;

/// Name used when a source omits one
pub const UNNAMED_PLACE: &str = "Unnamed place";

/// Rating assigned to places from sources without native ratings
pub const DEFAULT_RATING: f64 = 4.0;

/// Canonical interest category
///
/// Declaration order is the primary-category priority order.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Category {
    Gastro,
    #[serde(alias = "cultura")]
    Culture,
    #[serde(alias = "naturaleza")]
    Nature,
    Shopping,
    #[serde(alias = "recreacion")]
    Recreation,
    #[serde(alias = "servicios")]
    Services,
}

impl Category {
    /// Priority order used to pick a place's primary category
    pub const PRIORITY: [Category; 6] = [
        Category::Gastro,
        Category::Culture,
        Category::Nature,
        Category::Shopping,
        Category::Recreation,
        Category::Services,
    ];

    /// Category assigned when no tag matches
    pub const DEFAULT: Category = Category::Services;

    pub fn as_str(&self) -> &'static str {
        match self {
            Category::Gastro => "gastro",
            Category::Culture => "culture",
            Category::Nature => "nature",
            Category::Shopping => "shopping",
            Category::Recreation => "recreation",
            Category::Services => "services",
        }
    }
}

impl fmt::Display for Category {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Category {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "gastro" => Ok(Category::Gastro),
            "culture" | "cultura" => Ok(Category::Culture),
            "nature" | "naturaleza" => Ok(Category::Nature),
            "shopping" => Ok(Category::Shopping),
            "recreation" | "recreacion" => Ok(Category::Recreation),
            "services" | "servicios" => Ok(Category::Services),
            other => Err(format!("unknown category: {}", other)),
        }
    }
}

/// Provenance of a place record
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum PlaceSource {
    Google,
    Osm,
}

impl PlaceSource {
    /// Dedup tie-break rank: lower wins when two sources report the same place
    pub fn priority(&self) -> u8 {
        match self {
            PlaceSource::Google => 0,
            PlaceSource::Osm => 1,
        }
    }

    /// Whether records from this source are considered verified
    pub fn is_authoritative(&self) -> bool {
        matches!(self, PlaceSource::Google)
    }

    /// Prefix used to qualify source-native ids
    pub fn id_prefix(&self) -> &'static str {
        match self {
            PlaceSource::Google => "google",
            PlaceSource::Osm => "osm",
        }
    }
}

impl fmt::Display for PlaceSource {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.id_prefix())
    }
}

/// WGS84 point
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Coordinates {
    #[serde(rename = "lat")]
    pub latitude: f64,
    #[serde(rename = "lng")]
    pub longitude: f64,
}

impl Coordinates {
    pub fn new(latitude: f64, longitude: f64) -> Self {
        Self { latitude, longitude }
    }

    /// Build coordinates only when both values are finite and in range
    pub fn checked(latitude: f64, longitude: f64) -> Option<Self> {
        let coords = Self::new(latitude, longitude);
        coords.is_valid().then_some(coords)
    }

    pub fn is_valid(&self) -> bool {
        self.latitude.is_finite()
            && self.longitude.is_finite()
            && (-90.0..=90.0).contains(&self.latitude)
            && (-180.0..=180.0).contains(&self.longitude)
    }
}

/// Canonical point of interest
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Place {
    pub id: String,
    pub name: String,
    #[serde(flatten)]
    pub coordinates: Coordinates,
    #[serde(default)]
    pub tags: BTreeSet<Category>,
    pub category: Category,
    pub rating: f64,
    pub verified: bool,
    pub source: PlaceSource,
    #[serde(default)]
    pub address: String,
    #[serde(rename = "distanceFromQuery")]
    pub distance_from_query: f64,
    #[serde(rename = "relevanceScore", default)]
    pub relevance_score: f64,
    #[serde(default)]
    pub score: f64,
}

/// A record as extracted from one source, before normalization
#[derive(Debug, Clone)]
pub struct RawPlace {
    pub source: PlaceSource,
    pub native_id: String,
    pub name: Option<String>,
    pub latitude: Option<f64>,
    pub longitude: Option<f64>,
    /// Source-vocabulary tag values or types
    pub raw_types: Vec<String>,
    pub rating: Option<f64>,
    pub address: String,
}

/// Geospatial bounding box
#[derive(Debug, Clone, Copy)]
pub struct BoundingBox {
    pub min_lat: f64,
    pub max_lat: f64,
    pub min_lon: f64,
    pub max_lon: f64,
}

/// Parameters of one place search
#[derive(Debug, Clone)]
pub struct SearchQuery {
    pub center: Coordinates,
    pub radius_m: u32,
    pub interests: BTreeSet<Category>,
    pub time_budget_hours: u32,
}

/// One stop in a route
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RouteEntry {
    pub place: Arc<Place>,
    #[serde(rename = "routeOrder")]
    pub order: usize,
}

/// Aggregate statistics over a route
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
pub struct RouteStats {
    /// Meters between consecutive stops
    #[serde(rename = "totalDistance")]
    pub total_distance: f64,
    /// Walking plus dwell time, in minutes
    #[serde(rename = "estimatedTime")]
    pub estimated_time: f64,
    #[serde(rename = "placesCount")]
    pub places_count: usize,
}

/// Stop as exchanged with the route store
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RouteStop {
    pub place_id: String,
    pub order: usize,
    pub lat: f64,
    pub lng: f64,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,
}

/// Route payload submitted to the route store
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct NewRoute {
    pub name: String,
    pub user_id: String,
    pub places: Vec<RouteStop>,
    pub total_distance: f64,
    pub estimated_time: f64,
    pub created_at: DateTime<Utc>,
}

/// Route as returned by the route store
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PersistedRoute {
    #[serde(deserialize_with = "string_or_number")]
    pub id: String,
    pub name: String,
    #[serde(default)]
    pub user_id: Option<String>,
    #[serde(default)]
    pub places: Vec<RouteStop>,
    #[serde(default)]
    pub total_distance: f64,
    #[serde(default)]
    pub estimated_time: f64,
    #[serde(default)]
    pub created_at: Option<DateTime<Utc>>,
}

/// Route stores hand out either numeric or string ids
fn string_or_number<'de, D>(deserializer: D) -> Result<String, D::Error>
where
    D: Deserializer<'de>,
{
    #[derive(Deserialize)]
    #[serde(untagged)]
    enum Id {
        Text(String),
        Number(i64),
    }

    Ok(match Id::deserialize(deserializer)? {
        Id::Text(s) => s,
        Id::Number(n) => n.to_string(),
    })
}
