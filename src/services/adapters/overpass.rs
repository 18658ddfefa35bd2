use async_trait::async_trait;
use reqwest::Client;
use serde::Deserialize;
use std::collections::{BTreeMap, BTreeSet};
use std::time::Duration;

use super::{AdapterError, SourceAdapter, SourceRequest};
use crate::core::categorizer::{osm_tags_for, OSM_CATEGORY_KEYS};
use crate::core::distance::calculate_bounding_box;
use crate::core::normalize::normalize_place;
use crate::models::{BoundingBox, Category, Coordinates, Place, PlaceSource, RawPlace};

pub const DEFAULT_OVERPASS_ENDPOINT: &str = "https://overpass-api.de/api/interpreter";
pub const DEFAULT_QUERY_TIMEOUT_SECS: u32 = 25;

/// Tag groups requested from Overpass, one node selector each
const TAG_GROUPS: [(&str, &str); 6] = [
    ("amenity", "restaurant|cafe|bar|fast_food|food_court"),
    ("tourism", "museum|gallery|attraction|information"),
    ("leisure", "park|garden|sports_centre"),
    ("shop", "mall|market|supermarket|clothes"),
    ("historic", "monument|memorial|castle|church"),
    ("natural", "park|beach|waterfall"),
];

/// OpenStreetMap adapter backed by an Overpass interpreter
pub struct OverpassAdapter {
    client: Client,
    endpoint: String,
    query_timeout_secs: u32,
}

impl OverpassAdapter {
    /// Create an adapter with an explicit request timeout
    pub fn new(endpoint: String, request_timeout: Duration, query_timeout_secs: u32) -> Result<Self, reqwest::Error> {
        let client = Client::builder().timeout(request_timeout).build()?;

        Ok(Self {
            client,
            endpoint,
            query_timeout_secs: query_timeout_secs.max(1),
        })
    }
}

#[async_trait]
impl SourceAdapter for OverpassAdapter {
    fn source(&self) -> PlaceSource {
        PlaceSource::Osm
    }

    fn translate_interests(&self, interests: &BTreeSet<Category>) -> Vec<&'static str> {
        osm_tags_for(interests)
    }

    async fn fetch(&self, request: &SourceRequest) -> Result<Vec<Place>, AdapterError> {
        let bbox = calculate_bounding_box(
            request.center.latitude,
            request.center.longitude,
            request.radius_m as f64,
        );
        let query = build_overpass_query(&bbox, self.query_timeout_secs);

        // The query covers fixed tag groups; interests only shape ranking
        tracing::debug!("Querying Overpass (requested tags: {:?})", request.types);

        let response = self
            .client
            .post(&self.endpoint)
            .header(reqwest::header::ACCEPT, "application/json")
            .form(&[("data", query)])
            .send()
            .await?;

        if !response.status().is_success() {
            return Err(AdapterError::ApiError(format!(
                "Overpass query failed: {}",
                response.status()
            )));
        }

        let body = response.bytes().await?;
        let decoded: OverpassResponse = serde_json::from_slice(&body)
            .map_err(|e| AdapterError::InvalidResponse(format!("invalid Overpass JSON payload: {}", e)))?;

        Ok(decoded
            .elements
            .into_iter()
            .filter_map(|element| normalize_place(element.into_raw(), &request.center))
            .collect())
    }
}

/// Build the Overpass QL query for a bounding box
pub fn build_overpass_query(bbox: &BoundingBox, query_timeout_secs: u32) -> String {
    let area = format!("{},{},{},{}", bbox.min_lat, bbox.min_lon, bbox.max_lat, bbox.max_lon);

    let selectors: String = TAG_GROUPS
        .iter()
        .map(|(key, values)| format!("node[\"{}\"~\"{}\"][\"name\"]({});", key, values, area))
        .collect();

    format!("[out:json][timeout:{}];({});out center meta;", query_timeout_secs, selectors)
}

#[derive(Debug, Deserialize)]
struct OverpassResponse {
    #[serde(default)]
    elements: Vec<OverpassElement>,
}

#[derive(Debug, Deserialize)]
struct OverpassElement {
    id: i64,
    lat: Option<f64>,
    lon: Option<f64>,
    center: Option<OverpassCenter>,
    #[serde(default)]
    tags: BTreeMap<String, String>,
}

#[derive(Debug, Deserialize)]
struct OverpassCenter {
    lat: f64,
    lon: f64,
}

impl OverpassElement {
    fn coordinates(&self) -> Option<Coordinates> {
        if let (Some(lat), Some(lon)) = (self.lat, self.lon) {
            return Some(Coordinates::new(lat, lon));
        }
        self.center.as_ref().map(|c| Coordinates::new(c.lat, c.lon))
    }

    fn into_raw(self) -> RawPlace {
        let coordinates = self.coordinates();

        // Values may be ';'-separated lists, e.g. amenity=cafe;bar
        let raw_types = OSM_CATEGORY_KEYS
            .iter()
            .filter_map(|key| self.tags.get(*key))
            .flat_map(|value| value.split(';').map(|v| v.trim().to_string()))
            .collect();

        RawPlace {
            source: PlaceSource::Osm,
            native_id: self.id.to_string(),
            name: self.tags.get("name").cloned(),
            latitude: coordinates.map(|c| c.latitude),
            longitude: coordinates.map(|c| c.longitude),
            raw_types,
            rating: None,
            address: build_address(&self.tags),
        }
    }
}

/// Best-effort address from addr:* tags
fn build_address(tags: &BTreeMap<String, String>) -> String {
    ["addr:street", "addr:housenumber", "addr:city"]
        .iter()
        .filter_map(|key| tags.get(*key))
        .map(|part| part.trim())
        .filter(|part| !part.is_empty())
        .collect::<Vec<_>>()
        .join(" ")
}
