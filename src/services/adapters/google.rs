use async_trait::async_trait;
use reqwest::Client;
use serde::Deserialize;
use std::collections::BTreeSet;
use std::time::Duration;

use super::{AdapterError, SourceAdapter, SourceRequest};
use crate::core::categorizer::google_types_for;
use crate::core::normalize::normalize_place;
use crate::models::{Category, Place, PlaceSource, RawPlace};

pub const DEFAULT_GOOGLE_ENDPOINT: &str = "https://maps.googleapis.com/maps/api/place/nearbysearch/json";

/// Google Places nearby-search adapter
///
/// Without an API key the adapter reports `MissingCredentials` and makes no
/// network call.
pub struct GooglePlacesAdapter {
    client: Client,
    endpoint: String,
    api_key: Option<String>,
}

impl GooglePlacesAdapter {
    pub fn new(endpoint: String, api_key: Option<String>, request_timeout: Duration) -> Result<Self, reqwest::Error> {
        let client = Client::builder().timeout(request_timeout).build()?;

        Ok(Self {
            client,
            endpoint,
            api_key: api_key.filter(|key| !key.trim().is_empty()),
        })
    }

    pub fn has_credentials(&self) -> bool {
        self.api_key.is_some()
    }
}

#[async_trait]
impl SourceAdapter for GooglePlacesAdapter {
    fn source(&self) -> PlaceSource {
        PlaceSource::Google
    }

    fn translate_interests(&self, interests: &BTreeSet<Category>) -> Vec<&'static str> {
        google_types_for(interests)
    }

    async fn fetch(&self, request: &SourceRequest) -> Result<Vec<Place>, AdapterError> {
        let Some(api_key) = self.api_key.as_deref() else {
            return Err(AdapterError::MissingCredentials(PlaceSource::Google));
        };

        let location = format!("{},{}", request.center.latitude, request.center.longitude);
        let radius = request.radius_m.to_string();
        let mut params = vec![("location", location), ("radius", radius)];
        if !request.types.is_empty() {
            params.push(("type", request.types.join("|")));
        }
        params.push(("key", api_key.to_string()));

        let response = self.client.get(&self.endpoint).query(&params).send().await?;

        if !response.status().is_success() {
            return Err(AdapterError::ApiError(format!(
                "Google Places request failed: {}",
                response.status()
            )));
        }

        let body: NearbySearchResponse = response
            .json()
            .await
            .map_err(|e| AdapterError::InvalidResponse(format!("invalid Google Places payload: {}", e)))?;

        match body.status.as_str() {
            "OK" | "ZERO_RESULTS" => {}
            status => {
                return Err(AdapterError::ApiError(format!(
                    "Google Places status {}: {}",
                    status,
                    body.error_message.unwrap_or_default()
                )));
            }
        }

        Ok(body
            .results
            .into_iter()
            .filter_map(NearbyResult::into_raw)
            .filter_map(|raw| normalize_place(raw, &request.center))
            .collect())
    }
}

#[derive(Debug, Deserialize)]
struct NearbySearchResponse {
    #[serde(default)]
    results: Vec<NearbyResult>,
    #[serde(default = "default_status")]
    status: String,
    #[serde(default)]
    error_message: Option<String>,
}

fn default_status() -> String {
    "OK".to_string()
}

#[derive(Debug, Deserialize)]
struct NearbyResult {
    #[serde(default)]
    place_id: Option<String>,
    #[serde(default)]
    name: Option<String>,
    #[serde(default)]
    geometry: Option<Geometry>,
    #[serde(default)]
    types: Vec<String>,
    #[serde(default)]
    rating: Option<f64>,
    #[serde(default)]
    vicinity: Option<String>,
}

#[derive(Debug, Deserialize)]
struct Geometry {
    location: LatLng,
}

#[derive(Debug, Deserialize)]
struct LatLng {
    lat: f64,
    lng: f64,
}

impl NearbyResult {
    /// Results without a place id cannot be referenced again and are dropped
    fn into_raw(self) -> Option<RawPlace> {
        let native_id = self.place_id.filter(|id| !id.trim().is_empty())?;
        let location = self.geometry.map(|g| g.location);

        Some(RawPlace {
            source: PlaceSource::Google,
            native_id,
            name: self.name,
            latitude: location.as_ref().map(|l| l.lat),
            longitude: location.as_ref().map(|l| l.lng),
            raw_types: self.types,
            rating: self.rating,
            address: self.vicinity.unwrap_or_default(),
        })
    }
}
