use crate::models::domain::{Category, Coordinates, SearchQuery};
use serde::{Deserialize, Serialize};
use validator::Validate;

/// Request to search places around a point
#[derive(Debug, Clone, Serialize, Deserialize, Validate)]
pub struct SearchPlacesRequest {
    #[validate(range(min = -90.0, max = 90.0))]
    pub lat: f64,
    #[validate(range(min = -180.0, max = 180.0))]
    pub lng: f64,
    /// Search radius in meters
    #[serde(default = "default_radius")]
    #[validate(range(min = 1, max = 50000))]
    pub radius: u32,
    #[serde(default)]
    pub interests: Vec<Category>,
    /// Time budget in hours
    #[serde(default = "default_time")]
    #[validate(range(max = 24))]
    pub time: u32,
    #[serde(default)]
    pub user_id: Option<String>,
}

fn default_radius() -> u32 {
    2000
}

fn default_time() -> u32 {
    3
}

impl SearchPlacesRequest {
    pub fn to_query(&self) -> SearchQuery {
        SearchQuery {
            center: Coordinates::new(self.lat, self.lng),
            radius_m: self.radius,
            interests: self.interests.iter().copied().collect(),
            time_budget_hours: self.time,
        }
    }
}
