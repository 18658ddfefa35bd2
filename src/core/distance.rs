use crate::models::{BoundingBox, Coordinates};

/// Earth's mean radius in meters
pub const EARTH_RADIUS_M: f64 = 6_371_000.0;

/// Calculate the Haversine distance between two points in meters
///
/// # Arguments
/// * `lat1` - Latitude of first point in degrees
/// * `lon1` - Longitude of first point in degrees
/// * `lat2` - Latitude of second point in degrees
/// * `lon2` - Longitude of second point in degrees
///
/// # Returns
/// Distance in meters
#[inline]
pub fn haversine_distance(lat1: f64, lon1: f64, lat2: f64, lon2: f64) -> f64 {
    let lat1_rad = lat1.to_radians();
    let lat2_rad = lat2.to_radians();
    let delta_lat = (lat2 - lat1).to_radians();
    let delta_lon = (lon2 - lon1).to_radians();

    let a = (delta_lat / 2.0).sin().powi(2)
        + lat1_rad.cos() * lat2_rad.cos() * (delta_lon / 2.0).sin().powi(2);
    let c = 2.0 * a.sqrt().atan2((1.0 - a).sqrt());

    EARTH_RADIUS_M * c
}

/// Haversine distance between two coordinate pairs in meters
#[inline]
pub fn distance_between(from: &Coordinates, to: &Coordinates) -> f64 {
    haversine_distance(from.latitude, from.longitude, to.latitude, to.longitude)
}

/// Calculate a bounding box around a center point
///
/// Small-angle approximation: the latitude delta is the radius as an arc
/// angle, and the longitude delta widens by 1/cos(latitude).
///
/// # Arguments
/// * `lat` - Center latitude in degrees
/// * `lon` - Center longitude in degrees
/// * `radius_m` - Radius in meters
///
/// # Returns
/// BoundingBox with min/max lat/lon
pub fn calculate_bounding_box(lat: f64, lon: f64, radius_m: f64) -> BoundingBox {
    let lat_delta = (radius_m / EARTH_RADIUS_M).to_degrees();
    let lon_delta = lat_delta / lat.to_radians().cos();

    BoundingBox {
        min_lat: lat - lat_delta,
        max_lat: lat + lat_delta,
        min_lon: lon - lon_delta,
        max_lon: lon + lon_delta,
    }
}
