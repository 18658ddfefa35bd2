use crate::core::categorizer::{categorize_tags, primary_category};
use crate::core::distance::distance_between;
use crate::models::{Coordinates, Place, RawPlace, DEFAULT_RATING, UNNAMED_PLACE};

/// Turn a source record into a canonical place
///
/// Returns `None` when the record has no usable coordinates.
pub fn normalize_place(raw: RawPlace, center: &Coordinates) -> Option<Place> {
    let coordinates = Coordinates::checked(raw.latitude?, raw.longitude?)?;

    let name = raw
        .name
        .as_deref()
        .map(str::trim)
        .filter(|name| !name.is_empty())
        .unwrap_or(UNNAMED_PLACE)
        .to_string();

    let tags = categorize_tags(raw.source, &raw.raw_types);
    let category = primary_category(&tags);

    let rating = raw
        .rating
        .filter(|r| r.is_finite())
        .map(|r| r.clamp(0.0, 5.0))
        .unwrap_or(DEFAULT_RATING);

    Some(Place {
        id: format!("{}_{}", raw.source.id_prefix(), raw.native_id),
        name,
        coordinates,
        tags,
        category,
        rating,
        verified: raw.source.is_authoritative(),
        source: raw.source,
        address: raw.address,
        distance_from_query: distance_between(center, &coordinates),
        relevance_score: 0.0,
        score: 0.0,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::{Category, PlaceSource};

    fn raw(source: PlaceSource) -> RawPlace {
        RawPlace {
            source,
            native_id: "123".to_string(),
            name: Some("  Café Mulato ".to_string()),
            latitude: Some(4.4410),
            longitude: Some(-75.2040),
            raw_types: vec!["cafe".to_string()],
            rating: None,
            address: String::new(),
        }
    }

    #[test]
    fn test_normalize_osm_place() {
        let center = Coordinates::new(4.4399, -75.2050);
        let place = normalize_place(raw(PlaceSource::Osm), &center).unwrap();

        assert_eq!(place.id, "osm_123");
        assert_eq!(place.name, "Café Mulato");
        assert_eq!(place.category, Category::Gastro);
        assert_eq!(place.rating, DEFAULT_RATING);
        assert!(!place.verified);
        assert!(place.distance_from_query > 0.0 && place.distance_from_query < 300.0);
    }

    #[test]
    fn test_google_places_are_verified() {
        let center = Coordinates::new(4.4399, -75.2050);
        let mut record = raw(PlaceSource::Google);
        record.rating = Some(7.5);
        let place = normalize_place(record, &center).unwrap();

        assert_eq!(place.id, "google_123");
        assert!(place.verified);
        assert_eq!(place.rating, 5.0);
    }

    #[test]
    fn test_missing_name_gets_placeholder() {
        let center = Coordinates::new(4.4399, -75.2050);
        let mut record = raw(PlaceSource::Osm);
        record.name = Some("   ".to_string());
        assert_eq!(normalize_place(record, &center).unwrap().name, UNNAMED_PLACE);
    }

    #[test]
    fn test_missing_or_invalid_coordinates_dropped() {
        let center = Coordinates::new(4.4399, -75.2050);

        let mut record = raw(PlaceSource::Osm);
        record.latitude = None;
        record.longitude = None;
        assert!(normalize_place(record, &center).is_none());

        let mut record = raw(PlaceSource::Osm);
        record.latitude = Some(120.0);
        assert!(normalize_place(record, &center).is_none());
    }
}
