use crate::models::{Category, PlaceSource};
use std::collections::BTreeSet;

/// Overpass tag keys whose values carry the place kind
pub const OSM_CATEGORY_KEYS: [&str; 6] = ["amenity", "tourism", "leisure", "shop", "historic", "natural"];

/// Map an OpenStreetMap tag value to a canonical category
fn osm_category(value: &str) -> Option<Category> {
    let category = match value {
        "restaurant" | "cafe" | "bar" | "fast_food" | "food_court" | "pub" | "ice_cream" => Category::Gastro,
        "museum" | "gallery" | "theatre" | "arts_centre" | "attraction" | "monument" | "memorial"
        | "castle" | "church" => Category::Culture,
        "park" | "garden" | "nature_reserve" | "beach" | "waterfall" => Category::Nature,
        "mall" | "market" | "marketplace" | "supermarket" | "clothes" => Category::Shopping,
        "cinema" | "sports_centre" => Category::Recreation,
        "bank" | "pharmacy" | "hospital" | "post_office" | "information" => Category::Services,
        _ => return None,
    };
    Some(category)
}

/// Map a Google Places type to a canonical category
fn google_category(place_type: &str) -> Option<Category> {
    let category = match place_type {
        "restaurant" | "cafe" | "bar" | "food" | "bakery" => Category::Gastro,
        "museum" | "art_gallery" | "theater" | "church" | "tourist_attraction" => Category::Culture,
        "park" | "zoo" | "aquarium" | "natural_feature" => Category::Nature,
        "shopping_mall" | "store" | "clothing_store" | "supermarket" => Category::Shopping,
        "movie_theater" | "amusement_park" | "bowling_alley" => Category::Recreation,
        "bank" | "pharmacy" | "hospital" | "post_office" => Category::Services,
        _ => return None,
    };
    Some(category)
}

/// Collect the canonical categories a set of raw source values maps to
pub fn categorize_tags<S: AsRef<str>>(source: PlaceSource, raw_types: &[S]) -> BTreeSet<Category> {
    let lookup = match source {
        PlaceSource::Osm => osm_category,
        PlaceSource::Google => google_category,
    };

    raw_types
        .iter()
        .filter_map(|raw| lookup(raw.as_ref()))
        .collect()
}

/// Pick the primary category: first tag present in priority order
pub fn primary_category(tags: &BTreeSet<Category>) -> Category {
    Category::PRIORITY
        .iter()
        .copied()
        .find(|category| tags.contains(category))
        .unwrap_or(Category::DEFAULT)
}

/// Translate requested interests into the Overpass tag vocabulary
pub fn osm_tags_for(interests: &BTreeSet<Category>) -> Vec<&'static str> {
    interests
        .iter()
        .flat_map(|interest| match interest {
            Category::Gastro => &["restaurant", "cafe", "bar", "fast_food"][..],
            Category::Culture => &["museum", "gallery", "theatre", "arts_centre"][..],
            Category::Nature => &["park", "garden", "nature_reserve"][..],
            Category::Shopping => &["mall", "market", "shop"][..],
            Category::Recreation => &["cinema", "sports_centre", "leisure"][..],
            Category::Services => &["bank", "pharmacy", "hospital", "post_office"][..],
        })
        .copied()
        .collect()
}

/// Translate requested interests into Google Places types
pub fn google_types_for(interests: &BTreeSet<Category>) -> Vec<&'static str> {
    interests
        .iter()
        .flat_map(|interest| match interest {
            Category::Gastro => &["restaurant", "cafe", "bar", "food"][..],
            Category::Culture => &["museum", "art_gallery", "theater"][..],
            Category::Nature => &["park", "zoo", "aquarium"][..],
            Category::Shopping => &["shopping_mall", "store"][..],
            Category::Recreation => &["movie_theater", "amusement_park", "bowling_alley"][..],
            Category::Services => &["bank", "pharmacy", "hospital"][..],
        })
        .copied()
        .collect()
}
