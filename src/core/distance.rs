use crate::models::{BoundingBox, Coordinate};

/// Earth's radius in kilometers
const EARTH_RADIUS_KM: f64 = 6371.0;

/// Calculate the Haversine distance between two points in kilometers
///
/// # Arguments
/// * `lat1` - Latitude of first point in degrees
/// * `lon1` - Longitude of first point in degrees
/// * `lat2` - Latitude of second point in degrees
/// * `lon2` - Longitude of second point in degrees
///
/// # Returns
/// Distance in kilometers, never negative
#[inline]
pub fn haversine_distance(lat1: f64, lon1: f64, lat2: f64, lon2: f64) -> f64 {
    let lat1_rad = lat1.to_radians();
    let lat2_rad = lat2.to_radians();
    let delta_lat = (lat2 - lat1).to_radians();
    let delta_lon = (lon2 - lon1).to_radians();

    let a = (delta_lat / 2.0).sin().powi(2)
        + lat1_rad.cos() * lat2_rad.cos() * (delta_lon / 2.0).sin().powi(2);
    // Rounding can push `a` a hair outside [0, 1] for antipodal points
    let a = a.clamp(0.0, 1.0);
    let c = 2.0 * a.sqrt().atan2((1.0 - a).sqrt());

    EARTH_RADIUS_KM * c
}

/// Great-circle distance between two coordinates in kilometers
#[inline]
pub fn distance_km(a: &Coordinate, b: &Coordinate) -> f64 {
    haversine_distance(a.latitude, a.longitude, b.latitude, b.longitude)
}

/// Distance between two optional locations.
///
/// `None` means the distance is unknown because one side has no location.
#[inline]
pub fn known_distance_km(a: Option<&Coordinate>, b: Option<&Coordinate>) -> Option<f64> {
    match (a, b) {
        (Some(a), Some(b)) => Some(distance_km(a, b)),
        _ => None,
    }
}

/// Calculate a bounding box that contains every point within `radius_km`
/// of the center.
///
/// Much faster than Haversine for pre-filtering. The longitude reach is the
/// exact extent of the spherical cap, `asin(sin(d) / cos(lat))` for angular
/// radius `d`. A circle that reaches a pole spans every longitude, so the box
/// is widened to the full range.
pub fn calculate_bounding_box(lat: f64, lon: f64, radius_km: f64) -> BoundingBox {
    let angular = radius_km / EARTH_RADIUS_KM;
    let lat_delta = angular.to_degrees();
    let min_lat = lat - lat_delta;
    let max_lat = lat + lat_delta;

    if min_lat <= -90.0 || max_lat >= 90.0 {
        return BoundingBox {
            min_lat: min_lat.max(-90.0),
            max_lat: max_lat.min(90.0),
            min_lon: -180.0,
            max_lon: 180.0,
        };
    }

    let ratio = angular.sin() / lat.to_radians().cos();
    let lon_delta = if ratio >= 1.0 { 180.0 } else { ratio.asin().to_degrees() };

    BoundingBox {
        min_lat,
        max_lat,
        min_lon: lon - lon_delta,
        max_lon: lon + lon_delta,
    }
}

/// Check if a point is within a bounding box
#[inline]
pub fn is_within_bounding_box(
    lat: f64,
    lon: f64,
    bbox: &BoundingBox,
) -> bool {
    lat >= bbox.min_lat
        && lat <= bbox.max_lat
        && lon >= bbox.min_lon
        && lon <= bbox.max_lon
}

/// Whether `candidate` lies within `radius_km` of `center`.
///
/// The bounding box is checked first and rejects most far-away points
/// without trigonometry.
pub fn within_radius(center: &Coordinate, candidate: &Coordinate, radius_km: f64) -> bool {
    let bbox = calculate_bounding_box(center.latitude, center.longitude, radius_km);
    // Boxes that wrap the antimeridian are left to the exact check
    let wraps = bbox.min_lon < -180.0 || bbox.max_lon > 180.0;
    if !wraps && !is_within_bounding_box(candidate.latitude, candidate.longitude, &bbox) {
        return false;
    }
    distance_km(center, candidate) <= radius_km
}
