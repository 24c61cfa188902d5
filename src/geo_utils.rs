//! # Geographic Utilities
//!
//! Core geographic computations shared by the import and hit-testing paths.
//!
//! | Function | Description |
//! |----------|-------------|
//! | [`great_circle_miles`] | Great-circle distance between two points, in miles |
//! | [`total_distance_miles`] | Total length of a track in miles |
//! | [`point_segment_distance`] | Degree-space distance from a point to a clamped segment |
//!
//! Distances destined for the operator (mileage, distance loss) are computed
//! on the sphere in miles. Hit-testing distances stay in decimal degrees,
//! the same unit as click tolerances, so no conversion happens on that path.

use crate::GeoPoint;

/// Earth radius in miles, matching the published track mileage figures.
pub const EARTH_RADIUS_MILES: f64 = 3958.8;

/// Feet per mile, for the distance-loss quality signal.
pub const FEET_PER_MILE: f64 = 5280.0;

// =============================================================================
// Distance Functions
// =============================================================================

/// Great-circle distance between two points, in miles.
///
/// Uses the haversine form, which stays well-conditioned for the short
/// segments that dominate GPS traces.
///
/// # Example
///
/// ```rust
/// use track_atlas::GeoPoint;
/// use track_atlas::geo_utils::great_circle_miles;
///
/// let asheville = GeoPoint::new(35.5951, -82.5515);
/// let boone = GeoPoint::new(36.2168, -81.6746);
/// let dist = great_circle_miles(&asheville, &boone);
/// assert!((dist - 65.0).abs() < 5.0);
/// ```
#[inline]
pub fn great_circle_miles(p1: &GeoPoint, p2: &GeoPoint) -> f64 {
    let d_lat = (p2.lat - p1.lat).to_radians();
    let d_lng = (p2.lng - p1.lng).to_radians();
    let a = (d_lat / 2.0).sin().powi(2)
        + p1.lat.to_radians().cos() * p2.lat.to_radians().cos() * (d_lng / 2.0).sin().powi(2);
    let c = 2.0 * a.sqrt().atan2((1.0 - a).sqrt());
    EARTH_RADIUS_MILES * c
}

/// Total length of a track in miles.
///
/// Sums pairwise great-circle distances between consecutive points.
/// Empty and single-point tracks have length 0.
pub fn total_distance_miles(points: &[GeoPoint]) -> f64 {
    if points.len() < 2 {
        return 0.0;
    }

    points
        .windows(2)
        .map(|w| great_circle_miles(&w[0], &w[1]))
        .sum()
}

// =============================================================================
// Segment Distance
// =============================================================================

/// Distance in decimal degrees from a point to the segment `a`-`b`.
///
/// The closest point is clamped to the segment, not the infinite line.
/// A zero-length segment degenerates to plain point distance.
///
/// This is planar math on raw lat/lng values; at click-tolerance scales the
/// projection error is far below GPS noise, and it keeps the result in the
/// same unit as the zoom-derived tolerance.
pub fn point_segment_distance(p: &GeoPoint, a: &GeoPoint, b: &GeoPoint) -> f64 {
    let dx = b.lng - a.lng;
    let dy = b.lat - a.lat;
    let len_sq = dx * dx + dy * dy;

    if len_sq == 0.0 {
        return (p.lng - a.lng).hypot(p.lat - a.lat);
    }

    let t = (((p.lng - a.lng) * dx + (p.lat - a.lat) * dy) / len_sq).clamp(0.0, 1.0);
    let closest_lng = a.lng + t * dx;
    let closest_lat = a.lat + t * dy;

    (p.lng - closest_lng).hypot(p.lat - closest_lat)
}

// =============================================================================
// Unit Tests
// =============================================================================

#[cfg(test)]
mod tests {
    use super::*;

    fn approx_eq(a: f64, b: f64, epsilon: f64) -> bool {
        (a - b).abs() < epsilon
    }

    #[test]
    fn test_great_circle_same_point() {
        let p = GeoPoint::new(35.5951, -82.5515);
        assert_eq!(great_circle_miles(&p, &p), 0.0);
    }

    #[test]
    fn test_great_circle_known_value() {
        // New York to Los Angeles is about 2,445 miles
        let nyc = GeoPoint::new(40.7128, -74.0060);
        let la = GeoPoint::new(34.0522, -118.2437);
        let dist = great_circle_miles(&nyc, &la);
        assert!(approx_eq(dist, 2445.0, 20.0));
    }

    #[test]
    fn test_total_distance_degenerate() {
        let empty: Vec<GeoPoint> = vec![];
        assert_eq!(total_distance_miles(&empty), 0.0);

        let single = vec![GeoPoint::new(35.5951, -82.5515)];
        assert_eq!(total_distance_miles(&single), 0.0);
    }

    #[test]
    fn test_total_distance_is_sum_of_legs() {
        let a = GeoPoint::new(35.59, -82.55);
        let b = GeoPoint::new(35.60, -82.55);
        let c = GeoPoint::new(35.61, -82.55);
        let legs = great_circle_miles(&a, &b) + great_circle_miles(&b, &c);
        let total = total_distance_miles(&[a, b, c]);
        assert!(approx_eq(total, legs, 1e-12));
    }

    #[test]
    fn test_point_segment_distance_on_segment() {
        let a = GeoPoint::new(0.0, 0.0);
        let b = GeoPoint::new(0.0, 1.0);
        let mid = GeoPoint::new(0.0, 0.5);
        assert_eq!(point_segment_distance(&mid, &a, &b), 0.0);
    }

    #[test]
    fn test_point_segment_distance_perpendicular() {
        let a = GeoPoint::new(0.0, 0.0);
        let b = GeoPoint::new(0.0, 1.0);
        let p = GeoPoint::new(0.25, 0.5);
        assert!(approx_eq(point_segment_distance(&p, &a, &b), 0.25, 1e-12));
    }

    #[test]
    fn test_point_segment_distance_clamps_to_endpoint() {
        let a = GeoPoint::new(0.0, 0.0);
        let b = GeoPoint::new(0.0, 1.0);
        // Beyond b: distance is to b itself, not the infinite line
        let p = GeoPoint::new(0.0, 2.0);
        assert!(approx_eq(point_segment_distance(&p, &a, &b), 1.0, 1e-12));
    }

    #[test]
    fn test_point_segment_distance_degenerate_segment() {
        let a = GeoPoint::new(1.0, 1.0);
        let p = GeoPoint::new(1.0, 2.0);
        assert!(approx_eq(point_segment_distance(&p, &a, &a), 1.0, 1e-12));
    }
}
