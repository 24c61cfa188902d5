//! Douglas-Peucker line simplification.
//!
//! Raw GPS traces carry thousands of points; published tracks carry tens.
//! Simplification runs at two epsilons: a user-tunable "working" epsilon for
//! the exported high-resolution track, and a fixed coarser epsilon for the
//! lightweight preview embedded in every manifest entry. The preview is
//! deliberately independent of the working epsilon so that tuning export
//! quality never changes the preview.

use geo::{algorithm::simplify::Simplify, Coord, LineString};

use crate::{geo_utils, GeoPoint};

/// Default epsilon for the exported high-resolution track, in degrees.
pub const DEFAULT_WORKING_EPSILON: f64 = 0.00002;

/// Upper end of the useful working-epsilon range, in degrees.
pub const MAX_WORKING_EPSILON: f64 = 0.0003;

/// Fixed epsilon for the coarse preview path, in degrees.
pub const PREVIEW_EPSILON: f64 = 0.005;

/// Meters per degree of latitude, for displaying epsilon as an approximate
/// precision. Display only; the algorithm itself is unit-agnostic.
pub const METERS_PER_DEGREE: f64 = 111_139.0;

/// Simplify a track with the Douglas-Peucker algorithm.
///
/// The output is a subsequence of the input with both endpoints retained;
/// every dropped point lies within `epsilon` (in coordinate units, here
/// decimal degrees) of the simplified path. Inputs with fewer than two
/// points are returned unchanged.
///
/// # Example
/// ```rust
/// use track_atlas::{simplify_track, GeoPoint};
///
/// let track = vec![
///     GeoPoint::new(35.5900, -82.5500),
///     GeoPoint::new(35.5901, -82.5490), // nearly collinear
///     GeoPoint::new(35.5902, -82.5480),
/// ];
/// let simplified = simplify_track(&track, 0.001);
/// assert_eq!(simplified.len(), 2);
/// assert_eq!(simplified[0], track[0]);
/// assert_eq!(simplified[1], track[2]);
/// ```
pub fn simplify_track(points: &[GeoPoint], epsilon: f64) -> Vec<GeoPoint> {
    if points.len() < 2 {
        return points.to_vec();
    }

    let coords: Vec<Coord> = points
        .iter()
        .map(|p| Coord { x: p.lng, y: p.lat })
        .collect();

    let line = LineString::new(coords);
    let simplified = line.simplify(&epsilon);

    simplified
        .coords()
        .map(|c| GeoPoint::new(c.y, c.x))
        .collect()
}

/// Convert an epsilon in degrees to an approximate precision in meters.
#[inline]
pub fn epsilon_to_meters(epsilon: f64) -> f64 {
    epsilon * METERS_PER_DEGREE
}

/// Quality report for one simplification run.
///
/// Surfaced to the operator as a data-quality signal while tuning the
/// working epsilon; nothing downstream depends on it.
#[derive(Debug, Clone)]
pub struct SimplificationStats {
    pub raw_points: usize,
    pub simplified_points: usize,
    /// Fraction of points removed, 0-100.
    pub reduction_percent: f64,
    pub raw_miles: f64,
    pub simplified_miles: f64,
    /// Mileage lost to straightening, in feet. Always >= 0.
    pub distance_loss_feet: f64,
}

impl SimplificationStats {
    /// Compare a raw track against its simplified form.
    pub fn measure(raw: &[GeoPoint], simplified: &[GeoPoint]) -> Self {
        let raw_miles = geo_utils::total_distance_miles(raw);
        let simplified_miles = geo_utils::total_distance_miles(simplified);
        let reduction_percent = if raw.is_empty() {
            0.0
        } else {
            (1.0 - simplified.len() as f64 / raw.len() as f64) * 100.0
        };

        Self {
            raw_points: raw.len(),
            simplified_points: simplified.len(),
            reduction_percent,
            raw_miles,
            simplified_miles,
            distance_loss_feet: (raw_miles - simplified_miles) * geo_utils::FEET_PER_MILE,
        }
    }
}
