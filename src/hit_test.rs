//! Click-to-track spatial hit testing.
//!
//! Given a map click and a zoom level, narrow the whole catalog down to the
//! tracks actually under the cursor:
//!
//! 1. Derive a tolerance that shrinks with zoom, so the click target tracks
//!    the on-screen size of a fingertip.
//! 2. Prune with an O(1) box test per entry against the entry's stored
//!    endpoint-pair box - a full O(n) scan that stays cheap for large
//!    catalogs.
//! 3. For survivors, measure the click against every segment of the best
//!    available geometry: the cached full-resolution track when loaded,
//!    otherwise the preview. A padded per-segment box check skips the
//!    distance math for segments nowhere near the click.
//! 4. Rank survivors by descending activity date; the caller surfaces a
//!    disambiguation choice when more than one remains.
//!
//! No survivors is an empty result, not an error.

use std::cmp::Ordering;

#[cfg(feature = "parallel")]
use rayon::prelude::*;

use crate::catalog::CatalogIndex;
use crate::geo_utils::point_segment_distance;
use crate::{Bounds, GeoPoint, ManifestEntry, ResolutionCache};

/// Tolerance in degrees at zoom 0. On 256-pixel web-mercator tiles one
/// pixel spans about `1.40625 / 2^zoom` degrees, so this constant keeps the
/// click target near 11 pixels at every zoom.
pub const TOLERANCE_SCALE: f64 = 16.0;

/// Hit tolerance in degrees for a given zoom level.
///
/// Halves with every zoom step: `TOLERANCE_SCALE / 2^zoom`.
#[inline]
pub fn click_tolerance(zoom: u8) -> f64 {
    TOLERANCE_SCALE / 2f64.powi(zoom as i32)
}

/// Identify the catalog entries under a map click.
///
/// Uses the cached full-resolution sequence for entries that have one and
/// the manifest preview otherwise, so precision improves as tracks load.
/// Returns entries ordered most-recent-first; empty, singleton and multiple
/// results are all ordinary outcomes.
pub fn hit_test(
    click: &GeoPoint,
    zoom: u8,
    catalog: &CatalogIndex,
    cache: &ResolutionCache,
) -> Vec<ManifestEntry> {
    let tolerance = click_tolerance(zoom);

    // Prune: O(1) per entry against the stored endpoint-pair box. Entries
    // without a usable box are never candidates.
    let candidates: Vec<&ManifestEntry> = catalog
        .all()
        .iter()
        .filter(|entry| {
            entry
                .endpoint_box()
                .is_some_and(|bbox| bbox.padded(tolerance).contains(click))
        })
        .collect();

    let candidate_count = candidates.len();
    let precise = |entry: &&ManifestEntry| -> bool {
        match cache.get(&entry.id) {
            Some(points) => track_hit(click, &points, tolerance),
            None => track_hit(click, &entry.preview, tolerance),
        }
    };

    #[cfg(feature = "parallel")]
    let mut hits: Vec<ManifestEntry> = candidates
        .into_par_iter()
        .filter(precise)
        .map(ManifestEntry::clone)
        .collect();

    #[cfg(not(feature = "parallel"))]
    let mut hits: Vec<ManifestEntry> = candidates
        .into_iter()
        .filter(precise)
        .map(ManifestEntry::clone)
        .collect();

    // Most recent activity first; undated entries last; the sort is stable
    // so ties keep manifest order.
    hits.sort_by(|a, b| match (a.date_key(), b.date_key()) {
        (Some(da), Some(db)) => db.cmp(&da),
        (Some(_), None) => Ordering::Less,
        (None, Some(_)) => Ordering::Greater,
        (None, None) => Ordering::Equal,
    });

    log::debug!(
        "hit test at ({:.5}, {:.5}) zoom {}: {} candidate(s), {} hit(s)",
        click.lat,
        click.lng,
        zoom,
        candidate_count,
        hits.len()
    );

    hits
}

/// Whether a click falls within `tolerance` of any segment of a track.
///
/// Distance is measured to the segment, clamped at its endpoints. A zero
/// or negative tolerance never matches; duplicate-point segments are
/// skipped.
pub fn track_hit(click: &GeoPoint, points: &[GeoPoint], tolerance: f64) -> bool {
    if tolerance <= 0.0 {
        return false;
    }

    points.windows(2).any(|seg| {
        let (a, b) = (&seg[0], &seg[1]);
        if a == b {
            return false;
        }
        // Cheap reject before the distance math
        if !Bounds::from_corner_points(a, b).padded(tolerance).contains(click) {
            return false;
        }
        point_segment_distance(click, a, b) < tolerance
    })
}

// ============================================================================
// Tests
// ============================================================================

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{ActivityType, CatalogIndex, ResolutionCache};

    fn entry_with_preview(id: &str, date: &str, preview: Vec<GeoPoint>) -> ManifestEntry {
        let bounds = vec![*preview.first().unwrap(), *preview.last().unwrap()];
        ManifestEntry {
            id: id.to_string(),
            name: id.to_string(),
            date: date.to_string(),
            activity_type: ActivityType::Hike,
            has_blog: false,
            bounds,
            preview,
            track_url: format!("/data/tracks/{id}.json"),
        }
    }

    /// A simple southwest-to-northeast diagonal; its endpoint box covers
    /// every vertex.
    fn diagonal(origin_lat: f64, origin_lng: f64) -> Vec<GeoPoint> {
        (0..10)
            .map(|i| GeoPoint::new(origin_lat + i as f64 * 0.01, origin_lng + i as f64 * 0.01))
            .collect()
    }

    #[test]
    fn test_click_tolerance_halves_per_zoom() {
        assert_eq!(click_tolerance(0), TOLERANCE_SCALE);
        for zoom in 0..20u8 {
            let ratio = click_tolerance(zoom) / click_tolerance(zoom + 1);
            assert!((ratio - 2.0).abs() < 1e-12);
        }
    }

    #[test]
    fn test_vertex_click_hits_at_every_zoom() {
        let preview = diagonal(35.59, -82.55);
        let vertex = preview[4];
        let catalog = CatalogIndex::load(vec![entry_with_preview(
            "trail",
            "2023-05-01T12:00",
            preview,
        )]);
        let cache = ResolutionCache::new();

        for zoom in 0..=20u8 {
            let hits = hit_test(&vertex, zoom, &catalog, &cache);
            assert_eq!(hits.len(), 1, "missed at zoom {zoom}");
            assert_eq!(hits[0].id, "trail");
        }
    }

    #[test]
    fn test_far_click_returns_empty() {
        let catalog = CatalogIndex::load(vec![entry_with_preview(
            "trail",
            "2023-05-01T12:00",
            diagonal(35.59, -82.55),
        )]);
        let cache = ResolutionCache::new();

        // Another continent, at a zoom whose tolerance is far below the gap
        let click = GeoPoint::new(48.8566, 2.3522);
        assert!(hit_test(&click, 10, &catalog, &cache).is_empty());
    }

    #[test]
    fn test_overlapping_tracks_ranked_most_recent_first() {
        let shared = diagonal(35.59, -82.55);
        let catalog = CatalogIndex::load(vec![
            entry_with_preview("older", "2022-03-14T09:00", shared.clone()),
            entry_with_preview("newer", "2023-05-01T12:00", shared.clone()),
        ]);
        let cache = ResolutionCache::new();

        let hits = hit_test(&shared[3], 12, &catalog, &cache);
        assert_eq!(hits.len(), 2);
        assert_eq!(hits[0].id, "newer");
        assert_eq!(hits[1].id, "older");
    }

    #[test]
    fn test_undated_entries_rank_last() {
        let shared = diagonal(35.59, -82.55);
        let catalog = CatalogIndex::load(vec![
            entry_with_preview("undated", "unknown", shared.clone()),
            entry_with_preview("dated", "2020-01-01T08:00", shared.clone()),
        ]);
        let cache = ResolutionCache::new();

        let hits = hit_test(&shared[3], 12, &catalog, &cache);
        assert_eq!(hits.len(), 2);
        assert_eq!(hits[0].id, "dated");
        assert_eq!(hits[1].id, "undated");
    }

    #[test]
    fn test_zero_tolerance_never_matches() {
        let points = diagonal(35.59, -82.55);
        assert!(!track_hit(&points[0], &points, 0.0));
    }

    #[test]
    fn test_degenerate_segments_skipped() {
        let p = GeoPoint::new(35.59, -82.55);
        // Single point: no segment at all
        assert!(!track_hit(&p, &[p], 0.01));
        // Duplicate-point segment: skipped, not a zero-distance match
        assert!(!track_hit(&p, &[p, p], 0.01));
    }

    #[test]
    fn test_cached_track_refines_precision() {
        // The full-resolution track bows away from the straight chord the
        // preview reduces it to; the apex stays inside the endpoint box so
        // pruning keeps the entry either way.
        let full: Vec<GeoPoint> = vec![
            GeoPoint::new(35.590, -82.550),
            GeoPoint::new(35.605, -82.500), // apex, ~0.005 deg off the chord
            GeoPoint::new(35.620, -82.400),
        ];
        let preview = vec![full[0], full[2]];
        let entry = entry_with_preview("bowed", "2023-05-01T12:00", preview);

        let catalog = CatalogIndex::load(vec![entry]);
        let cache = ResolutionCache::new();
        let apex = full[1];

        // Preview resolution: the apex is farther than the zoom-12
        // tolerance (~0.0039 deg) from the straightened chord
        assert!(hit_test(&apex, 12, &catalog, &cache).is_empty());

        // Once the full track is cached, the same click hits
        cache.insert("bowed", full);
        let hits = hit_test(&apex, 12, &catalog, &cache);
        assert_eq!(hits.len(), 1);
        assert_eq!(hits[0].id, "bowed");
    }

    #[test]
    fn test_endpoint_box_prune_can_miss_looping_tracks() {
        // An L-shaped path whose corner vertex lies outside the thin box
        // spanned by its endpoints - the preserved manifest behavior prunes
        // it away even though the click is exactly on the track.
        let path = vec![
            GeoPoint::new(35.590, -82.550),
            GeoPoint::new(35.590, -82.400), // corner, far east of both endpoints' box
            GeoPoint::new(35.592, -82.548),
        ];
        let catalog = CatalogIndex::load(vec![entry_with_preview(
            "ell",
            "2023-05-01T12:00",
            path.clone(),
        )]);
        let cache = ResolutionCache::new();

        let corner = path[1];
        assert!(hit_test(&corner, 14, &catalog, &cache).is_empty());
    }
}
