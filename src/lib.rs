//! # Track Atlas
//!
//! GPS track cataloging for outdoor activities.
//!
//! This library provides:
//! - Douglas-Peucker line simplification with bounded geometric error
//! - Import of raw GPX / GeoJSON-like / coordinate-array traces
//! - Deterministic manifest-entry authoring (catalog export)
//! - Spatial hit-testing of map clicks against the catalog
//! - Lazy, single-flight loading of full-resolution tracks
//!
//! ## Features
//!
//! - **`parallel`** - Parallel precise hit-testing with rayon
//! - **`http`** - HTTP client for fetching the manifest and per-track files
//! - **`full`** - Enable all features
//!
//! ## Quick Start
//!
//! ```rust
//! use track_atlas::{import_track, build_entry, EntryConfig, ActivityType};
//!
//! let raw = import_track("[[35.59, -82.55], [35.60, -82.54]]", "morning-walk.json", None).unwrap();
//! let export = build_entry(&raw, &EntryConfig {
//!     epsilon: track_atlas::DEFAULT_WORKING_EPSILON,
//!     activity_type: ActivityType::Walk,
//!     has_blog: false,
//! });
//!
//! assert!(export.entry.preview.len() >= 2);
//! assert_eq!(export.entry.track_url, format!("/data/tracks/{}.json", export.entry.id));
//! ```

use serde::{Deserialize, Serialize};

// Unified error handling
pub mod error;
pub use error::{AtlasError, Result};

// Geographic utilities (distance, segment distance, bounds)
pub mod geo_utils;
pub use geo_utils::total_distance_miles;

// Douglas-Peucker simplification and quality stats
pub mod simplify;
pub use simplify::{
    simplify_track, SimplificationStats, DEFAULT_WORKING_EPSILON, MAX_WORKING_EPSILON,
    METERS_PER_DEGREE, PREVIEW_EPSILON,
};

// Raw trace import (GPX / GeoJSON-like / bare coordinate arrays)
pub mod import;
pub use import::{import_track, RawTrace, SourceFormat};

// Manifest entries and export artifacts
pub mod manifest;
pub use manifest::{
    build_entry, generate_id, slugify, ActivityType, EntryConfig, ManifestEntry, TrackExport,
    PENDING_ID,
};

// In-memory catalog of manifest entries
pub mod catalog;
pub use catalog::CatalogIndex;

// Lazily loaded full-resolution tracks
pub mod cache;
pub use cache::{ResolutionCache, StaticTrackSource, TrackSource};

#[cfg(feature = "http")]
pub use cache::HttpTrackSource;

// Click-to-track spatial hit testing
pub mod hit_test;
pub use hit_test::{click_tolerance, hit_test, TOLERANCE_SCALE};

// Viewing-side session state (catalog + cache + highlight)
pub mod session;
pub use session::{SessionContext, TrackStyle};

// ============================================================================
// Core Types
// ============================================================================

/// A geographic coordinate in decimal degrees.
///
/// Serializes to and from a two-element `[lat, lng]` JSON array, the wire
/// format used by the manifest and per-track files.
///
/// # Example
/// ```
/// use track_atlas::GeoPoint;
/// let point = GeoPoint::new(35.5951, -82.5515); // Asheville
/// assert_eq!(serde_json::to_string(&point).unwrap(), "[35.5951,-82.5515]");
/// ```
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(from = "[f64; 2]", into = "[f64; 2]")]
pub struct GeoPoint {
    pub lat: f64,
    pub lng: f64,
}

impl GeoPoint {
    /// Create a new geographic point.
    pub fn new(lat: f64, lng: f64) -> Self {
        Self { lat, lng }
    }

    /// Check that the point has finite, in-range coordinates.
    pub fn is_valid(&self) -> bool {
        self.lat.is_finite()
            && self.lng.is_finite()
            && self.lat >= -90.0
            && self.lat <= 90.0
            && self.lng >= -180.0
            && self.lng <= 180.0
    }
}

impl From<[f64; 2]> for GeoPoint {
    fn from(pair: [f64; 2]) -> Self {
        Self { lat: pair[0], lng: pair[1] }
    }
}

impl From<GeoPoint> for [f64; 2] {
    fn from(p: GeoPoint) -> Self {
        [p.lat, p.lng]
    }
}

/// Axis-aligned bounding box in decimal degrees.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Bounds {
    pub min_lat: f64,
    pub max_lat: f64,
    pub min_lng: f64,
    pub max_lng: f64,
}

impl Bounds {
    /// Compute the true bounding box of a point sequence.
    ///
    /// Returns `None` for empty input. Note that manifest entries do NOT
    /// store this box; they store the endpoint pair of the simplified path
    /// (see [`ManifestEntry::bounds`]).
    pub fn from_points(points: &[GeoPoint]) -> Option<Self> {
        if points.is_empty() {
            return None;
        }
        let mut min_lat = f64::MAX;
        let mut max_lat = f64::MIN;
        let mut min_lng = f64::MAX;
        let mut max_lng = f64::MIN;

        for p in points {
            min_lat = min_lat.min(p.lat);
            max_lat = max_lat.max(p.lat);
            min_lng = min_lng.min(p.lng);
            max_lng = max_lng.max(p.lng);
        }

        Some(Self { min_lat, max_lat, min_lng, max_lng })
    }

    /// Build the box spanned by two corner points, in either order.
    pub fn from_corner_points(a: &GeoPoint, b: &GeoPoint) -> Self {
        Self {
            min_lat: a.lat.min(b.lat),
            max_lat: a.lat.max(b.lat),
            min_lng: a.lng.min(b.lng),
            max_lng: a.lng.max(b.lng),
        }
    }

    /// Get the center point of the box.
    pub fn center(&self) -> GeoPoint {
        GeoPoint::new(
            (self.min_lat + self.max_lat) / 2.0,
            (self.min_lng + self.max_lng) / 2.0,
        )
    }

    /// Expand the box by `margin` degrees on every side.
    pub fn padded(&self, margin: f64) -> Self {
        Self {
            min_lat: self.min_lat - margin,
            max_lat: self.max_lat + margin,
            min_lng: self.min_lng - margin,
            max_lng: self.max_lng + margin,
        }
    }

    /// Check whether a point lies inside the box (inclusive).
    pub fn contains(&self, p: &GeoPoint) -> bool {
        p.lat >= self.min_lat
            && p.lat <= self.max_lat
            && p.lng >= self.min_lng
            && p.lng <= self.max_lng
    }
}

// ============================================================================
// Tests
// ============================================================================
