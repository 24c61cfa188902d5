//! Manifest entries and export artifacts.
//!
//! The manifest is the published catalog: a JSON array with one entry per
//! track. This module builds entries deterministically from a [`RawTrace`]
//! and produces the two export artifacts - the high-resolution track file
//! body and the manifest snippet (trailing comma included, ready to splice
//! into the array). Persistence of the manifest itself is an external,
//! manual curation step; nothing here mutates a published catalog.

use std::fmt;
use std::fs;
use std::path::{Path, PathBuf};
use std::str::FromStr;

use chrono::NaiveDateTime;
use serde::{Deserialize, Serialize};

use crate::simplify::{simplify_track, SimplificationStats, PREVIEW_EPSILON};
use crate::{AtlasError, Bounds, GeoPoint, RawTrace, Result, DEFAULT_WORKING_EPSILON};

/// Sentinel id produced when the name or date is missing. Export surfaces
/// refuse to proceed while the id is pending.
pub const PENDING_ID: &str = "pending";

/// Activity category, as it appears in the published manifest.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum ActivityType {
    Hike,
    #[serde(rename = "Bike ride")]
    BikeRide,
    Backpacking,
    Walk,
}

impl fmt::Display for ActivityType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ActivityType::Hike => write!(f, "Hike"),
            ActivityType::BikeRide => write!(f, "Bike ride"),
            ActivityType::Backpacking => write!(f, "Backpacking"),
            ActivityType::Walk => write!(f, "Walk"),
        }
    }
}

impl FromStr for ActivityType {
    type Err = String;

    fn from_str(s: &str) -> std::result::Result<Self, Self::Err> {
        match s.to_lowercase().replace(['-', '_'], " ").trim() {
            "hike" => Ok(ActivityType::Hike),
            "bike ride" | "bike" | "ride" => Ok(ActivityType::BikeRide),
            "backpacking" => Ok(ActivityType::Backpacking),
            "walk" => Ok(ActivityType::Walk),
            other => Err(format!("unknown activity type '{other}'")),
        }
    }
}

/// One published catalog entry.
///
/// Field names serialize to the exact manifest wire format (`type`,
/// `hasBlog`, `trackUrl`, `[lat, lng]` point arrays). Immutable after
/// construction; the viewing side treats entries as read-only.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ManifestEntry {
    pub id: String,
    pub name: String,
    /// Local date-time `YYYY-MM-DDThh:mm`, in the track's own timezone.
    pub date: String,
    #[serde(rename = "type")]
    pub activity_type: ActivityType,
    #[serde(rename = "hasBlog")]
    pub has_blog: bool,
    /// First and last points of the working-epsilon path - the published
    /// format stores the endpoint pair here, NOT a true min/max bounding
    /// box. Paths that loop or double back can extend well outside the box
    /// these corners span.
    pub bounds: Vec<GeoPoint>,
    /// Coarse fixed-epsilon path used until the full-resolution track is
    /// fetched.
    pub preview: Vec<GeoPoint>,
    #[serde(rename = "trackUrl")]
    pub track_url: String,
}

impl ManifestEntry {
    /// The box spanned by the stored endpoint pair, for pruning.
    ///
    /// `None` when the entry carries fewer than two bound points (only seen
    /// in hand-authored manifests); such entries are never pruned in.
    pub fn endpoint_box(&self) -> Option<Bounds> {
        match self.bounds.as_slice() {
            [a, b, ..] => Some(Bounds::from_corner_points(a, b)),
            _ => None,
        }
    }

    /// Activity date as a sortable key. Unparseable dates yield `None` and
    /// rank last in recency ordering.
    pub fn date_key(&self) -> Option<NaiveDateTime> {
        NaiveDateTime::parse_from_str(&self.date, "%Y-%m-%dT%H:%M").ok()
    }
}

// ============================================================================
// Id Generation
// ============================================================================

/// Lower-cased, hyphenated, id-safe form of a human-readable name.
///
/// Keeps word characters, whitespace and hyphens; collapses runs of
/// whitespace, underscores and hyphens into a single hyphen; trims hyphens
/// from both ends.
pub fn slugify(name: &str) -> String {
    let lowered = name.to_lowercase();
    let mut slug = String::with_capacity(lowered.len());
    let mut pending_hyphen = false;

    for c in lowered.trim().chars() {
        if c.is_whitespace() || c == '_' || c == '-' {
            pending_hyphen = true;
        } else if c.is_ascii_alphanumeric() {
            if pending_hyphen && !slug.is_empty() {
                slug.push('-');
            }
            pending_hyphen = false;
            slug.push(c);
        }
        // all other characters are dropped without breaking a run
    }

    slug
}

/// Deterministic entry id: the local date-time with its colon stripped,
/// joined to the slugified name.
///
/// A pure function of `(date_local, name)`: identical inputs always
/// reproduce the identical id. Returns [`PENDING_ID`] when either input is
/// missing; callers must block export on the sentinel.
///
/// # Example
/// ```
/// use track_atlas::generate_id;
/// assert_eq!(
///     generate_id("2023-05-01T12:00", "Blue Ridge Loop!"),
///     "2023-05-01T1200-blue-ridge-loop"
/// );
/// ```
pub fn generate_id(date_local: &str, name: &str) -> String {
    if date_local.is_empty() || name.is_empty() {
        return PENDING_ID.to_string();
    }

    let date_part = date_local.replacen(':', "", 1);
    format!("{date_part}-{}", slugify(name))
}

// ============================================================================
// Entry Building
// ============================================================================

/// Authoring-side settings for one entry build.
#[derive(Debug, Clone)]
pub struct EntryConfig {
    /// Working epsilon for the exported high-resolution track, in degrees.
    pub epsilon: f64,
    pub activity_type: ActivityType,
    pub has_blog: bool,
}

impl Default for EntryConfig {
    fn default() -> Self {
        Self {
            epsilon: DEFAULT_WORKING_EPSILON,
            activity_type: ActivityType::Hike,
            has_blog: false,
        }
    }
}

/// Product of one entry build: the catalog entry, the exportable
/// high-resolution track, and the simplification quality report.
#[derive(Debug, Clone)]
pub struct TrackExport {
    pub entry: ManifestEntry,
    /// Working-epsilon path; the body of the exported `<id>.json`.
    pub track: Vec<GeoPoint>,
    pub stats: SimplificationStats,
}

/// Build a manifest entry and its export artifacts from a raw trace.
///
/// The track is simplified at the configured working epsilon; the preview
/// is always simplified at the fixed [`PREVIEW_EPSILON`], independent of
/// the working epsilon, so preview geometry is stable across export-quality
/// tuning. Both keep the raw trace's first and last points.
pub fn build_entry(raw: &RawTrace, config: &EntryConfig) -> TrackExport {
    let track = simplify_track(&raw.points, config.epsilon);
    let preview = simplify_track(&raw.points, PREVIEW_EPSILON);
    let stats = SimplificationStats::measure(&raw.points, &track);

    let id = generate_id(&raw.date_local, &raw.name);
    let bounds = match (track.first(), track.last()) {
        (Some(first), Some(last)) => vec![*first, *last],
        _ => Vec::new(),
    };

    let entry = ManifestEntry {
        track_url: format!("/data/tracks/{id}.json"),
        id,
        name: raw.name.clone(),
        date: raw.date_local.clone(),
        activity_type: config.activity_type,
        has_blog: config.has_blog,
        bounds,
        preview,
    };

    TrackExport { entry, track, stats }
}

impl TrackExport {
    fn ensure_exportable(&self) -> Result<()> {
        if self.entry.id == PENDING_ID {
            return Err(AtlasError::ExportBlocked {
                reason: "name and date must be set before export".to_string(),
            });
        }
        Ok(())
    }

    /// Name of the per-track file this entry points at.
    pub fn track_file_name(&self) -> String {
        format!("{}.json", self.entry.id)
    }

    /// Serialized body of the per-track file: a JSON array of `[lat, lng]`.
    pub fn track_json(&self) -> Result<String> {
        self.ensure_exportable()?;
        Ok(serde_json::to_string(&self.track)?)
    }

    /// The manifest entry as pretty JSON with a trailing comma, ready to
    /// splice into the published manifest array.
    pub fn manifest_snippet(&self) -> Result<String> {
        self.ensure_exportable()?;
        Ok(format!("{},", serde_json::to_string_pretty(&self.entry)?))
    }

    /// Write the per-track file into `dir` and return its path.
    ///
    /// Refuses with [`AtlasError::ExportBlocked`] before touching the
    /// filesystem when the id is pending.
    pub fn write_track_file(&self, dir: &Path) -> Result<PathBuf> {
        let body = self.track_json()?;
        let path = dir.join(self.track_file_name());
        fs::write(&path, body)?;
        log::info!(
            "exported {} ({} points)",
            path.display(),
            self.track.len()
        );
        Ok(path)
    }
}

// ============================================================================
// Tests
// ============================================================================
