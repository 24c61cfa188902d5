//! Raw trace import.
//!
//! Turns raw file text into a normalized [`RawTrace`]: an ordered point
//! sequence plus provenance (name, local start time, IANA timezone, source
//! format). Three source shapes are accepted:
//!
//! - **GPX** - first track, points in file order
//! - **GeoJSON-like** - `features[0].geometry.coordinates`, with an optional
//!   top-level `outAndBack` flag that mirrors a one-way recording into a
//!   round trip
//! - **Bare array** - a JSON array of `[lat, lng]` pairs
//!
//! Callers that know the format pass it explicitly; sniffing is the fallback
//! when no hint is given. Any input from which no coordinates can be
//! extracted fails with [`AtlasError::Import`] and commits nothing.

use std::fmt;
use std::path::Path;

use chrono::{SecondsFormat, Utc};
use once_cell::sync::Lazy;
use serde_json::Value;
use tzf_rs::DefaultFinder;

use crate::{AtlasError, GeoPoint, Result};

/// Process-wide timezone finder; construction parses embedded polygon data,
/// so it happens once.
static TZ_FINDER: Lazy<DefaultFinder> = Lazy::new(DefaultFinder::new);

/// Declared or sniffed shape of a raw trace file.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SourceFormat {
    Gpx,
    GeoJson,
    CoordinateArray,
}

impl fmt::Display for SourceFormat {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            SourceFormat::Gpx => write!(f, "gpx"),
            SourceFormat::GeoJson => write!(f, "geojson"),
            SourceFormat::CoordinateArray => write!(f, "array"),
        }
    }
}

/// A normalized trace fresh off an import, before any simplification.
///
/// Transient: lives only long enough to build a manifest entry and the
/// exported track file.
#[derive(Debug, Clone)]
pub struct RawTrace {
    /// Human-readable activity name, from the file contents or the filename.
    pub name: String,
    /// Ordered traversal path, never reordered.
    pub points: Vec<GeoPoint>,
    /// Local date-time normalized to `YYYY-MM-DDThh:mm`.
    pub date_local: String,
    /// IANA timezone id resolved from the first point, when known. Attached
    /// here once and reused for all later local-time formatting.
    pub timezone: Option<String>,
    pub source_format: SourceFormat,
}

/// Import raw file text into a [`RawTrace`].
///
/// `file_name` supplies the fallback activity name (its stem) and is only
/// used for that. Pass `format` when the source shape is known; `None`
/// sniffs: a `<gpx` marker means GPX, anything else must parse as JSON.
pub fn import_track(
    text: &str,
    file_name: &str,
    format: Option<SourceFormat>,
) -> Result<RawTrace> {
    let fallback_name = file_stem(file_name);
    let format = format.unwrap_or_else(|| sniff_format(text));

    let (points, name, raw_date) = match format {
        SourceFormat::Gpx => parse_gpx(text, &fallback_name)?,
        SourceFormat::GeoJson => parse_geojson(text, &fallback_name)?,
        SourceFormat::CoordinateArray => parse_coordinate_array(text, &fallback_name)?,
    };

    if points.is_empty() {
        return Err(AtlasError::import("no coordinate data found"));
    }

    let timezone = lookup_timezone(&points[0]);
    let date_local = format_datetime_local(&raw_date);

    log::debug!(
        "imported '{}': {} points, format {}, tz {}",
        name,
        points.len(),
        format,
        timezone.as_deref().unwrap_or("unknown")
    );

    Ok(RawTrace {
        name,
        points,
        date_local,
        timezone,
        source_format: format,
    })
}

/// Guess the source format when the caller gave no hint.
fn sniff_format(text: &str) -> SourceFormat {
    if text.contains("<gpx") {
        SourceFormat::Gpx
    } else if text.trim_start().starts_with('[') {
        SourceFormat::CoordinateArray
    } else {
        SourceFormat::GeoJson
    }
}

/// Normalize assorted date strings to `YYYY-MM-DDThh:mm`.
///
/// Dots become hyphens, bare dates get noon as a default time, and full
/// ISO strings are truncated to minute precision.
pub fn format_datetime_local(raw: &str) -> String {
    if raw.is_empty() {
        return String::new();
    }
    let clean: String = raw.replace('.', "-");
    if clean.len() == 10 {
        return format!("{clean}T12:00");
    }
    clean.chars().take(16).collect()
}

fn file_stem(file_name: &str) -> String {
    Path::new(file_name)
        .file_stem()
        .and_then(|s| s.to_str())
        .unwrap_or(file_name)
        .to_string()
}

fn now_iso() -> String {
    Utc::now().to_rfc3339_opts(SecondsFormat::Millis, true)
}

fn lookup_timezone(first: &GeoPoint) -> Option<String> {
    // tzf takes (lng, lat)
    let name = TZ_FINDER.get_tz_name(first.lng, first.lat);
    if name.is_empty() {
        None
    } else {
        Some(name.to_string())
    }
}

// ============================================================================
// GPX
// ============================================================================

fn parse_gpx(text: &str, fallback_name: &str) -> Result<(Vec<GeoPoint>, String, String)> {
    let parsed = gpx::read(text.as_bytes())
        .map_err(|e| AtlasError::import(format!("GPX parse error: {e}")))?;

    let track = parsed
        .tracks
        .first()
        .ok_or_else(|| AtlasError::import("GPX file contains no tracks"))?;

    let points: Vec<GeoPoint> = track
        .segments
        .iter()
        .flat_map(|segment| segment.points.iter())
        .map(|wpt| {
            let p = wpt.point();
            GeoPoint::new(p.y(), p.x())
        })
        .collect();

    let name = track
        .name
        .clone()
        .unwrap_or_else(|| fallback_name.to_string());

    // Start time: first timestamped point, then GPX metadata, then now.
    let point_time = track
        .segments
        .iter()
        .flat_map(|segment| segment.points.iter())
        .find_map(|wpt| wpt.time.as_ref().and_then(|t| t.format().ok()));
    let metadata_time = parsed
        .metadata
        .as_ref()
        .and_then(|m| m.time.as_ref().and_then(|t| t.format().ok()));
    let raw_date = point_time.or(metadata_time).unwrap_or_else(now_iso);

    Ok((points, name, raw_date))
}

// ============================================================================
// JSON (GeoJSON-like and bare arrays)
// ============================================================================

fn parse_json_value(text: &str) -> Result<Value> {
    serde_json::from_str(text).map_err(|e| AtlasError::import(format!("malformed JSON: {e}")))
}

fn parse_geojson(text: &str, fallback_name: &str) -> Result<(Vec<GeoPoint>, String, String)> {
    let json = parse_json_value(text)?;

    let coordinates = json
        .get("features")
        .and_then(|f| f.get(0))
        .and_then(|feature| feature.get("geometry"))
        .and_then(|geometry| geometry.get("coordinates"))
        .and_then(Value::as_array)
        .ok_or_else(|| {
            AtlasError::import("unsupported geojson shape: no features[0].geometry.coordinates")
        })?;

    // GeoJSON axis order is [lng, lat]
    let mut coords: Vec<GeoPoint> = coordinates
        .iter()
        .filter_map(|pair| {
            let lng = pair.get(0)?.as_f64()?;
            let lat = pair.get(1)?.as_f64()?;
            Some(GeoPoint::new(lat, lng))
        })
        .collect();

    // An out-and-back recording covers the return leg by mirroring the
    // path, minus the shared turnaround point.
    if json.get("outAndBack").and_then(Value::as_bool) == Some(true) && coords.len() > 1 {
        let return_trip: Vec<GeoPoint> = coords.iter().rev().skip(1).copied().collect();
        coords.extend(return_trip);
    }

    let name = json
        .get("hikeName")
        .and_then(Value::as_str)
        .map(str::to_string)
        .unwrap_or_else(|| fallback_name.to_string());
    let raw_date = json
        .get("timestamp")
        .or_else(|| json.get("hikeDate"))
        .and_then(Value::as_str)
        .map(str::to_string)
        .unwrap_or_else(now_iso);

    Ok((coords, name, raw_date))
}

fn parse_coordinate_array(
    text: &str,
    fallback_name: &str,
) -> Result<(Vec<GeoPoint>, String, String)> {
    let json = parse_json_value(text)?;

    let pairs = json
        .as_array()
        .ok_or_else(|| AtlasError::import("unsupported array shape: not a JSON array"))?;

    // Bare arrays are already [lat, lng]
    let points: Vec<GeoPoint> = pairs
        .iter()
        .filter_map(|pair| {
            let lat = pair.get(0)?.as_f64()?;
            let lng = pair.get(1)?.as_f64()?;
            Some(GeoPoint::new(lat, lng))
        })
        .collect();

    Ok((points, fallback_name.to_string(), now_iso()))
}

// ============================================================================
// Tests
// ============================================================================
