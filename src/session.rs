//! Viewing-side session state.
//!
//! One `SessionContext` owns everything the map view mutates: the catalog
//! loaded at startup, the resolution cache that fills in as tracks are
//! interacted with, and the currently highlighted track. All mutation goes
//! through these methods; collaborators never write the underlying state
//! directly.

use std::sync::Arc;

use crate::{
    AtlasError, CatalogIndex, GeoPoint, ManifestEntry, ResolutionCache, Result, TrackSource,
};

/// Render attributes for one track polyline.
///
/// The rendering collaborator consumes these; nothing here draws pixels.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct TrackStyle {
    pub color: &'static str,
    pub weight: f64,
    pub opacity: f64,
}

impl TrackStyle {
    /// Resting style for a catalog track.
    pub const BASE: TrackStyle = TrackStyle {
        color: "#2196f3",
        weight: 4.0,
        opacity: 0.8,
    };

    /// Style for the highlighted (selected or hovered) track.
    pub const HIGHLIGHTED: TrackStyle = TrackStyle {
        color: "#2196f3",
        weight: 6.0,
        opacity: 1.0,
    };
}

/// Session state for the viewing side: catalog, cache, highlight.
pub struct SessionContext<S: TrackSource> {
    source: S,
    catalog: CatalogIndex,
    cache: ResolutionCache,
    highlighted: Option<String>,
}

impl<S: TrackSource> SessionContext<S> {
    /// Create a session with an empty catalog. Call [`load_catalog`]
    /// (once, at startup) to populate it.
    ///
    /// [`load_catalog`]: SessionContext::load_catalog
    pub fn new(source: S) -> Self {
        Self {
            source,
            catalog: CatalogIndex::default(),
            cache: ResolutionCache::new(),
            highlighted: None,
        }
    }

    /// Fetch the manifest and build the catalog.
    ///
    /// A fetch or parse failure degrades to an empty catalog - the viewer
    /// shows an empty map rather than crashing. Returns the number of
    /// entries loaded.
    pub async fn load_catalog(&mut self) -> usize {
        match self.source.fetch_manifest().await {
            Ok(entries) => {
                self.catalog = CatalogIndex::load(entries);
                log::info!("catalog loaded: {} entries", self.catalog.len());
            }
            Err(e) => {
                log::warn!("manifest load failed, starting with empty catalog: {e}");
                self.catalog = CatalogIndex::default();
            }
        }
        self.catalog.len()
    }

    pub fn catalog(&self) -> &CatalogIndex {
        &self.catalog
    }

    pub fn cache(&self) -> &ResolutionCache {
        &self.cache
    }

    /// Identify the tracks under a map click, most recent first.
    pub fn hit_test(&self, click: &GeoPoint, zoom: u8) -> Vec<ManifestEntry> {
        crate::hit_test::hit_test(click, zoom, &self.catalog, &self.cache)
    }

    /// Make sure the full-resolution sequence for a track is loaded,
    /// fetching it at most once per session.
    ///
    /// Failures are logged and returned; the track simply stays at preview
    /// resolution, which is not surfaced to the end user.
    pub async fn ensure_loaded(&self, id: &str) -> Result<Arc<Vec<GeoPoint>>> {
        let entry = self
            .catalog
            .by_id(id)
            .ok_or_else(|| AtlasError::track_load(id, "not in catalog"))?;

        let result = self
            .cache
            .ensure_loaded(id, &entry.track_url, &self.source)
            .await;
        if let Err(e) = &result {
            log::warn!("{e}; staying at preview resolution");
        }
        result
    }

    /// The best available geometry for a track: the cached full-resolution
    /// sequence when loaded, the preview otherwise.
    pub fn track_points(&self, id: &str) -> Option<Arc<Vec<GeoPoint>>> {
        if let Some(points) = self.cache.get(id) {
            return Some(points);
        }
        self.catalog
            .by_id(id)
            .map(|entry| Arc::new(entry.preview.clone()))
    }

    /// Set or clear the highlighted track. Unknown ids clear the highlight.
    pub fn highlight(&mut self, id: Option<&str>) {
        self.highlighted = match id {
            Some(id) if self.catalog.by_id(id).is_some() => Some(id.to_string()),
            Some(id) => {
                log::warn!("cannot highlight unknown track '{id}'");
                None
            }
            None => None,
        };
    }

    pub fn highlighted(&self) -> Option<&str> {
        self.highlighted.as_deref()
    }

    /// Render style for a track in its current highlight state.
    pub fn style_for(&self, id: &str) -> TrackStyle {
        if self.highlighted.as_deref() == Some(id) {
            TrackStyle::HIGHLIGHTED
        } else {
            TrackStyle::BASE
        }
    }
}

// ============================================================================
// Tests
// ============================================================================
