//! Lazily loaded full-resolution tracks.
//!
//! The catalog ships only coarse previews; full-resolution point sequences
//! are fetched one at a time as tracks are interacted with. The cache is
//! monotonic for the life of a session - once a track is loaded it is never
//! evicted or downgraded - and fetches are single-flight: a per-id gate
//! coalesces overlapping `ensure_loaded` calls into one fetch, so rapid
//! repeated hovers cannot race each other.
//!
//! Fetching itself sits behind the [`TrackSource`] seam. The `http` feature
//! provides [`HttpTrackSource`] for the static-file deployment; tests and
//! offline tools use [`StaticTrackSource`].

use std::collections::HashMap;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};

use tokio::sync::Mutex as AsyncMutex;

use crate::{AtlasError, GeoPoint, ManifestEntry, Result};

/// Where the manifest and per-track files come from.
///
/// `track_url` values are the manifest's own (`/data/tracks/<id>.json`);
/// a source resolves them against whatever it fronts.
#[allow(async_fn_in_trait)]
pub trait TrackSource {
    /// Fetch the published manifest. Called once at session startup.
    async fn fetch_manifest(&self) -> Result<Vec<ManifestEntry>>;

    /// Fetch one full-resolution track file.
    async fn fetch_track(&self, track_url: &str) -> Result<Vec<GeoPoint>>;
}

/// Session cache of full-resolution point sequences, keyed by entry id.
#[derive(Debug, Default)]
pub struct ResolutionCache {
    tracks: Mutex<HashMap<String, Arc<Vec<GeoPoint>>>>,
    /// Per-id fetch gates; holding a gate marks the fetch as in flight.
    gates: Mutex<HashMap<String, Arc<AsyncMutex<()>>>>,
}

impl ResolutionCache {
    pub fn new() -> Self {
        Self::default()
    }

    /// The cached sequence for an id, if already loaded. Never triggers I/O.
    pub fn get(&self, id: &str) -> Option<Arc<Vec<GeoPoint>>> {
        self.tracks.lock().unwrap().get(id).cloned()
    }

    pub fn contains(&self, id: &str) -> bool {
        self.tracks.lock().unwrap().contains_key(id)
    }

    pub fn len(&self) -> usize {
        self.tracks.lock().unwrap().len()
    }

    pub fn is_empty(&self) -> bool {
        self.tracks.lock().unwrap().is_empty()
    }

    /// Store a sequence obtained out of band (e.g. by a rendering
    /// collaborator that already fetched it). The cache is monotonic: if the
    /// id is already populated the existing sequence wins, and it is
    /// returned.
    pub fn insert(&self, id: &str, points: Vec<GeoPoint>) -> Arc<Vec<GeoPoint>> {
        self.tracks
            .lock()
            .unwrap()
            .entry(id.to_string())
            .or_insert_with(|| Arc::new(points))
            .clone()
    }

    /// Return the full-resolution sequence for `id`, fetching it at most
    /// once.
    ///
    /// Idempotent: a cached id returns immediately with no I/O. While a
    /// fetch is outstanding, further callers for the same id wait on its
    /// gate and then read the cached result - no second fetch is issued.
    /// On fetch failure the error is returned, nothing is cached, and the
    /// track stays at preview resolution until a later call retries.
    pub async fn ensure_loaded<S: TrackSource>(
        &self,
        id: &str,
        track_url: &str,
        source: &S,
    ) -> Result<Arc<Vec<GeoPoint>>> {
        if let Some(points) = self.get(id) {
            return Ok(points);
        }

        let gate = self
            .gates
            .lock()
            .unwrap()
            .entry(id.to_string())
            .or_insert_with(|| Arc::new(AsyncMutex::new(())))
            .clone();
        let _in_flight = gate.lock().await;

        // A fetch that completed while we waited on the gate
        if let Some(points) = self.get(id) {
            return Ok(points);
        }

        let points = source
            .fetch_track(track_url)
            .await
            .map_err(|e| AtlasError::track_load(id, e.to_string()))?;

        log::debug!("loaded track '{}' ({} points)", id, points.len());
        Ok(self.insert(id, points))
    }
}

// ============================================================================
// Sources
// ============================================================================

/// An in-memory source: a fixed manifest plus track files keyed by url.
///
/// Used by tests and offline tooling; also documents exactly what a real
/// deployment must serve.
#[derive(Debug, Default)]
pub struct StaticTrackSource {
    manifest: Vec<ManifestEntry>,
    tracks: HashMap<String, Vec<GeoPoint>>,
    track_fetches: AtomicUsize,
}

impl StaticTrackSource {
    pub fn new(manifest: Vec<ManifestEntry>) -> Self {
        Self {
            manifest,
            ..Self::default()
        }
    }

    /// Register the track file a `track_url` resolves to.
    pub fn with_track(mut self, track_url: &str, points: Vec<GeoPoint>) -> Self {
        self.tracks.insert(track_url.to_string(), points);
        self
    }

    /// Number of track fetches issued so far (diagnostics; the
    /// single-flight tests assert on it).
    pub fn track_fetches(&self) -> usize {
        self.track_fetches.load(Ordering::SeqCst)
    }
}

impl TrackSource for StaticTrackSource {
    async fn fetch_manifest(&self) -> Result<Vec<ManifestEntry>> {
        Ok(self.manifest.clone())
    }

    async fn fetch_track(&self, track_url: &str) -> Result<Vec<GeoPoint>> {
        self.track_fetches.fetch_add(1, Ordering::SeqCst);
        self.tracks
            .get(track_url)
            .cloned()
            .ok_or_else(|| AtlasError::track_load(track_url, "no such track file"))
    }
}

/// HTTP source for the static-file deployment: the manifest and track files
/// are plain JSON served relative to one base url.
#[cfg(feature = "http")]
#[derive(Debug, Clone)]
pub struct HttpTrackSource {
    client: reqwest::Client,
    base_url: String,
    manifest_path: String,
}

#[cfg(feature = "http")]
impl HttpTrackSource {
    /// Default path of the manifest relative to the base url.
    pub const MANIFEST_PATH: &'static str = "/data/manifest.json";

    pub fn new(base_url: impl Into<String>) -> Self {
        Self::with_client(reqwest::Client::new(), base_url)
    }

    /// Use a pre-configured client (timeouts, proxies, pooling).
    pub fn with_client(client: reqwest::Client, base_url: impl Into<String>) -> Self {
        let mut base_url = base_url.into();
        while base_url.ends_with('/') {
            base_url.pop();
        }
        Self {
            client,
            base_url,
            manifest_path: Self::MANIFEST_PATH.to_string(),
        }
    }

    /// Override the manifest path.
    pub fn manifest_at(mut self, path: impl Into<String>) -> Self {
        self.manifest_path = path.into();
        self
    }

    fn url_for(&self, path: &str) -> String {
        format!("{}{}", self.base_url, path)
    }
}

#[cfg(feature = "http")]
impl TrackSource for HttpTrackSource {
    async fn fetch_manifest(&self) -> Result<Vec<ManifestEntry>> {
        let url = self.url_for(&self.manifest_path);
        let response = self
            .client
            .get(&url)
            .send()
            .await
            .and_then(reqwest::Response::error_for_status)
            .map_err(|e| AtlasError::ManifestLoad { reason: e.to_string() })?;

        response
            .json::<Vec<ManifestEntry>>()
            .await
            .map_err(|e| AtlasError::ManifestLoad { reason: e.to_string() })
    }

    async fn fetch_track(&self, track_url: &str) -> Result<Vec<GeoPoint>> {
        let url = self.url_for(track_url);
        let response = self
            .client
            .get(&url)
            .send()
            .await
            .and_then(reqwest::Response::error_for_status)
            .map_err(|e| AtlasError::track_load(track_url, e.to_string()))?;

        response
            .json::<Vec<GeoPoint>>()
            .await
            .map_err(|e| AtlasError::track_load(track_url, e.to_string()))
    }
}

// ============================================================================
// Tests
// ============================================================================
