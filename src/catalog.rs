//! In-memory catalog of manifest entries.
//!
//! Built once from the fetched manifest and read-only afterwards. Lookup is
//! by id; iteration preserves manifest order, which keeps layer lists and
//! disambiguation menus stable across sessions.

use std::collections::HashMap;

use rstar::{RTree, RTreeObject, AABB};

use crate::{Bounds, ManifestEntry};

/// Envelope wrapper for R-tree indexing of entry boxes.
#[derive(Debug, Clone)]
struct EntryEnvelope {
    id: String,
    bounds: Bounds,
}

impl RTreeObject for EntryEnvelope {
    type Envelope = AABB<[f64; 2]>;

    fn envelope(&self) -> Self::Envelope {
        AABB::from_corners(
            [self.bounds.min_lng, self.bounds.min_lat],
            [self.bounds.max_lng, self.bounds.max_lat],
        )
    }
}

/// Id-indexed, insertion-ordered collection of manifest entries.
#[derive(Debug, Default)]
pub struct CatalogIndex {
    entries: Vec<ManifestEntry>,
    by_id: HashMap<String, usize>,
    spatial: RTree<EntryEnvelope>,
}

impl CatalogIndex {
    /// Build a catalog from manifest order.
    ///
    /// Ids are unique within a catalog; a duplicate is logged and dropped,
    /// keeping the first occurrence.
    pub fn load(entries: Vec<ManifestEntry>) -> Self {
        let mut kept: Vec<ManifestEntry> = Vec::with_capacity(entries.len());
        let mut by_id = HashMap::with_capacity(entries.len());

        for entry in entries {
            if by_id.contains_key(&entry.id) {
                log::warn!("duplicate manifest id '{}' dropped", entry.id);
                continue;
            }
            by_id.insert(entry.id.clone(), kept.len());
            kept.push(entry);
        }

        let envelopes: Vec<EntryEnvelope> = kept
            .iter()
            .filter_map(|entry| {
                entry.endpoint_box().map(|bounds| EntryEnvelope {
                    id: entry.id.clone(),
                    bounds,
                })
            })
            .collect();

        Self {
            entries: kept,
            by_id,
            spatial: RTree::bulk_load(envelopes),
        }
    }

    /// Look up an entry by id.
    pub fn by_id(&self, id: &str) -> Option<&ManifestEntry> {
        self.by_id.get(id).map(|&i| &self.entries[i])
    }

    /// All entries in manifest order.
    pub fn all(&self) -> &[ManifestEntry] {
        &self.entries
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Entries whose stored boxes intersect a map viewport.
    ///
    /// Uses the same endpoint-pair boxes as the hit tester, so the same
    /// caveat applies: a looping path can extend outside its box and be
    /// missed here.
    pub fn in_view(&self, viewport: &Bounds) -> Vec<&ManifestEntry> {
        let envelope = AABB::from_corners(
            [viewport.min_lng, viewport.min_lat],
            [viewport.max_lng, viewport.max_lat],
        );

        let mut hits: Vec<&ManifestEntry> = self
            .spatial
            .locate_in_envelope_intersecting(&envelope)
            .filter_map(|e| self.by_id(&e.id))
            .collect();

        // R-tree order is arbitrary; return manifest order
        hits.sort_by_key(|entry| self.by_id[&entry.id]);
        hits
    }
}
