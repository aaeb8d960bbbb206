//! In-memory cache of fetched records, keyed by record identifier.
//!
//! Each entry pairs the raw payload with a non-owning reference to the record's
//! render target. Storing an entry produces its render; changing the display mode
//! produces a render for every entry again from the stored payload, without
//! refetching.
//!
//! Renders are returned as [`PendingRender`] values rather than delivered in place,
//! so a caller holding a lock around the cache can deliver them after releasing it.

use chrono::{DateTime, Utc};
use std::collections::HashMap;
use std::sync::{Arc, Weak};

use crate::presenter::Presenter;
use crate::source::RenderTarget;
use crate::types::{DisplayMode, Presentation, RawPayload, RecordId};

/// A fetched record and where it is displayed
pub struct CacheEntry {
    /// Render target of the record (not owned by the cache)
    pub target: Weak<dyn RenderTarget>,
    /// Detail payload as fetched
    pub payload: RawPayload,
}

impl std::fmt::Debug for CacheEntry {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("CacheEntry")
            .field("target_alive", &(self.target.strong_count() > 0))
            .field("payload", &self.payload)
            .finish()
    }
}

/// A presentation ready to hand to a live render target
pub struct PendingRender {
    target: Arc<dyn RenderTarget>,
    presentation: Presentation,
}

impl PendingRender {
    /// What the target will be shown
    pub fn presentation(&self) -> &Presentation {
        &self.presentation
    }

    /// Hand the presentation to its target
    pub fn deliver(self) {
        self.target.render(&self.presentation);
    }
}

impl std::fmt::Debug for PendingRender {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("PendingRender")
            .field("presentation", &self.presentation)
            .finish_non_exhaustive()
    }
}

/// Fetched records of the current run
#[derive(Debug)]
pub struct RecordCache {
    entries: HashMap<RecordId, CacheEntry>,
    presenter: Presenter,
}

impl RecordCache {
    /// Create an empty cache rendering through `presenter`
    pub fn new(presenter: Presenter) -> Self {
        Self {
            entries: HashMap::new(),
            presenter,
        }
    }

    /// Store a fetched record and prepare its render under `mode`
    ///
    /// Returns `None` if the target has already been dropped; the payload is
    /// cached either way.
    pub fn record(
        &mut self,
        id: RecordId,
        target: Weak<dyn RenderTarget>,
        payload: RawPayload,
        mode: DisplayMode,
        now: DateTime<Utc>,
    ) -> Option<PendingRender> {
        let entry = CacheEntry { target, payload };
        let render = self.prepare(&id, &entry, mode, now);

        if self.entries.insert(id.clone(), entry).is_some() {
            tracing::warn!(record_id = %id, "Record cached twice in one run, keeping latest");
        }
        render
    }

    /// Drop every entry
    pub fn clear(&mut self) {
        self.entries.clear();
    }

    /// Prepare a render of every entry under `mode`, skipping dropped targets
    ///
    /// An empty cache yields nothing.
    pub fn rerender_all(&self, mode: DisplayMode, now: DateTime<Utc>) -> Vec<PendingRender> {
        self.entries
            .iter()
            .filter_map(|(id, entry)| self.prepare(id, entry, mode, now))
            .collect()
    }

    /// Number of cached records
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    /// Whether nothing has been cached
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Cached entry for `id`
    pub fn get(&self, id: &RecordId) -> Option<&CacheEntry> {
        self.entries.get(id)
    }

    /// Whether `id` has been cached
    pub fn contains(&self, id: &RecordId) -> bool {
        self.entries.contains_key(id)
    }

    /// Cached identifiers, in no particular order
    pub fn ids(&self) -> impl Iterator<Item = &RecordId> {
        self.entries.keys()
    }

    fn prepare(
        &self,
        id: &RecordId,
        entry: &CacheEntry,
        mode: DisplayMode,
        now: DateTime<Utc>,
    ) -> Option<PendingRender> {
        let Some(target) = entry.target.upgrade() else {
            tracing::debug!(record_id = %id, "Render target dropped, skipping");
            return None;
        };

        Some(PendingRender {
            target,
            presentation: self.presenter.render(id, &entry.payload, mode, now),
        })
    }
}
