//! Memoizing caches shared by the type registry and the mapper.
//!
//! Each key owns a `OnceCell`, so concurrent first requests for the same key
//! build exactly once while other keys proceed. The map lock is held only to
//! look up or insert the cell, never across a build.

use crate::error::MapError;
use once_cell::sync::OnceCell;
use parking_lot::RwLock;
use rustc_hash::FxHashMap;
use serde::Serialize;
use std::{
    hash::Hash,
    sync::{
        Arc,
        atomic::{AtomicU64, Ordering},
    },
};

///
/// CacheStats
///

#[derive(Clone, Copy, Debug, Default, Eq, PartialEq, Serialize)]
pub struct CacheStats {
    pub hits: u64,
    pub misses: u64,
    pub builds: u64,
    pub size: usize,
}

///
/// MemoCache
///
/// Memoized `K -> V` map. A failed build leaves the key unfilled; the next
/// request retries it.
///

pub struct MemoCache<K, V> {
    label: &'static str,
    entries: RwLock<FxHashMap<K, Arc<OnceCell<V>>>>,
    hits: AtomicU64,
    misses: AtomicU64,
    builds: AtomicU64,
}

impl<K, V> MemoCache<K, V>
where
    K: Eq + Hash + Clone,
    V: Clone,
{
    #[must_use]
    pub fn new(label: &'static str) -> Self {
        Self {
            label,
            entries: RwLock::new(FxHashMap::default()),
            hits: AtomicU64::new(0),
            misses: AtomicU64::new(0),
            builds: AtomicU64::new(0),
        }
    }

    #[must_use]
    pub const fn label(&self) -> &'static str {
        self.label
    }

    /// Return the cached value without building.
    pub fn get(&self, key: &K) -> Option<V> {
        self.entries
            .read()
            .get(key)
            .and_then(|cell| cell.get().cloned())
    }

    /// Return the cached value, building it with `build` on first request.
    pub fn get_or_try_build<F>(&self, key: K, build: F) -> Result<V, MapError>
    where
        F: FnOnce() -> Result<V, MapError>,
    {
        if let Some(value) = self.get(&key) {
            self.hits.fetch_add(1, Ordering::Relaxed);
            return Ok(value);
        }
        self.misses.fetch_add(1, Ordering::Relaxed);

        let cell = Arc::clone(self.entries.write().entry(key.clone()).or_default());

        let mut built = false;
        let value = cell.get_or_try_init(|| {
            built = true;
            build()
        });

        match value {
            Ok(value) => {
                if built {
                    self.builds.fetch_add(1, Ordering::Relaxed);
                    tracing::trace!(cache = self.label, "memo entry built");
                }
                Ok(value.clone())
            }
            Err(err) => {
                tracing::debug!(cache = self.label, error = %err, "memo build failed");
                self.discard_unfilled(&key, &cell);
                Err(err)
            }
        }
    }

    // Drop the cell a failed build left behind, unless another caller
    // still holds it and may fill it.
    fn discard_unfilled(&self, key: &K, cell: &Arc<OnceCell<V>>) {
        let mut entries = self.entries.write();

        let stale = entries.get(key).is_some_and(|current| {
            Arc::ptr_eq(current, cell) && current.get().is_none() && Arc::strong_count(cell) <= 2
        });
        if stale {
            entries.remove(key);
        }
    }

    /// Number of cells held, filled or not.
    #[cfg(test)]
    fn slots(&self) -> usize {
        self.entries.read().len()
    }

    /// Store a value built outside the cache. Refused when the key is
    /// filled or a build for it is under way; never waits on that build.
    pub fn offer(&self, key: K, value: V) -> bool {
        let mut entries = self.entries.write();
        if entries.contains_key(&key) {
            return false;
        }

        entries.insert(key, Arc::new(OnceCell::with_value(value)));
        self.builds.fetch_add(1, Ordering::Relaxed);

        true
    }

    /// Pre-register a value. Returns `false` if the key is already filled.
    pub fn insert(&self, key: K, value: V) -> bool {
        let cell = Arc::clone(self.entries.write().entry(key).or_default());

        cell.set(value).is_ok()
    }

    #[must_use]
    pub fn contains(&self, key: &K) -> bool {
        self.entries
            .read()
            .get(key)
            .is_some_and(|cell| cell.get().is_some())
    }

    /// Number of filled entries.
    #[must_use]
    pub fn len(&self) -> usize {
        self.entries
            .read()
            .values()
            .filter(|cell| cell.get().is_some())
            .count()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    #[must_use]
    pub fn stats(&self) -> CacheStats {
        CacheStats {
            hits: self.hits.load(Ordering::Relaxed),
            misses: self.misses.load(Ordering::Relaxed),
            builds: self.builds.load(Ordering::Relaxed),
            size: self.len(),
        }
    }
}

impl<K, V> std::fmt::Debug for MemoCache<K, V> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("MemoCache")
            .field("label", &self.label)
            .finish_non_exhaustive()
    }
}

///
/// TESTS
///
