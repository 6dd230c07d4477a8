//! Bounded cache of decoded leaf directories.
//!
//! Each cached offset owns a [`OnceCell`] slot. Concurrent lookups of the same
//! uncached directory wait on the slot instead of issuing their own reads, and
//! a fetch that fails or is dropped leaves the slot empty for the next caller.

use std::collections::HashMap;
use std::future::Future;
use std::sync::Arc;

use parking_lot::Mutex;
use tokio::sync::OnceCell;
use tracing::{debug, trace};

use super::directory::Entry;
use super::error::Result;

/// A decoded directory shared between lookups.
pub type Directory = Arc<Vec<Entry>>;

/// Default number of leaf directories kept.
pub const DEFAULT_DIR_CACHE_CAPACITY: usize = 20;

/// Counters describing cache effectiveness.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct DirectoryCacheStats {
    /// Lookups answered from a filled slot.
    pub hits: u64,
    /// Lookups that found no slot.
    pub misses: u64,
    /// Lookups that joined a fetch already in flight.
    pub coalesced: u64,
    /// Slots dropped to stay within capacity.
    pub evictions: u64,
}

struct Slot {
    cell: Arc<OnceCell<Directory>>,
    last_access: u64,
}

struct Inner {
    slots: HashMap<u64, Slot>,
    clock: u64,
    stats: DirectoryCacheStats,
}

/// LRU cache of directories keyed by their byte offset.
pub struct DirectoryCache {
    inner: Mutex<Inner>,
    capacity: usize,
}

impl DirectoryCache {
    pub fn new(capacity: usize) -> Self {
        Self {
            inner: Mutex::new(Inner {
                slots: HashMap::new(),
                clock: 0,
                stats: DirectoryCacheStats::default(),
            }),
            capacity: capacity.max(1),
        }
    }

    pub fn capacity(&self) -> usize {
        self.capacity
    }

    /// Number of slots, including ones still being fetched.
    pub fn len(&self) -> usize {
        self.inner.lock().slots.len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    pub fn stats(&self) -> DirectoryCacheStats {
        self.inner.lock().stats
    }

    /// Return the directory at `offset`, running `fetch` if no caller has
    /// loaded it yet.
    pub async fn get_or_fetch<F, Fut>(&self, offset: u64, fetch: F) -> Result<Directory>
    where
        F: FnOnce() -> Fut,
        Fut: Future<Output = Result<Directory>>,
    {
        let cell = self.slot(offset);
        let directory = cell.get_or_try_init(fetch).await?;
        Ok(Arc::clone(directory))
    }

    fn slot(&self, offset: u64) -> Arc<OnceCell<Directory>> {
        let mut inner = self.inner.lock();
        inner.clock += 1;
        let now = inner.clock;

        if let Some(slot) = inner.slots.get_mut(&offset) {
            slot.last_access = now;
            let cell = Arc::clone(&slot.cell);
            if cell.initialized() {
                inner.stats.hits += 1;
                trace!(offset, "Directory cache hit");
            } else {
                inner.stats.coalesced += 1;
                debug!(offset, "Joining in-flight directory fetch");
            }
            return cell;
        }

        inner.stats.misses += 1;
        trace!(offset, "Directory cache miss");
        if inner.slots.len() >= self.capacity {
            let oldest = inner
                .slots
                .iter()
                .min_by_key(|(_, slot)| slot.last_access)
                .map(|(key, _)| *key);
            if let Some(key) = oldest {
                inner.slots.remove(&key);
                inner.stats.evictions += 1;
                trace!(offset = key, "Evicted directory");
            }
        }

        let cell = Arc::new(OnceCell::new());
        inner.slots.insert(
            offset,
            Slot {
                cell: Arc::clone(&cell),
                last_access: now,
            },
        );
        cell
    }
}

impl Default for DirectoryCache {
    fn default() -> Self {
        Self::new(DEFAULT_DIR_CACHE_CAPACITY)
    }
}
