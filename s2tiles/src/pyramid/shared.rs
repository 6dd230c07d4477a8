//! Thread-safe access to a tile pyramid.

use std::sync::Arc;

use parking_lot::Mutex;

use super::builder::TilePyramid;
use super::error::BuilderError;
use super::key::TileKey;
use super::tile::Tile;
use super::BuilderConfig;
use crate::cell::CellId;
use crate::geometry::FeatureCollection;

/// A [`TilePyramid`] shared between threads.
///
/// Lookups may refine the pyramid, so every call takes the lock exclusively
/// and hands back an owned copy of the tile.
pub struct SharedTilePyramid<K: TileKey = CellId> {
    inner: Arc<Mutex<TilePyramid<K>>>,
}

impl<K: TileKey> SharedTilePyramid<K> {
    pub fn new(collection: &FeatureCollection, config: BuilderConfig) -> Result<Self, BuilderError> {
        TilePyramid::new(collection, config).map(Self::from)
    }

    pub fn get_tile(&self, key: K) -> Option<Tile> {
        self.inner.lock().get_tile(key).cloned()
    }

    /// Number of tiles materialised so far.
    pub fn len(&self) -> usize {
        self.inner.lock().len()
    }

    pub fn is_empty(&self) -> bool {
        self.inner.lock().is_empty()
    }
}

impl<K: TileKey> From<TilePyramid<K>> for SharedTilePyramid<K> {
    fn from(pyramid: TilePyramid<K>) -> Self {
        Self {
            inner: Arc::new(Mutex::new(pyramid)),
        }
    }
}

impl<K: TileKey> Clone for SharedTilePyramid<K> {
    fn clone(&self) -> Self {
        Self {
            inner: Arc::clone(&self.inner),
        }
    }
}
