//! Tile addressing for the pyramid.
//!
//! The builder is agnostic of whether tiles live on the cube-sphere or on a
//! single Web Mercator plane. Both schemes are quadtrees whose children are
//! computed from the parent's `(face, zoom, i, j)`.

use crate::cell::{CellId, NUM_FACES};
use crate::geometry::{lon_lat_to_mercator, Point};
use serde::Serialize;
use std::fmt::Debug;
use std::hash::Hash;

/// A quadtree tile address usable as a pyramid key.
pub trait TileKey: Copy + Eq + Hash + Debug + Send + Sync + 'static {
    /// Number of independent root tiles.
    const NUM_FACES: u8;

    /// Root tile of `face`.
    fn root(face: u8) -> Self;

    fn face(&self) -> u8;

    fn zoom(&self) -> u8;

    /// Grid position at [`zoom`](Self::zoom).
    fn ij(&self) -> (u32, u32);

    /// Enclosing tile one zoom up, `None` for a root.
    fn parent(&self) -> Option<Self>;

    /// Children of `(face, zoom, i, j)` ordered bottom-left, bottom-right,
    /// top-left, top-right in `(i, j)` space.
    fn children_ij(face: u8, zoom: u8, i: u32, j: u32) -> [Self; 4];

    /// Whether `other` is this tile or lies beneath it.
    fn contains(&self, other: &Self) -> bool;

    /// Maps an input coordinate into the unit square of its face.
    fn project(point: Point) -> Point;
}

impl TileKey for CellId {
    const NUM_FACES: u8 = NUM_FACES;

    fn root(face: u8) -> Self {
        CellId::from_face(face)
    }

    fn face(&self) -> u8 {
        CellId::face(*self)
    }

    fn zoom(&self) -> u8 {
        self.level()
    }

    fn ij(&self) -> (u32, u32) {
        let (_, i, j, _) = self.to_ij_at(self.level());
        (i, j)
    }

    fn parent(&self) -> Option<Self> {
        CellId::parent(*self)
    }

    fn children_ij(face: u8, zoom: u8, i: u32, j: u32) -> [Self; 4] {
        CellId::children_ij(face, zoom, i, j)
    }

    fn contains(&self, other: &Self) -> bool {
        CellId::contains(*self, *other)
    }

    /// Features are already in face S,T space.
    fn project(point: Point) -> Point {
        point
    }
}

/// A Web Mercator `z/x/y` tile.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize)]
pub struct PlanarTileId {
    pub zoom: u8,
    pub x: u32,
    pub y: u32,
}

impl PlanarTileId {
    pub fn new(zoom: u8, x: u32, y: u32) -> Self {
        Self { zoom, x, y }
    }
}

impl TileKey for PlanarTileId {
    const NUM_FACES: u8 = 1;

    fn root(_face: u8) -> Self {
        Self::new(0, 0, 0)
    }

    fn face(&self) -> u8 {
        0
    }

    fn zoom(&self) -> u8 {
        self.zoom
    }

    fn ij(&self) -> (u32, u32) {
        (self.x, self.y)
    }

    fn parent(&self) -> Option<Self> {
        (self.zoom > 0).then(|| Self::new(self.zoom - 1, self.x >> 1, self.y >> 1))
    }

    fn children_ij(_face: u8, zoom: u8, i: u32, j: u32) -> [Self; 4] {
        let (z, x, y) = (zoom + 1, i << 1, j << 1);
        [
            Self::new(z, x, y),
            Self::new(z, x + 1, y),
            Self::new(z, x, y + 1),
            Self::new(z, x + 1, y + 1),
        ]
    }

    fn contains(&self, other: &Self) -> bool {
        if other.zoom < self.zoom {
            return false;
        }
        let dz = other.zoom - self.zoom;
        other.x >> dz == self.x && other.y >> dz == self.y
    }

    /// Longitude/latitude to the Mercator unit square.
    fn project(point: Point) -> Point {
        lon_lat_to_mercator(point)
    }
}
