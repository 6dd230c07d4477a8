//! Hierarchical cell index over the cube-sphere.
//!
//! A [`CellId`] is a 64-bit value: three face bits, then up to 30 levels of
//! Hilbert-curve quadrant positions (two bits per level), then a single
//! sentinel bit whose position encodes the level.
//!
//! ```text
//!   fff ppppppp...pp 1 000...0
//!   │   │            │
//!   │   │            └─ sentinel (level marker)
//!   │   └─ 2 bits per level, Hilbert order
//!   └─ face 0-5
//! ```
//!
//! Every function here is pure arithmetic and safe to call from any thread.

mod adjacency;
mod coords;
mod lookup;

#[cfg(test)]
mod tests;

pub use adjacency::Direction;
pub use coords::{
    face_uv_to_xyz, face_xyz_to_uv, ij_to_st, lon_lat_to_xyz, siti_to_st, st_to_ij, st_to_uv,
    uv_to_st, xyz_to_face, xyz_to_face_uv, xyz_to_lon_lat, Xyz, MAX_SIZE,
};

use lookup::{LOOKUP, LOOKUP_BITS};
use std::fmt;
use std::str::FromStr;
use thiserror::Error;

/// Deepest level; leaf cells live here.
pub const MAX_LEVEL: u8 = 30;

/// Number of cube faces.
pub const NUM_FACES: u8 = 6;

const FACE_BITS: u32 = 3;
const POS_BITS: u32 = 2 * MAX_LEVEL as u32 + 1;

/// Offset that moves an id from past face 5 back to face 0.
const WRAP_OFFSET: u64 = (NUM_FACES as u64) << POS_BITS;

/// Errors from parsing a cell token.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum CellError {
    #[error("Invalid cell token: {0:?}")]
    InvalidToken(String),
}

/// A cell on the cube-sphere at some level in `0..=30`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct CellId(u64);

impl CellId {
    /// Wraps a raw id without validation.
    #[inline]
    pub const fn new(raw: u64) -> Self {
        Self(raw)
    }

    /// The raw 64-bit value.
    #[inline]
    pub const fn raw(self) -> u64 {
        self.0
    }

    /// The level-0 cell covering an entire face.
    #[inline]
    pub fn from_face(face: u8) -> Self {
        assert!(face < NUM_FACES, "invalid cube face {face}");
        Self(((face as u64) << POS_BITS) + lsb_for_level(0))
    }

    /// Cell at `level` containing the leaf at Hilbert position `pos` on `face`.
    pub fn from_face_pos_level(face: u8, pos: u64, level: u8) -> Self {
        assert!(face < NUM_FACES, "invalid cube face {face}");
        Self(((face as u64) << POS_BITS) + (pos | 1)).parent_at(level)
    }

    /// Cell at `level` with grid coordinates `(i, j)` in `[0, 2^level)`.
    ///
    /// Coordinates past the face edge are clamped to it.
    pub fn from_ij(face: u8, i: u32, j: u32, level: u8) -> Self {
        assert!(face < NUM_FACES, "invalid cube face {face}");
        assert!(level <= MAX_LEVEL, "invalid level {level}");
        let max = (1u64 << level) - 1;
        let shift = MAX_LEVEL - level;
        let i = (i as u64).min(max) << shift;
        let j = (j as u64).min(max) << shift;

        let mut n = (face as u64) << (POS_BITS - 1);
        let mut bits = (face & 1) as u64;
        let mask = (1u64 << LOOKUP_BITS) - 1;
        for k in (0..8u32).rev() {
            bits += ((i >> (k * LOOKUP_BITS)) & mask) << (LOOKUP_BITS + 2);
            bits += ((j >> (k * LOOKUP_BITS)) & mask) << 2;
            bits = LOOKUP.pos[bits as usize] as u64;
            n |= (bits >> 2) << (k * 2 * LOOKUP_BITS);
            bits &= 3;
        }

        let leaf = Self(n * 2 + 1);
        if level < MAX_LEVEL {
            leaf.parent_at(level)
        } else {
            leaf
        }
    }

    /// Leaf cell for `(i, j)` that may lie up to one leaf outside `face`.
    ///
    /// Such coordinates are reprojected onto the adjacent face.
    pub fn from_ij_wrap(face: u8, i: i64, j: i64) -> Self {
        let max = MAX_SIZE as i64;
        let i = i.clamp(-1, max);
        let j = j.clamp(-1, max);

        // Linear projection keeps the reprojected point just past the edge.
        let scale = 1.0 / MAX_SIZE as f64;
        let limit = 1.0 + f64::EPSILON;
        let u = (scale * (2 * (i - max / 2) + 1) as f64).clamp(-limit, limit);
        let v = (scale * (2 * (j - max / 2) + 1) as f64).clamp(-limit, limit);

        let (next_face, nu, nv) = xyz_to_face_uv(face_uv_to_xyz(face, u, v));
        Self::from_ij(
            next_face,
            st_to_ij(0.5 * (nu + 1.0)),
            st_to_ij(0.5 * (nv + 1.0)),
            MAX_LEVEL,
        )
    }

    /// The four children of the grid cell `(i, j)` at `level`, ordered
    /// bottom-left, bottom-right, top-left, top-right.
    pub fn children_ij(face: u8, level: u8, i: u32, j: u32) -> [CellId; 4] {
        let (i, j, level) = (i << 1, j << 1, level + 1);
        [
            Self::from_ij(face, i, j, level),
            Self::from_ij(face, i + 1, j, level),
            Self::from_ij(face, i, j + 1, level),
            Self::from_ij(face, i + 1, j + 1, level),
        ]
    }

    /// Leaf cell containing face-local `(s, t)`.
    pub fn from_st(face: u8, s: f64, t: f64) -> Self {
        Self::from_ij(face, st_to_ij(s), st_to_ij(t), MAX_LEVEL)
    }

    /// Leaf cell containing face-local `(u, v)`.
    pub fn from_uv(face: u8, u: f64, v: f64) -> Self {
        Self::from_st(face, uv_to_st(u), uv_to_st(v))
    }

    /// Leaf cell containing the direction `xyz`.
    pub fn from_xyz(xyz: Xyz) -> Self {
        let (face, u, v) = xyz_to_face_uv(xyz);
        Self::from_uv(face, u, v)
    }

    /// Leaf cell containing a longitude/latitude in degrees.
    pub fn from_lon_lat(lon: f64, lat: f64) -> Self {
        Self::from_xyz(lon_lat_to_xyz(lon, lat))
    }

    /// Cell at `level` whose [`distance`](Self::distance) is `d`.
    pub fn from_distance(d: u64, level: u8) -> Self {
        let shift = 2 * (MAX_LEVEL - level) as u32;
        Self((d << (shift + 1)) + (1u64 << shift))
    }

    /// Face this cell lies on.
    #[inline]
    pub fn face(self) -> u8 {
        (self.0 >> POS_BITS) as u8
    }

    /// Hilbert position within the face (sentinel included).
    #[inline]
    pub fn pos(self) -> u64 {
        self.0 & (u64::MAX >> FACE_BITS)
    }

    #[inline]
    pub fn level(self) -> u8 {
        MAX_LEVEL - (self.0.trailing_zeros().min(2 * MAX_LEVEL as u32) / 2) as u8
    }

    #[inline]
    pub fn is_leaf(self) -> bool {
        self.0 & 1 == 1
    }

    #[inline]
    pub fn is_face(self) -> bool {
        self.0 & (lsb_for_level(0) - 1) == 0
    }

    /// Lowest set bit (the level sentinel).
    #[inline]
    pub fn lsb(self) -> u64 {
        self.0 & self.0.wrapping_neg()
    }

    /// Leaf `(face, i, j)` and Hilbert orientation of this cell.
    pub fn to_ij(self) -> (u8, u32, u32, u8) {
        let face = self.face();
        let mut bits = (face & 1) as u64;
        let mut i = 0u64;
        let mut j = 0u64;
        let mask = (1u64 << LOOKUP_BITS) - 1;

        for k in (0..8u32).rev() {
            let nbits = if k == 7 {
                MAX_LEVEL as u32 - 7 * LOOKUP_BITS
            } else {
                LOOKUP_BITS
            };
            bits += ((self.0 >> (k * 2 * LOOKUP_BITS + 1)) & ((1u64 << (2 * nbits)) - 1)) << 2;
            bits = LOOKUP.ij[bits as usize] as u64;
            i += (bits >> (LOOKUP_BITS + 2)) << (k * LOOKUP_BITS);
            j += ((bits >> 2) & mask) << (k * LOOKUP_BITS);
            bits &= 3;
        }

        // Cells an even number of levels above the leaves flip the swap bit.
        if self.lsb() & 0x1111_1111_1111_1110 != 0 {
            bits ^= 1;
        }

        (face, i as u32, j as u32, bits as u8)
    }

    /// `(face, i, j, orientation)` with `i`, `j` on the grid of `level`.
    pub fn to_ij_at(self, level: u8) -> (u8, u32, u32, u8) {
        let (face, i, j, orientation) = self.to_ij();
        let shift = MAX_LEVEL - level;
        (face, i >> shift, j >> shift, orientation)
    }

    /// `(face, level, i, j)` on this cell's own grid.
    pub fn to_face_ij(self) -> (u8, u8, u32, u32) {
        let level = self.level();
        let (face, i, j, _) = self.to_ij_at(level);
        (face, level, i, j)
    }

    /// `(face, s, t)` of this cell's leaf anchor.
    pub fn to_st(self) -> (u8, f64, f64) {
        let (face, i, j, _) = self.to_ij();
        (face, ij_to_st(i), ij_to_st(j))
    }

    pub fn to_uv(self) -> (u8, f64, f64) {
        let (face, s, t) = self.to_st();
        (face, st_to_uv(s), st_to_uv(t))
    }

    /// Unit vector through the cell center.
    pub fn to_xyz(self) -> Xyz {
        let (face, s, t) = self.center_st();
        coords::normalize(face_uv_to_xyz(face, st_to_uv(s), st_to_uv(t)))
    }

    /// Longitude/latitude in degrees of the cell center.
    pub fn to_lon_lat(self) -> (f64, f64) {
        xyz_to_lon_lat(self.to_xyz())
    }

    /// Exact `(face, s, t)` center of the cell.
    pub fn center_st(self) -> (u8, f64, f64) {
        let (face, i, j, _) = self.to_ij();
        let delta = if self.is_leaf() {
            1
        } else if ((i as u64) ^ (self.0 >> 2)) & 1 != 0 {
            2
        } else {
            0
        };
        let si = 2 * i as u64 + delta;
        let ti = 2 * j as u64 + delta;
        (face, siti_to_st(si), siti_to_st(ti))
    }

    /// `[min_s, min_t, max_s, max_t]` of this cell's ancestor at `level`.
    pub fn bounds_st(self, level: u8) -> [f64; 4] {
        let (_, s, t) = self.parent_at(level.min(self.level())).center_st();
        let half = size_st(level) * 0.5;
        [s - half, t - half, s + half, t + half]
    }

    /// Ancestor one level up, or `None` for a face cell.
    pub fn parent(self) -> Option<CellId> {
        if self.is_face() {
            return None;
        }
        let lsb = self.lsb() << 2;
        Some(Self((self.0 & lsb.wrapping_neg()) | lsb))
    }

    /// Ancestor at `level`, which must not be deeper than this cell.
    pub fn parent_at(self, level: u8) -> CellId {
        debug_assert!(level <= self.level(), "level {level} below cell");
        let lsb = lsb_for_level(level);
        Self((self.0 & lsb.wrapping_neg()) | lsb)
    }

    /// Child at Hilbert position `pos` (0..4).
    pub fn child(self, pos: u8) -> CellId {
        debug_assert!(!self.is_leaf(), "leaf cells have no children");
        debug_assert!(pos < 4);
        let step = self.lsb() >> 2;
        let offset = (2 * pos as u64).wrapping_sub(3);
        Self(self.0.wrapping_add(offset.wrapping_mul(step)))
    }

    /// The four children in Hilbert order.
    pub fn children(self) -> [CellId; 4] {
        [self.child(0), self.child(1), self.child(2), self.child(3)]
    }

    /// Position (0..4) of this cell's ancestor at `level` within its parent.
    pub fn child_position(self, level: u8) -> u8 {
        debug_assert!((1..=self.level()).contains(&level));
        ((self.0 >> (2 * (MAX_LEVEL - level) as u32 + 1)) & 3) as u8
    }

    /// Smallest leaf id covered by this cell.
    #[inline]
    pub fn range_min(self) -> CellId {
        Self(self.0 - (self.lsb() - 1))
    }

    /// Largest leaf id covered by this cell.
    #[inline]
    pub fn range_max(self) -> CellId {
        Self(self.0 + (self.lsb() - 1))
    }

    /// Whether `other` is this cell or one of its descendants.
    pub fn contains(self, other: CellId) -> bool {
        other >= self.range_min() && other <= self.range_max()
    }

    /// Whether the leaf ranges of the two cells overlap.
    pub fn intersects(self, other: CellId) -> bool {
        other.range_min() <= self.range_max() && other.range_max() >= self.range_min()
    }

    /// Next cell at the same level along the curve, wrapping face 5 to face 0.
    pub fn next(self) -> CellId {
        let n = self.0.wrapping_add(self.lsb() << 1);
        if n < WRAP_OFFSET {
            Self(n)
        } else {
            Self(n - WRAP_OFFSET)
        }
    }

    /// Previous cell at the same level, wrapping face 0 to face 5.
    pub fn prev(self) -> CellId {
        let p = self.0.wrapping_sub(self.lsb() << 1);
        if p < WRAP_OFFSET {
            Self(p)
        } else {
            Self(p.wrapping_add(WRAP_OFFSET))
        }
    }

    /// Index of this cell among all cells of its level across every face.
    pub fn distance(self) -> u64 {
        self.distance_at(self.level())
    }

    /// Index of this cell's ancestor at `level` among cells of that level.
    pub fn distance_at(self, level: u8) -> u64 {
        self.0 >> (2 * (MAX_LEVEL - level) as u32 + 1)
    }

    /// Edge neighbours in [`Direction::ALL`] order.
    pub fn neighbors(self) -> [CellId; 4] {
        let level = self.level();
        let (face, i, j, _) = self.to_ij_at(level);
        Self::neighbors_ij(face, i, j, level)
    }

    /// Edge neighbours of grid cell `(i, j)` at `level`, crossing face edges
    /// where needed.
    pub fn neighbors_ij(face: u8, i: u32, j: u32, level: u8) -> [CellId; 4] {
        let n = 1u32 << level;
        Direction::ALL.map(|dir| {
            let (di, dj) = dir.offset();
            let ni = i as i64 + di;
            let nj = j as i64 + dj;
            if (0..n as i64).contains(&ni) && (0..n as i64).contains(&nj) {
                Self::from_ij(face, ni as u32, nj as u32, level)
            } else {
                let (nf, ni, nj) = adjacency::update_face(face, dir, i, j, n);
                Self::from_ij(nf, ni, nj, level)
            }
        })
    }

    /// Cells at `level` sharing the vertex closest to this cell's center.
    ///
    /// Returns four cells, or three when the vertex is a cube corner.
    pub fn vertex_neighbors(self, level: u8) -> Vec<CellId> {
        debug_assert!(level < MAX_LEVEL && level <= self.level());
        let (face, i, j, _) = self.to_ij();
        let (i, j) = (i as i64, j as i64);
        let half = size_ij(level + 1) as i64;
        let size = half << 1;
        let max = MAX_SIZE as i64;

        let (ioffset, isame) = if i & half != 0 {
            (size, i + size < max)
        } else {
            (-size, i - size >= 0)
        };
        let (joffset, jsame) = if j & half != 0 {
            (size, j + size < max)
        } else {
            (-size, j - size >= 0)
        };

        let at = |ni: i64, nj: i64, same: bool| {
            let leaf = if same {
                Self::from_ij(face, ni as u32, nj as u32, MAX_LEVEL)
            } else {
                Self::from_ij_wrap(face, ni, nj)
            };
            leaf.parent_at(level)
        };

        let mut cells = vec![
            self.parent_at(level),
            at(i + ioffset, j, isame),
            at(i, j + joffset, jsame),
        ];
        if isame || jsame {
            cells.push(at(i + ioffset, j + joffset, isame && jsame));
        }
        cells
    }

    /// Hex token with trailing zeros removed (`"X"` for the zero id).
    pub fn to_token(self) -> String {
        if self.0 == 0 {
            return "X".to_string();
        }
        let digits = 16 - (self.0.trailing_zeros() / 4) as usize;
        format!("{:016x}", self.0)[..digits].to_string()
    }
}

impl fmt::Display for CellId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.to_token())
    }
}

impl FromStr for CellId {
    type Err = CellError;

    fn from_str(token: &str) -> Result<Self, Self::Err> {
        if token == "X" {
            return Ok(Self(0));
        }
        if token.is_empty() || token.len() > 16 {
            return Err(CellError::InvalidToken(token.to_string()));
        }
        let value = u64::from_str_radix(token, 16)
            .map_err(|_| CellError::InvalidToken(token.to_string()))?;
        Ok(Self(value << (4 * (16 - token.len()))))
    }
}

impl From<CellId> for u64 {
    fn from(id: CellId) -> Self {
        id.0
    }
}

/// Sentinel bit of a cell at `level`.
#[inline]
pub fn lsb_for_level(level: u8) -> u64 {
    1u64 << (2 * (MAX_LEVEL - level) as u32)
}

/// Leaf cells along one edge of a cell at `level`.
#[inline]
pub fn size_ij(level: u8) -> u32 {
    1 << (MAX_LEVEL - level)
}

/// Edge length in S,T of a cell at `level`.
#[inline]
pub fn size_st(level: u8) -> f64 {
    ij_to_st(size_ij(level))
}
