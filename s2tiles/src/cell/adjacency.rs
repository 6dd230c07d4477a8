//! Edge adjacency between cube faces.
//!
//! Each face borders exactly four others and the coordinate mapping across
//! every edge is fixed, so stepping off a face is a table lookup.

/// Direction of an edge neighbour in face-local `(i, j)` space.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Direction {
    /// `j - 1`
    Down = 0,
    /// `i + 1`
    Right = 1,
    /// `j + 1`
    Up = 2,
    /// `i - 1`
    Left = 3,
}

impl Direction {
    /// All directions in neighbour order.
    pub const ALL: [Direction; 4] = [
        Direction::Down,
        Direction::Right,
        Direction::Up,
        Direction::Left,
    ];

    /// Grid step `(di, dj)` taken in this direction.
    pub fn offset(self) -> (i64, i64) {
        match self {
            Direction::Down => (0, -1),
            Direction::Right => (1, 0),
            Direction::Up => (0, 1),
            Direction::Left => (-1, 0),
        }
    }
}

/// How a coordinate on the neighbouring face is derived from the position
/// `k` along the crossed edge.
#[derive(Debug, Clone, Copy)]
enum Axis {
    Zero,
    Last,
    Along,
    Reversed,
}

impl Axis {
    fn resolve(self, k: u32, n: u32) -> u32 {
        match self {
            Axis::Zero => 0,
            Axis::Last => n - 1,
            Axis::Along => k,
            Axis::Reversed => n - 1 - k,
        }
    }
}

use Axis::{Along, Last, Reversed, Zero};

/// `(face, i, j)` reached when leaving each face in each [`Direction`].
const UPDATE_FACE: [[(u8, Axis, Axis); 4]; 6] = [
    [(5, Along, Last), (1, Zero, Along), (2, Zero, Reversed), (4, Reversed, Last)],
    [(5, Last, Reversed), (3, Reversed, Zero), (2, Along, Zero), (0, Last, Along)],
    [(1, Along, Last), (3, Zero, Along), (4, Zero, Reversed), (0, Reversed, Last)],
    [(1, Last, Reversed), (5, Reversed, Zero), (4, Along, Zero), (2, Last, Along)],
    [(3, Along, Last), (5, Zero, Along), (0, Zero, Reversed), (2, Reversed, Last)],
    [(3, Last, Reversed), (1, Reversed, Zero), (0, Along, Zero), (4, Last, Along)],
];

/// Maps the cell `(i, j)` on the border of `face` across the edge in
/// direction `dir`, at a level with `n` cells per side.
///
/// The caller guarantees the step actually leaves the face.
pub(super) fn update_face(face: u8, dir: Direction, i: u32, j: u32, n: u32) -> (u8, u32, u32) {
    let k = match dir {
        Direction::Down | Direction::Up => i,
        Direction::Right | Direction::Left => j,
    };
    let (next_face, ni, nj) = UPDATE_FACE[face as usize][dir as usize];
    (next_face, ni.resolve(k, n), nj.resolve(k, n))
}
