//! Hilbert curve lookup tables.
//!
//! Each table maps 4 bits of `i`, 4 bits of `j` and a 2-bit orientation to
//! 8 bits of curve position plus the orientation of the next sub-square
//! (and the reverse for `ij`). Both are computed at compile time.

/// Number of `i`/`j` bits consumed per table lookup.
pub(super) const LOOKUP_BITS: u32 = 4;

const SWAP_MASK: u16 = 0x01;
const INVERT_MASK: u16 = 0x02;

/// Orientation change applied when descending into each child position.
pub(super) const POS_TO_ORIENTATION: [u16; 4] = [SWAP_MASK, 0, 0, INVERT_MASK | SWAP_MASK];

/// `(i, j)` quadrant (encoded `2*i + j`) of each child position, per orientation.
pub(super) const POS_TO_IJ: [[u16; 4]; 4] = [
    [0, 1, 3, 2], // canonical order
    [0, 2, 3, 1], // axes swapped
    [3, 2, 0, 1], // bits inverted
    [3, 1, 0, 2], // swapped & inverted
];

const TABLE_SIZE: usize = 1 << (2 * LOOKUP_BITS + 2);

pub(super) struct LookupTables {
    /// `(i << 4 | j) << 2 | orientation` -> `pos << 2 | orientation`
    pub pos: [u16; TABLE_SIZE],
    /// `pos << 2 | orientation` -> `(i << 4 | j) << 2 | orientation`
    pub ij: [u16; TABLE_SIZE],
}

pub(super) static LOOKUP: LookupTables = build_tables();

const fn build_tables() -> LookupTables {
    let mut pos_table = [0u16; TABLE_SIZE];
    let mut ij_table = [0u16; TABLE_SIZE];

    let mut orig = 0u16;
    while orig < 4 {
        let mut pos = 0u16;
        while pos < 256 {
            let mut i = 0u16;
            let mut j = 0u16;
            let mut orientation = orig;

            let mut level = 0u16;
            while level < LOOKUP_BITS as u16 {
                let quad = ((pos >> (2 * (3 - level))) & 3) as usize;
                let r = POS_TO_IJ[orientation as usize][quad];
                i = (i << 1) | (r >> 1);
                j = (j << 1) | (r & 1);
                orientation ^= POS_TO_ORIENTATION[quad];
                level += 1;
            }

            let ij = (i << LOOKUP_BITS) | j;
            pos_table[((ij << 2) + orig) as usize] = (pos << 2) + orientation;
            ij_table[((pos << 2) + orig) as usize] = (ij << 2) + orientation;
            pos += 1;
        }
        orig += 1;
    }

    LookupTables {
        pos: pos_table,
        ij: ij_table,
    }
}
