//! Planar Hilbert tile ids.
//!
//! Tile ids count every tile of the lower zooms first, then the Hilbert
//! position within the tile's own zoom, so `0/0/0` is 0 and `1/0/0` is 1.

use super::error::{ArchiveError, Result};

/// Deepest zoom whose tile ids fit in a `u64`.
pub const MAX_TILE_ZOOM: u8 = 31;

/// Number of tiles on all zoom levels below `zoom`.
fn tiles_before(zoom: u8) -> u64 {
    ((1u64 << (2 * zoom as u32)) - 1) / 3
}

fn rotate(n: u64, x: &mut u64, y: &mut u64, rx: u64, ry: u64) {
    if ry == 0 {
        if rx == 1 {
            *x = n - 1 - *x;
            *y = n - 1 - *y;
        }
        std::mem::swap(x, y);
    }
}

/// Encode `zoom/x/y` as a tile id.
pub fn zxy_to_tile_id(zoom: u8, x: u32, y: u32) -> Result<u64> {
    if zoom > MAX_TILE_ZOOM {
        return Err(ArchiveError::InvalidTileCoordinates { zoom, x, y });
    }
    let n = 1u64 << zoom;
    if x as u64 >= n || y as u64 >= n {
        return Err(ArchiveError::InvalidTileCoordinates { zoom, x, y });
    }

    let (mut tx, mut ty) = (x as u64, y as u64);
    let mut d = 0u64;
    let mut s = n >> 1;
    while s > 0 {
        let rx = u64::from(tx & s != 0);
        let ry = u64::from(ty & s != 0);
        d += s * s * ((3 * rx) ^ ry);
        rotate(n, &mut tx, &mut ty, rx, ry);
        s >>= 1;
    }
    Ok(tiles_before(zoom) + d)
}

/// Decode a tile id into `(zoom, x, y)`.
pub fn tile_id_to_zxy(tile_id: u64) -> Result<(u8, u32, u32)> {
    let mut acc = 0u64;
    for zoom in 0..=MAX_TILE_ZOOM {
        let num_tiles = 1u64 << (2 * zoom as u32);
        if tile_id - acc < num_tiles {
            let (x, y) = position_on_level(zoom, tile_id - acc);
            return Ok((zoom, x, y));
        }
        acc += num_tiles;
    }
    Err(ArchiveError::TileIdOutOfRange(tile_id))
}

fn position_on_level(zoom: u8, pos: u64) -> (u32, u32) {
    let n = 1u64 << zoom;
    let (mut x, mut y) = (0u64, 0u64);
    let mut t = pos;
    let mut s = 1u64;
    while s < n {
        let rx = 1 & (t >> 1);
        let ry = 1 & (t ^ rx);
        rotate(s, &mut x, &mut y, rx, ry);
        x += s * rx;
        y += s * ry;
        t >>= 2;
        s <<= 1;
    }
    (x as u32, y as u32)
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;

    #[test]
    fn test_known_ids() {
        assert_eq!(zxy_to_tile_id(0, 0, 0).unwrap(), 0);
        assert_eq!(zxy_to_tile_id(1, 0, 0).unwrap(), 1);
        assert_eq!(zxy_to_tile_id(1, 0, 1).unwrap(), 2);
        assert_eq!(zxy_to_tile_id(1, 1, 1).unwrap(), 3);
        assert_eq!(zxy_to_tile_id(1, 1, 0).unwrap(), 4);
        assert_eq!(zxy_to_tile_id(2, 0, 0).unwrap(), 5);
    }

    #[test]
    fn test_round_trip_low_zooms() {
        for z in 0..10u8 {
            let n = 1u32 << z;
            for x in 0..n {
                for y in 0..n {
                    let id = zxy_to_tile_id(z, x, y).unwrap();
                    assert_eq!(tile_id_to_zxy(id).unwrap(), (z, x, y));
                }
            }
        }
    }

    #[test]
    fn test_ids_are_dense_per_zoom() {
        let mut ids: Vec<u64> = (0..8u32)
            .flat_map(|x| (0..8u32).map(move |y| zxy_to_tile_id(3, x, y).unwrap()))
            .collect();
        ids.sort_unstable();
        assert_eq!(ids, (21..85).collect::<Vec<u64>>());
    }

    #[test]
    fn test_out_of_bounds() {
        assert!(matches!(
            zxy_to_tile_id(2, 4, 0),
            Err(ArchiveError::InvalidTileCoordinates { zoom: 2, x: 4, y: 0 })
        ));
        assert!(zxy_to_tile_id(32, 0, 0).is_err());
        assert!(matches!(tile_id_to_zxy(u64::MAX), Err(ArchiveError::TileIdOutOfRange(_))));
    }

    #[test]
    fn test_deepest_zoom() {
        let max = (1u32 << MAX_TILE_ZOOM) - 1;
        let id = zxy_to_tile_id(MAX_TILE_ZOOM, max, 0).unwrap();
        assert_eq!(tile_id_to_zxy(id).unwrap(), (MAX_TILE_ZOOM, max, 0));
    }

    proptest! {
        #[test]
        fn prop_round_trip(z in 0u8..=MAX_TILE_ZOOM, x in any::<u32>(), y in any::<u32>()) {
            let mask = ((1u64 << z) - 1) as u32;
            let (x, y) = (x & mask, y & mask);
            let id = zxy_to_tile_id(z, x, y).unwrap();
            prop_assert_eq!(tile_id_to_zxy(id).unwrap(), (z, x, y));
        }
    }
}
