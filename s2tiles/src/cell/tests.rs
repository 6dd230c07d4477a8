//! Tests for cell id arithmetic

use super::*;
use proptest::prelude::*;

fn cell_strategy() -> impl Strategy<Value = (u8, u8, u32, u32)> {
    (0u8..NUM_FACES, 0u8..=MAX_LEVEL).prop_flat_map(|(face, level)| {
        let n = 1u32 << level;
        (Just(face), Just(level), 0..n, 0..n)
    })
}

#[test]
fn test_face_cells() {
    assert_eq!(CellId::from_face(0).raw(), 0x1000_0000_0000_0000);
    assert_eq!(CellId::from_face(5).raw(), 0xb000_0000_0000_0000);
    for face in 0..NUM_FACES {
        let id = CellId::from_face(face);
        assert_eq!(id.face(), face);
        assert_eq!(id.level(), 0);
        assert!(id.is_face());
        assert!(!id.is_leaf());
        assert_eq!(id.parent(), None);
    }
}

#[test]
fn test_from_ij_known_values() {
    assert_eq!(CellId::from_ij(0, 0, 0, MAX_LEVEL).raw(), 1);
    assert_eq!(
        CellId::from_ij(0, 1 << 29, 1 << 29, MAX_LEVEL).raw(),
        0x1000_0000_0000_0001
    );
    assert_eq!(CellId::from_ij(0, 0, 0, 1).raw(), 0x0400_0000_0000_0000);
    assert_eq!(CellId::from_ij(0, 1, 0, 1).raw(), 0x1c00_0000_0000_0000);
    assert_eq!(CellId::from_ij(0, 0, 1, 1).raw(), 0x0c00_0000_0000_0000);
    assert_eq!(CellId::from_ij(0, 1, 1, 1).raw(), 0x1400_0000_0000_0000);
    assert_eq!(CellId::from_ij(3, 5, 9, 4).raw(), 0x7b10_0000_0000_0000);
    assert_eq!(CellId::from_ij(2, 1, 2, 2).raw(), 0x4f00_0000_0000_0000);
}

#[test]
fn test_from_ij_clamps_out_of_range() {
    assert_eq!(
        CellId::from_ij(1, 9, 2, 2),
        CellId::from_ij(1, 3, 2, 2),
        "i past the edge clamps to the last column"
    );
}

#[test]
fn test_face_one_uses_flipped_orientation() {
    let ids: Vec<u64> = [(0, 0), (1, 0), (0, 1), (1, 1)]
        .iter()
        .map(|&(i, j)| CellId::from_ij(1, i, j, 1).raw())
        .collect();
    assert_eq!(
        ids,
        vec![
            0x2400_0000_0000_0000,
            0x2c00_0000_0000_0000,
            0x3c00_0000_0000_0000,
            0x3400_0000_0000_0000
        ]
    );
}

#[test]
fn test_to_ij_at_level() {
    let id = CellId::from_ij(2, 1, 2, 2);
    let (face, i, j, _) = id.to_ij_at(2);
    assert_eq!((face, i, j), (2, 1, 2));
    assert_eq!(id.to_face_ij(), (2, 2, 1, 2));
}

#[test]
fn test_children_in_hilbert_order() {
    let face = CellId::from_face(0);
    let raw: Vec<u64> = face.children().iter().map(|c| c.raw()).collect();
    assert_eq!(
        raw,
        vec![
            0x0400_0000_0000_0000,
            0x0c00_0000_0000_0000,
            0x1400_0000_0000_0000,
            0x1c00_0000_0000_0000
        ]
    );
    for (pos, child) in face.children().iter().enumerate() {
        assert_eq!(child.level(), 1);
        assert_eq!(child.parent(), Some(face));
        assert_eq!(child.child_position(1), pos as u8);
    }
}

#[test]
fn test_children_ij_quadrants() {
    let [bl, br, tl, tr] = CellId::children_ij(0, 0, 0, 0);
    assert_eq!(bl, CellId::from_ij(0, 0, 0, 1));
    assert_eq!(br, CellId::from_ij(0, 1, 0, 1));
    assert_eq!(tl, CellId::from_ij(0, 0, 1, 1));
    assert_eq!(tr, CellId::from_ij(0, 1, 1, 1));
}

#[test]
fn test_from_face_pos_level() {
    let id = CellId::from_ij(4, 11, 6, 5);
    assert_eq!(CellId::from_face_pos_level(4, id.pos(), 5), id);
    assert_eq!(CellId::from_face_pos_level(4, id.pos(), 0), CellId::from_face(4));
}

#[test]
fn test_range_of_face() {
    let face = CellId::from_face(5);
    assert_eq!(face.range_min().raw(), 0xa000_0000_0000_0001);
    assert_eq!(face.range_max().raw(), 0xbfff_ffff_ffff_ffff);
}

#[test]
fn test_next_prev_wrap_across_faces() {
    assert_eq!(CellId::from_face(0).next(), CellId::from_face(1));
    assert_eq!(CellId::from_face(5).next(), CellId::from_face(0));
    assert_eq!(CellId::from_face(0).prev(), CellId::from_face(5));

    let last_leaf = CellId::from_face(5).range_max();
    let first_leaf = CellId::from_face(0).range_min();
    assert_eq!(last_leaf.next(), first_leaf);
    assert_eq!(first_leaf.prev(), last_leaf);
}

#[test]
fn test_distance_round_trip() {
    let id = CellId::from_ij(3, 5, 9, 4);
    let d = id.distance();
    assert_eq!(CellId::from_distance(d, 4), id);
    assert_eq!(CellId::from_face(0).distance(), 0);
    assert_eq!(CellId::from_face(3).distance(), 3);
    assert_eq!(id.distance_at(0), 3);
}

#[test]
fn test_contains_and_intersects() {
    let face = CellId::from_face(2);
    let child = CellId::from_ij(2, 1, 2, 2);
    let other_face = CellId::from_ij(3, 1, 2, 2);

    assert!(face.contains(child));
    assert!(!child.contains(face));
    assert!(!face.contains(other_face));
    assert!(face.intersects(child));
    assert!(child.intersects(face));
    assert!(!child.intersects(other_face));
}

#[test]
fn test_face_neighbors() {
    let raw: Vec<u64> = CellId::from_face(0)
        .neighbors()
        .iter()
        .map(|c| c.raw())
        .collect();
    assert_eq!(
        raw,
        vec![
            0xb000_0000_0000_0000,
            0x3000_0000_0000_0000,
            0x5000_0000_0000_0000,
            0x9000_0000_0000_0000
        ]
    );
}

#[test]
fn test_interior_neighbors_stay_on_face() {
    let id = CellId::from_ij(1, 5, 5, 4);
    let expected = [
        CellId::from_ij(1, 5, 4, 4),
        CellId::from_ij(1, 6, 5, 4),
        CellId::from_ij(1, 5, 6, 4),
        CellId::from_ij(1, 4, 5, 4),
    ];
    assert_eq!(id.neighbors(), expected);
}

#[test]
fn test_vertex_neighbors() {
    let id = CellId::from_ij(0, 5, 5, 4);
    let cells = id.vertex_neighbors(3);
    assert_eq!(cells.len(), 4);
    assert!(cells.iter().all(|c| c.level() == 3));
    assert_eq!(cells[0], id.parent_at(3));

    // A face corner touches only three cells.
    let corner = CellId::from_ij(0, 0, 0, 4);
    assert_eq!(corner.vertex_neighbors(3).len(), 3);
}

#[test]
fn test_center_and_bounds() {
    let (face, s, t) = CellId::from_face(4).center_st();
    assert_eq!((face, s, t), (4, 0.5, 0.5));

    let child = CellId::from_ij(4, 1, 0, 1);
    let (_, s, t) = child.center_st();
    assert_eq!((s, t), (0.75, 0.25));
    assert_eq!(child.bounds_st(1), [0.5, 0.0, 1.0, 0.5]);
    assert_eq!(size_st(1), 0.5);
    assert_eq!(size_ij(30), 1);
}

#[test]
fn test_lon_lat() {
    assert_eq!(CellId::from_lon_lat(0.0, 0.0).face(), 0);
    assert_eq!(CellId::from_lon_lat(90.0, 0.0).face(), 1);
    assert_eq!(CellId::from_lon_lat(0.0, 90.0).face(), 2);
    assert_eq!(CellId::from_lon_lat(180.0, 0.0).face(), 3);
    assert_eq!(CellId::from_lon_lat(0.0, -90.0).face(), 5);

    let (lon, lat) = CellId::from_lon_lat(12.5, -33.25).to_lon_lat();
    assert!((lon - 12.5).abs() < 1e-6);
    assert!((lat + 33.25).abs() < 1e-6);
}

#[test]
fn test_tokens() {
    assert_eq!(CellId::from_face(0).to_token(), "1");
    assert_eq!(CellId::from_face(3).to_string(), "7");
    assert_eq!(CellId::new(1).to_token(), "0000000000000001");
    assert_eq!(CellId::new(0).to_token(), "X");

    assert_eq!("7".parse::<CellId>(), Ok(CellId::from_face(3)));
    assert_eq!("X".parse::<CellId>(), Ok(CellId::new(0)));
    assert!("xyz".parse::<CellId>().is_err());
    assert!("".parse::<CellId>().is_err());
    assert!("00000000000000001".parse::<CellId>().is_err());
}

#[test]
fn test_from_ij_wrap_steps_onto_adjacent_face() {
    // One leaf right of face 0 lands on face 1's left column.
    let id = CellId::from_ij_wrap(0, MAX_SIZE as i64, 1 << 29);
    let (face, i, _, _) = id.to_ij();
    assert_eq!(face, 1);
    assert_eq!(i, 0);
}

proptest! {
    #[test]
    fn prop_ij_round_trip((face, level, i, j) in cell_strategy()) {
        let id = CellId::from_ij(face, i, j, level);
        prop_assert_eq!(id.level(), level);
        let (f, ri, rj, _) = id.to_ij_at(level);
        prop_assert_eq!((f, ri, rj), (face, i, j));
    }

    #[test]
    fn prop_parent_contains_child((face, level, i, j) in cell_strategy()) {
        let id = CellId::from_ij(face, i, j, level);
        prop_assert!(id.contains(id));
        if let Some(parent) = id.parent() {
            prop_assert!(parent.contains(id));
            prop_assert!(!id.contains(parent));
            prop_assert!(parent.children().contains(&id));
            prop_assert!(CellId::from_face(face).contains(parent));
        }
    }

    #[test]
    fn prop_contains_is_transitive((face, level, i, j) in cell_strategy()) {
        let id = CellId::from_ij(face, i, j, level);
        for outer in 0..=level {
            for inner in outer..=level {
                prop_assert!(id.parent_at(outer).contains(id.parent_at(inner)));
            }
        }
    }

    #[test]
    fn prop_neighbors_distinct_and_symmetric((face, level, i, j) in cell_strategy()) {
        prop_assume!(level < MAX_LEVEL);
        let id = CellId::from_ij(face, i, j, level);
        let neighbors = id.neighbors();
        for (k, a) in neighbors.iter().enumerate() {
            prop_assert_eq!(a.level(), level);
            prop_assert_ne!(*a, id);
            for b in &neighbors[k + 1..] {
                prop_assert_ne!(a, b);
            }
            prop_assert!(a.neighbors().contains(&id));
        }
    }

    #[test]
    fn prop_neighbors_match_reprojection((face, level, i, j) in cell_strategy()) {
        prop_assume!(level < MAX_LEVEL);
        let id = CellId::from_ij(face, i, j, level);
        let (_, li, lj, _) = id.to_ij();
        let size = size_ij(level) as i64;
        let expected = Direction::ALL.map(|dir| {
            let (di, dj) = dir.offset();
            CellId::from_ij_wrap(face, li as i64 + di * size, lj as i64 + dj * size)
                .parent_at(level)
        });
        prop_assert_eq!(id.neighbors(), expected);
    }

    #[test]
    fn prop_token_round_trip((face, level, i, j) in cell_strategy()) {
        let id = CellId::from_ij(face, i, j, level);
        prop_assert_eq!(id.to_token().parse::<CellId>(), Ok(id));
    }
}
