//! Tile pyramid construction and on-demand refinement.

use std::collections::HashMap;
use std::sync::Arc;

use rayon::prelude::*;
use tracing::{debug, trace};

use super::clip::{clip, ClipTile};
use super::config::BuilderConfig;
use super::error::BuilderError;
use super::feature::{convert, FeatureSet, VectorFeature};
use super::key::{PlanarTileId, TileKey};
use super::tile::{Tile, TileNode, TileState};
use crate::cell::CellId;
use crate::geometry::FeatureCollection;

/// A vector tile pyramid over the six cube faces.
pub type S2TilePyramid = TilePyramid<CellId>;

/// A vector tile pyramid over the Web Mercator plane.
pub type PlanarTilePyramid = TilePyramid<PlanarTileId>;

/// A sparse quadtree of vector tiles.
///
/// Construction eagerly builds the top of every non-empty face down to
/// `index_maxzoom`. Deeper tiles are cut from their nearest retained ancestor
/// the first time they are requested.
///
/// # Example
///
/// ```
/// use s2tiles::cell::CellId;
/// use s2tiles::geometry::{Feature, FeatureCollection, Geometry};
/// use s2tiles::pyramid::{BuilderConfig, TilePyramid};
///
/// let features = FeatureCollection::new(vec![Feature::new(0, Geometry::Point([0.3, 0.6]))]);
/// let config = BuilderConfig::new().with_maxzoom(6).with_index_maxzoom(2);
/// let mut pyramid = TilePyramid::<CellId>::new(&features, config).unwrap();
///
/// let tile = pyramid.get_tile(CellId::from_face(0)).unwrap();
/// assert_eq!(tile.num_features, 1);
/// ```
pub struct TilePyramid<K: TileKey = CellId> {
    config: BuilderConfig,
    faces: Vec<u8>,
    tiles: HashMap<K, TileNode>,
}

impl<K: TileKey> TilePyramid<K> {
    /// Validate `config`, project the input and build the top of the pyramid.
    pub fn new(collection: &FeatureCollection, config: BuilderConfig) -> Result<Self, BuilderError> {
        config.validate()?;
        if K::NUM_FACES > 1 {
            if let Some((index, feature)) = collection
                .features
                .iter()
                .enumerate()
                .find(|(_, f)| f.face >= K::NUM_FACES)
            {
                return Err(BuilderError::InvalidFace {
                    index,
                    face: feature.face,
                    faces: K::NUM_FACES,
                });
            }
        }

        let mut by_face: Vec<Vec<VectorFeature>> = vec![Vec::new(); K::NUM_FACES as usize];
        for feature in convert::<K>(collection, &config) {
            by_face[feature.face as usize].push(feature);
        }
        let faces: Vec<(u8, Vec<VectorFeature>)> = by_face
            .into_iter()
            .enumerate()
            .filter(|(_, features)| !features.is_empty())
            .map(|(face, features)| (face as u8, features))
            .collect();

        let built: Vec<(u8, HashMap<K, TileNode>)> = faces
            .into_par_iter()
            .map(|(face, features)| {
                let count = features.len();
                let mut tiles = HashMap::new();
                split_tile(&mut tiles, &config, Arc::new(features), K::root(face), None);
                debug!(face, features = count, tiles = tiles.len(), "Built face index");
                (face, tiles)
            })
            .collect();

        let mut pyramid = Self {
            config,
            faces: Vec::with_capacity(built.len()),
            tiles: HashMap::new(),
        };
        for (face, tiles) in built {
            pyramid.faces.push(face);
            pyramid.tiles.extend(tiles);
        }
        debug!(
            faces = pyramid.faces.len(),
            tiles = pyramid.tiles.len(),
            "Tile pyramid ready"
        );
        Ok(pyramid)
    }

    pub fn config(&self) -> &BuilderConfig {
        &self.config
    }

    /// Faces that received at least one feature.
    pub fn faces(&self) -> &[u8] {
        &self.faces
    }

    /// Number of tiles materialised so far.
    pub fn len(&self) -> usize {
        self.tiles.len()
    }

    pub fn is_empty(&self) -> bool {
        self.tiles.is_empty()
    }

    /// Whether `key` has been materialised, without building it.
    pub fn contains_tile(&self, key: K) -> bool {
        self.tiles.contains_key(&key)
    }

    /// State of a materialised tile.
    pub fn tile_state(&self, key: K) -> Option<TileState> {
        self.tiles.get(&key).map(TileNode::state)
    }

    /// Fetch the tile at `key`, cutting it from its nearest ancestor if needed.
    ///
    /// Returns `None` outside `[minzoom, maxzoom]`, on faces without data and
    /// where the nearest ancestor has already discarded its source.
    pub fn get_tile(&mut self, key: K) -> Option<&Tile> {
        let zoom = key.zoom();
        if zoom < self.config.minzoom() || zoom > self.config.maxzoom() {
            return None;
        }
        if !self.faces.contains(&key.face()) {
            return None;
        }

        if !self.tiles.contains_key(&key) {
            let mut ancestor = key.parent();
            while let Some(candidate) = ancestor {
                if self.tiles.contains_key(&candidate) {
                    break;
                }
                ancestor = candidate.parent();
            }
            let ancestor = ancestor?;
            let Some(source) = self.tiles.get(&ancestor).and_then(|n| n.source.clone()) else {
                trace!(?key, ?ancestor, "Ancestor already split, tile is empty");
                return None;
            };
            trace!(?key, ?ancestor, "Refining tile on demand");
            split_tile(&mut self.tiles, &self.config, source, ancestor, Some(key));
        }

        self.tiles.get_mut(&key).map(TileNode::transformed)
    }
}

/// Build tiles from `(features, key)` downwards with an explicit stack.
///
/// Without a `target` the descent stops at `index_maxzoom` or once a tile
/// holds few enough points. With a `target` only the path to it is expanded.
fn split_tile<K: TileKey>(
    tiles: &mut HashMap<K, TileNode>,
    config: &BuilderConfig,
    features: FeatureSet,
    key: K,
    target: Option<K>,
) {
    let mut stack = vec![(features, key)];

    while let Some((features, key)) = stack.pop() {
        let face = key.face();
        let zoom = key.zoom();
        let (i, j) = key.ij();

        let node = tiles
            .entry(key)
            .or_insert_with(|| TileNode::create(&features, face, zoom, i, j, config));

        let stop = zoom == config.maxzoom()
            || match target {
                None => {
                    zoom >= config.index_maxzoom()
                        || node.tile.num_points <= config.index_max_points()
                }
                Some(target) => zoom == target.zoom() || !key.contains(&target),
            };
        if stop {
            continue;
        }

        node.source = None;
        if features.is_empty() {
            continue;
        }

        let bounds = ClipTile {
            zoom,
            i,
            j,
            bbox: node.tile.bbox,
        };
        let quadrants = clip(&features, &bounds, config.extent(), config.buffer());
        for (child, child_features) in K::children_ij(face, zoom, i, j).into_iter().zip(quadrants) {
            stack.push((child_features, child));
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::geometry::{Feature, Geometry, VectorGeometry};

    fn unit_square(face: u8) -> Feature {
        Feature::new(
            face,
            Geometry::Polygon(vec![vec![
                [0.0, 0.0],
                [1.0, 0.0],
                [1.0, 1.0],
                [0.0, 1.0],
                [0.0, 0.0],
            ]]),
        )
    }

    fn scattered_points(face: u8, n: usize) -> Feature {
        let points = (0..n)
            .map(|k| {
                let v = (k as f64 + 0.5) / n as f64;
                [v, 1.0 - v]
            })
            .collect();
        Feature::new(face, Geometry::MultiPoint(points))
    }

    #[test]
    fn test_invalid_config_rejected() {
        let collection = FeatureCollection::new(vec![unit_square(0)]);
        let config = BuilderConfig::new().with_maxzoom(30);
        assert!(matches!(
            TilePyramid::<CellId>::new(&collection, config),
            Err(BuilderError::MaxZoomOutOfRange { .. })
        ));
    }

    #[test]
    fn test_invalid_face_rejected() {
        let collection = FeatureCollection::new(vec![unit_square(0), unit_square(6)]);
        let err = TilePyramid::<CellId>::new(&collection, BuilderConfig::new())
            .err()
            .unwrap();
        assert_eq!(
            err,
            BuilderError::InvalidFace {
                index: 1,
                face: 6,
                faces: 6
            }
        );
    }

    #[test]
    fn test_faces_partitioned() {
        let collection = FeatureCollection::new(vec![unit_square(1), unit_square(4)]);
        let config = BuilderConfig::new().with_maxzoom(3).with_index_maxzoom(1).with_buffer(0);
        let mut pyramid = TilePyramid::<CellId>::new(&collection, config).unwrap();

        let mut faces = pyramid.faces().to_vec();
        faces.sort_unstable();
        assert_eq!(faces, vec![1, 4]);
        assert!(pyramid.get_tile(CellId::from_face(0)).is_none());
        assert_eq!(pyramid.get_tile(CellId::from_face(1)).unwrap().face, 1);
        assert_eq!(pyramid.get_tile(CellId::from_face(4)).unwrap().num_features, 1);
    }

    #[test]
    fn test_eager_build_stops_at_index_maxzoom() {
        let collection = FeatureCollection::new(vec![unit_square(0)]);
        let config = BuilderConfig::new()
            .with_maxzoom(8)
            .with_index_maxzoom(2)
            .with_index_max_points(0);
        let pyramid = TilePyramid::<CellId>::new(&collection, config).unwrap();

        // 1 + 4 + 16 tiles, nothing deeper.
        assert_eq!(pyramid.len(), 21);
        assert_eq!(pyramid.tile_state(CellId::from_face(0)), Some(TileState::Split));
        let deep = CellId::from_ij(0, 0, 0, 2);
        assert_eq!(pyramid.tile_state(deep), Some(TileState::Unsplit));
    }

    #[test]
    fn test_eager_build_stops_below_point_threshold() {
        let collection = FeatureCollection::new(vec![scattered_points(0, 8)]);
        let config = BuilderConfig::new().with_maxzoom(8).with_index_maxzoom(6);
        let pyramid = TilePyramid::<CellId>::new(&collection, config).unwrap();
        assert_eq!(pyramid.len(), 1);
        assert_eq!(pyramid.tile_state(CellId::from_face(0)), Some(TileState::Unsplit));
    }

    #[test]
    fn test_lazy_refinement_builds_only_the_path() {
        let collection = FeatureCollection::new(vec![scattered_points(0, 32)]);
        let config = BuilderConfig::new().with_maxzoom(10).with_index_maxzoom(1);
        let mut pyramid = TilePyramid::<CellId>::new(&collection, config).unwrap();
        assert_eq!(pyramid.len(), 1);

        let target = CellId::from_st(0, 0.5 / 32.0, 1.0 - 0.5 / 32.0).parent_at(5);
        assert!(!pyramid.contains_tile(target));
        let tile = pyramid.get_tile(target).unwrap();
        assert_eq!(tile.zoom, 5);
        assert_eq!(tile.feature_count(), 1);

        // Four children per split level on the way down.
        assert_eq!(pyramid.len(), 1 + 4 * 5);
        assert_eq!(pyramid.tile_state(target), Some(TileState::Unsplit));
        assert_eq!(pyramid.tile_state(CellId::from_face(0)), Some(TileState::Split));
    }

    #[test]
    fn test_repeated_get_tile_is_stable() {
        let collection = FeatureCollection::new(vec![unit_square(2)]);
        let config = BuilderConfig::new().with_maxzoom(4).with_index_maxzoom(0).with_buffer(0);
        let mut pyramid = TilePyramid::<CellId>::new(&collection, config).unwrap();

        let key = CellId::from_ij(2, 3, 1, 3);
        let first = pyramid.get_tile(key).cloned().unwrap();
        let count = pyramid.len();
        let second = pyramid.get_tile(key).cloned().unwrap();
        assert_eq!(first, second);
        assert_eq!(pyramid.len(), count);
    }

    #[test]
    fn test_empty_region_yields_none() {
        let collection = FeatureCollection::new(vec![Feature::new(0, Geometry::Point([0.1, 0.1]))]);
        let config = BuilderConfig::new()
            .with_maxzoom(6)
            .with_index_maxzoom(1)
            .with_index_max_points(0);
        let mut pyramid = TilePyramid::<CellId>::new(&collection, config).unwrap();

        let empty_quadrant = CellId::from_ij(0, 1, 1, 1);
        assert_eq!(pyramid.tile_state(empty_quadrant), Some(TileState::Unsplit));

        // An empty ancestor is split without producing children.
        let beneath = CellId::from_ij(0, 7, 7, 3);
        assert!(pyramid.get_tile(beneath).is_none());
        assert_eq!(pyramid.tile_state(empty_quadrant), Some(TileState::Split));
        assert!(pyramid.get_tile(beneath).is_none());

        // The populated quadrant still refines.
        let near = CellId::from_st(0, 0.1, 0.1).parent_at(4);
        assert_eq!(pyramid.get_tile(near).map(Tile::feature_count), Some(1));
    }

    #[test]
    fn test_zoom_gates() {
        let collection = FeatureCollection::new(vec![unit_square(0)]);
        let config = BuilderConfig::new().with_minzoom(1).with_maxzoom(3).with_index_maxzoom(1);
        let mut pyramid = TilePyramid::<CellId>::new(&collection, config).unwrap();
        assert!(pyramid.get_tile(CellId::from_face(0)).is_none());
        assert!(pyramid.get_tile(CellId::from_ij(0, 0, 0, 4)).is_none());
        assert!(pyramid.get_tile(CellId::from_ij(0, 0, 0, 3)).is_some());
    }

    #[test]
    fn test_planar_pyramid() {
        let collection = FeatureCollection::new(vec![
            Feature::new(0, Geometry::Point([-90.0, 45.0])).with_id(3),
            Feature::new(0, Geometry::Point([90.0, -45.0])),
        ]);
        let config = BuilderConfig::new().with_maxzoom(4).with_index_maxzoom(4).with_index_max_points(0);
        let mut pyramid = PlanarTilePyramid::new(&collection, config).unwrap();
        assert_eq!(pyramid.faces(), &[0]);

        let root = pyramid.get_tile(PlanarTileId::new(0, 0, 0)).unwrap();
        assert_eq!(root.num_features, 2);

        let west = pyramid.get_tile(PlanarTileId::new(1, 0, 0)).unwrap();
        assert_eq!(west.feature_count(), 1);
        let feature = &west.layers["default"].features[0];
        assert_eq!(feature.id, Some(3));
        assert!(matches!(&feature.geometry, VectorGeometry::Points(p) if p.len() == 1));
    }

    #[test]
    fn test_empty_collection() {
        let mut pyramid =
            TilePyramid::<CellId>::new(&FeatureCollection::default(), BuilderConfig::new()).unwrap();
        assert!(pyramid.is_empty());
        assert!(pyramid.faces().is_empty());
        assert!(pyramid.get_tile(CellId::from_face(0)).is_none());
    }
}
