//! Intermediate feature representation used while tiling.

use super::config::{BuilderConfig, IdStrategy};
use super::key::TileKey;
use super::simplify::rank_line;
use crate::geometry::{BBox, Feature, FeatureCollection, Geometry, Point, Properties, VectorGeometry};
use std::sync::Arc;

/// Importance of vertices that survive every simplification threshold.
pub(crate) const KEEP_ALWAYS: f64 = 1.0;

/// Layer used for features without one.
pub const DEFAULT_LAYER: &str = "default";

/// A projected vertex with its simplification importance.
#[derive(Debug, Clone, Copy, PartialEq)]
pub(crate) struct VectorPoint {
    pub s: f64,
    pub t: f64,
    pub importance: f64,
}

impl VectorPoint {
    pub fn new(s: f64, t: f64) -> Self {
        Self {
            s,
            t,
            importance: 0.0,
        }
    }

    pub fn with_importance(s: f64, t: f64, importance: f64) -> Self {
        Self { s, t, importance }
    }

    /// Coordinate along axis 0 (S) or 1 (T).
    #[inline]
    pub fn axis(&self, axis: usize) -> f64 {
        if axis == 0 {
            self.s
        } else {
            self.t
        }
    }
}

/// A feature in projected unit-square space, ready for clipping.
#[derive(Debug, Clone, PartialEq)]
pub(crate) struct VectorFeature {
    pub id: Option<u64>,
    pub face: u8,
    pub layer: Arc<str>,
    pub properties: Arc<Properties>,
    pub geometry: VectorGeometry<VectorPoint>,
    pub bbox: BBox,
}

impl VectorFeature {
    /// Same feature with replaced geometry; bounds are recomputed.
    pub fn with_geometry(&self, geometry: VectorGeometry<VectorPoint>) -> Self {
        Self {
            id: self.id,
            face: self.face,
            layer: Arc::clone(&self.layer),
            properties: Arc::clone(&self.properties),
            bbox: geometry_bbox(&geometry),
            geometry,
        }
    }
}

/// Shared, immutable list of features for one tile.
pub(crate) type FeatureSet = Arc<Vec<VectorFeature>>;

/// Project, rank and bound every input feature.
///
/// Features with empty geometry are skipped.
pub(crate) fn convert<K: TileKey>(
    collection: &FeatureCollection,
    config: &BuilderConfig,
) -> Vec<VectorFeature> {
    let sq_tolerance = if config.tolerance() == 0.0 {
        0.0
    } else {
        config.sq_tolerance_at(config.maxzoom())
    };
    let strategy = config.id_strategy();

    collection
        .features
        .iter()
        .enumerate()
        .filter_map(|(index, feature)| {
            let geometry = convert_geometry::<K>(&feature.geometry, sq_tolerance);
            if geometry.is_empty() {
                return None;
            }
            Some(VectorFeature {
                id: feature_id(feature, index, &strategy),
                face: if K::NUM_FACES == 1 { 0 } else { feature.face },
                layer: Arc::from(feature.layer.as_deref().unwrap_or(DEFAULT_LAYER)),
                properties: Arc::new(feature.properties.clone()),
                bbox: geometry_bbox(&geometry),
                geometry,
            })
        })
        .collect()
}

fn feature_id(feature: &Feature, index: usize, strategy: &IdStrategy) -> Option<u64> {
    match strategy {
        IdStrategy::Keep => feature.id,
        IdStrategy::Generate => Some(index as u64),
        IdStrategy::Promote(key) => feature.properties.get(key).and_then(|v| v.as_u64()),
    }
}

fn convert_geometry<K: TileKey>(geometry: &Geometry, sq_tolerance: f64) -> VectorGeometry<VectorPoint> {
    let point = |p: &Point| {
        let [s, t] = K::project(*p);
        VectorPoint::with_importance(s, t, KEEP_ALWAYS)
    };
    let line = |coords: &[Point]| {
        let mut line: Vec<VectorPoint> = coords
            .iter()
            .map(|p| {
                let [s, t] = K::project(*p);
                VectorPoint::new(s, t)
            })
            .collect();
        rank_line(&mut line, sq_tolerance);
        line
    };
    let lines = |rings: &[Vec<Point>]| -> Vec<Vec<VectorPoint>> {
        rings
            .iter()
            .filter(|ring| !ring.is_empty())
            .map(|ring| line(ring))
            .collect()
    };

    match geometry {
        Geometry::Point(p) => VectorGeometry::Points(vec![point(p)]),
        Geometry::MultiPoint(points) => VectorGeometry::Points(points.iter().map(point).collect()),
        Geometry::LineString(coords) => VectorGeometry::Lines(lines(std::slice::from_ref(coords))),
        Geometry::MultiLineString(coords) => VectorGeometry::Lines(lines(coords)),
        Geometry::Polygon(rings) => VectorGeometry::Polygon(lines(rings)),
        Geometry::MultiPolygon(polygons) => VectorGeometry::MultiPolygon(
            polygons
                .iter()
                .map(|rings| lines(rings))
                .filter(|polygon| !polygon.is_empty())
                .collect(),
        ),
    }
}

pub(crate) fn geometry_bbox(geometry: &VectorGeometry<VectorPoint>) -> BBox {
    let mut bbox = BBox::EMPTY;
    let mut add = |points: &[VectorPoint]| points.iter().for_each(|p| bbox.extend(p.s, p.t));
    match geometry {
        VectorGeometry::Points(points) => add(points),
        VectorGeometry::Lines(lines) | VectorGeometry::Polygon(lines) => {
            lines.iter().for_each(|l| add(l))
        }
        VectorGeometry::MultiPolygon(polygons) => {
            polygons.iter().flatten().for_each(|l| add(l))
        }
    }
    bbox
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::cell::CellId;
    use crate::pyramid::key::PlanarTileId;

    fn square() -> Geometry {
        Geometry::Polygon(vec![vec![
            [0.25, 0.25],
            [0.75, 0.25],
            [0.75, 0.75],
            [0.25, 0.75],
            [0.25, 0.25],
        ]])
    }

    #[test]
    fn test_convert_keeps_face_layer_and_bbox() {
        let collection = FeatureCollection::new(vec![Feature::new(4, square()).with_layer("land")]);
        let features = convert::<CellId>(&collection, &BuilderConfig::default());
        assert_eq!(features.len(), 1);

        let f = &features[0];
        assert_eq!(f.face, 4);
        assert_eq!(&*f.layer, "land");
        assert_eq!(f.bbox.axis(0), (0.25, 0.75));
        assert_eq!(f.bbox.axis(1), (0.25, 0.75));
    }

    #[test]
    fn test_default_layer() {
        let collection = FeatureCollection::new(vec![Feature::new(0, Geometry::Point([0.5, 0.5]))]);
        let features = convert::<CellId>(&collection, &BuilderConfig::default());
        assert_eq!(&*features[0].layer, DEFAULT_LAYER);
    }

    #[test]
    fn test_empty_geometry_skipped() {
        let collection = FeatureCollection::new(vec![
            Feature::new(0, Geometry::MultiPoint(vec![])),
            Feature::new(0, Geometry::Polygon(vec![vec![]])),
        ]);
        assert!(convert::<CellId>(&collection, &BuilderConfig::default()).is_empty());
    }

    #[test]
    fn test_id_strategies() {
        let collection = FeatureCollection::new(vec![
            Feature::new(0, Geometry::Point([0.1, 0.1]))
                .with_id(40)
                .with_property("gid", 9),
            Feature::new(0, Geometry::Point([0.2, 0.2])).with_property("gid", "x"),
        ]);

        let kept = convert::<CellId>(&collection, &BuilderConfig::default());
        assert_eq!(kept[0].id, Some(40));
        assert_eq!(kept[1].id, None);

        let generated = convert::<CellId>(&collection, &BuilderConfig::new().with_generate_id(true));
        assert_eq!(generated[0].id, Some(0));
        assert_eq!(generated[1].id, Some(1));

        let promoted = convert::<CellId>(&collection, &BuilderConfig::new().with_promote_id("gid"));
        assert_eq!(promoted[0].id, Some(9));
        assert_eq!(promoted[1].id, None);
    }

    #[test]
    fn test_planar_features_are_projected_to_face_zero() {
        let collection = FeatureCollection::new(vec![Feature::new(3, Geometry::Point([0.0, 0.0]))]);
        let features = convert::<PlanarTileId>(&collection, &BuilderConfig::default());
        assert_eq!(features[0].face, 0);
        assert!(matches!(
            &features[0].geometry,
            VectorGeometry::Points(p) if p[0].s == 0.5 && p[0].t == 0.5
        ));
    }

    #[test]
    fn test_zero_tolerance_keeps_every_vertex() {
        let collection = FeatureCollection::new(vec![Feature::new(
            0,
            Geometry::LineString(vec![[0.0, 0.0], [0.5, 0.0], [1.0, 0.0]]),
        )]);
        let config = BuilderConfig::new().with_tolerance(0.0);
        let features = convert::<CellId>(&collection, &config);
        let VectorGeometry::Lines(lines) = &features[0].geometry else {
            panic!("expected lines");
        };
        assert!(lines[0].iter().all(|p| p.importance == KEEP_ALWAYS));
    }
}
