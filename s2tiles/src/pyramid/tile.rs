//! Tiles and their conversion to tile-local integer coordinates.

use super::config::BuilderConfig;
use super::feature::{FeatureSet, VectorFeature, VectorPoint};
use crate::geometry::{BBox, FeatureType, Properties, VectorGeometry};
use serde::Serialize;
use std::collections::BTreeMap;
use std::sync::Arc;

/// A vertex in tile-local integer coordinates.
pub type TilePoint = [i32; 2];

/// Geometry of an output feature.
pub type TileGeometry = VectorGeometry<TilePoint>;

/// A feature clipped, simplified and quantised to one tile.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct TileFeature {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub id: Option<u64>,
    pub geometry: TileGeometry,
    pub properties: Arc<Properties>,
}

impl TileFeature {
    pub fn feature_type(&self) -> FeatureType {
        self.geometry.feature_type()
    }
}

/// Features of one named layer.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct Layer {
    pub extent: u32,
    pub features: Vec<TileFeature>,
}

impl Layer {
    pub fn len(&self) -> usize {
        self.features.len()
    }

    pub fn is_empty(&self) -> bool {
        self.features.is_empty()
    }
}

/// Whether a tile still holds the features needed to build its children.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TileState {
    /// Raw source retained; children can still be generated on demand.
    Unsplit,
    /// Source discarded after producing the four children.
    Split,
}

/// One tile of the pyramid.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Tile {
    pub face: u8,
    pub zoom: u8,
    pub i: u32,
    pub j: u32,
    pub extent: u32,
    pub layers: BTreeMap<String, Layer>,
    /// Vertices seen before simplification.
    pub num_points: usize,
    /// Vertices kept after simplification.
    pub num_simplified: usize,
    pub num_features: usize,
    /// Bounds of the tile's features in unit-square space.
    pub bbox: BBox,
}

impl Tile {
    pub fn layer(&self, name: &str) -> Option<&Layer> {
        self.layers.get(name)
    }

    /// Features across every layer.
    pub fn feature_count(&self) -> usize {
        self.layers.values().map(Layer::len).sum()
    }

    pub fn is_empty(&self) -> bool {
        self.feature_count() == 0
    }
}

struct SimplifiedFeature {
    id: Option<u64>,
    properties: Arc<Properties>,
    geometry: VectorGeometry<[f64; 2]>,
}

/// Builder-side tile record.
pub(crate) struct TileNode {
    pub tile: Tile,
    /// Features retained for on-demand splitting.
    pub source: Option<FeatureSet>,
    /// Simplified layers awaiting quantisation; `None` once transformed.
    pending: Option<BTreeMap<String, Vec<SimplifiedFeature>>>,
}

impl TileNode {
    /// Simplify `features` for `zoom` and bucket them by layer.
    pub fn create(features: &FeatureSet, face: u8, zoom: u8, i: u32, j: u32, config: &BuilderConfig) -> Self {
        let sq_tolerance = if zoom == config.maxzoom() {
            0.0
        } else {
            config.sq_tolerance_at(zoom)
        };

        let mut tile = Tile {
            face,
            zoom,
            i,
            j,
            extent: config.extent(),
            layers: BTreeMap::new(),
            num_points: 0,
            num_simplified: 0,
            num_features: 0,
            bbox: BBox::EMPTY,
        };
        let mut pending: BTreeMap<String, Vec<SimplifiedFeature>> = BTreeMap::new();

        for feature in features.iter() {
            tile.num_features += 1;
            tile.bbox.merge(&feature.bbox);

            let geometry = simplify_feature(feature, sq_tolerance, &mut tile);
            if geometry.is_empty() {
                continue;
            }
            pending
                .entry(feature.layer.to_string())
                .or_default()
                .push(SimplifiedFeature {
                    id: feature.id,
                    properties: Arc::clone(&feature.properties),
                    geometry,
                });
        }

        Self {
            tile,
            source: Some(Arc::clone(features)),
            pending: Some(pending),
        }
    }

    pub fn state(&self) -> TileState {
        if self.source.is_some() {
            TileState::Unsplit
        } else {
            TileState::Split
        }
    }

    /// The tile in integer coordinates, quantising on first access.
    pub fn transformed(&mut self) -> &Tile {
        if let Some(pending) = self.pending.take() {
            let Tile {
                zoom, i, j, extent, ..
            } = self.tile;
            self.tile.layers = pending
                .into_iter()
                .filter_map(|(name, features)| {
                    let features: Vec<TileFeature> = features
                        .into_iter()
                        .filter_map(|f| transform_feature(f, zoom, i, j, extent))
                        .collect();
                    (!features.is_empty()).then(|| (name, Layer { extent, features }))
                })
                .collect();
        }
        &self.tile
    }
}

fn simplify_feature(feature: &VectorFeature, sq_tolerance: f64, tile: &mut Tile) -> VectorGeometry<[f64; 2]> {
    match &feature.geometry {
        VectorGeometry::Points(points) => {
            tile.num_points += points.len();
            tile.num_simplified += points.len();
            VectorGeometry::Points(points.iter().map(|p| [p.s, p.t]).collect())
        }
        VectorGeometry::Lines(lines) => {
            VectorGeometry::Lines(simplify_rings(lines, sq_tolerance, tile))
        }
        VectorGeometry::Polygon(rings) => {
            VectorGeometry::Polygon(simplify_rings(rings, sq_tolerance, tile))
        }
        VectorGeometry::MultiPolygon(polygons) => VectorGeometry::MultiPolygon(
            polygons
                .iter()
                .map(|rings| simplify_rings(rings, sq_tolerance, tile))
                .collect(),
        ),
    }
}

fn simplify_rings(lines: &[Vec<VectorPoint>], sq_tolerance: f64, tile: &mut Tile) -> Vec<Vec<[f64; 2]>> {
    let mut out = Vec::with_capacity(lines.len());
    for line in lines {
        tile.num_points += line.len();
        let kept: Vec<[f64; 2]> = line
            .iter()
            .filter(|p| sq_tolerance == 0.0 || p.importance > sq_tolerance)
            .map(|p| [p.s, p.t])
            .collect();
        tile.num_simplified += kept.len();
        out.push(kept);
    }
    out
}

fn transform_feature(feature: SimplifiedFeature, zoom: u8, i: u32, j: u32, extent: u32) -> Option<TileFeature> {
    let scale = (1u64 << zoom) as f64;
    let (ti, tj, extent) = (i as f64, j as f64, extent as f64);
    let point = |[s, t]: [f64; 2]| -> TilePoint {
        [
            (extent * (s * scale - ti)).round() as i32,
            (extent * (t * scale - tj)).round() as i32,
        ]
    };
    let line = |coords: Vec<[f64; 2]>| -> Vec<TilePoint> {
        let mut out: Vec<TilePoint> = coords.into_iter().map(point).collect();
        out.dedup();
        out
    };
    let polygon = |rings: Vec<Vec<[f64; 2]>>| -> Option<Vec<Vec<TilePoint>>> {
        let mut out = Vec::with_capacity(rings.len());
        for (index, ring) in rings.into_iter().enumerate() {
            let mut ring = line(ring);
            if ring.len() < 4 {
                if index == 0 {
                    return None;
                }
                continue;
            }
            rewind(&mut ring, index == 0);
            out.push(ring);
        }
        (!out.is_empty()).then_some(out)
    };

    let geometry = match feature.geometry {
        VectorGeometry::Points(points) => VectorGeometry::Points(points.into_iter().map(point).collect()),
        VectorGeometry::Lines(lines) => VectorGeometry::Lines(
            lines
                .into_iter()
                .map(line)
                .filter(|l| l.len() >= 2)
                .collect(),
        ),
        VectorGeometry::Polygon(rings) => VectorGeometry::Polygon(polygon(rings).unwrap_or_default()),
        VectorGeometry::MultiPolygon(polygons) => {
            VectorGeometry::MultiPolygon(polygons.into_iter().filter_map(polygon).collect())
        }
    };

    (!geometry.is_empty()).then(|| TileFeature {
        id: feature.id,
        geometry,
        properties: feature.properties,
    })
}

/// Twice the signed shoelace area of a closed ring.
fn signed_area(ring: &[TilePoint]) -> i64 {
    ring.windows(2)
        .map(|w| w[0][0] as i64 * w[1][1] as i64 - w[1][0] as i64 * w[0][1] as i64)
        .sum()
}

/// Orient outer rings to positive area and holes to negative area.
fn rewind(ring: &mut [TilePoint], outer: bool) {
    let area = signed_area(ring);
    if (outer && area < 0) || (!outer && area > 0) {
        ring.reverse();
    }
}
