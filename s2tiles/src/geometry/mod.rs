//! Input geometry model.
//!
//! Features arrive already tagged with a cube face and expressed in that
//! face's S,T space (or, for planar pyramids, in longitude/latitude). They
//! deserialize from S2JSON / GeoJSON-shaped documents:
//!
//! ```json
//! {"type": "S2FeatureCollection", "features": [
//!   {"type": "S2Feature", "face": 0, "properties": {"name": "a"},
//!    "geometry": {"type": "Point", "coordinates": [0.5, 0.5]}}
//! ]}
//! ```

mod projection;

pub use projection::{lon_lat_to_mercator, mercator_x, mercator_y};

use serde::{Deserialize, Serialize};

/// Feature properties.
pub type Properties = serde_json::Map<String, serde_json::Value>;

/// A 2D input coordinate.
pub type Point = [f64; 2];

/// Input geometry.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", content = "coordinates")]
pub enum Geometry {
    Point(Point),
    MultiPoint(Vec<Point>),
    LineString(Vec<Point>),
    MultiLineString(Vec<Vec<Point>>),
    Polygon(Vec<Vec<Point>>),
    MultiPolygon(Vec<Vec<Vec<Point>>>),
}

/// A face-tagged input feature.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Feature {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub id: Option<u64>,
    /// Cube face the coordinates belong to (ignored by planar pyramids).
    #[serde(default)]
    pub face: u8,
    /// Output layer; `"default"` when absent.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub layer: Option<String>,
    #[serde(default)]
    pub properties: Properties,
    pub geometry: Geometry,
}

impl Feature {
    pub fn new(face: u8, geometry: Geometry) -> Self {
        Self {
            id: None,
            face,
            layer: None,
            properties: Properties::new(),
            geometry,
        }
    }

    pub fn with_id(mut self, id: u64) -> Self {
        self.id = Some(id);
        self
    }

    pub fn with_layer(mut self, layer: impl Into<String>) -> Self {
        self.layer = Some(layer.into());
        self
    }

    pub fn with_property(mut self, key: impl Into<String>, value: impl Into<serde_json::Value>) -> Self {
        self.properties.insert(key.into(), value.into());
        self
    }
}

/// An ordered set of features.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct FeatureCollection {
    pub features: Vec<Feature>,
}

impl FeatureCollection {
    pub fn new(features: Vec<Feature>) -> Self {
        Self { features }
    }

    pub fn len(&self) -> usize {
        self.features.len()
    }

    pub fn is_empty(&self) -> bool {
        self.features.is_empty()
    }
}

impl From<Vec<Feature>> for FeatureCollection {
    fn from(features: Vec<Feature>) -> Self {
        Self::new(features)
    }
}

impl FromIterator<Feature> for FeatureCollection {
    fn from_iter<I: IntoIterator<Item = Feature>>(iter: I) -> Self {
        Self::new(iter.into_iter().collect())
    }
}

/// Geometry shared by intermediate and output features, generic over the
/// point representation.
///
/// `Points` covers Point and MultiPoint, `Lines` covers LineString and
/// MultiLineString.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "type", content = "coordinates")]
pub enum VectorGeometry<P> {
    Points(Vec<P>),
    Lines(Vec<Vec<P>>),
    Polygon(Vec<Vec<P>>),
    MultiPolygon(Vec<Vec<Vec<P>>>),
}

impl<P> VectorGeometry<P> {
    pub fn feature_type(&self) -> FeatureType {
        match self {
            VectorGeometry::Points(_) => FeatureType::Points,
            VectorGeometry::Lines(_) => FeatureType::Lines,
            VectorGeometry::Polygon(_) => FeatureType::Polygon,
            VectorGeometry::MultiPolygon(_) => FeatureType::MultiPolygon,
        }
    }

    pub fn is_empty(&self) -> bool {
        match self {
            VectorGeometry::Points(points) => points.is_empty(),
            VectorGeometry::Lines(lines) | VectorGeometry::Polygon(lines) => lines.is_empty(),
            VectorGeometry::MultiPolygon(polygons) => polygons.is_empty(),
        }
    }

    /// Total number of vertices.
    pub fn num_points(&self) -> usize {
        match self {
            VectorGeometry::Points(points) => points.len(),
            VectorGeometry::Lines(lines) | VectorGeometry::Polygon(lines) => {
                lines.iter().map(Vec::len).sum()
            }
            VectorGeometry::MultiPolygon(polygons) => polygons
                .iter()
                .flat_map(|polygon| polygon.iter().map(Vec::len))
                .sum(),
        }
    }
}

/// Output feature type code.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[repr(u8)]
pub enum FeatureType {
    Points = 1,
    Lines = 2,
    Polygon = 3,
    MultiPolygon = 4,
}

/// Axis-aligned bounds `[min_s, min_t, max_s, max_t]`.
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct BBox {
    pub min_s: f64,
    pub min_t: f64,
    pub max_s: f64,
    pub max_t: f64,
}

impl BBox {
    /// An inverted box that any point extends.
    pub const EMPTY: BBox = BBox {
        min_s: f64::INFINITY,
        min_t: f64::INFINITY,
        max_s: f64::NEG_INFINITY,
        max_t: f64::NEG_INFINITY,
    };

    pub fn is_empty(&self) -> bool {
        self.min_s > self.max_s || self.min_t > self.max_t
    }

    pub fn extend(&mut self, s: f64, t: f64) {
        self.min_s = self.min_s.min(s);
        self.min_t = self.min_t.min(t);
        self.max_s = self.max_s.max(s);
        self.max_t = self.max_t.max(t);
    }

    pub fn merge(&mut self, other: &BBox) {
        self.min_s = self.min_s.min(other.min_s);
        self.min_t = self.min_t.min(other.min_t);
        self.max_s = self.max_s.max(other.max_s);
        self.max_t = self.max_t.max(other.max_t);
    }

    /// `(min, max)` along axis 0 (S) or 1 (T).
    pub fn axis(&self, axis: usize) -> (f64, f64) {
        if axis == 0 {
            (self.min_s, self.max_s)
        } else {
            (self.min_t, self.max_t)
        }
    }
}

impl Default for BBox {
    fn default() -> Self {
        Self::EMPTY
    }
}
