//! Quadrant clipping.
//!
//! A tile's features are cut along S into a left and right half, then each
//! half along T, giving the bottom-left, bottom-right, top-left and top-right
//! children. Every interval is widened by the configured buffer. Intervals
//! are half-open except where they end on the face edge, so coordinates at
//! exactly 1.0 still land in the last row or column.
//!
//! ```text
//!   t
//!   ▲  ┌──────┬──────┐
//!   │  │  tl  │  tr  │
//!   │  ├──────┼──────┤
//!   │  │  bl  │  br  │
//!   │  └──────┴──────┘
//!   └──────────────────▶ s
//! ```

use super::feature::{FeatureSet, VectorFeature, VectorPoint, KEEP_ALWAYS};
use crate::geometry::{BBox, VectorGeometry};
use std::sync::Arc;

/// Position of a tile being split.
#[derive(Debug, Clone, Copy)]
pub(crate) struct ClipTile {
    pub zoom: u8,
    pub i: u32,
    pub j: u32,
    /// Bounds of every feature in the tile.
    pub bbox: BBox,
}

/// Split `features` into `[bl, br, tl, tr]`.
pub(crate) fn clip(features: &FeatureSet, tile: &ClipTile, extent: u32, buffer: u32) -> [FeatureSet; 4] {
    let scale = (1u64 << tile.zoom) as f64;
    let k1 = 0.5 * buffer as f64 / extent as f64;
    let k2 = 0.5 - k1;
    let k3 = 0.5 + k1;
    let k4 = 1.0 + k1;
    let (i, j) = (tile.i as f64, tile.j as f64);

    let left = clip_axis(features, (i - k1) / scale, (i + k3) / scale, 0, &tile.bbox);
    let right = clip_axis(features, (i + k2) / scale, (i + k4) / scale, 0, &tile.bbox);

    let split = |half: Option<FeatureSet>| match half {
        Some(half) => (
            clip_axis(&half, (j - k1) / scale, (j + k3) / scale, 1, &tile.bbox),
            clip_axis(&half, (j + k2) / scale, (j + k4) / scale, 1, &tile.bbox),
        ),
        None => (None, None),
    };
    let (bl, tl) = split(left);
    let (br, tr) = split(right);

    [bl, br, tl, tr].map(|quadrant| quadrant.unwrap_or_default())
}

/// Upper bound test; closed when the band reaches the face edge.
fn below(a: f64, k2: f64) -> bool {
    a < k2 || (k2 >= 1.0 && a <= k2)
}

/// Keep the parts of `features` within `[k1, k2)` along `axis`.
fn clip_axis(features: &FeatureSet, k1: f64, k2: f64, axis: usize, bbox: &BBox) -> Option<FeatureSet> {
    let (min, max) = bbox.axis(axis);
    if min >= k1 && below(max, k2) {
        return Some(Arc::clone(features));
    }
    if max < k1 || !below(min, k2) {
        return None;
    }

    let clipped: Vec<VectorFeature> = features
        .iter()
        .filter_map(|feature| clip_feature(feature, k1, k2, axis))
        .collect();

    (!clipped.is_empty()).then(|| Arc::new(clipped))
}

fn clip_feature(feature: &VectorFeature, k1: f64, k2: f64, axis: usize) -> Option<VectorFeature> {
    let (min, max) = feature.bbox.axis(axis);
    if min >= k1 && below(max, k2) {
        return Some(feature.clone());
    }
    if max < k1 || !below(min, k2) {
        return None;
    }

    let geometry = match &feature.geometry {
        VectorGeometry::Points(points) => VectorGeometry::Points(
            points
                .iter()
                .filter(|p| {
                    let a = p.axis(axis);
                    a >= k1 && below(a, k2)
                })
                .copied()
                .collect(),
        ),
        VectorGeometry::Lines(lines) => VectorGeometry::Lines(clip_lines(lines, k1, k2, axis, false)),
        VectorGeometry::Polygon(rings) => {
            VectorGeometry::Polygon(clip_lines(rings, k1, k2, axis, true))
        }
        VectorGeometry::MultiPolygon(polygons) => VectorGeometry::MultiPolygon(
            polygons
                .iter()
                .map(|rings| clip_lines(rings, k1, k2, axis, true))
                .filter(|rings| !rings.is_empty())
                .collect(),
        ),
    };

    (!geometry.is_empty()).then(|| feature.with_geometry(geometry))
}

fn clip_lines(
    lines: &[Vec<VectorPoint>],
    k1: f64,
    k2: f64,
    axis: usize,
    is_polygon: bool,
) -> Vec<Vec<VectorPoint>> {
    let mut out = Vec::new();
    for line in lines {
        clip_line(line, &mut out, k1, k2, axis, is_polygon);
    }
    out
}

/// Cut one line or ring to `[k1, k2]`.
///
/// Open lines are split wherever they leave the band. Rings stay a single
/// sequence and are re-closed.
fn clip_line(
    line: &[VectorPoint],
    out: &mut Vec<Vec<VectorPoint>>,
    k1: f64,
    k2: f64,
    axis: usize,
    is_polygon: bool,
) {
    let mut slice: Vec<VectorPoint> = Vec::new();

    for segment in line.windows(2) {
        let (p, q) = (&segment[0], &segment[1]);
        let a = p.axis(axis);
        let b = q.axis(axis);
        let mut exited = false;

        if a < k1 {
            if b > k1 {
                slice.push(intersect(p, q, k1, axis));
            }
        } else if a > k2 {
            if b < k2 {
                slice.push(intersect(p, q, k2, axis));
            }
        } else {
            slice.push(*p);
        }

        if b < k1 && a >= k1 {
            slice.push(intersect(p, q, k1, axis));
            exited = true;
        }
        if b > k2 && a <= k2 {
            slice.push(intersect(p, q, k2, axis));
            exited = true;
        }

        if !is_polygon && exited {
            out.push(std::mem::take(&mut slice));
        }
    }

    if let Some(last) = line.last() {
        let a = last.axis(axis);
        if a >= k1 && a <= k2 {
            slice.push(*last);
        }
    }

    if is_polygon && slice.len() >= 2 {
        let first = slice[0];
        let last = slice[slice.len() - 1];
        if first.s != last.s || first.t != last.t {
            slice.push(first);
        }
    }

    if !slice.is_empty() {
        out.push(slice);
    }
}

/// Point where `p`-`q` crosses `k` along `axis`.
fn intersect(p: &VectorPoint, q: &VectorPoint, k: f64, axis: usize) -> VectorPoint {
    if axis == 0 {
        let t = (k - p.s) / (q.s - p.s);
        VectorPoint::with_importance(k, p.t + (q.t - p.t) * t, KEEP_ALWAYS)
    } else {
        let t = (k - p.t) / (q.t - p.t);
        VectorPoint::with_importance(p.s + (q.s - p.s) * t, k, KEEP_ALWAYS)
    }
}
