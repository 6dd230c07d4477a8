//! Douglas-Peucker importance ranking.
//!
//! Instead of removing vertices, every vertex of a line is annotated with the
//! squared distance at which it would be dropped. A tile at any zoom then
//! keeps exactly the vertices whose importance exceeds that zoom's threshold.

use super::feature::{VectorPoint, KEEP_ALWAYS};

/// Annotate `line` with importance values for `sq_tolerance`.
///
/// Endpoints are always kept. A zero tolerance keeps every vertex.
pub(crate) fn rank_line(line: &mut [VectorPoint], sq_tolerance: f64) {
    let Some(last) = line.len().checked_sub(1) else {
        return;
    };
    if sq_tolerance <= 0.0 {
        line.iter_mut().for_each(|p| p.importance = KEEP_ALWAYS);
        return;
    }

    line[0].importance = KEEP_ALWAYS;
    line[last].importance = KEEP_ALWAYS;

    let mut stack = vec![(0usize, last)];
    while let Some((first, last)) = stack.pop() {
        if last - first < 2 {
            continue;
        }
        let a = line[first];
        let b = line[last];
        let mid = first + (last - first) / 2;

        let mut max_sq_dist = sq_tolerance;
        let mut min_pos_to_mid = last - first;
        let mut index = None;

        for (i, p) in line.iter().enumerate().take(last).skip(first + 1) {
            let d = sq_seg_dist(p, &a, &b);
            if d > max_sq_dist {
                index = Some(i);
                max_sq_dist = d;
            } else if d == max_sq_dist {
                // Prefer the pivot nearest the middle on ties.
                let pos_to_mid = i.abs_diff(mid);
                if pos_to_mid < min_pos_to_mid {
                    index = Some(i);
                    min_pos_to_mid = pos_to_mid;
                }
            }
        }

        if let Some(index) = index {
            if max_sq_dist > sq_tolerance {
                line[index].importance = max_sq_dist;
                stack.push((first, index));
                stack.push((index, last));
            }
        }
    }
}

/// Squared distance from `p` to the segment `a`-`b`.
fn sq_seg_dist(p: &VectorPoint, a: &VectorPoint, b: &VectorPoint) -> f64 {
    let (mut x, mut y) = (a.s, a.t);
    let dx = b.s - x;
    let dy = b.t - y;

    if dx != 0.0 || dy != 0.0 {
        let t = ((p.s - x) * dx + (p.t - y) * dy) / (dx * dx + dy * dy);
        if t > 1.0 {
            x = b.s;
            y = b.t;
        } else if t > 0.0 {
            x += dx * t;
            y += dy * t;
        }
    }

    let dx = p.s - x;
    let dy = p.t - y;
    dx * dx + dy * dy
}
