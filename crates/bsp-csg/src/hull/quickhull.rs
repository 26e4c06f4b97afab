//! Planar convex hull by farthest-point subdivision.

use nalgebra::Point2;

use crate::{EPS, EPS_SQUARED};

enum Work {
    /// Points strictly to the right of the directed segment still to be resolved.
    Segment(Point2<f32>, Point2<f32>, Vec<Point2<f32>>),
    Emit(Point2<f32>),
}

/// Distance of `p` to the right of the directed line `a -> b`.
fn right_distance(a: Point2<f32>, b: Point2<f32>, p: Point2<f32>) -> f32 {
    let d = b - a;
    let e = p - a;
    -(d.x * e.y - d.y * e.x) / d.norm()
}

fn outside(a: Point2<f32>, b: Point2<f32>, points: &[Point2<f32>]) -> Vec<Point2<f32>> {
    points
        .iter()
        .copied()
        .filter(|&p| right_distance(a, b, p) > EPS)
        .collect()
}

/// Appends the hull vertices strictly between `a` and `b`, walking clockwise around
/// the outside of `a -> b`.
fn chain(a: Point2<f32>, b: Point2<f32>, points: &[Point2<f32>], out: &mut Vec<Point2<f32>>) {
    let mut stack = vec![Work::Segment(a, b, outside(a, b, points))];
    while let Some(work) = stack.pop() {
        match work {
            Work::Emit(p) => out.push(p),
            Work::Segment(a, b, candidates) => {
                let Some(far) = candidates.iter().copied().max_by(|p, q| {
                    right_distance(a, b, *p).total_cmp(&right_distance(a, b, *q))
                }) else {
                    continue;
                };
                let before = outside(a, far, &candidates);
                let after = outside(far, b, &candidates);
                stack.push(Work::Segment(far, b, after));
                stack.push(Work::Emit(far));
                stack.push(Work::Segment(a, far, before));
            }
        }
    }
}

/// Counter-clockwise convex loop of `points`.
///
/// Points within `EPS` of a hull edge are dropped. Returns an empty list when the
/// points do not span an area.
pub(crate) fn convex_loop(points: &[Point2<f32>]) -> Vec<Point2<f32>> {
    if points.len() < 3 {
        return Vec::new();
    }
    let order = |p: &&Point2<f32>, q: &&Point2<f32>| p.x.total_cmp(&q.x).then(p.y.total_cmp(&q.y));
    let (Some(&left), Some(&right)) = (points.iter().min_by(order), points.iter().max_by(order))
    else {
        return Vec::new();
    };
    if (right - left).norm_squared() <= EPS_SQUARED {
        return Vec::new();
    }

    let mut hull = vec![left];
    chain(left, right, points, &mut hull);
    hull.push(right);
    chain(right, left, points, &mut hull);
    if hull.len() < 3 { Vec::new() } else { hull }
}
