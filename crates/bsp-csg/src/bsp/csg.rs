//! Merging two trees over the same space.

use std::collections::VecDeque;

use tracing::{debug, trace};

use super::edge::EdgeTree;
use super::node::NodeBody;
use super::tree::BspTree;
use crate::Hull;
use crate::content::{Content, SpaceOperation};

impl<H, E, C> BspTree<H, E, C>
where
    H: Hull,
    E: EdgeTree<C, Surface = H::Boundary>,
    C: Content,
{
    /// Merges `other` into this tree, combining co-located leaves with `op`.
    ///
    /// Afterwards every leaf holds `op` applied to this tree's content (left) and
    /// `other`'s content (right) at that place, and the hull covers both operands.
    /// Splitting surfaces coincident with surfaces of this tree are merged into them with
    /// `op`'s edge operation. When the two hulls face opposite ways, `other`'s contents
    /// are inverted with `op` before they are combined.
    ///
    /// # Panics
    ///
    /// Panics if a leaf of the merged tree has no region to sample, which only happens
    /// when one of the operands was not a full tree.
    pub fn csg_in_place(&mut self, other: &Self, op: &SpaceOperation<C>) {
        let flip = self.hull.is_flip(&other.hull);
        let mut other = other.projected_onto(&self.hull);
        let hull = self.hull.union(&other.hull);
        let mine = self.numerate();
        let theirs = other.numerate();
        debug!(mine, theirs, flip, "merging trees");

        if let Some(lhs) = self.root.content().cloned() {
            let mut root = other.root;
            root.map_contents(|rhs| op.combine(&lhs, rhs, flip));
            self.root = root;
        } else if let Some(rhs) = other.root.content().cloned() {
            self.root.map_contents(|lhs| op.combine(lhs, &rhs, flip));
        } else {
            let edge_op = op.edge_operation();
            for edge in other.sections() {
                self.add(edge, &edge_op);
            }
            self.resolve(&other, op, flip);
        }

        self.hull = hull;
        debug!(nodes = self.node_count(), "merge finished");
    }

    /// Consuming form of [`csg_in_place`](Self::csg_in_place).
    pub fn csg_into(mut self, other: &Self, op: &SpaceOperation<C>) -> Self {
        self.csg_in_place(other, op);
        self
    }

    /// Merges into a copy, leaving both operands untouched.
    pub fn csg_copy(&self, other: &Self, op: &SpaceOperation<C>) -> Self {
        self.clone().csg_into(other, op)
    }

    /// Splitting surfaces clipped to the regions they split, breadth first from an
    /// unbounded copy of the hull.
    fn sections(&self) -> Vec<E> {
        let mut sections = Vec::new();
        let mut queue = VecDeque::from([(&self.root, self.hull.unbounded())]);
        while let Some((node, region)) = queue.pop_front() {
            let NodeBody::Internal { edge, back, front } = node.body() else {
                continue;
            };
            let cut = region.cut(edge.surface());
            if let Some(section) = cut.section {
                sections.push(edge.with_surface(section));
            }
            if let Some(piece) = cut.back {
                queue.push_back((back.as_ref(), piece));
            }
            if let Some(piece) = cut.front {
                queue.push_back((front.as_ref(), piece));
            }
        }
        sections
    }

    /// Replaces every leaf with `op` of its content and `other`'s content at a point of
    /// the leaf's region.
    fn resolve(&mut self, other: &Self, op: &SpaceOperation<C>, flip: bool) {
        let start = self.hull.unbounded();
        let fallback = start.interior_point();
        let mut stack = vec![(&mut self.root, Some(start), fallback)];
        while let Some((node, region, fallback)) = stack.pop() {
            let sample = region
                .as_ref()
                .and_then(|region| region.interior_point())
                .or(fallback);
            match node.body_mut() {
                NodeBody::Leaf(content) => {
                    let Some(point) = sample else {
                        panic!("Broken tree: no leaf");
                    };
                    let merged = op.combine(content, other.search(point), flip);
                    trace!(?point, ?merged, "resolved leaf");
                    *content = merged;
                }
                NodeBody::Internal { edge, back, front } => {
                    let (b, f) = match &region {
                        Some(region) => region.cut(edge.surface()).into_pair(),
                        None => (None, None),
                    };
                    stack.push((back.as_mut(), b, sample));
                    stack.push((front.as_mut(), f, sample));
                }
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::bsp::{BspTree1D, BspTree2D, BspTree3D};
    use crate::content::{
        Binary, CsgOperation, SolidContent, space2d_difference, space2d_intersect,
        space2d_union,
    };
    use crate::{Basis2D, Basis3D, Hull1D, Hull2D, Hull3D, Plane2D, Plane3D};
    use nalgebra::{Point2, Point3, Vector2, Vector3};
    use rand::rngs::StdRng;
    use rand::{Rng, SeedableRng};

    fn line() -> Basis2D {
        Basis2D::from_plane(&Plane2D::new(Vector2::new(0.0, 1.0), 0.0))
    }

    fn interval(min: f32, max: f32, content: i32) -> BspTree1D<i32> {
        BspTree1D::from_hull(Hull1D::new(line(), min, max), &SolidContent::new(content, 0))
    }

    fn or() -> SpaceOperation<i32> {
        SpaceOperation::new(Binary::Or, Binary::Or)
    }

    fn ground() -> Basis3D {
        Basis3D::from_plane(&Plane3D::new(Vector3::z(), 0.0))
    }

    fn square(cx: f32, cy: f32, half: f32, content: i32) -> BspTree2D<i32> {
        let corners = [
            Point2::new(cx - half, cy - half),
            Point2::new(cx + half, cy - half),
            Point2::new(cx + half, cy + half),
            Point2::new(cx - half, cy + half),
        ];
        let hull = Hull2D::from_loop(ground(), &corners);
        let provider = SolidContent::new(content, 0).with_boundary(SolidContent::new(1, 0));
        BspTree2D::from_hull(hull, &provider)
    }

    /// Square given in world coordinates on the plane `z = 0` facing along `normal`.
    fn world_square(
        normal: Vector3<f32>,
        cx: f32,
        cy: f32,
        half: f32,
        content: i32,
    ) -> BspTree2D<i32> {
        let corners = [
            Point3::new(cx - half, cy - half, 0.0),
            Point3::new(cx + half, cy - half, 0.0),
            Point3::new(cx + half, cy + half, 0.0),
            Point3::new(cx - half, cy + half, 0.0),
        ];
        let hull = Hull2D::from_world_points(&Plane3D::new(normal, 0.0), &corners);
        let provider = SolidContent::new(content, 0).with_boundary(SolidContent::new(1, 0));
        BspTree2D::from_hull(hull, &provider)
    }

    fn search_world(tree: &BspTree2D<i32>, x: f32, y: f32) -> i32 {
        *tree.search(tree.hull().basis().local(Point3::new(x, y, 0.0)))
    }

    /// Edge trees of `tree` lying on the line through `a` and `b`.
    fn edges_on_line(
        tree: &BspTree2D<i32>,
        a: Point2<f32>,
        b: Point2<f32>,
    ) -> Vec<&BspTree1D<i32>> {
        let mut found = Vec::new();
        let mut stack = vec![tree.root()];
        while let Some(node) = stack.pop() {
            if let NodeBody::Internal { edge, back, front } = node.body() {
                let basis = edge.hull().basis();
                if basis.distance(a).abs() < 1e-3 && basis.distance(b).abs() < 1e-3 {
                    found.push(edge);
                }
                stack.push(back.as_ref());
                stack.push(front.as_ref());
            }
        }
        found
    }

    /// Contents at `point` of every edge tree on the line through `point` and `other`
    /// whose piece covers `point`.
    fn boundary_contents(
        tree: &BspTree2D<i32>,
        point: Point2<f32>,
        other: Point2<f32>,
    ) -> Vec<i32> {
        edges_on_line(tree, point, other)
            .into_iter()
            .filter_map(|edge| {
                let t = edge.hull().basis().parameter(point);
                (edge.hull().min() <= t && t <= edge.hull().max()).then(|| *edge.search(t))
            })
            .collect()
    }

    fn cube(min: [f32; 3], max: [f32; 3], content: i32) -> BspTree3D<i32> {
        let hull = Hull3D::cuboid(Point3::from(min), Point3::from(max));
        let provider = SolidContent::new(content, 0)
            .with_boundary(SolidContent::new(1, 0).with_boundary(SolidContent::new(1, 0)));
        BspTree3D::from_hull(hull, &provider)
    }

    #[test]
    fn union_of_overlapping_intervals() {
        let a = interval(-1.0, 1.0, 2);
        let b = interval(-2.0, 0.0, 4);
        let merged = a.csg_copy(&b, &or());
        for (t, expected) in [(-3.0, 0), (-1.5, 4), (-0.5, 6), (0.5, 2), (1.5, 0)] {
            assert_eq!(*merged.search(t), expected, "at {t}");
        }
        assert_eq!(merged.hull().min(), -2.0);
        assert_eq!(merged.hull().max(), 1.0);
    }

    #[test]
    fn union_of_disjoint_intervals() {
        let merged = interval(0.0, 4.0, 1).csg_into(&interval(6.0, 9.0, 2), &or());
        for (t, expected) in [(-1.0, 0), (2.0, 1), (5.0, 0), (7.0, 2), (10.0, 0)] {
            assert_eq!(*merged.search(t), expected, "at {t}");
        }
        assert_eq!(merged.hull().min(), 0.0);
        assert_eq!(merged.hull().max(), 9.0);
    }

    #[test]
    fn union_is_associative() {
        let mut rng = StdRng::seed_from_u64(11);
        let random_interval = |rng: &mut StdRng| {
            let lo = rng.gen_range(0..10);
            let hi = rng.gen_range(lo + 1..=10);
            interval(lo as f32, hi as f32, 1 << rng.gen_range(0..4))
        };
        for _ in 0..300 {
            let a = random_interval(&mut rng);
            let b = random_interval(&mut rng);
            let c = random_interval(&mut rng);
            let left = a.csg_copy(&b, &or()).csg_into(&c, &or());
            let right = a.csg_copy(&b.csg_copy(&c, &or()), &or());
            for k in -1..=10 {
                let t = k as f32 + 0.5;
                assert_eq!(left.search(t), right.search(t), "at {t}");
            }
        }
    }

    #[test]
    fn merge_is_commutative_for_symmetric_operations() {
        let a = interval(-1.0, 1.5, 1);
        let b = interval(0.5, 3.0, 2);
        let ab = a.csg_copy(&b, &or());
        let ba = b.csg_copy(&a, &or());
        for t in [-2.0, -0.5, 0.0, 1.0, 2.0, 3.5] {
            assert_eq!(ab.search(t), ba.search(t), "at {t}");
        }
    }

    #[test]
    fn leaf_only_operands() {
        let full = BspTree1D::leaf(Hull1D::line(line()), 8);
        let merged = full.csg_copy(&interval(0.0, 1.0, 1), &or());
        assert_eq!(*merged.search(0.5), 9);
        assert_eq!(*merged.search(2.0), 8);

        let merged = interval(0.0, 1.0, 1).csg_copy(&full, &or());
        assert_eq!(*merged.search(0.5), 9);
        assert_eq!(*merged.search(-2.0), 8);
    }

    #[test]
    fn flipped_operand_is_inverted() {
        let op = CsgOperation::Intersect.operation();
        let a = interval(-1.0, 1.0, 3);
        // [0, 2] on the reversed line is [-2, 0] on `a`'s line.
        let b = BspTree1D::from_hull(
            Hull1D::new(line().flipped(), 0.0, 2.0),
            &SolidContent::new(1, 0),
        );
        let merged = a.csg_copy(&b, &op);
        let expected = [(-3.0, 0), (-1.5, 0), (-0.5, 3 & !1), (0.5, 3 & !0), (1.5, 0)];
        for (t, expected) in expected {
            assert_eq!(*merged.search(t), expected, "at {t}");
        }
    }

    #[test]
    fn union_of_squares_on_opposite_frames() {
        let up = Vector3::z();
        let a = world_square(up, -1.0, -1.0, 2.0, 3);
        for normal in [up, -up] {
            let b = world_square(normal, 1.0, 1.0, 2.0, 5);
            let union = a.csg_copy(&b, &space2d_union());
            assert_eq!(search_world(&union, 0.0, 0.0), 7, "normal {normal:?}");
            assert_eq!(search_world(&union, 1.5, 1.5), 5, "normal {normal:?}");
            assert_eq!(search_world(&union, -2.0, -2.0), 3, "normal {normal:?}");
            assert_eq!(search_world(&union, 5.0, 5.0), 0, "normal {normal:?}");

            let difference = a.csg_copy(&b, &space2d_difference());
            assert_eq!(search_world(&difference, 0.0, 0.0), 2, "normal {normal:?}");
            assert_eq!(search_world(&difference, 1.5, 1.5), 0, "normal {normal:?}");
            assert_eq!(search_world(&difference, -2.0, -2.0), 3, "normal {normal:?}");
        }
    }

    #[test]
    fn shared_boundary_of_touching_squares_cancels() {
        let a = square(1.0, 1.0, 1.0, 3);
        let b = square(3.0, 1.0, 1.0, 5);
        let merged = a.csg_copy(&b, &space2d_union());
        assert_eq!(*merged.search(Point2::new(1.0, 1.0)), 3);
        assert_eq!(*merged.search(Point2::new(3.0, 1.0)), 5);

        // The two squares' edges at u = 2 face each other and cancel out.
        let shared = boundary_contents(&merged, Point2::new(2.0, 1.0), Point2::new(2.0, 0.5));
        assert!(!shared.is_empty());
        assert!(shared.iter().all(|&c| c == 0), "{shared:?}");

        let outer = boundary_contents(&merged, Point2::new(0.0, 1.0), Point2::new(0.0, 0.5));
        assert!(!outer.is_empty());
        assert!(outer.iter().all(|&c| c == 1), "{outer:?}");
    }

    /// Runs `merges` random interval merges over `cells` cells and checks every cell
    /// against a per-cell reference.
    fn check_interval_sequence(rng: &mut StdRng, cells: usize, merges: usize) {
        let ops = [Binary::Or, Binary::Xor, Binary::Difference, Binary::And];
        // Breakpoint `k` sits somewhere in (k, k + 1); cell `c` lies between
        // breakpoints `c - 1` and `c`.
        let stops: Vec<f32> = (0..=cells)
            .map(|k| k as f32 + 0.05 + rng.gen_range(0.0..0.9))
            .collect();
        let mut probes = vec![stops[0] - 1.0];
        probes.extend(stops.windows(2).map(|w| 0.5 * (w[0] + w[1])));
        probes.push(stops[cells] + 1.0);

        let mut tree = BspTree1D::leaf(Hull1D::line(line()), 0);
        let mut reference = vec![0; cells + 2];
        for _ in 0..merges {
            let lo = rng.gen_range(0..cells);
            let hi = rng.gen_range(lo + 1..=cells);
            let bit = 1 << rng.gen_range(0..4);
            let binary = ops[rng.gen_range(0..ops.len())];
            let op = SpaceOperation::new(binary, binary);
            tree = tree.csg_into(&interval(stops[lo], stops[hi], bit), &op);
            tree.optimize();
            for (cell, value) in reference.iter_mut().enumerate() {
                let rhs = if cell > lo && cell <= hi { bit } else { 0 };
                *value = op.apply(value, &rhs);
            }
        }
        for (cell, (probe, value)) in probes.iter().zip(&reference).enumerate() {
            assert_eq!(tree.search(*probe), value, "cell {cell}");
        }
    }

    #[test]
    fn random_interval_sequences_match_reference() {
        let mut rng = StdRng::seed_from_u64(7);
        for _ in 0..1000 {
            check_interval_sequence(&mut rng, 16, 8);
        }
    }

    #[test]
    fn long_interval_sequence_matches_reference() {
        let mut rng = StdRng::seed_from_u64(19);
        for _ in 0..5 {
            check_interval_sequence(&mut rng, 100, 200);
        }
    }

    #[test]
    fn squares_intersect() {
        let a = square(-1.0, -1.0, 2.0, 3);
        let b = square(1.0, 1.0, 2.0, 5);
        let merged = a.csg_copy(&b, &space2d_intersect());
        assert_eq!(*merged.search(Point2::new(0.0, 0.0)), 1);
        assert_eq!(*merged.search(Point2::new(-2.0, -2.0)), 0);
        assert_eq!(*merged.search(Point2::new(2.0, 2.0)), 0);
        assert_eq!(*merged.search(Point2::new(5.0, 5.0)), 0);
    }

    #[test]
    fn squares_union() {
        let a = square(-1.0, -1.0, 2.0, 3);
        let b = square(1.0, 1.0, 2.0, 5);
        let merged = a.csg_copy(&b, &space2d_union());
        assert_eq!(*merged.search(Point2::new(0.0, 0.0)), 7);
        assert_eq!(*merged.search(Point2::new(-2.0, -2.0)), 3);
        assert_eq!(*merged.search(Point2::new(2.0, 2.0)), 5);
        assert_eq!(*merged.search(Point2::new(5.0, 5.0)), 0);
        assert!(merged.hull().classify(Point2::new(2.5, 2.5)) != crate::Side::Front);
    }

    #[test]
    fn squares_difference() {
        let a = square(-1.0, -1.0, 2.0, 3);
        let b = square(1.0, 1.0, 2.0, 5);
        let merged = a.csg_copy(&b, &space2d_difference());
        assert_eq!(*merged.search(Point2::new(0.0, 0.0)), 2);
        assert_eq!(*merged.search(Point2::new(-2.0, -2.0)), 3);
        assert_eq!(*merged.search(Point2::new(2.0, 2.0)), 0);
        assert_eq!(*merged.search(Point2::new(-5.0, 5.0)), 0);
    }

    #[test]
    fn overlapping_cubes_union() {
        let op = CsgOperation::Union.operation();
        let a = cube([-1.0, -1.0, -1.0], [1.0, 1.0, 1.0], 1);
        let b = cube([0.0, 0.0, 0.0], [2.0, 2.0, 2.0], 2);
        let merged = a.csg_copy(&b, &op);
        assert_eq!(*merged.search(Point3::new(-0.5, -0.5, -0.5)), 1);
        assert_eq!(*merged.search(Point3::new(0.5, 0.5, 0.5)), 3);
        assert_eq!(*merged.search(Point3::new(1.5, 1.5, 1.5)), 2);
        assert_eq!(*merged.search(Point3::new(1.5, -0.5, 0.5)), 0);
        assert_eq!(*merged.search(Point3::new(5.0, 5.0, 5.0)), 0);
    }

    #[test]
    fn touching_cubes_share_a_face() {
        let op = CsgOperation::Union.operation();
        let a = cube([-1.0, -1.0, -1.0], [1.0, 1.0, 1.0], 1);
        let b = cube([1.0, -1.0, -1.0], [3.0, 1.0, 1.0], 2);
        let merged = a.csg_copy(&b, &op);
        assert_eq!(*merged.search(Point3::new(0.0, 0.0, 0.0)), 1);
        assert_eq!(*merged.search(Point3::new(2.0, 0.0, 0.0)), 2);
        assert_eq!(*merged.search(Point3::new(2.0, 5.0, 0.0)), 0);
        assert_eq!(*merged.search(Point3::new(0.0, 0.0, 5.0)), 0);
    }
}
