//! Splitting surfaces that carry their own lower-dimensional trees.

use std::fmt;

use super::BspTree;
use crate::content::{Content, SpaceOperation};
use crate::{EdgeHull, Hull0D, Surface};

/// The splitting surface stored in an internal node.
///
/// A tree over a region of dimension `n` is split by surfaces of dimension `n - 1`.
/// Each such surface is itself a tree ([`BspTree`]) whose leaves describe what lies on
/// the surface, down to [`Hull0D`], which splits a line and carries nothing.
pub trait EdgeTree<C: Content>: Clone + fmt::Debug {
    type Surface: Surface;

    fn surface(&self) -> &Self::Surface;

    /// The same edge tree restricted to another piece of its carrier.
    fn with_surface(&self, surface: Self::Surface) -> Self;

    /// True when the surface piece is degenerate.
    fn is_empty(&self) -> bool;

    /// Splits the surface by the carrier of `splitter`, keeping the tree on both pieces.
    fn split_by(&self, splitter: &Self::Surface) -> (Option<Self>, Option<Self>) {
        let (back, front) = self.surface().split(splitter);
        (
            back.map(|piece| self.with_surface(piece)),
            front.map(|piece| self.with_surface(piece)),
        )
    }

    /// Merges the tree of a coincident surface into this one.
    ///
    /// When the two surfaces face opposite ways the inverse of `op` is used.
    fn merge(&mut self, other: &Self, op: &SpaceOperation<C>);

    /// Re-expresses the edge after a coordinate change of the enclosing space.
    fn reframe(&self, map: &<Self::Surface as Surface>::SpaceMap) -> Self;

    /// Contents of the edge tree's leaves that meet `piece`.
    fn leaf_contents(&self, piece: &Self::Surface) -> Vec<C>;
}

impl<C: Content> EdgeTree<C> for Hull0D {
    type Surface = Hull0D;

    fn surface(&self) -> &Hull0D {
        self
    }

    fn with_surface(&self, surface: Hull0D) -> Self {
        surface
    }

    fn is_empty(&self) -> bool {
        false
    }

    fn merge(&mut self, _other: &Self, _op: &SpaceOperation<C>) {}

    fn reframe(&self, map: &crate::LineMap) -> Self {
        Surface::reframe(self, map)
    }

    fn leaf_contents(&self, _piece: &Hull0D) -> Vec<C> {
        Vec::new()
    }
}

impl<H, E, C> EdgeTree<C> for BspTree<H, E, C>
where
    H: EdgeHull,
    E: EdgeTree<C, Surface = H::Boundary>,
    C: Content,
{
    type Surface = H;

    fn surface(&self) -> &H {
        self.hull()
    }

    fn with_surface(&self, surface: H) -> Self {
        self.clone().with_hull(surface)
    }

    fn is_empty(&self) -> bool {
        self.hull().is_empty()
    }

    fn merge(&mut self, other: &Self, op: &SpaceOperation<C>) {
        let flip = self.hull().is_flip(other.hull());
        self.csg_in_place(other, &op.oriented(flip));
    }

    fn reframe(&self, map: &<H as Surface>::SpaceMap) -> Self {
        let (hull, local) = self.hull().reframe_local(map);
        let mut root = self.root().clone();
        root.map_edges(|edge| edge.reframe(&local));
        BspTree::new(hull, root)
    }

    fn leaf_contents(&self, piece: &H) -> Vec<C> {
        let (piece, _) = piece.project_onto(self.hull());
        self.leafs(&piece)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::basis::{LineMap, PlaneMap};
    use crate::bsp::{BspNode, BspTree1D};
    use crate::{Basis2D, Hull1D, Plane2D};
    use nalgebra::{Point2, Vector2};

    fn edge_tree() -> BspTree1D<i32> {
        // Segment along y = 0 from x = 0 to x = 4, content 5 on [1, 3].
        let hull = Hull1D::segment(Point2::new(0.0, 0.0), Point2::new(4.0, 0.0)).unwrap();
        let mid = |x: f32| hull.basis().parameter(Point2::new(x, 0.0));
        let (lo, hi) = (mid(1.0).min(mid(3.0)), mid(1.0).max(mid(3.0)));
        let root = BspNode::internal(
            Hull0D::lower(lo),
            BspNode::internal(Hull0D::upper(hi), BspNode::leaf(5), BspNode::leaf(0)),
            BspNode::leaf(0),
        );
        BspTree::new(hull, root)
    }

    #[test]
    fn bound_reframes_like_a_surface() {
        let bound = Hull0D::upper(2.0);
        let map = LineMap::new(-1.0, 1.0);
        let moved = <Hull0D as EdgeTree<i32>>::reframe(&bound, &map);
        assert_eq!(moved, Surface::reframe(&bound, &map));
        assert!(<Hull0D as EdgeTree<i32>>::leaf_contents(&bound, &bound).is_empty());
    }

    #[test]
    fn split_by_keeps_tree_on_both_pieces() {
        let tree = edge_tree();
        let splitter = Hull1D::line(Basis2D::from_plane(&Plane2D::new(
            Vector2::new(1.0, 0.0),
            2.0,
        )));
        let (back, front) = tree.split_by(&splitter);
        let back = back.unwrap();
        let front = front.unwrap();
        assert_eq!(back.root(), tree.root());
        assert_eq!(front.root(), tree.root());
        assert!(back.surface().length() < tree.surface().length());
    }

    #[test]
    fn leaf_contents_of_pieces() {
        let tree = edge_tree();
        let inner = Hull1D::segment(Point2::new(1.5, 0.0), Point2::new(2.5, 0.0)).unwrap();
        assert_eq!(tree.leaf_contents(&inner), vec![5]);
        let outer = Hull1D::segment(Point2::new(3.5, 0.0), Point2::new(3.9, 0.0)).unwrap();
        assert_eq!(tree.leaf_contents(&outer), vec![0]);
        let mut across = tree.leaf_contents(tree.surface());
        across.sort();
        across.dedup();
        assert_eq!(across, vec![0, 5]);
    }

    #[test]
    fn reframe_moves_with_the_plane() {
        let tree = edge_tree();
        let mirror = PlaneMap::mirror();
        let moved = tree.reframe(&mirror);
        // (2, 0) is on the mirror axis and keeps its content.
        let t = moved.hull().basis().parameter(Point2::new(2.0, 0.0));
        assert_eq!(*moved.search(t), 5);
        let t = moved.hull().basis().parameter(Point2::new(3.5, 0.0));
        assert_eq!(*moved.search(t), 0);
    }
}
