//! BSP tree container, insertion and queries.

use std::collections::{HashMap, VecDeque};
use std::fmt;

use tracing::trace;

use super::edge::EdgeTree;
use super::node::{BspNode, NodeBody};
use super::visitor::BspVisitor;
use crate::content::{Content, SpaceOperation};
use crate::{Classification, Hull, Hull0D, Hull1D, Hull2D, Hull3D, Side, Surface};

/// A full partition of a convex region.
///
/// `hull` is the region the tree covers and `root` partitions it: every point of the
/// region descends to exactly one leaf. Internal nodes split by edge trees `E` one
/// dimension lower, whose own leaves describe the splitting surface.
///
/// ```ignore
/// use bsp_csg::{BspTree2D, Hull2D, SolidContent, space2d_union};
///
/// let a = BspTree2D::from_hull(square_a, &SolidContent::new(1, 0));
/// let b = BspTree2D::from_hull(square_b, &SolidContent::new(2, 0));
/// let merged = a.csg_into(&b, &space2d_union());
/// ```
#[derive(Debug, Clone, PartialEq)]
pub struct BspTree<H, E, C> {
    pub(crate) hull: H,
    pub(crate) root: BspNode<E, C>,
}

/// Tree over a line, split by parameter bounds.
pub type BspTree1D<C> = BspTree<Hull1D, Hull0D, C>;
/// Tree over a plane, split by line pieces carrying 1D trees.
pub type BspTree2D<C> = BspTree<Hull2D, BspTree1D<C>, C>;
/// Tree over space, split by plane pieces carrying 2D trees.
pub type BspTree3D<C> = BspTree<Hull3D, BspTree2D<C>, C>;

/// Where an incoming splitting surface goes relative to an existing internal node.
#[derive(Debug, Clone, PartialEq)]
pub enum Placement<E> {
    /// Coincident with the node's surface and merged into its edge tree.
    Merged,
    Back(E),
    Front(E),
    /// Crossed the node's surface and was split in two.
    Both(E, E),
    /// Nothing of the surface was left after splitting.
    Dropped,
}

impl<H, E, C> BspTree<H, E, C> {
    pub fn new(hull: H, root: BspNode<E, C>) -> Self {
        Self { hull, root }
    }

    /// A tree with a single leaf covering `hull`.
    pub fn leaf(hull: H, content: C) -> Self {
        Self::new(hull, BspNode::leaf(content))
    }

    #[inline]
    pub fn hull(&self) -> &H {
        &self.hull
    }

    #[inline]
    pub fn root(&self) -> &BspNode<E, C> {
        &self.root
    }

    /// The same partition over another region of the same carrier.
    pub fn with_hull(mut self, hull: H) -> Self {
        self.hull = hull;
        self
    }

    #[inline]
    pub fn node_count(&self) -> usize {
        self.root.node_count()
    }

    #[inline]
    pub fn leaf_count(&self) -> usize {
        self.root.leaf_count()
    }

    #[inline]
    pub fn depth(&self) -> usize {
        self.root.depth()
    }

    /// Rewrites every leaf content.
    pub fn map_contents(&mut self, f: impl FnMut(&C) -> C) {
        self.root.map_contents(f);
    }

    /// Numbers the nodes breadth first and returns how many there are.
    pub fn numerate(&mut self) -> usize {
        let mut next = 0;
        let mut queue = VecDeque::from([&mut self.root]);
        while let Some(node) = queue.pop_front() {
            node.set_numeration(next);
            next += 1;
            if let NodeBody::Internal { back, front, .. } = node.body_mut() {
                queue.push_back(back.as_mut());
                queue.push_back(front.as_mut());
            }
        }
        next
    }

    /// For every node, the side of each ancestor it lies on, keyed by numeration.
    ///
    /// Only meaningful right after [`numerate`](Self::numerate).
    pub fn order(&self) -> HashMap<usize, HashMap<usize, Side>> {
        let mut order = HashMap::new();
        let mut stack = vec![(&self.root, HashMap::new())];
        while let Some((node, path)) = stack.pop() {
            if let NodeBody::Internal { back, front, .. } = node.body() {
                let mut back_path = path.clone();
                back_path.insert(node.numeration(), Side::Back);
                let mut front_path = path.clone();
                front_path.insert(node.numeration(), Side::Front);
                stack.push((back.as_ref(), back_path));
                stack.push((front.as_ref(), front_path));
            }
            order.insert(node.numeration(), path);
        }
        order
    }
}

impl<H, E, C> BspTree<H, E, C>
where
    H: Hull,
    E: EdgeTree<C, Surface = H::Boundary>,
    C: Content,
{
    /// The leaf containing `point`.
    ///
    /// Points on a splitting surface descend to its front side.
    pub fn search_leaf(&self, point: H::Point) -> &BspNode<E, C> {
        let mut node = &self.root;
        while let NodeBody::Internal { edge, back, front } = node.body() {
            node = match edge.surface().side(point) {
                Side::Back => back.as_ref(),
                _ => front.as_ref(),
            };
        }
        node
    }

    /// Content of the leaf containing `point`.
    pub fn search(&self, point: H::Point) -> &C {
        match self.search_leaf(point).body() {
            NodeBody::Leaf(content) => content,
            NodeBody::Internal { .. } => unreachable!("descent stops at leaves"),
        }
    }

    /// Inserts a splitting surface, splitting every leaf it crosses.
    ///
    /// Parts coincident with an existing splitting surface are merged into that
    /// surface's edge tree with `op`.
    pub fn add(&mut self, edge: E, op: &SpaceOperation<C>) {
        let mut stack = vec![(&mut self.root, edge)];
        while let Some((node, edge)) = stack.pop() {
            if node.is_leaf() {
                node.split_leaf(edge);
                continue;
            }
            let placement = node.place(edge, op);
            let NodeBody::Internal { back, front, .. } = node.body_mut() else {
                unreachable!("place only accepts internal nodes");
            };
            match placement {
                Placement::Merged | Placement::Dropped => {}
                Placement::Back(edge) => stack.push((back.as_mut(), edge)),
                Placement::Front(edge) => stack.push((front.as_mut(), edge)),
                Placement::Both(b, f) => {
                    stack.push((back.as_mut(), b));
                    stack.push((front.as_mut(), f));
                }
            }
        }
    }

    /// Collapses sibling leaves with equal content.
    pub fn optimize(&mut self) {
        self.root.optimize();
    }

    /// Contents of the leaves whose regions meet `region`, in breadth-first order.
    pub fn leafs(&self, region: &H) -> Vec<C> {
        self.regions_from(region.clone())
            .into_iter()
            .filter_map(|(node, _)| node.content().cloned())
            .collect()
    }

    /// Every leaf with a non-empty region inside the tree's hull, with that region.
    pub fn leaf_regions(&self) -> Vec<(&BspNode<E, C>, H)> {
        self.regions_from(self.hull.clone())
            .into_iter()
            .filter(|(node, _)| node.is_leaf())
            .collect()
    }

    /// Calls `visitor` for every leaf region inside the tree's hull.
    pub fn visit_regions<V: BspVisitor<H, C>>(&self, visitor: &mut V) {
        for (node, region) in self.leaf_regions() {
            if let Some(content) = node.content() {
                visitor.visit(&region, content);
            }
        }
    }

    /// Every node reached from `start`, with its non-empty part of `start`.
    pub(crate) fn regions_from(&self, start: H) -> Vec<(&BspNode<E, C>, H)> {
        let mut regions = Vec::new();
        let mut queue = VecDeque::from([(&self.root, start)]);
        while let Some((node, region)) = queue.pop_front() {
            if region.is_empty() {
                continue;
            }
            if let NodeBody::Internal { edge, back, front } = node.body() {
                let cut = region.cut(edge.surface());
                if let Some(piece) = cut.back {
                    queue.push_back((back.as_ref(), piece));
                }
                if let Some(piece) = cut.front {
                    queue.push_back((front.as_ref(), piece));
                }
            }
            regions.push((node, region));
        }
        regions
    }

    /// The same tree re-expressed in the frame of `target`, a hull of the same carrier.
    pub(crate) fn projected_onto(&self, target: &H) -> Self {
        let (hull, map) = self.hull.project_onto(target);
        let mut root = self.root.clone();
        root.map_edges(|edge| edge.reframe(&map));
        Self { hull, root }
    }
}

impl<E, C> BspNode<E, C>
where
    E: EdgeTree<C>,
    C: Content,
{
    /// Decides where `incoming` goes below this internal node.
    ///
    /// # Panics
    ///
    /// Panics if the node is a leaf.
    pub fn place(&mut self, incoming: E, op: &SpaceOperation<C>) -> Placement<E> {
        let NodeBody::Internal { edge, .. } = self.body_mut() else {
            panic!("Leaf has no splitting surface");
        };
        match incoming.surface().classify_to(edge.surface()) {
            Classification::Coincident => {
                trace!("merging coincident splitting surface");
                edge.merge(&incoming, op);
                Placement::Merged
            }
            Classification::Back => Placement::Back(incoming),
            Classification::Front => Placement::Front(incoming),
            Classification::NotParallel => {
                let (back, front) = incoming.split_by(edge.surface());
                let keep = |piece: Option<E>| piece.filter(|piece| !piece.is_empty());
                match (keep(back), keep(front)) {
                    (Some(b), Some(f)) => Placement::Both(b, f),
                    (Some(b), None) => Placement::Back(b),
                    (None, Some(f)) => Placement::Front(f),
                    (None, None) => Placement::Dropped,
                }
            }
        }
    }
}

impl<H, E, C> fmt::Display for BspTree<H, E, C>
where
    H: fmt::Display,
    E: EdgeTree<C>,
    E::Surface: fmt::Display,
    C: Content,
{
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        writeln!(f, "{}", self.hull)?;
        let mut stack = vec![(&self.root, 0, "root")];
        while let Some((node, depth, label)) = stack.pop() {
            write!(f, "{:indent$}{label}: ", "", indent = 2 * depth)?;
            match node.body() {
                NodeBody::Leaf(content) => writeln!(f, "{content:?}")?,
                NodeBody::Internal { edge, back, front } => {
                    writeln!(f, "{}", edge.surface())?;
                    stack.push((front.as_ref(), depth + 1, "front"));
                    stack.push((back.as_ref(), depth + 1, "back"));
                }
            }
        }
        Ok(())
    }
}
