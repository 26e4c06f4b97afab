//! Leaf adjacency, areas and inside/outside classification.
//!
//! A [`PortalGraph`] is built once from a finished tree. Two leaves are neighbors when
//! their regions share a piece of some splitting surface; that shared piece is a
//! [`Portal`]. Leaves joined by portals passable in both directions form an area, and
//! walking outward from a known outside point through the area links classifies every
//! area as inside or outside without knowing what brushes made the tree.

use std::collections::{BTreeMap, VecDeque};

use tracing::debug;

use crate::bsp::{BspTree, EdgeTree, NodeBody};
use crate::content::{
    Content, ContentOperation, Visibility, VisibilityContent, VisibilityMerge,
};
use crate::{GeometryError, Hull, Side, Surface};

/// Decides what portals carry and whether they can be crossed.
pub trait AreaBuilder<C> {
    /// Content a portal starts from before its surface's contents are folded in.
    fn outer_content(&self) -> C;

    fn aggregate(&self, acc: &C, content: &C) -> C;

    /// Whether a portal with `content` can be crossed into the `side` of its surface.
    fn pass_condition(&self, content: &C, side: Side) -> bool;
}

/// Area builder for [`VisibilityContent`]: a portal blocks the directions its
/// surface's visibility flags block.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct VisibilityBuilder;

impl VisibilityBuilder {
    /// Flag blocking traversal that ends on `side`.
    fn entering(side: Side) -> Visibility {
        match side {
            Side::Front => Visibility::BACK_TO_FRONT,
            Side::Back => Visibility::FRONT_TO_BACK,
            Side::Incident => Visibility::OPEN,
        }
    }
}

impl AreaBuilder<VisibilityContent> for VisibilityBuilder {
    fn outer_content(&self) -> VisibilityContent {
        VisibilityContent::default()
    }

    fn aggregate(&self, acc: &VisibilityContent, content: &VisibilityContent) -> VisibilityContent {
        VisibilityMerge.apply(acc, content)
    }

    fn pass_condition(&self, content: &VisibilityContent, side: Side) -> bool {
        !content.visibility.intersects(Self::entering(side))
    }
}

/// The shared boundary between a leaf and one neighbor.
#[derive(Debug, Clone, PartialEq)]
pub struct Portal<S, C> {
    /// Index of the neighboring leaf.
    pub neighbor: usize,
    /// Numeration of the node whose splitting surface holds the portal.
    pub node: usize,
    pub piece: S,
    /// Aggregated content of the surface on `piece`.
    pub content: C,
    /// Side of the surface the neighbor lies on.
    pub side: Side,
    /// Whether the portal can be crossed toward the neighbor.
    pub pass: bool,
}

/// A piece of an ancestor's splitting surface bounding a leaf.
#[derive(Debug, Clone, PartialEq)]
pub struct LeafEdge<S> {
    /// Numeration of the node whose splitting surface this is.
    pub node: usize,
    /// Side of that surface the leaf lies on.
    pub side: Side,
    pub piece: S,
}

/// Passability between two areas, seen from the area owning the link.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct Passage {
    /// Some portal can be crossed toward the other area.
    pub forward: bool,
    /// Some portal can be crossed back from the other area.
    pub backward: bool,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum AreaClass {
    External,
    Internal,
}

/// A splitting surface piece carried down the tree.
struct Fragment<E> {
    origin: usize,
    edge: E,
}

/// Leaves of a tree with their regions, portals and areas.
#[derive(Debug, Clone)]
pub struct PortalGraph<H: Hull, C> {
    regions: Vec<H>,
    contents: Vec<C>,
    nodes: Vec<usize>,
    edges: Vec<Vec<LeafEdge<H::Boundary>>>,
    portals: Vec<BTreeMap<usize, Portal<H::Boundary, C>>>,
    leaf_area: Vec<usize>,
    areas: Vec<Vec<usize>>,
    area_graph: Vec<BTreeMap<usize, Passage>>,
}

impl<H: Hull, C: Content> PortalGraph<H, C> {
    /// Builds the graph of `tree`, restricted to the tree's hull.
    ///
    /// Leaves are numbered breadth first, skipping leaves with no region inside the hull.
    pub fn build<E, B>(tree: &BspTree<H, E, C>, builder: &B) -> Self
    where
        E: EdgeTree<C, Surface = H::Boundary>,
        B: AreaBuilder<C> + ?Sized,
    {
        let mut tree = tree.clone();
        tree.numerate();
        let order = tree.order();

        let mut regions = Vec::new();
        let mut contents = Vec::new();
        let mut nodes = Vec::new();
        let mut reached: Vec<Vec<Fragment<E>>> = Vec::new();
        let mut queue = VecDeque::from([(tree.root(), tree.hull().clone(), Vec::new())]);
        while let Some((node, region, fragments)) = queue.pop_front() {
            if region.is_empty() {
                continue;
            }
            match node.body() {
                NodeBody::Leaf(content) => {
                    regions.push(region);
                    contents.push(content.clone());
                    nodes.push(node.numeration());
                    reached.push(fragments);
                }
                NodeBody::Internal { edge, back, front } => {
                    let cut = region.cut(edge.surface());
                    let (mut to_back, mut to_front) =
                        Self::distribute(fragments, edge.surface(), cut.back.is_some());
                    if let Some(section) = cut.section {
                        let origin = node.numeration();
                        to_back.push(Fragment {
                            origin,
                            edge: edge.with_surface(section.clone()),
                        });
                        to_front.push(Fragment {
                            origin,
                            edge: edge.with_surface(section),
                        });
                    }
                    if let Some(piece) = cut.back {
                        queue.push_back((back.as_ref(), piece, to_back));
                    }
                    if let Some(piece) = cut.front {
                        queue.push_back((front.as_ref(), piece, to_front));
                    }
                }
            }
        }

        let count = regions.len();
        let mut edges = Vec::with_capacity(count);
        let mut by_origin: BTreeMap<usize, (Vec<(usize, &E)>, Vec<(usize, &E)>)> =
            BTreeMap::new();
        for (leaf, fragments) in reached.iter().enumerate() {
            let path = &order[&nodes[leaf]];
            let mut bounding = Vec::with_capacity(fragments.len());
            for fragment in fragments {
                let side = path[&fragment.origin];
                let sides = by_origin.entry(fragment.origin).or_default();
                match side {
                    Side::Back => sides.0.push((leaf, &fragment.edge)),
                    _ => sides.1.push((leaf, &fragment.edge)),
                }
                bounding.push(LeafEdge {
                    node: fragment.origin,
                    side,
                    piece: fragment.edge.surface().clone(),
                });
            }
            edges.push(bounding);
        }

        let mut portals: Vec<BTreeMap<usize, Portal<H::Boundary, C>>> =
            vec![BTreeMap::new(); count];
        for (&origin, (backs, fronts)) in &by_origin {
            for &(behind, back_edge) in backs {
                for &(ahead, front_edge) in fronts {
                    let Some(piece) = back_edge.surface().intersect(front_edge.surface()) else {
                        continue;
                    };
                    let content = back_edge
                        .leaf_contents(&piece)
                        .iter()
                        .fold(builder.outer_content(), |acc, c| builder.aggregate(&acc, c));
                    portals[behind].entry(ahead).or_insert_with(|| Portal {
                        neighbor: ahead,
                        node: origin,
                        piece: piece.clone(),
                        content: content.clone(),
                        side: Side::Front,
                        pass: builder.pass_condition(&content, Side::Front),
                    });
                    portals[ahead].entry(behind).or_insert_with(|| Portal {
                        neighbor: behind,
                        node: origin,
                        piece,
                        pass: builder.pass_condition(&content, Side::Back),
                        content,
                        side: Side::Back,
                    });
                }
            }
        }

        let (leaf_area, areas) = Self::cluster(&portals);
        let mut area_graph = vec![BTreeMap::new(); areas.len()];
        for (leaf, links) in portals.iter().enumerate() {
            for (&next, portal) in links {
                let (from, to) = (leaf_area[leaf], leaf_area[next]);
                if from == to {
                    continue;
                }
                let passage: &mut Passage = area_graph[from].entry(to).or_default();
                passage.forward |= portal.pass;
                passage.backward |= portals[next].get(&leaf).is_some_and(|back| back.pass);
            }
        }

        debug!(
            leaves = count,
            portals = portals.iter().map(BTreeMap::len).sum::<usize>(),
            areas = areas.len(),
            "portal graph built"
        );
        Self {
            regions,
            contents,
            nodes,
            edges,
            portals,
            leaf_area,
            areas,
            area_graph,
        }
    }

    /// Splits fragments reaching a node between its children. Fragments lying on the
    /// node's own surface follow the region.
    fn distribute<E: EdgeTree<C>>(
        fragments: Vec<Fragment<E>>,
        splitter: &E::Surface,
        back_reached: bool,
    ) -> (Vec<Fragment<E>>, Vec<Fragment<E>>) {
        let mut back = Vec::new();
        let mut front = Vec::new();
        for Fragment { origin, edge } in fragments {
            if edge.surface().classify_to(splitter).is_coincident() {
                let target = if back_reached { &mut back } else { &mut front };
                target.push(Fragment { origin, edge });
                continue;
            }
            let (b, f) = edge.split_by(splitter);
            let keep = |edge: E| Fragment { origin, edge };
            back.extend(b.filter(|e| !e.is_empty()).map(keep));
            front.extend(f.filter(|e| !e.is_empty()).map(keep));
        }
        (back, front)
    }

    /// Flood fill over portals passable both ways.
    fn cluster(portals: &[BTreeMap<usize, Portal<H::Boundary, C>>]) -> (Vec<usize>, Vec<Vec<usize>>) {
        let mut leaf_area: Vec<Option<usize>> = vec![None; portals.len()];
        let mut areas = Vec::new();
        for seed in 0..portals.len() {
            if leaf_area[seed].is_some() {
                continue;
            }
            let area = areas.len();
            leaf_area[seed] = Some(area);
            let mut members = vec![seed];
            let mut queue = VecDeque::from([seed]);
            while let Some(leaf) = queue.pop_front() {
                for (&next, portal) in &portals[leaf] {
                    let mutual =
                        portal.pass && portals[next].get(&leaf).is_some_and(|back| back.pass);
                    if mutual && leaf_area[next].is_none() {
                        leaf_area[next] = Some(area);
                        members.push(next);
                        queue.push_back(next);
                    }
                }
            }
            areas.push(members);
        }
        (leaf_area.into_iter().flatten().collect(), areas)
    }

    /// Classifies every area by how many area links separate it from the area holding
    /// `outside`: an even count is external.
    ///
    /// Areas with no link path to the outside are internal.
    pub fn build_parity(&self, outside: H::Point) -> Result<Vec<AreaClass>, GeometryError> {
        let start = self
            .leaf_at(outside)
            .ok_or(GeometryError::OutsideGraph)?;
        let start = self.leaf_area[start];
        let mut generation: Vec<Option<usize>> = vec![None; self.areas.len()];
        generation[start] = Some(0);
        let mut current = vec![start];
        let mut depth = 0;
        while !current.is_empty() {
            let mut next = Vec::new();
            for area in current {
                for &neighbor in self.area_graph[area].keys() {
                    if generation[neighbor].is_none() {
                        generation[neighbor] = Some(depth + 1);
                        next.push(neighbor);
                    }
                }
            }
            current = next;
            depth += 1;
        }

        let classes: Vec<AreaClass> = generation
            .into_iter()
            .map(|g| match g {
                Some(g) if g % 2 == 0 => AreaClass::External,
                _ => AreaClass::Internal,
            })
            .collect();
        debug!(
            areas = classes.len(),
            internal = classes.iter().filter(|c| **c == AreaClass::Internal).count(),
            "parity classified"
        );
        Ok(classes)
    }

    #[inline]
    pub fn leaf_count(&self) -> usize {
        self.regions.len()
    }

    #[inline]
    pub fn leaf_region(&self, leaf: usize) -> &H {
        &self.regions[leaf]
    }

    #[inline]
    pub fn leaf_content(&self, leaf: usize) -> &C {
        &self.contents[leaf]
    }

    /// Numeration of the leaf's node in the numerated copy of the tree.
    #[inline]
    pub fn leaf_node(&self, leaf: usize) -> usize {
        self.nodes[leaf]
    }

    /// Corner points of the leaf region.
    pub fn leaf_points(&self, leaf: usize) -> Vec<H::Point> {
        self.regions[leaf].vertices()
    }

    /// The surfaces bounding the leaf region.
    pub fn leaf_brush(&self, leaf: usize) -> Vec<H::Boundary> {
        self.regions[leaf].boundaries()
    }

    pub fn portals(&self, leaf: usize) -> &BTreeMap<usize, Portal<H::Boundary, C>> {
        &self.portals[leaf]
    }

    pub fn leaf_edges(&self, leaf: usize) -> &[LeafEdge<H::Boundary>] {
        &self.edges[leaf]
    }

    #[inline]
    pub fn area_of(&self, leaf: usize) -> usize {
        self.leaf_area[leaf]
    }

    #[inline]
    pub fn area_count(&self) -> usize {
        self.areas.len()
    }

    pub fn area_leaves(&self, area: usize) -> &[usize] {
        &self.areas[area]
    }

    /// Links from `area` to neighboring areas.
    pub fn area_links(&self, area: usize) -> &BTreeMap<usize, Passage> {
        &self.area_graph[area]
    }

    /// The leaf whose region contains `point`, preferring interiors over boundaries.
    pub fn leaf_at(&self, point: H::Point) -> Option<usize> {
        let mut incident = None;
        for (leaf, region) in self.regions.iter().enumerate() {
            match region.classify(point) {
                Side::Back => return Some(leaf),
                Side::Incident if incident.is_none() => incident = Some(leaf),
                _ => {}
            }
        }
        incident
    }
}
