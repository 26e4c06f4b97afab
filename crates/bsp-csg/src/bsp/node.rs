//! BSP tree node implementation.

/// What a node holds: a content leaf, or a splitting surface with two subtrees.
#[derive(Debug, Clone, PartialEq)]
pub enum NodeBody<E, C> {
    Leaf(C),
    Internal {
        /// The splitting surface, carrying its own lower-dimensional tree.
        edge: E,
        /// Subtree behind the splitting surface.
        back: Box<BspNode<E, C>>,
        /// Subtree in front of the splitting surface.
        front: Box<BspNode<E, C>>,
    },
}

/// A node in a BSP tree.
///
/// Every internal node has both children, so any point descends to exactly one leaf.
/// The `numeration` is a transient index, assigned by [`BspTree::numerate`] and only
/// meaningful until the tree is next modified.
///
/// [`BspTree::numerate`]: super::BspTree::numerate
#[derive(Debug, Clone, PartialEq)]
pub struct BspNode<E, C> {
    numeration: usize,
    body: NodeBody<E, C>,
}

impl<E, C> BspNode<E, C> {
    /// Creates a leaf holding `content`.
    pub fn leaf(content: C) -> Self {
        Self {
            numeration: 0,
            body: NodeBody::Leaf(content),
        }
    }

    /// Creates an internal node splitting by `edge`.
    pub fn internal(edge: E, back: Self, front: Self) -> Self {
        Self {
            numeration: 0,
            body: NodeBody::Internal {
                edge,
                back: Box::new(back),
                front: Box::new(front),
            },
        }
    }

    #[inline]
    pub fn body(&self) -> &NodeBody<E, C> {
        &self.body
    }

    #[inline]
    pub(crate) fn body_mut(&mut self) -> &mut NodeBody<E, C> {
        &mut self.body
    }

    #[inline]
    pub fn numeration(&self) -> usize {
        self.numeration
    }

    #[inline]
    pub(crate) fn set_numeration(&mut self, numeration: usize) {
        self.numeration = numeration;
    }

    #[inline]
    pub fn is_leaf(&self) -> bool {
        matches!(self.body, NodeBody::Leaf(_))
    }

    /// Leaf content, `None` for internal nodes.
    #[inline]
    pub fn content(&self) -> Option<&C> {
        match &self.body {
            NodeBody::Leaf(content) => Some(content),
            NodeBody::Internal { .. } => None,
        }
    }

    /// The splitting surface, `None` for leaves.
    #[inline]
    pub fn edge(&self) -> Option<&E> {
        match &self.body {
            NodeBody::Leaf(_) => None,
            NodeBody::Internal { edge, .. } => Some(edge),
        }
    }

    #[inline]
    pub fn back(&self) -> Option<&BspNode<E, C>> {
        match &self.body {
            NodeBody::Leaf(_) => None,
            NodeBody::Internal { back, .. } => Some(back),
        }
    }

    #[inline]
    pub fn front(&self) -> Option<&BspNode<E, C>> {
        match &self.body {
            NodeBody::Leaf(_) => None,
            NodeBody::Internal { front, .. } => Some(front),
        }
    }

    /// Number of nodes in this subtree, leaves included.
    pub fn node_count(&self) -> usize {
        let mut count = 0;
        let mut stack = vec![self];
        while let Some(node) = stack.pop() {
            count += 1;
            if let NodeBody::Internal { back, front, .. } = &node.body {
                stack.push(back);
                stack.push(front);
            }
        }
        count
    }

    /// Number of leaves in this subtree.
    pub fn leaf_count(&self) -> usize {
        let mut count = 0;
        let mut stack = vec![self];
        while let Some(node) = stack.pop() {
            match &node.body {
                NodeBody::Leaf(_) => count += 1,
                NodeBody::Internal { back, front, .. } => {
                    stack.push(back);
                    stack.push(front);
                }
            }
        }
        count
    }

    /// Returns the depth of this subtree (1 for a leaf).
    pub fn depth(&self) -> usize {
        let mut depth = 0;
        let mut stack = vec![(self, 1)];
        while let Some((node, level)) = stack.pop() {
            depth = depth.max(level);
            if let NodeBody::Internal { back, front, .. } = &node.body {
                stack.push((back.as_ref(), level + 1));
                stack.push((front.as_ref(), level + 1));
            }
        }
        depth
    }

    /// Rewrites every leaf content in place.
    pub fn map_contents(&mut self, mut f: impl FnMut(&C) -> C) {
        let mut stack = vec![self];
        while let Some(node) = stack.pop() {
            match &mut node.body {
                NodeBody::Leaf(content) => *content = f(content),
                NodeBody::Internal { back, front, .. } => {
                    stack.push(back);
                    stack.push(front);
                }
            }
        }
    }

    /// Rewrites every splitting surface in place.
    pub(crate) fn map_edges(&mut self, mut f: impl FnMut(&E) -> E) {
        let mut stack = vec![self];
        while let Some(node) = stack.pop() {
            if let NodeBody::Internal { edge, back, front } = &mut node.body {
                *edge = f(edge);
                stack.push(back);
                stack.push(front);
            }
        }
    }
}

impl<E, C: Clone> BspNode<E, C> {
    /// Turns a leaf into an internal node split by `edge`, with the leaf's content on
    /// both sides.
    ///
    /// # Panics
    ///
    /// Panics if the node is not a leaf.
    pub fn split_leaf(&mut self, edge: E) {
        let NodeBody::Leaf(content) = &self.body else {
            panic!("Only a leaf can be split");
        };
        let content = content.clone();
        self.body = NodeBody::Internal {
            edge,
            back: Box::new(BspNode::leaf(content.clone())),
            front: Box::new(BspNode::leaf(content)),
        };
    }
}

/// Post-order step of [`BspNode::optimize`].
enum Step<E, C> {
    Enter(BspNode<E, C>),
    Join { edge: E, numeration: usize },
}

impl<E, C: Clone + PartialEq> BspNode<E, C> {
    /// Collapses internal nodes whose children are leaves with equal content.
    ///
    /// Children are collapsed before their parents, so whole uniform subtrees fold into
    /// one leaf.
    pub fn optimize(&mut self) {
        if self.is_leaf() {
            return;
        }
        let mut probe = &*self;
        while let NodeBody::Internal { back, .. } = &probe.body {
            probe = back.as_ref();
        }
        let NodeBody::Leaf(sample) = &probe.body else {
            return;
        };
        let placeholder = BspNode::leaf(sample.clone());
        let root = std::mem::replace(self, placeholder);

        let mut steps = vec![Step::Enter(root)];
        let mut finished: Vec<BspNode<E, C>> = Vec::new();
        while let Some(step) = steps.pop() {
            match step {
                Step::Enter(BspNode { numeration, body }) => match body {
                    NodeBody::Leaf(content) => finished.push(BspNode {
                        numeration,
                        body: NodeBody::Leaf(content),
                    }),
                    NodeBody::Internal { edge, back, front } => {
                        steps.push(Step::Join { edge, numeration });
                        steps.push(Step::Enter(*front));
                        steps.push(Step::Enter(*back));
                    }
                },
                Step::Join { edge, numeration } => {
                    let (Some(front), Some(back)) = (finished.pop(), finished.pop()) else {
                        unreachable!("children finish before their parent");
                    };
                    let uniform = matches!(
                        (&back.body, &front.body),
                        (NodeBody::Leaf(b), NodeBody::Leaf(f)) if b == f
                    );
                    let body = if uniform {
                        back.body
                    } else {
                        NodeBody::Internal {
                            edge,
                            back: Box::new(back),
                            front: Box::new(front),
                        }
                    };
                    finished.push(BspNode { numeration, body });
                }
            }
        }
        if let Some(root) = finished.pop() {
            *self = root;
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    type Node = BspNode<&'static str, i32>;

    fn sample() -> Node {
        // a -> (b -> (1, 2), 3)
        BspNode::internal(
            "a",
            BspNode::internal("b", BspNode::leaf(1), BspNode::leaf(2)),
            BspNode::leaf(3),
        )
    }

    #[test]
    fn leaf_accessors() {
        let leaf: Node = BspNode::leaf(7);
        assert!(leaf.is_leaf());
        assert_eq!(leaf.content(), Some(&7));
        assert!(leaf.edge().is_none());
        assert!(leaf.back().is_none() && leaf.front().is_none());
        assert_eq!(leaf.depth(), 1);
    }

    #[test]
    fn internal_accessors() {
        let node = sample();
        assert!(!node.is_leaf());
        assert_eq!(node.edge(), Some(&"a"));
        assert_eq!(node.front().and_then(BspNode::content), Some(&3));
        assert_eq!(node.back().and_then(BspNode::edge), Some(&"b"));
        assert_eq!(node.node_count(), 5);
        assert_eq!(node.leaf_count(), 3);
        assert_eq!(node.depth(), 3);
    }

    #[test]
    fn split_leaf_copies_content() {
        let mut node: Node = BspNode::leaf(4);
        node.split_leaf("x");
        assert_eq!(node.edge(), Some(&"x"));
        assert_eq!(node.back().and_then(BspNode::content), Some(&4));
        assert_eq!(node.front().and_then(BspNode::content), Some(&4));
    }

    #[test]
    #[should_panic(expected = "Only a leaf can be split")]
    fn split_internal_panics() {
        sample().split_leaf("y");
    }

    #[test]
    fn map_contents_and_edges() {
        let mut node = sample();
        node.map_contents(|c| c * 10);
        node.map_edges(|e| if *e == "b" { "c" } else { *e });
        assert_eq!(node.front().and_then(BspNode::content), Some(&30));
        assert_eq!(node.back().and_then(BspNode::edge), Some(&"c"));
        assert_eq!(node.edge(), Some(&"a"));
    }

    #[test]
    fn optimize_collapses_equal_leaves() {
        let mut node: Node = BspNode::internal(
            "a",
            BspNode::internal("b", BspNode::leaf(1), BspNode::leaf(1)),
            BspNode::leaf(1),
        );
        node.optimize();
        assert!(node.is_leaf());
        assert_eq!(node.content(), Some(&1));

        let mut node = sample();
        node.optimize();
        assert_eq!(node.node_count(), 5);
    }

    #[test]
    fn optimize_keeps_differing_subtrees() {
        // a -> (b -> (2, 2), c -> (1, 3))
        let mut node: Node = BspNode::internal(
            "a",
            BspNode::internal("b", BspNode::leaf(2), BspNode::leaf(2)),
            BspNode::internal("c", BspNode::leaf(1), BspNode::leaf(3)),
        );
        node.optimize();
        assert_eq!(node.node_count(), 5);
        assert_eq!(node.back().and_then(BspNode::content), Some(&2));
        assert_eq!(node.front().and_then(BspNode::edge), Some(&"c"));
        assert_eq!(node.edge(), Some(&"a"));
    }

    #[test]
    fn deep_chains_optimize_without_recursion() {
        let levels = 2000;
        let mut node: Node = BspNode::leaf(0);
        for _ in 0..levels {
            node = BspNode::internal("x", node, BspNode::leaf(0));
        }
        assert_eq!(node.depth(), levels + 1);
        node.optimize();
        assert!(node.is_leaf());
        assert_eq!(node.content(), Some(&0));

        let mut node: Node = BspNode::leaf(1);
        for _ in 0..levels {
            node = BspNode::internal("x", node, BspNode::leaf(0));
        }
        node.optimize();
        assert_eq!(node.node_count(), 2 * levels + 1);
    }
}
