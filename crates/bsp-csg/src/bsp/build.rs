//! Building trees from single convex hulls.

use super::node::BspNode;
use super::tree::{BspTree, BspTree1D, BspTree2D, BspTree3D};
use crate::content::{Content, ContentProvider};
use crate::{Hull, Hull1D, Hull2D, Hull3D};

/// Chains the boundaries of a hull: each boundary node keeps the rest of the chain
/// behind it and the default content in front, ending in the content leaf.
fn chain<B, E, C>(
    boundaries: &[B],
    content: C,
    default: &C,
    mut edge_of: impl FnMut(&B) -> E,
) -> BspNode<E, C>
where
    C: Clone,
{
    boundaries
        .iter()
        .rev()
        .fold(BspNode::leaf(content), |inner, bound| {
            BspNode::internal(edge_of(bound), inner, BspNode::leaf(default.clone()))
        })
}

/// The content inside `hull`, or `None` when the tree is a single default leaf.
fn inner_content<H: Hull, C: Content>(hull: &H, provider: &dyn ContentProvider<C>) -> Option<C> {
    let content = provider.content();
    (!hull.is_empty() && content != provider.default_content()).then_some(content)
}

impl<C: Content> BspTree1D<C> {
    /// A tree holding the provider's content on `hull` and its default elsewhere.
    pub fn from_hull(hull: Hull1D, provider: &dyn ContentProvider<C>) -> Self {
        let default = provider.default_content();
        let Some(content) = inner_content(&hull, provider) else {
            return BspTree::leaf(hull, default);
        };
        let root = chain(&hull.boundaries(), content, &default, |bound| *bound);
        BspTree::new(hull, root)
    }
}

impl<C: Content> BspTree2D<C> {
    /// A tree holding the provider's content on `hull` and its default elsewhere.
    ///
    /// Boundary edges carry trees built from the provider's boundary provider, or a
    /// default leaf when there is none.
    pub fn from_hull(hull: Hull2D, provider: &dyn ContentProvider<C>) -> Self {
        let default = provider.default_content();
        let Some(content) = inner_content(&hull, provider) else {
            return BspTree::leaf(hull, default);
        };
        let boundary = provider.boundary();
        let root = chain(&hull.boundaries(), content, &default, |bound| match boundary {
            Some(inner) => BspTree1D::from_hull(bound.clone(), inner),
            None => BspTree::leaf(bound.clone(), default.clone()),
        });
        BspTree::new(hull, root)
    }
}

impl<C: Content> BspTree3D<C> {
    /// A tree holding the provider's content on `hull` and its default elsewhere.
    ///
    /// Faces carry 2D trees built from the provider's boundary provider, or a default
    /// leaf when there is none.
    pub fn from_hull(hull: Hull3D, provider: &dyn ContentProvider<C>) -> Self {
        let default = provider.default_content();
        let Some(content) = inner_content(&hull, provider) else {
            return BspTree::leaf(hull, default);
        };
        let boundary = provider.boundary();
        let root = chain(&hull.boundaries(), content, &default, |face| match boundary {
            Some(inner) => BspTree2D::from_hull(face.clone(), inner),
            None => BspTree::leaf(face.clone(), default.clone()),
        });
        BspTree::new(hull, root)
    }
}
