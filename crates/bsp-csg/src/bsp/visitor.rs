//! Visitor pattern for walking the leaf regions of a tree.
//!
//! Visitors receive every leaf region together with its content, without coupling the
//! walk to a specific use.

/// Visitor for processing leaf regions during [`BspTree::visit_regions`].
///
/// Common uses include:
/// - Collecting regions of one content for export
/// - Measuring areas or volumes per content
///
/// [`BspTree::visit_regions`]: super::BspTree::visit_regions
pub trait BspVisitor<H, C> {
    /// Called once for each leaf whose region inside the tree's hull is non-empty.
    fn visit(&mut self, region: &H, content: &C);
}

/// A simple visitor that collects all visited regions.
#[derive(Debug)]
pub struct CollectingVisitor<H, C> {
    collected: Vec<(H, C)>,
}

impl<H, C> Default for CollectingVisitor<H, C> {
    fn default() -> Self {
        Self {
            collected: Vec::new(),
        }
    }
}

impl<H, C> CollectingVisitor<H, C> {
    /// Creates a new empty collecting visitor.
    pub fn new() -> Self {
        Self::default()
    }

    /// Returns the collected regions.
    pub fn into_regions(self) -> Vec<(H, C)> {
        self.collected
    }

    /// Returns a reference to the collected regions.
    pub fn regions(&self) -> &[(H, C)] {
        &self.collected
    }
}

impl<H: Clone, C: Clone> BspVisitor<H, C> for CollectingVisitor<H, C> {
    fn visit(&mut self, region: &H, content: &C) {
        self.collected.push((region.clone(), content.clone()));
    }
}

/// A visitor that calls a closure for each leaf region.
pub struct FnVisitor<F> {
    func: F,
}

impl<F> FnVisitor<F> {
    /// Creates a new visitor from a closure.
    pub fn new(func: F) -> Self {
        Self { func }
    }
}

impl<H, C, F> BspVisitor<H, C> for FnVisitor<F>
where
    F: FnMut(&H, &C),
{
    fn visit(&mut self, region: &H, content: &C) {
        (self.func)(region, content);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::bsp::BspTree2D;
    use crate::content::SolidContent;
    use crate::{Basis3D, Hull, Hull2D, Plane3D};
    use nalgebra::{Point2, Vector3};

    fn triangle_tree() -> BspTree2D<u8> {
        let basis = Basis3D::from_plane(&Plane3D::new(Vector3::z(), 0.0));
        let hull = Hull2D::from_loop(
            basis,
            &[
                Point2::new(0.0, 0.0),
                Point2::new(4.0, 0.0),
                Point2::new(0.0, 4.0),
            ],
        );
        let room = Hull2D::from_loop(
            basis,
            &[
                Point2::new(-10.0, -10.0),
                Point2::new(10.0, -10.0),
                Point2::new(10.0, 10.0),
                Point2::new(-10.0, 10.0),
            ],
        );
        BspTree2D::from_hull(hull, &SolidContent::new(1, 0)).with_hull(room)
    }

    #[test]
    fn collecting_visitor_empty() {
        let visitor: CollectingVisitor<Hull2D, u8> = CollectingVisitor::new();
        assert!(visitor.regions().is_empty());
    }

    #[test]
    fn collecting_visitor_collects() {
        let mut visitor = CollectingVisitor::new();
        triangle_tree().visit_regions(&mut visitor);
        let regions = visitor.into_regions();
        assert_eq!(regions.len(), 4);
        let inside: Vec<_> = regions.iter().filter(|(_, c)| *c == 1).collect();
        assert_eq!(inside.len(), 1);
        assert!((inside[0].0.area() - 8.0).abs() < 1e-3);
        for (region, _) in &regions {
            assert!(!region.is_empty());
        }
    }

    #[test]
    fn fn_visitor_calls_closure() {
        let mut area = 0.0;
        {
            let mut visitor = FnVisitor::new(|region: &Hull2D, _: &u8| {
                area += region.area();
            });
            triangle_tree().visit_regions(&mut visitor);
        }
        assert!((area - 400.0).abs() < 1e-2);
    }
}
