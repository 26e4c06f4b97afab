//! Convex regions of every dimension and the surfaces that cut them.
//!
//! A hull plays up to two roles:
//!
//! - as a **region** ([`Hull`]) it is a convex part of its own space, bounded by
//!   hulls of the next lower dimension, and can be cut by one of those;
//! - as a **surface** ([`Surface`]) it is a convex piece of a splitting carrier living
//!   in the space one dimension up, and can be split by another piece.
//!
//! [`Hull1D`] and [`Hull2D`] play both roles ([`EdgeHull`]); [`Hull0D`] is only a
//! surface and [`Hull3D`] only a region. There is no volume surface, so a volume can
//! never be used to split another volume.

mod hull0d;
mod hull1d;
mod hull2d;
mod hull3d;
mod quickhull;

use std::fmt;

pub use hull0d::Hull0D;
pub use hull1d::Hull1D;
pub use hull2d::Hull2D;
pub use hull3d::Hull3D;

use crate::{Classification, Side};

/// Distance from the farthest feature at which unbounded regions are closed off
/// when a finite sample of them is needed.
const BOX_MARGIN: f32 = 16.0;

/// Result of cutting a region by a surface.
#[derive(Debug, Clone)]
pub struct Cut<H: Hull> {
    /// Part of the region behind the splitter, if any.
    pub back: Option<H>,
    /// Part of the region in front of the splitter, if any.
    pub front: Option<H>,
    /// The splitter clipped to the region. Present only when both sides are non-empty.
    pub section: Option<H::Boundary>,
}

impl<H: Hull> Cut<H> {
    pub(crate) fn back(region: H) -> Self {
        Self {
            back: Some(region),
            front: None,
            section: None,
        }
    }

    pub(crate) fn front(region: H) -> Self {
        Self {
            back: None,
            front: Some(region),
            section: None,
        }
    }

    /// Side-by-side pair, in the order the tree stores children.
    pub fn into_pair(self) -> (Option<H>, Option<H>) {
        (self.back, self.front)
    }

    /// Chooses a whole side when the splitter could not be clipped to the region.
    pub(crate) fn dominant(region: H, lo: f32, hi: f32) -> Self {
        if hi > -lo {
            Self::front(region)
        } else {
            Self::back(region)
        }
    }
}

/// A convex piece of a splitting carrier, living in the space one dimension up.
pub trait Surface: Clone + fmt::Debug {
    /// Point type of the enclosing space.
    type SpacePoint: Copy + fmt::Debug;
    /// Coordinate change of the enclosing space.
    type SpaceMap;

    /// Signed distance of a point of the enclosing space from the carrier.
    fn distance(&self, point: Self::SpacePoint) -> f32;

    /// Descent side of `point`: zero counts as front.
    fn side(&self, point: Self::SpacePoint) -> Side {
        Side::strict(self.distance(point))
    }

    /// Side of `point` with the tolerance band.
    fn classify_point(&self, point: Self::SpacePoint) -> Side {
        Side::of_distance(self.distance(point))
    }

    /// Classifies this piece's carrier relative to the splitter's carrier.
    fn classify_to(&self, splitter: &Self) -> Classification;

    /// Splits this piece by the carrier of `splitter` into `(back, front)`.
    ///
    /// Parallel carriers return the whole piece on one side, coincident carriers return
    /// it on both.
    fn split(&self, splitter: &Self) -> (Option<Self>, Option<Self>);

    /// Overlap of two pieces of the same carrier.
    fn intersect(&self, other: &Self) -> Option<Self>;

    /// Same piece with the carrier facing the other way.
    fn flipped(&self) -> Self;

    /// Re-expresses the piece after a coordinate change of the enclosing space.
    fn reframe(&self, map: &Self::SpaceMap) -> Self;
}

/// A convex region of its own space.
pub trait Hull: Clone + fmt::Debug {
    /// Local point type.
    type Point: Copy + fmt::Debug;
    /// Coordinate change between two hulls of the same carrier.
    type Map;
    /// Bounding surfaces, one dimension lower.
    type Boundary: Surface<SpacePoint = Self::Point, SpaceMap = Self::Map>;

    /// True when the region is degenerate (below `EPS` in some direction).
    fn is_empty(&self) -> bool;

    /// The whole space of this hull's carrier, in the same frame.
    fn unbounded(&self) -> Self;

    /// Cuts the region by the carrier of `splitter`.
    fn cut(&self, splitter: &Self::Boundary) -> Cut<Self>;

    /// Smallest convenient convex region containing both. `other` must share this frame.
    fn union(&self, other: &Self) -> Self;

    /// Membership: `Back` inside, `Front` outside, `Incident` on the boundary.
    fn classify(&self, point: Self::Point) -> Side;

    /// A point strictly inside the region, if the region is not empty.
    fn interior_point(&self) -> Option<Self::Point>;

    /// Finite corner points.
    fn vertices(&self) -> Vec<Self::Point>;

    /// The bounding surfaces, outward facing.
    fn boundaries(&self) -> Vec<Self::Boundary>;

    /// True when the two carriers face opposite directions.
    fn is_flip(&self, other: &Self) -> bool;

    /// Re-expresses this hull in the frame of a hull of the same carrier, returning the
    /// map that was used.
    fn project_onto(&self, target: &Self) -> (Self, Self::Map);
}

/// A hull that is both a region and a splitting surface.
pub trait EdgeHull: Hull + Surface {
    /// Like [`Surface::reframe`], also returning how the hull's own local coordinates
    /// changed.
    fn reframe_local(&self, map: &<Self as Surface>::SpaceMap) -> (Self, <Self as Hull>::Map);
}

/// Extent of an affine function along a parameter interval, given its value at zero
/// and its slope. Infinite ends produce infinite values unless the slope vanishes.
pub(crate) fn ray_extent(at_zero: f32, slope: f32, min: f32, max: f32) -> (f32, f32) {
    let value = |t: f32| {
        if t.is_finite() {
            at_zero + slope * t
        } else if slope.abs() <= crate::basis::PARALLEL_SLOPE {
            at_zero
        } else if (slope > 0.0) == (t > 0.0) {
            f32::INFINITY
        } else {
            f32::NEG_INFINITY
        }
    };
    let (a, b) = (value(min), value(max));
    (a.min(b), a.max(b))
}

/// Widens `extent` with an unbounded direction of slope `slope`.
pub(crate) fn widen_by_direction(extent: (f32, f32), slope: f32) -> (f32, f32) {
    let (mut lo, mut hi) = extent;
    if slope > crate::basis::PARALLEL_SLOPE {
        hi = f32::INFINITY;
    } else if slope < -crate::basis::PARALLEL_SLOPE {
        lo = f32::NEG_INFINITY;
    }
    (lo, hi)
}

/// Half-size of the box used to close off an unbounded region whose features lie
/// within `reach` of the origin.
pub(crate) fn box_half_size(reach: f32) -> f32 {
    2.0 * reach + BOX_MARGIN
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn ray_extent_of_finite_interval() {
        assert_eq!(ray_extent(1.0, 2.0, -1.0, 3.0), (-1.0, 7.0));
        assert_eq!(ray_extent(1.0, -2.0, -1.0, 3.0), (-5.0, 3.0));
    }

    #[test]
    fn ray_extent_of_rays() {
        assert_eq!(
            ray_extent(0.0, 0.5, 0.0, f32::INFINITY),
            (0.0, f32::INFINITY)
        );
        assert_eq!(
            ray_extent(0.0, 0.5, f32::NEG_INFINITY, f32::INFINITY),
            (f32::NEG_INFINITY, f32::INFINITY)
        );
        // Parallel lines keep their constant distance.
        assert_eq!(
            ray_extent(2.0, 0.0, f32::NEG_INFINITY, f32::INFINITY),
            (2.0, 2.0)
        );
    }

    #[test]
    fn widen_only_for_real_slopes() {
        assert_eq!(widen_by_direction((1.0, 2.0), 0.0), (1.0, 2.0));
        assert_eq!(widen_by_direction((1.0, 2.0), 0.5), (1.0, f32::INFINITY));
        assert_eq!(
            widen_by_direction((1.0, 2.0), -0.5),
            (f32::NEG_INFINITY, 2.0)
        );
    }
}
