use std::fmt;

use crate::basis::LineMap;
use crate::{Classification, EPS, Side, Surface};

/// A signed bound on a line parameter: the terminal surface of the hierarchy.
///
/// The signed distance of parameter `t` is `normal * t - offset`, where `normal` is
/// `+1` or `-1`. It cuts a line into two rays and carries no content of its own.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Hull0D {
    normal: f32,
    offset: f32,
}

impl Hull0D {
    /// Creates a bound; only the sign of `normal` is kept.
    pub fn new(normal: f32, offset: f32) -> Self {
        assert!(normal != 0.0 && !normal.is_nan(), "Bound direction cannot be zero");
        Self {
            normal: normal.signum(),
            offset,
        }
    }

    /// Bound whose back side is `t > min`.
    pub fn lower(min: f32) -> Self {
        Self::new(-1.0, -min)
    }

    /// Bound whose back side is `t < max`.
    pub fn upper(max: f32) -> Self {
        Self::new(1.0, max)
    }

    #[inline]
    pub fn normal(&self) -> f32 {
        self.normal
    }

    #[inline]
    pub fn offset(&self) -> f32 {
        self.offset
    }

    /// The parameter where the bound sits.
    #[inline]
    pub fn position(&self) -> f32 {
        self.offset * self.normal
    }

    #[inline]
    pub fn signed_distance(&self, t: f32) -> f32 {
        self.normal * t - self.offset
    }
}

impl Surface for Hull0D {
    type SpacePoint = f32;
    type SpaceMap = LineMap;

    fn distance(&self, point: f32) -> f32 {
        self.signed_distance(point)
    }

    fn classify_to(&self, splitter: &Self) -> Classification {
        match Side::of_distance(splitter.signed_distance(self.position())) {
            Side::Back => Classification::Back,
            Side::Incident => Classification::Coincident,
            Side::Front => Classification::Front,
        }
    }

    fn split(&self, splitter: &Self) -> (Option<Self>, Option<Self>) {
        match self.classify_to(splitter) {
            Classification::Back => (Some(*self), None),
            Classification::Front => (None, Some(*self)),
            _ => (Some(*self), Some(*self)),
        }
    }

    fn intersect(&self, other: &Self) -> Option<Self> {
        ((self.position() - other.position()).abs() <= EPS).then_some(*self)
    }

    fn flipped(&self) -> Self {
        Self {
            normal: -self.normal,
            offset: -self.offset,
        }
    }

    fn reframe(&self, map: &LineMap) -> Self {
        let normal = self.normal * map.scale().signum();
        Self {
            normal,
            offset: self.offset + normal * map.shift(),
        }
    }
}

impl fmt::Display for Hull0D {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let op = if self.normal > 0.0 { "<" } else { ">" };
        write!(f, "t {} {}", op, self.position())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;

    #[test]
    fn lower_and_upper_bounds() {
        let lower = Hull0D::lower(-1.0);
        let upper = Hull0D::upper(2.0);
        assert_eq!(lower.side(0.0), Side::Back);
        assert_eq!(lower.side(-3.0), Side::Front);
        assert_eq!(upper.side(0.0), Side::Back);
        assert_eq!(upper.side(3.0), Side::Front);
        assert_relative_eq!(lower.position(), -1.0);
        assert_relative_eq!(upper.position(), 2.0);
    }

    #[test]
    fn split_by_other_bound() {
        let bound = Hull0D::upper(1.0);
        let (back, front) = bound.split(&Hull0D::upper(3.0));
        assert!(back.is_some() && front.is_none());
        let (back, front) = bound.split(&Hull0D::lower(3.0));
        assert!(back.is_none() && front.is_some());
        // Opposite orientation on the same spot still coincides.
        let (back, front) = bound.split(&Hull0D::lower(1.005));
        assert!(back.is_some() && front.is_some());
    }

    #[test]
    fn reframe_keeps_position_in_new_parameters() {
        let bound = Hull0D::upper(2.0);
        // t' = -t + 5
        let map = LineMap::new(-1.0, 5.0);
        let moved = bound.reframe(&map);
        assert_relative_eq!(moved.position(), 3.0);
        // The back side t < 2 becomes t' > 3.
        assert_eq!(moved.side(4.0), Side::Back);
        assert_eq!(moved.side(2.0), Side::Front);
    }

    #[test]
    fn flipped_swaps_sides() {
        let bound = Hull0D::lower(0.5);
        let flipped = bound.flipped();
        assert_eq!(bound.side(1.0), Side::Back);
        assert_eq!(flipped.side(1.0), Side::Front);
        assert_relative_eq!(flipped.position(), 0.5);
    }
}
