use std::fmt;

use nalgebra::Point2;

use super::{Cut, ray_extent, widen_by_direction};
use crate::basis::{LineMap, PlaneMap};
use crate::{
    Basis2D, Classification, EPS, EdgeHull, GeometryError, Hull, Hull0D, Plane2D, Side, Surface,
};

/// A convex part of a line: an interval of the parameter along a [`Basis2D`].
///
/// Unbounded ends are stored as infinities. As a surface it is a segment (or ray, or
/// line) of the plane; as a region its boundaries are the two end bounds.
#[derive(Debug, Clone, PartialEq)]
pub struct Hull1D {
    basis: Basis2D,
    min: f32,
    max: f32,
    empty: bool,
}

impl Hull1D {
    /// Creates the interval `[min, max]` on `basis`.
    ///
    /// The hull is flagged empty when it is shorter than `EPS`.
    pub fn new(basis: Basis2D, min: f32, max: f32) -> Self {
        let (min, max) = if min <= max { (min, max) } else { (max, min) };
        Self {
            basis,
            min,
            max,
            empty: max - min <= EPS,
        }
    }

    /// The whole carrier line.
    pub fn line(basis: Basis2D) -> Self {
        Self {
            basis,
            min: f32::NEG_INFINITY,
            max: f32::INFINITY,
            empty: false,
        }
    }

    /// The whole line `plane`.
    pub fn from_plane(plane: &Plane2D) -> Self {
        Self::line(Basis2D::from_plane(plane))
    }

    /// The segment from `a` to `b`, in front on the right-hand side of `a -> b`.
    pub fn segment(a: Point2<f32>, b: Point2<f32>) -> Result<Self, GeometryError> {
        let basis = Basis2D::from_plane(&Plane2D::through(a, b)?);
        Ok(Self::new(basis, basis.parameter(a), basis.parameter(b)))
    }

    #[inline]
    pub fn basis(&self) -> &Basis2D {
        &self.basis
    }

    #[inline]
    pub fn min(&self) -> f32 {
        self.min
    }

    #[inline]
    pub fn max(&self) -> f32 {
        self.max
    }

    #[inline]
    pub fn length(&self) -> f32 {
        self.max - self.min
    }

    /// True when both ends are finite.
    #[inline]
    pub fn is_bounded(&self) -> bool {
        self.min.is_finite() && self.max.is_finite()
    }

    /// True when neither end is finite.
    #[inline]
    pub fn is_full_line(&self) -> bool {
        self.min.is_infinite() && self.max.is_infinite()
    }

    /// Finite end points in the plane.
    pub fn end_points(&self) -> Vec<Point2<f32>> {
        [self.min, self.max]
            .into_iter()
            .filter(|t| t.is_finite())
            .map(|t| self.basis.point(t))
            .collect()
    }

    /// Largest absolute coordinate among the finite ends and the carrier's foot point.
    pub(crate) fn reach(&self) -> f32 {
        self.end_points()
            .into_iter()
            .chain(std::iter::once(self.basis.point(0.0)))
            .map(|p| p.x.abs().max(p.y.abs()))
            .fold(0.0, f32::max)
    }

    /// Extent of an affine function over the piece, given its value at parameter zero
    /// and its rate along the tangent.
    pub(crate) fn extent_by(&self, at_zero: f32, slope: f32) -> (f32, f32) {
        ray_extent(at_zero, slope, self.min, self.max)
    }

    /// Extent of the signed distance from `line` over this piece.
    pub(crate) fn extent(&self, line: &Basis2D) -> (f32, f32) {
        self.extent_by(
            line.distance(self.basis.point(0.0)),
            line.normal().dot(&self.basis.tangent()),
        )
    }

    /// Extent of the distance from `line` over the half-plane behind this full line.
    pub(crate) fn half_plane_extent(&self, line: &Basis2D) -> (f32, f32) {
        widen_by_direction(self.extent(line), -line.normal().dot(&self.basis.normal()))
    }

    /// Splits this piece by the carrier `line` into `(back, front)` with the `EPS` band.
    pub(crate) fn split_by_line(&self, line: &Basis2D) -> (Option<Self>, Option<Self>) {
        let (lo, hi) = self.extent(line);
        if hi <= EPS {
            return (Some(self.clone()), None);
        }
        if lo >= -EPS {
            return (None, Some(self.clone()));
        }
        let Some(bound) = self.basis.project(&line.plane()) else {
            let cut = Cut::<Self>::dominant(self.clone(), lo, hi);
            return (cut.back, cut.front);
        };
        self.split_at(&bound)
    }

    /// Splits the interval at the parameter of `bound`, ordered `(back, front)`.
    fn split_at(&self, bound: &Hull0D) -> (Option<Self>, Option<Self>) {
        let x = bound.position().clamp(self.min, self.max);
        let lower = Self::new(self.basis, self.min, x);
        let upper = Self::new(self.basis, x, self.max);
        if bound.normal() > 0.0 {
            (Some(lower), Some(upper))
        } else {
            (Some(upper), Some(lower))
        }
    }

    /// The part of this piece behind `line`, clipped exactly at the crossing.
    pub(crate) fn clip_back(&self, line: &Basis2D) -> Option<Self> {
        match self.basis.classify_to(&line.plane()) {
            Classification::Coincident | Classification::Back => Some(self.clone()),
            Classification::Front => None,
            Classification::NotParallel => {
                let Some(bound) = self.basis.project(&line.plane()) else {
                    return Some(self.clone());
                };
                let x = bound.position();
                let (min, max) = if bound.normal() > 0.0 {
                    (self.min, self.max.min(x))
                } else {
                    (self.min.max(x), self.max)
                };
                (min < max).then(|| Self::new(self.basis, min, max))
            }
        }
    }
}

impl Hull for Hull1D {
    type Point = f32;
    type Map = LineMap;
    type Boundary = Hull0D;

    fn is_empty(&self) -> bool {
        self.empty
    }

    fn unbounded(&self) -> Self {
        Self::line(self.basis)
    }

    fn cut(&self, splitter: &Hull0D) -> Cut<Self> {
        if self.empty {
            return Cut::back(self.clone());
        }
        let (a, b) = (
            splitter.signed_distance(self.min),
            splitter.signed_distance(self.max),
        );
        let (lo, hi) = (a.min(b), a.max(b));
        if hi <= EPS {
            return Cut::back(self.clone());
        }
        if lo >= -EPS {
            return Cut::front(self.clone());
        }
        let (back, front) = self.split_at(splitter);
        Cut {
            back,
            front,
            section: Some(*splitter),
        }
    }

    fn union(&self, other: &Self) -> Self {
        if self.empty {
            return Self {
                basis: self.basis,
                ..other.clone()
            };
        }
        if other.empty {
            return self.clone();
        }
        Self::new(
            self.basis,
            self.min.min(other.min),
            self.max.max(other.max),
        )
    }

    fn classify(&self, t: f32) -> Side {
        Side::of_distance((self.min - t).max(t - self.max))
    }

    fn interior_point(&self) -> Option<f32> {
        if self.empty {
            return None;
        }
        Some(match (self.min.is_finite(), self.max.is_finite()) {
            (true, true) => 0.5 * (self.min + self.max),
            (true, false) => self.min + 1.0,
            (false, true) => self.max - 1.0,
            (false, false) => 0.0,
        })
    }

    fn vertices(&self) -> Vec<f32> {
        [self.min, self.max]
            .into_iter()
            .filter(|t| t.is_finite())
            .collect()
    }

    fn boundaries(&self) -> Vec<Hull0D> {
        let mut bounds = Vec::with_capacity(2);
        if self.min.is_finite() {
            bounds.push(Hull0D::lower(self.min));
        }
        if self.max.is_finite() {
            bounds.push(Hull0D::upper(self.max));
        }
        bounds
    }

    fn is_flip(&self, other: &Self) -> bool {
        self.basis.is_flip(&other.basis)
    }

    fn project_onto(&self, target: &Self) -> (Self, LineMap) {
        let map = self.basis.map_to(&target.basis);
        let (a, b) = (map.apply(self.min), map.apply(self.max));
        let hull = Self {
            basis: target.basis,
            min: a.min(b),
            max: a.max(b),
            empty: self.empty,
        };
        (hull, map)
    }
}

impl Surface for Hull1D {
    type SpacePoint = Point2<f32>;
    type SpaceMap = PlaneMap;

    fn distance(&self, point: Point2<f32>) -> f32 {
        self.basis.distance(point)
    }

    fn classify_to(&self, splitter: &Self) -> Classification {
        self.basis.classify_to(&splitter.basis.plane())
    }

    fn split(&self, splitter: &Self) -> (Option<Self>, Option<Self>) {
        match self.classify_to(splitter) {
            Classification::Coincident => (Some(self.clone()), Some(self.clone())),
            Classification::Back => (Some(self.clone()), None),
            Classification::Front => (None, Some(self.clone())),
            Classification::NotParallel => self.split_by_line(&splitter.basis),
        }
    }

    fn intersect(&self, other: &Self) -> Option<Self> {
        let (other, _) = other.project_onto(self);
        let min = self.min.max(other.min);
        let max = self.max.min(other.max);
        (max - min > EPS).then(|| Self::new(self.basis, min, max))
    }

    fn flipped(&self) -> Self {
        Self {
            basis: self.basis.flipped(),
            min: -self.max,
            max: -self.min,
            empty: self.empty,
        }
    }

    fn reframe(&self, map: &PlaneMap) -> Self {
        self.reframe_local(map).0
    }
}

impl EdgeHull for Hull1D {
    fn reframe_local(&self, map: &PlaneMap) -> (Self, LineMap) {
        let basis = Basis2D::from_plane(&map.apply_line(&self.basis.plane()));
        let direction = map.apply_vector(self.basis.tangent());
        let scale = if basis.tangent().dot(&direction) < 0.0 { -1.0 } else { 1.0 };
        let shift = basis.parameter(map.apply_point(self.basis.point(0.0)));
        let local = LineMap::new(scale, shift);
        let (a, b) = (local.apply(self.min), local.apply(self.max));
        let hull = Self {
            basis,
            min: a.min(b),
            max: a.max(b),
            empty: self.empty,
        };
        (hull, local)
    }
}

impl fmt::Display for Hull1D {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let n = self.basis.normal();
        write!(
            f,
            "[{}, {}] on ({}, {})·p = {}",
            self.min,
            self.max,
            n.x,
            n.y,
            self.basis.offset()
        )
    }
}
