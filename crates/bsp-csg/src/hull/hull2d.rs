use std::fmt;

use nalgebra::{Point2, Point3, Vector2};

use super::quickhull::convex_loop;
use super::{Cut, box_half_size, widen_by_direction};
use crate::basis::{PARALLEL_SLOPE, PlaneMap, SpaceMap};
use crate::{
    Basis2D, Basis3D, Classification, EPS_SQUARED, EdgeHull, GeometryError, Hull, Hull1D,
    Plane2D, Plane3D, Side, Surface,
};

/// A convex polygon (possibly unbounded) on a plane of 3D space.
///
/// The polygon lives in the in-plane coordinates of its [`Basis3D`] and is the
/// intersection of the back sides of its bounds. A face with no bounds is the whole
/// plane.
#[derive(Debug, Clone, PartialEq)]
pub struct Hull2D {
    basis: Basis3D,
    bounds: Vec<Hull1D>,
    empty: bool,
}

impl Hull2D {
    /// The whole plane of `basis`.
    pub fn from_basis(basis: Basis3D) -> Self {
        Self {
            basis,
            bounds: Vec::new(),
            empty: false,
        }
    }

    /// The whole plane `plane`.
    pub fn from_plane(plane: &Plane3D) -> Self {
        Self::from_basis(Basis3D::from_plane(plane))
    }

    fn empty_on(basis: Basis3D) -> Self {
        Self {
            basis,
            bounds: Vec::new(),
            empty: true,
        }
    }

    /// Builds the polygon of a convex loop of in-plane points.
    ///
    /// Either winding is accepted. Edges shorter than `EPS` are skipped, and a loop
    /// without area gives an empty hull.
    pub fn try_from_loop(basis: Basis3D, points: &[Point2<f32>]) -> Result<Self, GeometryError> {
        if points.len() < 3 {
            return Err(GeometryError::TooFewPoints {
                found: points.len(),
            });
        }
        let area = signed_area(points);
        let ordered: Vec<Point2<f32>> = if area < 0.0 {
            points.iter().rev().copied().collect()
        } else {
            points.to_vec()
        };

        let bounds: Vec<Hull1D> = (0..ordered.len())
            .filter_map(|i| {
                let (a, b) = (ordered[i], ordered[(i + 1) % ordered.len()]);
                Hull1D::segment(a, b).ok().filter(|s| !s.is_empty())
            })
            .collect();
        let empty = area.abs() <= EPS_SQUARED || bounds.len() < 3;
        Ok(Self {
            basis,
            bounds,
            empty,
        })
    }

    /// Like [`Hull2D::try_from_loop`].
    ///
    /// # Panics
    /// Panics if the loop has fewer than 3 points.
    pub fn from_loop(basis: Basis3D, points: &[Point2<f32>]) -> Self {
        match Self::try_from_loop(basis, points) {
            Ok(hull) => hull,
            Err(err) => panic!("Unclosed polygon: {err}"),
        }
    }

    /// Convex hull of arbitrary in-plane points.
    pub fn convex_hull(basis: Basis3D, points: &[Point2<f32>]) -> Self {
        let hull = convex_loop(points);
        if hull.is_empty() {
            return Self::empty_on(basis);
        }
        match Self::try_from_loop(basis, &hull) {
            Ok(polygon) => polygon,
            Err(_) => Self::empty_on(basis),
        }
    }

    /// Convex hull of world points projected onto `plane`.
    pub fn from_world_points(plane: &Plane3D, points: &[Point3<f32>]) -> Self {
        let basis = Basis3D::from_plane(plane);
        let local: Vec<Point2<f32>> = points.iter().map(|&p| basis.local(p)).collect();
        Self::convex_hull(basis, &local)
    }

    /// Restricts the polygon to the back side of the in-plane line `line`.
    pub fn add_bound(&mut self, line: &Plane2D) {
        match self.clip_by_line(&Basis2D::from_plane(line)) {
            Some(clipped) => *self = clipped,
            None => *self = Self::empty_on(self.basis),
        }
    }

    #[inline]
    pub fn basis(&self) -> &Basis3D {
        &self.basis
    }

    #[inline]
    pub fn bounds(&self) -> &[Hull1D] {
        &self.bounds
    }

    #[inline]
    pub fn is_bounded(&self) -> bool {
        !self.bounds.is_empty() && self.bounds.iter().all(Hull1D::is_bounded)
    }

    /// Corner points in world space.
    pub fn world_vertices(&self) -> Vec<Point3<f32>> {
        self.vertices()
            .into_iter()
            .map(|p| self.basis.point(p))
            .collect()
    }

    /// Area of a bounded polygon. Unbounded polygons report infinity.
    pub fn area(&self) -> f32 {
        if self.empty {
            0.0
        } else if !self.is_bounded() {
            f32::INFINITY
        } else {
            signed_area(&self.vertices()).abs()
        }
    }

    /// Extent of the signed distance from `line` over the polygon.
    pub(crate) fn extent(&self, line: &Basis2D) -> (f32, f32) {
        match self.bounds.as_slice() {
            [] => (f32::NEG_INFINITY, f32::INFINITY),
            [single] if single.is_full_line() => single.half_plane_extent(line),
            bounds => bounds.iter().fold(
                (f32::INFINITY, f32::NEG_INFINITY),
                |(lo, hi), bound| {
                    let (a, b) = bound.extent(line);
                    (lo.min(a), hi.max(b))
                },
            ),
        }
    }

    /// Extent of the signed distance from a world plane over the polygon.
    pub(crate) fn world_extent(&self, plane: &Basis3D) -> (f32, f32) {
        let n = plane.normal();
        let bound_extent = |bound: &Hull1D| {
            let origin = self.basis.point(bound.basis().point(0.0));
            let along = self.basis.direction(bound.basis().tangent());
            bound.extent_by(plane.distance(origin), n.dot(&along))
        };
        match self.bounds.as_slice() {
            [] => {
                let at = plane.distance(self.basis.point(Point2::origin()));
                let in_plane =
                    Vector2::new(n.dot(&self.basis.tangent()), n.dot(&self.basis.binormal()));
                if in_plane.norm() <= PARALLEL_SLOPE {
                    (at, at)
                } else {
                    (f32::NEG_INFINITY, f32::INFINITY)
                }
            }
            [single] if single.is_full_line() => {
                let inward = -self.basis.direction(single.basis().normal());
                widen_by_direction(bound_extent(single), n.dot(&inward))
            }
            bounds => bounds.iter().fold(
                (f32::INFINITY, f32::NEG_INFINITY),
                |(lo, hi), bound| {
                    let (a, b) = bound_extent(bound);
                    (lo.min(a), hi.max(b))
                },
            ),
        }
    }

    /// Cuts the polygon by an in-plane line, with the `EPS` band.
    pub(crate) fn cut_line(&self, line: &Basis2D) -> Cut<Self> {
        if self.empty {
            return Cut::back(self.clone());
        }
        let (lo, hi) = self.extent(line);
        if hi <= crate::EPS {
            return Cut::back(self.clone());
        }
        if lo >= -crate::EPS {
            return Cut::front(self.clone());
        }

        let section = self
            .bounds
            .iter()
            .try_fold(Hull1D::line(*line), |section, bound| {
                section.clip_back(bound.basis())
            })
            .filter(|section| !section.is_empty());
        let Some(section) = section else {
            return Cut::dominant(self.clone(), lo, hi);
        };

        let mut back = vec![section.clone()];
        let mut front = vec![section.flipped()];
        for bound in &self.bounds {
            let (b, f) = bound.split_by_line(line);
            back.extend(b.filter(|piece| !piece.is_empty()));
            front.extend(f.filter(|piece| !piece.is_empty()));
        }
        Cut {
            back: Some(self.with_bounds(back)),
            front: Some(self.with_bounds(front)),
            section: Some(section),
        }
    }

    fn with_bounds(&self, bounds: Vec<Hull1D>) -> Self {
        Self {
            basis: self.basis,
            bounds,
            empty: false,
        }
    }

    /// The part of the polygon behind an in-plane line.
    pub(crate) fn clip_by_line(&self, line: &Basis2D) -> Option<Self> {
        self.cut_line(line).back
    }

    /// Splits the polygon by a world plane into `(back, front)`.
    pub(crate) fn split_by_plane(&self, plane: &Basis3D) -> (Option<Self>, Option<Self>) {
        match self.basis.project(&plane.plane()) {
            Some(line) => self.cut_line(&Basis2D::from_plane(&line)).into_pair(),
            None => match self.basis.classify_to(&plane.plane()) {
                Classification::Back => (Some(self.clone()), None),
                Classification::Front => (None, Some(self.clone())),
                _ => (Some(self.clone()), Some(self.clone())),
            },
        }
    }

    /// The part of the polygon behind a world plane.
    pub(crate) fn clip_back_by(&self, plane: &Basis3D) -> Option<Self> {
        match self.basis.project(&plane.plane()) {
            Some(line) => self.clip_by_line(&Basis2D::from_plane(&line)),
            None => match self.basis.classify_to(&plane.plane()) {
                Classification::Front => None,
                _ => Some(self.clone()),
            },
        }
    }

    /// Largest coordinate any feature of the polygon reaches.
    fn reach(&self) -> f32 {
        self.bounds.iter().map(Hull1D::reach).fold(0.0, f32::max)
    }

    fn centroid(&self) -> Option<Point2<f32>> {
        let vertices = self.vertices();
        if vertices.is_empty() {
            return None;
        }
        let sum = vertices
            .iter()
            .fold(Vector2::zeros(), |acc, p| acc + p.coords);
        Some(Point2::from(sum / vertices.len() as f32))
    }
}

fn signed_area(points: &[Point2<f32>]) -> f32 {
    let n = points.len();
    (0..n)
        .map(|i| {
            let (a, b) = (points[i], points[(i + 1) % n]);
            a.x * b.y - b.x * a.y
        })
        .sum::<f32>()
        * 0.5
}

impl Hull for Hull2D {
    type Point = Point2<f32>;
    type Map = PlaneMap;
    type Boundary = Hull1D;

    fn is_empty(&self) -> bool {
        self.empty
    }

    fn unbounded(&self) -> Self {
        Self::from_basis(self.basis)
    }

    fn cut(&self, splitter: &Hull1D) -> Cut<Self> {
        self.cut_line(splitter.basis())
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
        if !self.is_bounded() || !other.is_bounded() {
            return self.unbounded();
        }
        let mut points = self.vertices();
        points.extend(other.vertices());
        Self::convex_hull(self.basis, &points)
    }

    fn classify(&self, point: Point2<f32>) -> Side {
        if self.empty {
            return Side::Front;
        }
        let distance = self
            .bounds
            .iter()
            .map(|bound| bound.distance(point))
            .fold(f32::NEG_INFINITY, f32::max);
        if distance == f32::NEG_INFINITY {
            Side::Back
        } else {
            Side::of_distance(distance)
        }
    }

    fn interior_point(&self) -> Option<Point2<f32>> {
        if self.empty {
            return None;
        }
        if self.is_bounded() {
            return self.centroid();
        }
        let half = box_half_size(self.reach());
        let mut boxed = self.clone();
        for normal in [
            Vector2::new(1.0, 0.0),
            Vector2::new(-1.0, 0.0),
            Vector2::new(0.0, 1.0),
            Vector2::new(0.0, -1.0),
        ] {
            boxed = boxed.clip_by_line(&Basis2D::from_plane(&Plane2D::new(normal, half)))?;
        }
        boxed.centroid()
    }

    fn vertices(&self) -> Vec<Point2<f32>> {
        let mut points: Vec<Point2<f32>> = Vec::new();
        for p in self.bounds.iter().flat_map(Hull1D::end_points) {
            if !points.iter().any(|q| (q - p).norm_squared() <= EPS_SQUARED) {
                points.push(p);
            }
        }
        if points.is_empty() {
            return points;
        }
        let center = points.iter().fold(Vector2::zeros(), |acc, p| acc + p.coords)
            / points.len() as f32;
        points.sort_by(|p, q| {
            let a = (p.y - center.y).atan2(p.x - center.x);
            let b = (q.y - center.y).atan2(q.x - center.x);
            a.total_cmp(&b)
        });
        points
    }

    fn boundaries(&self) -> Vec<Hull1D> {
        self.bounds.clone()
    }

    fn is_flip(&self, other: &Self) -> bool {
        self.basis.is_flip(&other.basis)
    }

    fn project_onto(&self, target: &Self) -> (Self, PlaneMap) {
        let map = self.basis.map_to(&target.basis);
        let hull = Self {
            basis: target.basis,
            bounds: self.bounds.iter().map(|b| b.reframe(&map)).collect(),
            empty: self.empty,
        };
        (hull, map)
    }
}

impl Surface for Hull2D {
    type SpacePoint = Point3<f32>;
    type SpaceMap = SpaceMap;

    fn distance(&self, point: Point3<f32>) -> f32 {
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
            Classification::NotParallel => self.split_by_plane(&splitter.basis),
        }
    }

    fn intersect(&self, other: &Self) -> Option<Self> {
        if self.empty || other.empty {
            return None;
        }
        let (other, _) = other.project_onto(self);
        other
            .bounds
            .iter()
            .try_fold(self.clone(), |acc, bound| acc.clip_by_line(bound.basis()))
            .filter(|overlap| !overlap.empty)
    }

    fn flipped(&self) -> Self {
        let mirror = PlaneMap::mirror();
        Self {
            basis: self.basis.flipped(),
            bounds: self.bounds.iter().map(|b| b.reframe(&mirror)).collect(),
            empty: self.empty,
        }
    }

    fn reframe(&self, _map: &SpaceMap) -> Self {
        self.clone()
    }
}

impl EdgeHull for Hull2D {
    fn reframe_local(&self, _map: &SpaceMap) -> (Self, PlaneMap) {
        (self.clone(), PlaneMap::identity())
    }
}

impl fmt::Display for Hull2D {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let n = self.basis.normal();
        write!(
            f,
            "face ({}, {}, {})·p = {} with {} bounds",
            n.x,
            n.y,
            n.z,
            self.basis.offset(),
            self.bounds.len()
        )
    }
}
