//! Plane representation and classification vocabularies.

use std::ops::Neg;

use nalgebra::{Point2, Point3, Vector2, Vector3};

use crate::GeometryError;

/// Geometric tolerance shared by every classification in the crate.
/// Distances within this band of a plane count as "on" the plane.
pub const EPS: f32 = 1e-2;

/// Squared tolerance, for distance-squared comparisons.
pub const EPS_SQUARED: f32 = EPS * EPS;

/// Which side of a plane a point lies on.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
#[repr(i8)]
pub enum Side {
    /// Behind the plane (negative side of the normal).
    Back = -1,
    /// Within `EPS` of the plane.
    Incident = 0,
    /// In front of the plane (positive side of the normal).
    Front = 1,
}

impl Side {
    /// Classifies a signed distance using the `EPS` band.
    #[inline]
    pub fn of_distance(distance: f32) -> Self {
        if distance > EPS {
            Side::Front
        } else if distance < -EPS {
            Side::Back
        } else {
            Side::Incident
        }
    }

    /// Classifies a signed distance with no tolerance band: zero counts as `Front`.
    ///
    /// This is the rule tree descent uses, so every point lands in exactly one child.
    #[inline]
    pub fn strict(distance: f32) -> Self {
        if distance < 0.0 { Side::Back } else { Side::Front }
    }

    /// Returns the opposite side. `Incident` stays `Incident`.
    #[inline]
    pub fn flipped(self) -> Self {
        match self {
            Side::Back => Side::Front,
            Side::Incident => Side::Incident,
            Side::Front => Side::Back,
        }
    }
}

impl Neg for Side {
    type Output = Side;

    fn neg(self) -> Side {
        self.flipped()
    }
}

/// Classification of one plane (or frame) relative to another.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Classification {
    /// Same carrier, within `EPS`, in either orientation.
    Coincident = 0,
    /// Parallel and entirely behind the other plane.
    Back = 1,
    /// Parallel and entirely in front of the other plane.
    Front = 2,
    /// The planes cross.
    NotParallel = 3,
}

impl Classification {
    /// Builds a classification from signed distances of probe points.
    ///
    /// The samples are taken at fixed offsets along the frame axes; if they disagree
    /// by more than `EPS` the planes are not parallel.
    pub fn from_samples(samples: &[f32]) -> Self {
        let Some(&first) = samples.first() else {
            return Classification::Coincident;
        };
        if samples.iter().any(|s| (s - first).abs() > EPS) {
            return Classification::NotParallel;
        }

        let back = samples.iter().any(|&s| s < -EPS);
        let front = samples.iter().any(|&s| s > EPS);
        match (back, front) {
            (false, false) => Classification::Coincident,
            (true, false) => Classification::Back,
            (false, true) => Classification::Front,
            (true, true) => Classification::NotParallel,
        }
    }

    /// Returns true when the two planes share a carrier.
    #[inline]
    pub fn is_coincident(self) -> bool {
        self == Classification::Coincident
    }
}

/// A line in 2D space, represented as `normal · point = offset`.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Plane2D {
    normal: Vector2<f32>,
    offset: f32,
}

impl Plane2D {
    /// Creates a line from a normal and offset; both are scaled so the normal is unit length.
    ///
    /// # Panics
    /// Panics if the normal vector has zero length.
    pub fn new(normal: Vector2<f32>, offset: f32) -> Self {
        let norm = normal.norm();
        assert!(norm > f32::EPSILON, "Plane normal cannot be zero");
        Self {
            normal: normal / norm,
            offset: offset / norm,
        }
    }

    /// Fallible variant of [`Plane2D::new`].
    pub fn try_new(normal: Vector2<f32>, offset: f32) -> Result<Self, GeometryError> {
        if normal.norm() <= f32::EPSILON {
            return Err(GeometryError::ZeroNormal);
        }
        Ok(Self::new(normal, offset))
    }

    /// Creates the line through `a` and `b`.
    ///
    /// With direction `t = b - a`, the normal is `(t.y, -t.x)`: the right-hand side of
    /// the direction is the front, so a counter-clockwise loop has its interior behind
    /// every edge.
    pub fn through(a: Point2<f32>, b: Point2<f32>) -> Result<Self, GeometryError> {
        let t = b - a;
        let len = t.norm();
        if len <= f32::EPSILON {
            return Err(GeometryError::CollinearPoints);
        }
        let t = t / len;
        let normal = Vector2::new(t.y, -t.x);
        Ok(Self {
            normal,
            offset: normal.dot(&a.coords),
        })
    }

    #[inline]
    pub fn normal(&self) -> Vector2<f32> {
        self.normal
    }

    #[inline]
    pub fn offset(&self) -> f32 {
        self.offset
    }

    /// Signed distance from `point` to the line, positive in front.
    #[inline]
    pub fn signed_distance(&self, point: Point2<f32>) -> f32 {
        self.normal.dot(&point.coords) - self.offset
    }

    #[inline]
    pub fn classify_point(&self, point: Point2<f32>) -> Side {
        Side::of_distance(self.signed_distance(point))
    }

    #[inline]
    pub fn flipped(&self) -> Self {
        Self {
            normal: -self.normal,
            offset: -self.offset,
        }
    }
}

/// A plane in 3D space, represented as `normal · point = offset`.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Plane3D {
    normal: Vector3<f32>,
    offset: f32,
}

impl Plane3D {
    /// Creates a new plane from a normal vector and offset.
    /// Normal and offset are divided by the normal's length.
    ///
    /// # Panics
    /// Panics if the normal vector has zero length.
    pub fn new(normal: Vector3<f32>, offset: f32) -> Self {
        let norm = normal.norm();
        assert!(norm > f32::EPSILON, "Plane normal cannot be zero");
        Self {
            normal: normal / norm,
            offset: offset / norm,
        }
    }

    /// Fallible variant of [`Plane3D::new`].
    pub fn try_new(normal: Vector3<f32>, offset: f32) -> Result<Self, GeometryError> {
        if normal.norm() <= f32::EPSILON {
            return Err(GeometryError::ZeroNormal);
        }
        Ok(Self::new(normal, offset))
    }

    /// Creates a plane from a point on the plane and a normal vector.
    ///
    /// # Panics
    /// Panics if the normal vector has zero length.
    pub fn from_point_and_normal(point: Point3<f32>, normal: Vector3<f32>) -> Self {
        let norm = normal.norm();
        assert!(norm > f32::EPSILON, "Plane normal cannot be zero");
        let unit_normal = normal / norm;
        Self {
            normal: unit_normal,
            offset: unit_normal.dot(&point.coords),
        }
    }

    /// Creates a plane from three points, normal `(b - a) × (c - a)`.
    ///
    /// # Panics
    /// Panics if the points are collinear.
    pub fn from_three_points(a: Point3<f32>, b: Point3<f32>, c: Point3<f32>) -> Self {
        Self::from_point_and_normal(a, (b - a).cross(&(c - a)))
    }

    /// Fallible variant of [`Plane3D::from_three_points`].
    pub fn try_from_points(
        a: Point3<f32>,
        b: Point3<f32>,
        c: Point3<f32>,
    ) -> Result<Self, GeometryError> {
        let normal = (b - a).cross(&(c - a));
        if normal.norm() <= f32::EPSILON {
            return Err(GeometryError::CollinearPoints);
        }
        Ok(Self::from_point_and_normal(a, normal))
    }

    /// Returns the unit normal vector of the plane.
    #[inline]
    pub fn normal(&self) -> Vector3<f32> {
        self.normal
    }

    /// Returns the signed distance from the origin to the plane along the normal.
    #[inline]
    pub fn offset(&self) -> f32 {
        self.offset
    }

    /// Computes the signed distance from a point to the plane.
    /// Positive in front (the side the normal points to), negative behind.
    #[inline]
    pub fn signed_distance(&self, point: Point3<f32>) -> f32 {
        self.normal.dot(&point.coords) - self.offset
    }

    /// Classifies which side of the plane a point lies on, using `EPS`.
    #[inline]
    pub fn classify_point(&self, point: Point3<f32>) -> Side {
        Side::of_distance(self.signed_distance(point))
    }

    /// Returns the same plane facing the opposite direction.
    #[inline]
    pub fn flipped(&self) -> Self {
        Self {
            normal: -self.normal,
            offset: -self.offset,
        }
    }
}
