//! Local orthonormal frames built from plane equations, and maps between the
//! frames of two coincident carriers.

use nalgebra::{Matrix2, Point2, Point3, Vector2, Vector3};

use crate::{Classification, Hull0D, Plane2D, Plane3D};

/// Distance of the coincidence probes from the frame origin.
const PROBE: f32 = 100.0;

/// Below this, a direction is treated as parallel to a carrier.
pub(crate) const PARALLEL_SLOPE: f32 = 1e-6;

/// Local frame of a line in 2D space: a tangent, the unit normal and the offset.
///
/// Local coordinates are `(t, distance)` where `t` runs along the tangent.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Basis2D {
    tangent: Vector2<f32>,
    normal: Vector2<f32>,
    offset: f32,
}

impl Basis2D {
    /// Builds the frame of `plane`. The tangent is the normal rotated counter-clockwise.
    pub fn from_plane(plane: &Plane2D) -> Self {
        let n = plane.normal();
        Self {
            tangent: Vector2::new(-n.y, n.x),
            normal: n,
            offset: plane.offset(),
        }
    }

    #[inline]
    pub fn tangent(&self) -> Vector2<f32> {
        self.tangent
    }

    #[inline]
    pub fn normal(&self) -> Vector2<f32> {
        self.normal
    }

    #[inline]
    pub fn offset(&self) -> f32 {
        self.offset
    }

    /// The carrier line of this frame.
    pub fn plane(&self) -> Plane2D {
        Plane2D::new(self.normal, self.offset)
    }

    /// Point to local `(t, distance)`.
    #[inline]
    pub fn transform(&self, point: Point2<f32>) -> Vector2<f32> {
        Vector2::new(
            point.coords.dot(&self.tangent),
            point.coords.dot(&self.normal) - self.offset,
        )
    }

    /// Direction to local `(along, across)`.
    #[inline]
    pub fn transform_normal(&self, direction: Vector2<f32>) -> Vector2<f32> {
        Vector2::new(direction.dot(&self.tangent), direction.dot(&self.normal))
    }

    /// Parameter of the foot of `point` along the carrier.
    #[inline]
    pub fn parameter(&self, point: Point2<f32>) -> f32 {
        point.coords.dot(&self.tangent)
    }

    /// Point of the carrier at parameter `t`.
    #[inline]
    pub fn point(&self, t: f32) -> Point2<f32> {
        Point2::from(self.normal * self.offset + self.tangent * t)
    }

    #[inline]
    pub fn distance(&self, point: Point2<f32>) -> f32 {
        point.coords.dot(&self.normal) - self.offset
    }

    /// Expresses `plane` as a bound on this carrier's parameter.
    ///
    /// The returned bound is in front where `plane` is. Returns `None` when the two
    /// lines are parallel.
    pub fn project(&self, plane: &Plane2D) -> Option<Hull0D> {
        let slope = plane.normal().dot(&self.tangent);
        if slope.abs() <= PARALLEL_SLOPE {
            return None;
        }
        let at_origin = self.offset * plane.normal().dot(&self.normal) - plane.offset();
        let sign = slope.signum();
        Some(Hull0D::new(sign, -at_origin / slope.abs()))
    }

    /// Classifies this carrier relative to `plane` using two probes along the tangent.
    pub fn classify_to(&self, plane: &Plane2D) -> Classification {
        let across = self.offset * plane.normal().dot(&self.normal) - plane.offset();
        let along = PROBE * plane.normal().dot(&self.tangent);
        Classification::from_samples(&[across + along, across - along])
    }

    /// True when the frames face opposite directions.
    #[inline]
    pub fn is_flip(&self, other: &Basis2D) -> bool {
        self.normal.dot(&other.normal) < 0.0
    }

    /// Same carrier facing the other way. Parameters map as `t -> -t`.
    pub fn flipped(&self) -> Self {
        Self {
            tangent: -self.tangent,
            normal: -self.normal,
            offset: -self.offset,
        }
    }

    /// Map from this frame's parameters to `target`'s, for a coincident carrier.
    pub fn map_to(&self, target: &Basis2D) -> LineMap {
        let scale = if target.tangent.dot(&self.tangent) < 0.0 { -1.0 } else { 1.0 };
        LineMap::new(scale, target.parameter(self.point(0.0)))
    }
}

/// Local frame of a plane in 3D space.
///
/// Local coordinates are `(u, v, distance)` along tangent, binormal and normal.
/// The frame is right-handed: `tangent × binormal = normal`.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Basis3D {
    tangent: Vector3<f32>,
    binormal: Vector3<f32>,
    normal: Vector3<f32>,
    offset: f32,
}

impl Basis3D {
    /// Builds the frame of `plane`.
    ///
    /// The tangent is taken from whichever of two axis cross products stays well away
    /// from zero for this normal.
    pub fn from_plane(plane: &Plane3D) -> Self {
        let n = plane.normal();
        let tangent = if n.x * n.x < 0.5 {
            Vector3::new(0.0, n.z, -n.y)
        } else {
            Vector3::new(n.z, 0.0, -n.x)
        }
        .normalize();
        Self {
            tangent,
            binormal: n.cross(&tangent),
            normal: n,
            offset: plane.offset(),
        }
    }

    #[inline]
    pub fn tangent(&self) -> Vector3<f32> {
        self.tangent
    }

    #[inline]
    pub fn binormal(&self) -> Vector3<f32> {
        self.binormal
    }

    #[inline]
    pub fn normal(&self) -> Vector3<f32> {
        self.normal
    }

    #[inline]
    pub fn offset(&self) -> f32 {
        self.offset
    }

    pub fn plane(&self) -> Plane3D {
        Plane3D::new(self.normal, self.offset)
    }

    /// Point to local `(u, v, distance)`.
    #[inline]
    pub fn transform(&self, point: Point3<f32>) -> Vector3<f32> {
        Vector3::new(
            point.coords.dot(&self.tangent),
            point.coords.dot(&self.binormal),
            point.coords.dot(&self.normal) - self.offset,
        )
    }

    /// Direction to local axes.
    #[inline]
    pub fn transform_normal(&self, direction: Vector3<f32>) -> Vector3<f32> {
        Vector3::new(
            direction.dot(&self.tangent),
            direction.dot(&self.binormal),
            direction.dot(&self.normal),
        )
    }

    /// In-plane coordinates of the foot of `point`.
    #[inline]
    pub fn local(&self, point: Point3<f32>) -> Point2<f32> {
        Point2::new(
            point.coords.dot(&self.tangent),
            point.coords.dot(&self.binormal),
        )
    }

    /// World point of in-plane coordinates `uv`.
    #[inline]
    pub fn point(&self, uv: Point2<f32>) -> Point3<f32> {
        Point3::from(self.tangent * uv.x + self.binormal * uv.y + self.normal * self.offset)
    }

    /// World direction of an in-plane direction.
    #[inline]
    pub fn direction(&self, dir: Vector2<f32>) -> Vector3<f32> {
        self.tangent * dir.x + self.binormal * dir.y
    }

    #[inline]
    pub fn distance(&self, point: Point3<f32>) -> f32 {
        point.coords.dot(&self.normal) - self.offset
    }

    /// Intersection line of `plane` with this carrier, in local coordinates.
    ///
    /// Returns `None` when the planes are parallel.
    pub fn project(&self, plane: &Plane3D) -> Option<Plane2D> {
        let local = self.transform_normal(plane.normal());
        let in_plane = Vector2::new(local.x, local.y);
        if in_plane.norm() <= PARALLEL_SLOPE {
            return None;
        }
        Some(Plane2D::new(
            in_plane,
            plane.offset() - self.offset * local.z,
        ))
    }

    /// Classifies this carrier relative to `plane` with four probes around the origin.
    pub fn classify_to(&self, plane: &Plane3D) -> Classification {
        let pn = plane.normal();
        let across = self.offset * pn.dot(&self.normal) - plane.offset();
        let along_t = PROBE * pn.dot(&self.tangent);
        let along_b = PROBE * pn.dot(&self.binormal);
        Classification::from_samples(&[
            across + along_t,
            across + along_b,
            across - along_t,
            across - along_b,
        ])
    }

    #[inline]
    pub fn is_flip(&self, other: &Basis3D) -> bool {
        self.normal.dot(&other.normal) < 0.0
    }

    /// Same carrier facing the other way, still right-handed.
    /// In-plane coordinates map as `(u, v) -> (u, -v)`.
    pub fn flipped(&self) -> Self {
        Self {
            tangent: self.tangent,
            binormal: -self.binormal,
            normal: -self.normal,
            offset: -self.offset,
        }
    }

    /// Map from this frame's in-plane coordinates to `target`'s, for a coincident carrier.
    pub fn map_to(&self, target: &Basis3D) -> PlaneMap {
        let linear = Matrix2::new(
            target.tangent.dot(&self.tangent),
            target.tangent.dot(&self.binormal),
            target.binormal.dot(&self.tangent),
            target.binormal.dot(&self.binormal),
        );
        let shift = Vector2::new(
            target.tangent.dot(&self.normal),
            target.binormal.dot(&self.normal),
        ) * self.offset;
        PlaneMap::new(linear, shift)
    }
}

/// Parameter change `t' = scale * t + shift` between two frames of one line.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct LineMap {
    scale: f32,
    shift: f32,
}

impl LineMap {
    pub fn new(scale: f32, shift: f32) -> Self {
        Self { scale, shift }
    }

    pub fn identity() -> Self {
        Self::new(1.0, 0.0)
    }

    #[inline]
    pub fn scale(&self) -> f32 {
        self.scale
    }

    #[inline]
    pub fn shift(&self) -> f32 {
        self.shift
    }

    /// Maps a parameter. Infinite parameters keep their magnitude.
    #[inline]
    pub fn apply(&self, t: f32) -> f32 {
        if t.is_infinite() {
            t * self.scale.signum()
        } else {
            self.scale * t + self.shift
        }
    }
}

/// Coordinate change `uv' = linear * uv + shift` between two frames of one plane.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct PlaneMap {
    linear: Matrix2<f32>,
    shift: Vector2<f32>,
}

impl PlaneMap {
    pub fn new(linear: Matrix2<f32>, shift: Vector2<f32>) -> Self {
        Self { linear, shift }
    }

    pub fn identity() -> Self {
        Self::new(Matrix2::identity(), Vector2::zeros())
    }

    /// The reflection `(u, v) -> (u, -v)` that [`Basis3D::flipped`] induces.
    pub fn mirror() -> Self {
        Self::new(Matrix2::new(1.0, 0.0, 0.0, -1.0), Vector2::zeros())
    }

    #[inline]
    pub fn apply_point(&self, point: Point2<f32>) -> Point2<f32> {
        Point2::from(self.linear * point.coords + self.shift)
    }

    #[inline]
    pub fn apply_vector(&self, vector: Vector2<f32>) -> Vector2<f32> {
        self.linear * vector
    }

    /// Maps a line. The linear part is a rotation or reflection, so normals map directly.
    pub fn apply_line(&self, line: &Plane2D) -> Plane2D {
        let normal = self.linear * line.normal();
        Plane2D::new(normal, line.offset() * normal.norm() + normal.dot(&self.shift))
    }
}

/// Identity map between volume frames; every volume shares world coordinates.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct SpaceMap;

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;

    fn plane(x: f32, y: f32, z: f32, d: f32) -> Plane3D {
        Plane3D::new(Vector3::new(x, y, z), d)
    }

    #[test]
    fn frame_is_orthonormal_and_right_handed() {
        for p in [
            plane(0.0, 0.0, 1.0, 1.0),
            plane(1.0, 0.0, 0.0, -2.0),
            plane(0.3, -0.7, 0.2, 5.0),
            plane(-0.9, 0.1, 0.4, 0.0),
        ] {
            let basis = Basis3D::from_plane(&p);
            assert_relative_eq!(basis.tangent().norm(), 1.0, epsilon = 1e-6);
            assert_relative_eq!(basis.binormal().norm(), 1.0, epsilon = 1e-6);
            assert_relative_eq!(basis.tangent().dot(&basis.normal()), 0.0, epsilon = 1e-6);
            assert_relative_eq!(
                basis.tangent().cross(&basis.binormal()),
                basis.normal(),
                epsilon = 1e-6
            );
        }
    }

    #[test]
    fn transform_and_point_round_trip() {
        let basis = Basis3D::from_plane(&plane(1.0, 2.0, 2.0, 9.0));
        let world = Point3::new(3.0, 1.0, 2.0);
        let local = basis.transform(world);
        assert_relative_eq!(local.z, 0.0, epsilon = 1e-5);
        let back = basis.point(Point2::new(local.x, local.y));
        assert_relative_eq!(back, world, epsilon = 1e-5);
    }

    #[test]
    fn coincidence_classification() {
        let n = Vector3::new(0.2, 0.5, 0.2);
        let basis = Basis3D::from_plane(&Plane3D::new(n, 123.0));

        assert_eq!(basis.classify_to(&Plane3D::new(n, 125.0)), Classification::Back);
        assert_eq!(basis.classify_to(&Plane3D::new(n, 122.0)), Classification::Front);
        assert_eq!(
            basis.classify_to(&plane(0.2, 0.5, 0.3, 122.0)),
            Classification::NotParallel
        );
        assert_eq!(
            basis.classify_to(&Plane3D::new(n, 123.001)),
            Classification::Coincident
        );
        assert_eq!(
            basis.classify_to(&Plane3D::new(n, 123.001).flipped()),
            Classification::Coincident
        );
        assert_eq!(
            basis.classify_to(&plane(0.2, 0.50001, 0.20001, 123.0001).flipped()),
            Classification::Coincident
        );
        assert_eq!(
            basis.classify_to(&Plane3D::new(n, 124.0).flipped()),
            Classification::Front
        );
    }

    #[test]
    fn project_gives_intersection_line() {
        let basis = Basis3D::from_plane(&plane(0.0, 0.0, 1.0, 1.0));
        let other = plane(1.0, 1.0, 1.0, 3.0);
        let line = basis.project(&other).unwrap();

        // (1, 1, 1) and (2, 0, 1) lie on both planes.
        for p in [Point3::new(1.0, 1.0, 1.0), Point3::new(2.0, 0.0, 1.0)] {
            assert_relative_eq!(line.signed_distance(basis.local(p)), 0.0, epsilon = 1e-5);
        }
        // Front of the projected line is front of the plane.
        let ahead = Point3::new(3.0, 3.0, 1.0);
        assert!(line.signed_distance(basis.local(ahead)) > 0.0);
        assert!(basis.project(&plane(0.0, 0.0, -1.0, 4.0)).is_none());
    }

    #[test]
    fn line_projection_finds_crossing() {
        let basis = Basis2D::from_plane(&Plane2D::new(Vector2::new(0.0, 1.0), 2.0));
        // The line x = 3, front towards +x.
        let bound = basis.project(&Plane2D::new(Vector2::new(1.0, 0.0), 3.0)).unwrap();
        let crossing = basis.parameter(Point2::new(3.0, 2.0));
        assert_relative_eq!(bound.signed_distance(crossing), 0.0, epsilon = 1e-6);
        let ahead = basis.parameter(Point2::new(4.0, 2.0));
        assert!(bound.signed_distance(ahead) > 0.0);
    }

    #[test]
    fn line_classification() {
        let basis = Basis2D::from_plane(&Plane2D::new(Vector2::new(0.0, 1.0), 2.0));
        let same = Plane2D::new(Vector2::new(0.0, -1.0), -2.005);
        assert_eq!(basis.classify_to(&same), Classification::Coincident);
        let above = Plane2D::new(Vector2::new(0.0, 1.0), 3.0);
        assert_eq!(basis.classify_to(&above), Classification::Back);
        let tilted = Plane2D::new(Vector2::new(0.01, 1.0), 2.0);
        assert_eq!(basis.classify_to(&tilted), Classification::NotParallel);
    }

    #[test]
    fn flipped_line_negates_parameters() {
        let basis = Basis2D::from_plane(&Plane2D::new(Vector2::new(0.6, 0.8), 1.5));
        let flipped = basis.flipped();
        assert!(basis.is_flip(&flipped));
        assert_relative_eq!(flipped.point(-2.0), basis.point(2.0), epsilon = 1e-6);
        let map = basis.map_to(&flipped);
        assert_relative_eq!(map.apply(2.0), -2.0, epsilon = 1e-6);
        assert_eq!(map.apply(f32::INFINITY), f32::NEG_INFINITY);
    }

    #[test]
    fn plane_map_between_coincident_frames() {
        let a = Basis3D::from_plane(&plane(1.0, 2.0, 2.0, 9.0));
        let b = Basis3D::from_plane(&plane(1.0, 2.0, 2.0, 9.0).flipped());
        let map = a.map_to(&b);
        let world = Point3::new(3.0, 1.0, 2.0);
        assert_relative_eq!(map.apply_point(a.local(world)), b.local(world), epsilon = 1e-5);

        // A line through two points maps onto the line through their images.
        let p = Point3::new(1.0, 2.0, 2.0) + Vector3::new(2.0, -1.0, 0.0);
        let q = Point3::new(1.0, 2.0, 2.0) + Vector3::new(0.0, 1.0, -1.0);
        let line = Plane2D::through(a.local(p), a.local(q)).unwrap();
        let mapped = map.apply_line(&line);
        assert_relative_eq!(mapped.signed_distance(b.local(p)), 0.0, epsilon = 1e-4);
        assert_relative_eq!(mapped.signed_distance(b.local(q)), 0.0, epsilon = 1e-4);
    }

    #[test]
    fn flipped_plane_frame_mirrors_v() {
        let basis = Basis3D::from_plane(&plane(0.3, -0.7, 0.2, 5.0));
        let flipped = basis.flipped();
        let uv = Point2::new(1.5, -2.0);
        assert_relative_eq!(
            flipped.point(Point2::new(uv.x, -uv.y)),
            basis.point(uv),
            epsilon = 1e-5
        );
        assert_relative_eq!(
            basis.map_to(&flipped).apply_point(uv),
            PlaneMap::mirror().apply_point(uv),
            epsilon = 1e-5
        );
    }
}
