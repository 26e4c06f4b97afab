use std::fmt;

use nalgebra::{Point3, Vector3};

use super::{Cut, box_half_size, widen_by_direction};
use crate::basis::SpaceMap;
use crate::{Basis3D, EPS, EPS_SQUARED, Hull, Hull2D, Plane3D, Side, Surface};

/// A convex polyhedron (possibly unbounded), the intersection of the back sides of its
/// faces.
///
/// A polyhedron with no faces is the whole space.
#[derive(Debug, Clone, PartialEq)]
pub struct Hull3D {
    faces: Vec<Hull2D>,
    empty: bool,
}

impl Default for Hull3D {
    fn default() -> Self {
        Self::space()
    }
}

impl Hull3D {
    /// The whole space.
    pub fn space() -> Self {
        Self {
            faces: Vec::new(),
            empty: false,
        }
    }

    /// Intersection of the back sides of `planes`.
    pub fn from_planes(planes: &[Plane3D]) -> Self {
        let mut hull = Self::space();
        for plane in planes {
            hull.add_bound(plane);
        }
        hull
    }

    /// The axis aligned box between two corners.
    pub fn cuboid(min: Point3<f32>, max: Point3<f32>) -> Self {
        let (lo, hi) = (min.inf(&max), min.sup(&max));
        Self::from_planes(&[
            Plane3D::new(Vector3::x(), hi.x),
            Plane3D::new(-Vector3::x(), -lo.x),
            Plane3D::new(Vector3::y(), hi.y),
            Plane3D::new(-Vector3::y(), -lo.y),
            Plane3D::new(Vector3::z(), hi.z),
            Plane3D::new(-Vector3::z(), -lo.z),
        ])
    }

    /// Restricts the polyhedron to the back side of `plane`.
    pub fn add_bound(&mut self, plane: &Plane3D) {
        let splitter = Hull2D::from_plane(plane);
        *self = match self.cut_plane(&splitter).back {
            Some(hull) => hull,
            None => Self {
                faces: Vec::new(),
                empty: true,
            },
        };
    }

    #[inline]
    pub fn faces(&self) -> &[Hull2D] {
        &self.faces
    }

    #[inline]
    pub fn is_bounded(&self) -> bool {
        !self.faces.is_empty() && self.faces.iter().all(Hull2D::is_bounded)
    }

    fn extent(&self, plane: &Basis3D) -> (f32, f32) {
        match self.faces.as_slice() {
            [] => (f32::NEG_INFINITY, f32::INFINITY),
            [single] if single.bounds().is_empty() => widen_by_direction(
                single.world_extent(plane),
                -plane.normal().dot(&single.basis().normal()),
            ),
            faces => faces
                .iter()
                .fold((f32::INFINITY, f32::NEG_INFINITY), |(lo, hi), face| {
                    let (a, b) = face.world_extent(plane);
                    (lo.min(a), hi.max(b))
                }),
        }
    }

    fn cut_plane(&self, splitter: &Hull2D) -> Cut<Self> {
        if self.empty {
            return Cut::back(self.clone());
        }
        let plane = splitter.basis();
        let (lo, hi) = self.extent(plane);
        if hi <= EPS {
            return Cut::back(self.clone());
        }
        if lo >= -EPS {
            return Cut::front(self.clone());
        }

        let section = self
            .faces
            .iter()
            .try_fold(splitter.unbounded(), |section, face| {
                section.clip_back_by(face.basis())
            })
            .filter(|section| !section.is_empty());
        let Some(section) = section else {
            return Cut::dominant(self.clone(), lo, hi);
        };

        let mut back = vec![section.clone()];
        let mut front = vec![section.flipped()];
        for face in &self.faces {
            if face.classify_to(splitter).is_coincident() {
                if face.basis().normal().dot(&plane.normal()) > 0.0 {
                    back.push(face.clone());
                } else {
                    front.push(face.clone());
                }
                continue;
            }
            let (b, f) = face.split_by_plane(plane);
            back.extend(b.filter(|piece| !piece.is_empty()));
            front.extend(f.filter(|piece| !piece.is_empty()));
        }
        Cut {
            back: Some(Self {
                faces: back,
                empty: false,
            }),
            front: Some(Self {
                faces: front,
                empty: false,
            }),
            section: Some(section),
        }
    }

    fn reach(&self) -> f32 {
        self.faces
            .iter()
            .flat_map(|face| {
                let foot = face.basis().normal() * face.basis().offset();
                face.world_vertices()
                    .into_iter()
                    .map(|p| p.coords)
                    .chain(std::iter::once(foot))
            })
            .map(|v| v.amax())
            .fold(0.0, f32::max)
    }

    fn centroid(&self) -> Option<Point3<f32>> {
        let vertices = self.vertices();
        if vertices.is_empty() {
            return None;
        }
        let sum = vertices
            .iter()
            .fold(Vector3::zeros(), |acc, p| acc + p.coords);
        Some(Point3::from(sum / vertices.len() as f32))
    }
}

impl Hull for Hull3D {
    type Point = Point3<f32>;
    type Map = SpaceMap;
    type Boundary = Hull2D;

    fn is_empty(&self) -> bool {
        self.empty
    }

    fn unbounded(&self) -> Self {
        Self::space()
    }

    fn cut(&self, splitter: &Hull2D) -> Cut<Self> {
        self.cut_plane(splitter)
    }

    fn union(&self, other: &Self) -> Self {
        if self.empty {
            return other.clone();
        }
        if other.empty {
            return self.clone();
        }
        if !self.is_bounded() || !other.is_bounded() {
            return Self::space();
        }
        let mut vertices = self.vertices();
        vertices.extend(other.vertices());
        let first = vertices[0];
        let (lo, hi) = vertices
            .iter()
            .fold((first, first), |(lo, hi), p| (lo.inf(p), hi.sup(p)));
        Self::cuboid(lo, hi)
    }

    fn classify(&self, point: Point3<f32>) -> Side {
        if self.empty {
            return Side::Front;
        }
        let distance = self
            .faces
            .iter()
            .map(|face| face.distance(point))
            .fold(f32::NEG_INFINITY, f32::max);
        if distance == f32::NEG_INFINITY {
            Side::Back
        } else {
            Side::of_distance(distance)
        }
    }

    fn interior_point(&self) -> Option<Point3<f32>> {
        if self.empty {
            return None;
        }
        if self.is_bounded() {
            return self.centroid();
        }
        let half = box_half_size(self.reach());
        let mut boxed = self.clone();
        for axis in [Vector3::x(), Vector3::y(), Vector3::z()] {
            for normal in [axis, -axis] {
                boxed = boxed
                    .cut_plane(&Hull2D::from_plane(&Plane3D::new(normal, half)))
                    .back?;
            }
        }
        boxed.centroid()
    }

    fn vertices(&self) -> Vec<Point3<f32>> {
        let mut points: Vec<Point3<f32>> = Vec::new();
        for p in self.faces.iter().flat_map(Hull2D::world_vertices) {
            if !points.iter().any(|q| (q - p).norm_squared() <= EPS_SQUARED) {
                points.push(p);
            }
        }
        points
    }

    fn boundaries(&self) -> Vec<Hull2D> {
        self.faces.clone()
    }

    fn is_flip(&self, _other: &Self) -> bool {
        false
    }

    fn project_onto(&self, _target: &Self) -> (Self, SpaceMap) {
        (self.clone(), SpaceMap)
    }
}

impl fmt::Display for Hull3D {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.faces.is_empty() {
            write!(f, "space")
        } else {
            write!(f, "volume with {} faces", self.faces.len())
        }
    }
}
