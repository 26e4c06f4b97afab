//! Constructive solid geometry on hierarchical BSP trees.
//!
//! Regions of a line, a plane or space are partitioned by trees whose splitting
//! surfaces carry trees of their own, one dimension lower. Trees over the same space
//! merge with a [`SpaceOperation`] deciding how co-located contents combine, and a
//! finished tree can be turned into a [`PortalGraph`] to find connected areas and tell
//! inside from outside.

mod basis;
pub mod bsp;
pub mod content;
mod error;
mod hull;
mod plane;
pub mod portal;

pub use basis::{Basis2D, Basis3D, LineMap, PlaneMap, SpaceMap};
pub use bsp::{BspNode, BspTree, BspTree1D, BspTree2D, BspTree3D, EdgeTree};
pub use content::{
    ContentOperation, ContentProvider, CsgOperation, SolidContent, SpaceOperation, Visibility,
    VisibilityContent,
};
pub use error::GeometryError;
pub use hull::{Cut, EdgeHull, Hull, Hull0D, Hull1D, Hull2D, Hull3D, Surface};
pub use plane::{Classification, EPS, EPS_SQUARED, Plane2D, Plane3D, Side};
pub use portal::{AreaBuilder, AreaClass, PortalGraph, VisibilityBuilder};
