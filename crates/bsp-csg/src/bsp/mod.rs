//! Binary Space Partitioning trees over lines, planes and space.
//!
//! A tree partitions a convex region ([`Hull`](crate::Hull)) into leaves holding
//! content. Its splitting surfaces are themselves trees one dimension lower, so a face
//! of a 3D tree knows which parts of it are walls and which are openings, and the edges
//! of that face know the same about their own pieces.
//!
//! The central operation is the CSG merge, which overlays one tree on another and
//! combines co-located leaf contents:
//!
//! ```ignore
//! use bsp_csg::{BspTree2D, CsgOperation, SolidContent};
//!
//! let a = BspTree2D::from_hull(square_a, &SolidContent::new(1u32, 0));
//! let b = BspTree2D::from_hull(square_b, &SolidContent::new(2u32, 0));
//! let union = a.csg_copy(&b, &CsgOperation::Union.operation());
//! assert_eq!(*union.search(point_in_both), 3);
//! ```
//!
//! # Architecture
//!
//! - [`BspTree`]: the region and the root node, with aliases per dimension
//! - [`BspNode`]: a leaf or a splitting edge with two children
//! - [`EdgeTree`]: what an internal node splits by
//! - [`BspVisitor`]: visitor trait for walking leaf regions

mod build;
mod csg;
mod edge;
mod node;
mod tree;
mod visitor;

pub use edge::EdgeTree;
pub use node::{BspNode, NodeBody};
pub use tree::{BspTree, BspTree1D, BspTree2D, BspTree3D, Placement};
pub use visitor::{BspVisitor, CollectingVisitor, FnVisitor};
