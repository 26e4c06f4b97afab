//! Leaf content algebra.
//!
//! A [`SpaceOperation`] decides how the leaf contents of two trees combine during a
//! CSG merge. It carries a straight operation, an inverse operation used when the two
//! trees' splitting surfaces face opposite ways, and optionally a separate operation for
//! the lower-dimensional trees hanging off coincident splitting surfaces.

use std::fmt;
use std::ops::{Add, BitAnd, BitOr, BitXor, Not, Sub};
use std::sync::Arc;

use bitflags::bitflags;

/// Anything that can sit in a tree leaf.
pub trait Content: Clone + PartialEq + fmt::Debug + 'static {}

impl<T: Clone + PartialEq + fmt::Debug + 'static> Content for T {}

/// A binary rule for combining two leaf contents.
pub trait ContentOperation<C>: Send + Sync {
    fn apply(&self, lhs: &C, rhs: &C) -> C;

    /// Content as seen from the opposite orientation.
    fn invert(&self, content: &C) -> C
    where
        C: Clone,
    {
        content.clone()
    }
}

/// Bitwise operations on flag-like content.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Binary {
    And,
    Or,
    Xor,
    /// `lhs & !rhs`
    Difference,
}

impl<C> ContentOperation<C> for Binary
where
    C: Copy + BitAnd<Output = C> + BitOr<Output = C> + BitXor<Output = C> + Not<Output = C>,
{
    fn apply(&self, lhs: &C, rhs: &C) -> C {
        match self {
            Binary::And => *lhs & *rhs,
            Binary::Or => *lhs | *rhs,
            Binary::Xor => *lhs ^ *rhs,
            Binary::Difference => *lhs & !*rhs,
        }
    }
}

/// Arithmetic operations, used for boundary multiplicities.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Arithmetic {
    Sum,
    Dif,
}

impl<C> ContentOperation<C> for Arithmetic
where
    C: Copy + Add<Output = C> + Sub<Output = C>,
{
    fn apply(&self, lhs: &C, rhs: &C) -> C {
        match self {
            Arithmetic::Sum => *lhs + *rhs,
            Arithmetic::Dif => *lhs - *rhs,
        }
    }
}

/// Keeps the receiver's content.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct KeepFirst;

impl<C: Clone> ContentOperation<C> for KeepFirst {
    fn apply(&self, lhs: &C, _rhs: &C) -> C {
        lhs.clone()
    }
}

/// Full description of how two trees combine.
pub struct SpaceOperation<C> {
    straight: Arc<dyn ContentOperation<C>>,
    inverse: Arc<dyn ContentOperation<C>>,
    edge: Option<Arc<SpaceOperation<C>>>,
    reversed: bool,
}

impl<C> Clone for SpaceOperation<C> {
    fn clone(&self) -> Self {
        Self {
            straight: Arc::clone(&self.straight),
            inverse: Arc::clone(&self.inverse),
            edge: self.edge.clone(),
            reversed: self.reversed,
        }
    }
}

impl<C> fmt::Debug for SpaceOperation<C> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("SpaceOperation")
            .field("has_edge", &self.edge.is_some())
            .field("reversed", &self.reversed)
            .finish()
    }
}

impl<C: Content> SpaceOperation<C> {
    pub fn new(
        straight: impl ContentOperation<C> + 'static,
        inverse: impl ContentOperation<C> + 'static,
    ) -> Self {
        Self {
            straight: Arc::new(straight),
            inverse: Arc::new(inverse),
            edge: None,
            reversed: false,
        }
    }

    /// Sets the operation used on the trees of coincident splitting surfaces.
    pub fn with_edge(mut self, edge: SpaceOperation<C>) -> Self {
        self.edge = Some(Arc::new(edge));
        self
    }

    pub fn apply(&self, lhs: &C, rhs: &C) -> C {
        if self.reversed {
            self.straight.apply(rhs, lhs)
        } else {
            self.straight.apply(lhs, rhs)
        }
    }

    pub fn invert(&self, content: &C) -> C {
        self.straight.invert(content)
    }

    /// The same operation with its operands swapped.
    pub fn reverse(&self) -> Self {
        Self {
            reversed: !self.reversed,
            ..self.clone()
        }
    }

    /// The operation with straight and inverse parts exchanged.
    pub fn inverse(&self) -> Self {
        Self {
            straight: Arc::clone(&self.inverse),
            inverse: Arc::clone(&self.straight),
            ..self.clone()
        }
    }

    /// Operation for edge trees. Falls back to keeping the receiver's content.
    pub fn edge_operation(&self) -> SpaceOperation<C> {
        match &self.edge {
            Some(edge) => edge.as_ref().clone(),
            None => SpaceOperation::new(KeepFirst, KeepFirst),
        }
    }

    /// The inverse operation when `flip` is set, this one otherwise.
    ///
    /// Coincident splitting surfaces facing opposite ways merge their trees with the
    /// inverse operation.
    pub fn oriented(&self, flip: bool) -> Self {
        if flip { self.inverse() } else { self.clone() }
    }

    /// Combines two leaf contents. `flip` is set when the operands' frames face
    /// opposite ways, in which case `rhs` is inverted first.
    pub fn combine(&self, lhs: &C, rhs: &C, flip: bool) -> C {
        if flip {
            self.apply(lhs, &self.invert(rhs))
        } else {
            self.apply(lhs, rhs)
        }
    }
}

/// Integer content usable with every preset.
pub trait CountContent:
    Content
    + Copy
    + Send
    + Sync
    + BitAnd<Output = Self>
    + BitOr<Output = Self>
    + BitXor<Output = Self>
    + Not<Output = Self>
    + Add<Output = Self>
    + Sub<Output = Self>
{
}

impl<T> CountContent for T where
    T: Content
        + Copy
        + Send
        + Sync
        + BitAnd<Output = T>
        + BitOr<Output = T>
        + BitXor<Output = T>
        + Not<Output = T>
        + Add<Output = T>
        + Sub<Output = T>
{
}

fn multiplicity<C: CountContent>() -> SpaceOperation<C> {
    SpaceOperation::new(Arithmetic::Sum, Arithmetic::Dif)
}

/// Intersection of planar regions. Boundaries add up their multiplicities.
pub fn space2d_intersect<C: CountContent>() -> SpaceOperation<C> {
    SpaceOperation::new(Binary::And, Binary::Xor).with_edge(multiplicity())
}

/// Union of planar regions.
pub fn space2d_union<C: CountContent>() -> SpaceOperation<C> {
    SpaceOperation::new(Binary::Or, Binary::Difference).with_edge(multiplicity())
}

/// Difference of planar regions; the subtracted boundaries count negatively.
pub fn space2d_difference<C: CountContent>() -> SpaceOperation<C> {
    SpaceOperation::new(Binary::Difference, Binary::And)
        .with_edge(SpaceOperation::new(Arithmetic::Dif, Arithmetic::Sum))
}

/// Boolean set operations on flag content, with complement as inversion.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CsgOperation {
    Union,
    Intersect,
    SymmetricDifference,
}

impl<C> ContentOperation<C> for CsgOperation
where
    C: Copy + BitAnd<Output = C> + BitOr<Output = C> + BitXor<Output = C> + Not<Output = C>,
{
    fn apply(&self, lhs: &C, rhs: &C) -> C {
        match self {
            CsgOperation::Union => *lhs | *rhs,
            CsgOperation::Intersect => *lhs & *rhs,
            CsgOperation::SymmetricDifference => *lhs ^ *rhs,
        }
    }

    fn invert(&self, content: &C) -> C {
        !*content
    }
}

impl CsgOperation {
    pub fn operation<C: CountContent>(self) -> SpaceOperation<C> {
        SpaceOperation::new(self, self)
    }
}

bitflags! {
    /// Directions in which a surface blocks traversal.
    #[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
    pub struct Visibility: u8 {
        /// Blocks traversal from the back side to the front side.
        const BACK_TO_FRONT = 0b01;
        /// Blocks traversal from the front side to the back side.
        const FRONT_TO_BACK = 0b10;
        const BLOCKED = Self::BACK_TO_FRONT.bits() | Self::FRONT_TO_BACK.bits();
    }
}

impl Default for Visibility {
    fn default() -> Self {
        Self::OPEN
    }
}

impl Visibility {
    pub const OPEN: Visibility = Visibility::empty();

    /// The same blocking seen from a surface facing the other way.
    pub fn flipped(self) -> Self {
        let mut flipped = Visibility::empty();
        flipped.set(Visibility::FRONT_TO_BACK, self.contains(Visibility::BACK_TO_FRONT));
        flipped.set(Visibility::BACK_TO_FRONT, self.contains(Visibility::FRONT_TO_BACK));
        flipped
    }
}

/// Leaf content for visibility and solidity analysis.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct VisibilityContent {
    pub flags: i64,
    pub visibility: Visibility,
}

impl VisibilityContent {
    pub fn new(flags: i64, visibility: Visibility) -> Self {
        Self { flags, visibility }
    }
}

/// Merges visibility content by or-ing everything together.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct VisibilityMerge;

impl ContentOperation<VisibilityContent> for VisibilityMerge {
    fn apply(&self, lhs: &VisibilityContent, rhs: &VisibilityContent) -> VisibilityContent {
        VisibilityContent {
            flags: lhs.flags | rhs.flags,
            visibility: lhs.visibility | rhs.visibility,
        }
    }

    fn invert(&self, content: &VisibilityContent) -> VisibilityContent {
        VisibilityContent {
            visibility: content.visibility.flipped(),
            ..*content
        }
    }
}

/// Union of visibility content, on regions and on their boundaries alike.
pub fn visibility_union() -> SpaceOperation<VisibilityContent> {
    SpaceOperation::new(VisibilityMerge, VisibilityMerge)
        .with_edge(SpaceOperation::new(VisibilityMerge, VisibilityMerge))
}

/// Supplies the contents of a tree built from a single hull.
pub trait ContentProvider<C> {
    /// Content inside the hull.
    fn content(&self) -> C;

    /// Content everywhere else.
    fn default_content(&self) -> C;

    /// Provider for the trees of the hull's boundaries, if they carry content.
    fn boundary(&self) -> Option<&dyn ContentProvider<C>>;
}

/// A constant provider, optionally with a nested provider for boundaries.
#[derive(Debug, Clone, PartialEq)]
pub struct SolidContent<C> {
    content: C,
    default: C,
    boundary: Option<Box<SolidContent<C>>>,
}

impl<C> SolidContent<C> {
    pub fn new(content: C, default: C) -> Self {
        Self {
            content,
            default,
            boundary: None,
        }
    }

    pub fn with_boundary(mut self, boundary: SolidContent<C>) -> Self {
        self.boundary = Some(Box::new(boundary));
        self
    }
}

impl<C: Clone> ContentProvider<C> for SolidContent<C> {
    fn content(&self) -> C {
        self.content.clone()
    }

    fn default_content(&self) -> C {
        self.default.clone()
    }

    fn boundary(&self) -> Option<&dyn ContentProvider<C>> {
        self.boundary
            .as_deref()
            .map(|b| b as &dyn ContentProvider<C>)
    }
}
