use thiserror::Error;

/// Errors reported for caller input that cannot describe geometry.
///
/// Degenerate but well-formed geometry is never an error: it yields empty hulls.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum GeometryError {
    #[error("plane normal has zero length")]
    ZeroNormal,

    #[error("points are collinear and do not span a plane")]
    CollinearPoints,

    #[error("a point loop needs at least 3 points, got {found}")]
    TooFewPoints { found: usize },

    #[error("point does not lie in any leaf of the portal graph")]
    OutsideGraph,
}
