use crate::geometry::RationalSurface;
use crate::math::Point3;

use super::curve::CurveId;

slotmap::new_key_type! {
    /// Unique identifier for a face within its owning shell.
    pub struct FaceId;
}

/// One directed run of a curve along a face's boundary.
///
/// `start` and `finish` are xyz points on the curve. When `backwards` is
/// true the boundary traverses the referenced curve from its last
/// piecewise-linear point towards its first.
#[derive(Debug, Clone)]
pub struct TrimBy {
    /// The curve this trim follows.
    pub curve: CurveId,
    /// Where the trim begins, in xyz.
    pub start: Point3,
    /// Where the trim ends, in xyz.
    pub finish: Point3,
    /// True if the curve is traversed finish-to-start along the boundary.
    pub backwards: bool,
}

/// A trimmed face: a rational surface plus the boundary records that
/// delimit its valid region.
///
/// Invariant between Booleans: the trim records chain into closed loops
/// in (u, v), counter-clockwise around the valid region.
#[derive(Debug, Clone)]
pub struct Face {
    /// The geometric carrier.
    pub surface: RationalSurface,
    /// Ordered boundary records.
    pub trims: Vec<TrimBy>,
}

impl Face {
    /// Creates an untrimmed face over a surface.
    #[must_use]
    pub fn new(surface: RationalSurface) -> Self {
        Self {
            surface,
            trims: Vec::new(),
        }
    }
}
