/// 2D point type (used for surface parameter space).
pub type Point2 = nalgebra::Point2<f64>;

/// 3D point type.
pub type Point3 = nalgebra::Point3<f64>;

/// 2D vector type.
pub type Vector2 = nalgebra::Vector2<f64>;

/// 3D vector type.
pub type Vector3 = nalgebra::Vector3<f64>;

/// Numerical tolerance for "coincident in xyz" tests.
///
/// Parameter-space distances are always scaled by the surface tangent
/// magnitudes before comparison against this, so it has a consistent
/// meaning in model units everywhere.
pub const LENGTH_EPS: f64 = 1e-6;

/// A distance larger than any that occurs in a model.
pub const VERY_POSITIVE: f64 = 1e10;

/// Tunable tolerances for a Boolean invocation.
#[derive(Debug, Clone, Copy)]
pub struct Tolerances {
    /// Maximum allowed xyz distance between a piecewise-linear
    /// approximation and the true curve it approximates.
    pub chord: f64,
}

impl Default for Tolerances {
    fn default() -> Self {
        Self { chord: 0.1 }
    }
}
