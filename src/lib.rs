pub mod error;
pub mod geometry;
pub mod math;
pub mod operations;
pub mod topology;

pub use error::{Result, ShellOpsError};
pub use math::Tolerances;
pub use operations::boolean::{
    make_from_assembly_of, make_from_difference_of, make_from_union_of, BooleanKind,
};
pub use operations::creation::make_block;
pub use topology::{Curve, CurveId, CurveSource, Face, FaceId, Shell, TrimBy};
