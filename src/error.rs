use thiserror::Error;

/// Top-level error type for the shellops kernel.
#[derive(Debug, Error)]
pub enum ShellOpsError {
    #[error(transparent)]
    Geometry(#[from] GeometryError),

    #[error(transparent)]
    Topology(#[from] TopologyError),

    #[error(transparent)]
    Operation(#[from] OperationError),
}

/// Errors related to geometric construction and evaluation.
#[derive(Debug, Error)]
pub enum GeometryError {
    #[error("degree {degree} is out of range [1, {max}]")]
    DegreeOutOfRange { degree: usize, max: usize },

    #[error("control net is {rows}x{cols}, expected {expected_rows}x{expected_cols}")]
    ControlNetShape {
        rows: usize,
        cols: usize,
        expected_rows: usize,
        expected_cols: usize,
    },

    #[error("weights must be finite and positive")]
    InvalidWeight,

    #[error("degenerate geometry: {0}")]
    Degenerate(String),

    #[error("zero-length vector")]
    ZeroVector,
}

/// Errors related to topological structure.
#[derive(Debug, Error)]
pub enum TopologyError {
    #[error("entity not found: {0}")]
    EntityNotFound(&'static str),

    #[error("trim loop is not closed")]
    TrimLoopNotClosed,

    #[error("invalid topology: {0}")]
    InvalidTopology(String),
}

/// Errors related to kernel operations.
#[derive(Debug, Error)]
pub enum OperationError {
    #[error("invalid input: {0}")]
    InvalidInput(String),

    #[error("operation failed: {0}")]
    Failed(String),
}

/// Convenience type alias for results using [`ShellOpsError`].
pub type Result<T> = std::result::Result<T, ShellOpsError>;
