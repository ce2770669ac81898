//! Error types for the solvers and engines.

use thiserror::Error;

pub type Result<T> = std::result::Result<T, Error>;

#[derive(Debug, Clone, PartialEq, Error)]
pub enum Error {
    /// LU pivoting found no usable pivot.
    #[error("matrix is singular")]
    SingularMatrix,

    /// Matrix/vector shapes do not agree.
    #[error("dimension mismatch: expected {expected}, actual {actual}")]
    DimensionMismatch { expected: usize, actual: usize },

    /// Layout failed (unresolved controlled-source reference).
    #[error(transparent)]
    Layout(#[from] nodal_devices::Error),

    /// A probe names a node the circuit does not know.
    #[error("node {0} not found")]
    UnknownNode(String),

    /// A probe or sweep names an element the circuit does not know.
    #[error("element {0} not found")]
    UnknownElement(String),

    /// A sweep specification that cannot produce points.
    #[error("invalid sweep: {0}")]
    InvalidSweep(String),
}
