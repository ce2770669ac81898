//! Error types for layout and assembly.

use thiserror::Error;

pub type Result<T> = std::result::Result<T, Error>;

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum Error {
    /// A CCCS/CCVS names a controller that does not exist or does not carry
    /// a branch-current unknown.
    #[error("element {element}: controlling element {controller} not found or has no branch current")]
    UnresolvedController { element: String, controller: String },
}
