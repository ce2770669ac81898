//! Parser errors. Every error is local to the command that raised it.

use thiserror::Error;

pub type Result<T> = std::result::Result<T, Error>;

#[derive(Debug, Clone, PartialEq, Error)]
pub enum Error {
    /// Missing or malformed tokens.
    #[error("syntax error: {0}")]
    Syntax(String),

    /// The command word itself is not recognized.
    #[error("unknown command: {0}")]
    UnknownCommand(String),

    /// An `add` name whose leading letter names no element type.
    #[error("element {0} not found in library")]
    UnknownElementType(String),

    /// Value, model, duplicate-name, and label errors from the core model.
    #[error(transparent)]
    Core(#[from] nodal_core::Error),
}
