//! Error types for the core circuit model.

use thiserror::Error;

pub type Result<T> = std::result::Result<T, Error>;

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum Error {
    /// A node label was empty or otherwise unusable.
    #[error("invalid node label")]
    InvalidLabel,

    /// An element with this name is already in the circuit.
    #[error("element {0} already exists in the circuit")]
    DuplicateName(String),

    /// No element with this name exists.
    #[error("element {0} not found")]
    UnknownElement(String),

    /// A numeric token could not be parsed, or a passive value was not
    /// strictly positive.
    #[error("invalid value: {0}")]
    InvalidValue(String),

    /// A diode model identifier outside the supported set.
    #[error("model {0} not found in library")]
    UnknownModel(String),
}
