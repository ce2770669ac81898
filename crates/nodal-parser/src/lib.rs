//! Netlist command parser for Nodal.
//!
//! Input is line-oriented: one command per line, `*` and `#` comments,
//! blank lines skipped. [`parse::parse_line`] turns a line into a typed
//! [`command::Command`]; [`apply::apply`] runs a structural command against
//! a circuit and surfaces analysis requests for the caller to execute.

pub mod apply;
pub mod command;
pub mod error;
pub mod parse;

pub use apply::{Outcome, apply, execute};
pub use command::{AcSweepKind, AddPayload, AddSpec, AnalysisRequest, Command};
pub use error::{Error, Result};
pub use parse::parse_line;
