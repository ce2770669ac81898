//! Element models and MNA stamps for Nodal.
//!
//! This crate turns the element set of `nodal-core` into matrix
//! contributions:
//! - [`layout::MnaLayout`] - row assignment for node voltages and branch
//!   currents, including controlled-source controller resolution
//! - [`layout::MnaAssembler`] - full real/complex system assembly
//! - [`stamp`] - the per-kind dispatch
//! - [`passive`], [`sources`], [`controlled`], [`diode`] - the per-kind
//!   algebra under backward-Euler companion modeling

pub mod controlled;
pub mod diode;
pub mod error;
pub mod layout;
pub mod passive;
pub mod sources;
pub mod stamp;

pub use error::{Error, Result};
pub use layout::{MnaAssembler, MnaLayout};
