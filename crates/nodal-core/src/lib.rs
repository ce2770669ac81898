//! Core circuit representation for the Nodal simulator.
//!
//! This crate provides:
//! - [`registry::NodeRegistry`] - label/id bookkeeping with a union-find over
//!   node ids (ground pinned at id 0), so that shorted nodes share one row in
//!   the MNA matrix
//! - [`element::Element`] - the tagged-variant element set (R, C, L, sources,
//!   diodes, controlled sources, time-varying sources)
//! - [`circuit::Circuit`] - the element container mutated by commands and
//!   read by the analysis engines
//! - [`mna::MnaMatrix`] - dense A/b containers with stamp primitives, shared
//!   by the real and complex analysis paths
//! - [`plot::PlotData`] - analysis results as an abscissa plus named series

pub mod circuit;
pub mod element;
pub mod error;
pub mod mna;
pub mod plot;
pub mod registry;
pub mod units;

pub use circuit::Circuit;
pub use element::{DiodeModel, Element, ElementKind, PulseParams, SinusoidParams};
pub use error::{Error, Result};
pub use mna::{ComplexMna, MnaMatrix, MnaSystem};
pub use plot::{OutputRequest, PlotData, Series};
pub use registry::{GROUND, NodeRegistry};
pub use units::parse_value;
