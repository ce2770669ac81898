//! Solvers and analysis engines for Nodal.
//!
//! - [`linear`] - dense LU with partial pivoting, real and complex
//! - [`newton`] - the Newton-Raphson outer iteration
//! - [`transient`] - time-domain analysis with backward-Euler companions and
//!   adaptive stepping
//! - [`dc_sweep`] - source sweeps with Newton continuation
//! - [`ac`] - small-signal frequency and phase sweeps over the complex MNA
//!   system
//! - [`probe`] - output-variable resolution and extraction

pub mod ac;
pub mod dc_sweep;
pub mod error;
pub mod linear;
pub mod newton;
pub mod probe;
pub mod transient;

pub use ac::{AcSweepParams, PhaseSweepParams, SweepKind, frequency_grid, run_ac_sweep, run_phase_sweep};
pub use dc_sweep::{DC_PSEUDO_STEP, DcSweepParams, run_dc_sweep};
pub use error::{Error, Result};
pub use linear::{solve_complex, solve_dense};
pub use newton::{ConvergenceCriteria, MAX_NR_ITERATIONS, NewtonOutcome, solve_newton};
pub use probe::{Probe, SampleContext, resolve_probes};
pub use transient::{GMIN, TransientParams, run_transient};
