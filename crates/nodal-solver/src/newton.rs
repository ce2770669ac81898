//! The Newton-Raphson outer iteration.
//!
//! Each iteration reassembles the MNA system at the current iterate (the
//! diode linearization point) and solves it; convergence is the max-norm of
//! the iterate change. Circuits without nonlinear elements take the
//! single-solve fast path.

use nalgebra::DVector;
use nodal_devices::MnaAssembler;

use crate::error::Result;
use crate::linear::solve_dense;

/// Default Newton tolerance on the iterate change.
pub const DEFAULT_NR_TOLERANCE: f64 = 1e-6;
/// Iteration cap.
pub const MAX_NR_ITERATIONS: usize = 100;

/// Convergence knobs for the Newton loop.
#[derive(Debug, Clone)]
pub struct ConvergenceCriteria {
    pub tolerance: f64,
    pub max_iterations: usize,
}

impl Default for ConvergenceCriteria {
    fn default() -> Self {
        Self {
            tolerance: DEFAULT_NR_TOLERANCE,
            max_iterations: MAX_NR_ITERATIONS,
        }
    }
}

/// The result of one Newton solve.
#[derive(Debug, Clone)]
pub struct NewtonOutcome {
    pub solution: DVector<f64>,
    pub iterations: usize,
    pub converged: bool,
}

/// Solve the (possibly nonlinear) MNA system at timestep `h`.
///
/// `prev_step` is the companion-model history (previous accepted timestep);
/// `initial_guess` seeds the iteration. On non-convergence the last iterate
/// is accepted with a warning; a singular matrix is an error.
pub fn solve_newton(
    assembler: &MnaAssembler,
    h: f64,
    prev_step: &DVector<f64>,
    initial_guess: &DVector<f64>,
    criteria: &ConvergenceCriteria,
    gmin: f64,
) -> Result<NewtonOutcome> {
    if !assembler.circuit().has_nonlinear() {
        let (a, b) = assembler.assemble(h, prev_step, initial_guess, gmin).into_parts();
        let solution = solve_dense(&a, &b)?;
        return Ok(NewtonOutcome {
            solution,
            iterations: 1,
            converged: true,
        });
    }

    let mut guess = initial_guess.clone();
    for iteration in 1..=criteria.max_iterations {
        let (a, b) = assembler.assemble(h, prev_step, &guess, gmin).into_parts();
        let next = solve_dense(&a, &b)?;
        let delta = (&next - &guess).amax();
        guess = next;
        if delta < criteria.tolerance {
            return Ok(NewtonOutcome {
                solution: guess,
                iterations: iteration,
                converged: true,
            });
        }
    }

    log::warn!(
        "Newton-Raphson did not converge after {} iterations; accepting last iterate",
        criteria.max_iterations
    );
    Ok(NewtonOutcome {
        solution: guess,
        iterations: criteria.max_iterations,
        converged: false,
    })
}
