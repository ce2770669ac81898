//! DC sweep analysis with Newton continuation.
//!
//! The swept source takes each value on a counted grid; every point is a
//! Newton solve at a huge pseudo-timestep, so capacitor companions
//! degenerate to opens (Geq -> 0) and inductor companions to shorts
//! (L/h -> 0). The previous point's solution seeds the next solve.

use nalgebra::DVector;
use nodal_core::circuit::Circuit;
use nodal_core::plot::{OutputRequest, PlotData};
use nodal_devices::{MnaAssembler, MnaLayout};

use crate::error::{Error, Result};
use crate::newton::{ConvergenceCriteria, solve_newton};
use crate::probe::{SampleContext, resolve_probes};
use crate::transient::GMIN;

/// Pseudo-timestep for DC solves, far beyond any circuit time constant.
pub const DC_PSEUDO_STEP: f64 = 1e12;

/// DC sweep specification.
#[derive(Debug, Clone)]
pub struct DcSweepParams {
    /// Name of the swept source.
    pub source: String,
    pub start: f64,
    pub stop: f64,
    pub step: f64,
}

impl DcSweepParams {
    /// Number of sweep points, counting steps so the upper bound is included
    /// without float-accumulation drift.
    pub fn num_points(&self) -> Result<usize> {
        if self.step == 0.0 {
            return Err(Error::InvalidSweep("increment must be non-zero".into()));
        }
        let count = ((self.stop - self.start) / self.step).round();
        if count < 0.0 {
            return Err(Error::InvalidSweep(
                "increment runs away from the stop value".into(),
            ));
        }
        Ok(count as usize + 1)
    }
}

/// Run a DC sweep, returning one sample per sweep value.
///
/// A singular point emits zeros and the sweep continues; the source's value
/// is restored afterwards.
pub fn run_dc_sweep(
    circuit: &mut Circuit,
    params: &DcSweepParams,
    requests: &[OutputRequest],
) -> Result<PlotData> {
    let num_points = params.num_points()?;
    if circuit.find_element(&params.source).is_none() {
        return Err(Error::UnknownElement(params.source.clone()));
    }

    circuit.canonicalize_nodes();
    let layout = MnaLayout::build(circuit)?;

    let mut plot = PlotData::new(requests.iter().map(|r| r.to_string()));
    if layout.total_unknowns() == 0 {
        log::warn!("dc sweep: circuit has no unknowns; returning empty data");
        return Ok(plot);
    }

    let gmin = if circuit.is_connected() {
        0.0
    } else {
        log::warn!("dc sweep: circuit is not connected to ground; proceeding with gmin fallback");
        GMIN
    };

    let probes = resolve_probes(circuit, &layout, requests)?;
    let criteria = ConvergenceCriteria::default();

    let original = circuit.find_element(&params.source).unwrap().value;
    let mut prev = DVector::zeros(layout.total_unknowns());

    for point in 0..num_points {
        let value = params.start + point as f64 * params.step;
        circuit.find_element_mut(&params.source).unwrap().value = value;

        let assembler = MnaAssembler::new(circuit, &layout);
        match solve_newton(&assembler, DC_PSEUDO_STEP, &prev, &prev, &criteria, gmin) {
            Ok(outcome) => {
                if !outcome.converged {
                    log::warn!("dc sweep: Newton did not converge at {} = {value}", params.source);
                }
                let row: Vec<f64> = {
                    let ctx = SampleContext {
                        solution: &outcome.solution,
                        prev_step: &prev,
                        h: DC_PSEUDO_STEP,
                        circuit,
                    };
                    probes.iter().map(|p| p.eval(&ctx)).collect()
                };
                plot.push_sample(value, &row);
                prev = outcome.solution;
            }
            Err(Error::SingularMatrix) => {
                log::warn!(
                    "dc sweep: singular matrix at {} = {value}; emitting zeros",
                    params.source
                );
                plot.push_sample(value, &vec![0.0; requests.len()]);
            }
            Err(e) => {
                circuit.find_element_mut(&params.source).unwrap().value = original;
                return Err(e);
            }
        }
    }

    circuit.find_element_mut(&params.source).unwrap().value = original;
    Ok(plot)
}
