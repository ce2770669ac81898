//! Transient time-domain analysis.
//!
//! Backward-Euler companion models, a Newton solve per step, and a simple
//! LTE-style step controller: the error estimate is the RMS of the step
//! change scaled by reltol/abstol, grown or shrunk with safety factors. The
//! previous accepted solution is the only state threaded between steps, so
//! retrying a step or replaying a run needs no per-element bookkeeping.

use nalgebra::DVector;
use nodal_core::circuit::Circuit;
use nodal_core::plot::{OutputRequest, PlotData};
use nodal_devices::{MnaAssembler, MnaLayout};

use crate::error::{Error, Result};
use crate::newton::{ConvergenceCriteria, solve_newton};
use crate::probe::{SampleContext, resolve_probes};

/// Conductance to ground added on every node row when the circuit fails its
/// connectivity pre-flight.
pub const GMIN: f64 = 1e-12;

/// Default floor for the timestep.
pub const H_MIN_DEFAULT: f64 = 1e-15;
/// Default relative tolerance for the step controller.
pub const RELTOL_DEFAULT: f64 = 1e-3;
/// Default absolute tolerance for the step controller.
pub const ABSTOL_DEFAULT: f64 = 1e-6;
/// Safety factor applied to step growth and shrinkage.
pub const STEP_SAFETY: f64 = 0.9;
/// Cap on step growth per accepted step.
pub const MAX_GROWTH: f64 = 2.0;

/// Transient run parameters.
#[derive(Debug, Clone)]
pub struct TransientParams {
    /// Stop time (s).
    pub tstop: f64,
    /// Initial timestep (s).
    pub h_init: f64,
    /// Maximum timestep (s).
    pub h_max: f64,
    /// Minimum timestep (s).
    pub h_min: f64,
    /// Relative tolerance for the step controller.
    pub reltol: f64,
    /// Absolute tolerance for the step controller.
    pub abstol: f64,
}

impl TransientParams {
    /// Parameters from the `print TRAN <tstep> <tstop> <tmax>` surface.
    pub fn new(tstep: f64, tstop: f64, tmax: f64) -> Self {
        Self {
            tstop,
            h_init: tstep,
            h_max: tmax,
            h_min: H_MIN_DEFAULT.min(tmax),
            reltol: RELTOL_DEFAULT,
            abstol: ABSTOL_DEFAULT,
        }
    }
}

/// RMS of the per-unknown step change scaled by mixed tolerance.
fn lte_error(next: &DVector<f64>, prev: &DVector<f64>, reltol: f64, abstol: f64) -> f64 {
    if next.is_empty() {
        return 0.0;
    }
    let sum: f64 = next
        .iter()
        .zip(prev.iter())
        .map(|(&x, &x_prev)| {
            let scaled = (x - x_prev).abs() / (reltol * x.abs() + abstol);
            scaled * scaled
        })
        .sum();
    (sum / next.len() as f64).sqrt()
}

/// Next step size from the error estimate: grow by at most [`MAX_GROWTH`]
/// when the estimate is inside tolerance, shrink otherwise.
fn next_step(h: f64, err: f64) -> f64 {
    if err < 1.0 {
        h * (STEP_SAFETY * err.powf(-0.2)).min(MAX_GROWTH)
    } else {
        h * STEP_SAFETY * err.powf(-0.25)
    }
}

/// Run a transient analysis over `[0, tstop]`.
///
/// Samples appear in strictly increasing time starting at exactly t = 0
/// (all output variables zero there). A singular step stops the run with the
/// partial results accumulated so far.
pub fn run_transient(
    circuit: &mut Circuit,
    params: &TransientParams,
    requests: &[OutputRequest],
) -> Result<PlotData> {
    circuit.canonicalize_nodes();
    let layout = MnaLayout::build(circuit)?;

    let mut plot = PlotData::new(requests.iter().map(|r| r.to_string()));
    plot.push_sample(0.0, &vec![0.0; requests.len()]);

    if layout.total_unknowns() == 0 {
        log::warn!("transient: circuit has no unknowns; returning the t=0 sample only");
        return Ok(plot);
    }

    let gmin = if circuit.is_connected() {
        0.0
    } else {
        log::warn!("transient: circuit is not connected to ground; proceeding with gmin fallback");
        GMIN
    };

    let probes = resolve_probes(circuit, &layout, requests)?;
    let criteria = ConvergenceCriteria::default();

    let mut prev = DVector::zeros(layout.total_unknowns());
    let mut t = 0.0;
    let mut h = params.h_init.clamp(params.h_min, params.h_max);

    while t < params.tstop - 0.5 * params.h_min {
        h = h.min(params.tstop - t).clamp(params.h_min, params.h_max);

        circuit.update_time_dependent_sources(t + h);
        let assembler = MnaAssembler::new(circuit, &layout);
        let outcome = match solve_newton(&assembler, h, &prev, &prev, &criteria, gmin) {
            Ok(outcome) => outcome,
            Err(Error::SingularMatrix) => {
                log::warn!(
                    "transient: singular matrix at t = {:.6e}s; stopping with partial results",
                    t + h
                );
                return Ok(plot);
            }
            Err(e) => return Err(e),
        };
        if !outcome.converged {
            log::warn!("transient: Newton did not converge at t = {:.6e}s", t + h);
        }

        t += h;
        let solution = outcome.solution;
        let row: Vec<f64> = {
            let ctx = SampleContext {
                solution: &solution,
                prev_step: &prev,
                h,
                circuit,
            };
            probes.iter().map(|p| p.eval(&ctx)).collect()
        };
        plot.push_sample(t, &row);

        let err = lte_error(&solution, &prev, params.reltol, params.abstol);
        prev = solution;
        h = next_step(h, err).clamp(params.h_min, params.h_max);
    }

    Ok(plot)
}

#[cfg(test)]
mod tests {
    use super::*;
    use nodal_core::element::{Element, PulseParams};
    use nodal_core::registry::GROUND;

    fn rc_circuit() -> Circuit {
        // V1 = 1V -> R1 = 1k -> n2 -> C1 = 1uF -> GND, tau = 1ms
        let mut circuit = Circuit::new();
        let n1 = circuit.registry_mut().resolve("n1").unwrap();
        let n2 = circuit.registry_mut().resolve("n2").unwrap();
        circuit
            .add_element(Element::voltage_source("V1", n1, GROUND, 1.0))
            .unwrap();
        circuit
            .add_element(Element::resistor("R1", n1, n2, 1e3))
            .unwrap();
        circuit
            .add_element(Element::capacitor("C1", n2, GROUND, 1e-6))
            .unwrap();
        circuit
    }

    #[test]
    fn test_rc_charging_curve() {
        let mut circuit = rc_circuit();
        let params = TransientParams::new(1e-6, 5e-3, 1e-5);
        let plot = run_transient(
            &mut circuit,
            &params,
            &[OutputRequest::Voltage("n2".into())],
        )
        .unwrap();

        let v = &plot.series_named("V(n2)").unwrap().values;
        let t = &plot.abscissa;

        // First sample is exactly t=0 with zero output
        assert_eq!(t[0], 0.0);
        assert_eq!(v[0], 0.0);

        // Strictly increasing abscissa, last sample lands on tstop
        for k in 1..t.len() {
            assert!(t[k] > t[k - 1], "time must be strictly increasing");
        }
        let t_last = *t.last().unwrap();
        assert!(
            (t_last - 5e-3).abs() < 1e-5,
            "last sample {t_last} should land on tstop"
        );

        // V(n2) at t = tau is 1 - 1/e within 1%
        let at = |target: f64| {
            let k = t
                .iter()
                .enumerate()
                .min_by(|(_, a), (_, b)| {
                    (*a - target).abs().partial_cmp(&(*b - target).abs()).unwrap()
                })
                .unwrap()
                .0;
            v[k]
        };
        let expected_tau = 1.0 - (-1.0f64).exp();
        assert!(
            (at(1e-3) - expected_tau).abs() / expected_tau < 0.01,
            "V(n2) at tau = {} (expected {expected_tau})",
            at(1e-3)
        );
        assert!(
            (at(5e-3) - 0.993).abs() < 0.01,
            "V(n2) at 5 tau = {} (expected ~0.993)",
            at(5e-3)
        );

        // Series invariant
        for series in &plot.series {
            assert_eq!(series.values.len(), plot.abscissa.len());
        }
    }

    #[test]
    fn test_series_rlc_rings() {
        // V1 (1V step) -> R = 10 -> L = 1mH -> C = 1uF, underdamped:
        // omega0 = 31.6 krad/s, period ~199us, overshoot expected
        let mut circuit = Circuit::new();
        let n1 = circuit.registry_mut().resolve("n1").unwrap();
        let n2 = circuit.registry_mut().resolve("n2").unwrap();
        let n3 = circuit.registry_mut().resolve("n3").unwrap();
        circuit
            .add_element(Element::voltage_source("V1", n1, GROUND, 1.0))
            .unwrap();
        circuit
            .add_element(Element::resistor("R1", n1, n2, 10.0))
            .unwrap();
        circuit
            .add_element(Element::inductor("L1", n2, n3, 1e-3))
            .unwrap();
        circuit
            .add_element(Element::capacitor("C1", n3, GROUND, 1e-6))
            .unwrap();

        let params = TransientParams::new(1e-7, 1e-3, 1e-6);
        let plot = run_transient(
            &mut circuit,
            &params,
            &[OutputRequest::Voltage("n3".into())],
        )
        .unwrap();

        let v = &plot.series_named("V(n3)").unwrap().values;
        let t = &plot.abscissa;

        // First overshoot above the 1V target
        let peak = v.iter().cloned().fold(f64::MIN, f64::max);
        assert!(peak > 1.0, "underdamped response should overshoot: peak = {peak}");

        // Measure the period between downward crossings of the 1V level
        let mut crossings = Vec::new();
        for k in 1..v.len() {
            if v[k - 1] > 1.0 && v[k] <= 1.0 {
                crossings.push(t[k]);
            }
        }
        assert!(crossings.len() >= 2, "expected at least two ring cycles");
        let period = crossings[1] - crossings[0];
        assert!(
            (period - 199e-6).abs() / 199e-6 < 0.15,
            "ring period {period} (expected ~199us)"
        );
    }

    #[test]
    fn test_pulse_drive_reaches_steady_oscillation() {
        // PULSE(0 1 0 1u 1u 10u 20u) through R = 1k into C = 1n: tau << pw,
        // so the output almost fully swings but stays below 1V peak-to-peak
        let mut circuit = Circuit::new();
        let n1 = circuit.registry_mut().resolve("n1").unwrap();
        let n2 = circuit.registry_mut().resolve("n2").unwrap();
        circuit
            .add_element(Element::pulse(
                "V1",
                n1,
                GROUND,
                PulseParams {
                    v1: 0.0,
                    v2: 1.0,
                    delay: 0.0,
                    rise: 1e-6,
                    fall: 1e-6,
                    width: 10e-6,
                    period: 20e-6,
                },
            ))
            .unwrap();
        circuit
            .add_element(Element::resistor("R1", n1, n2, 1e3))
            .unwrap();
        circuit
            .add_element(Element::capacitor("C1", n2, GROUND, 1e-9))
            .unwrap();

        let params = TransientParams::new(1e-8, 100e-6, 2e-7);
        let plot = run_transient(
            &mut circuit,
            &params,
            &[OutputRequest::Voltage("n2".into())],
        )
        .unwrap();

        let v = &plot.series_named("V(n2)").unwrap().values;
        let t = &plot.abscissa;

        // Look at the tail (after 3 periods) for the steady oscillation
        let tail: Vec<f64> = t
            .iter()
            .zip(v.iter())
            .filter(|&(&time, _)| time > 60e-6)
            .map(|(_, &value)| value)
            .collect();
        let max = tail.iter().cloned().fold(f64::MIN, f64::max);
        let min = tail.iter().cloned().fold(f64::MAX, f64::min);

        assert!(max - min < 1.0, "RC filtering keeps p2p under the drive");
        assert!(max > 0.9, "output should nearly reach the top: max = {max}");
        assert!(min < 0.1, "output should nearly reach the bottom: min = {min}");
    }

    #[test]
    fn test_disconnected_circuit_still_runs() {
        let mut circuit = rc_circuit();
        // Floating resistor triggers the gmin fallback
        let a = circuit.registry_mut().resolve("float_a").unwrap();
        let b = circuit.registry_mut().resolve("float_b").unwrap();
        circuit
            .add_element(Element::resistor("R9", a, b, 1e3))
            .unwrap();

        let params = TransientParams::new(1e-6, 1e-4, 1e-5);
        let plot = run_transient(
            &mut circuit,
            &params,
            &[OutputRequest::Voltage("n2".into())],
        )
        .unwrap();
        assert!(plot.len() > 1, "gmin fallback should let the run proceed");
    }

    #[test]
    fn test_step_never_below_h_min() {
        // Direct check on the controller
        let h = next_step(1e-9, 1e12);
        assert!(h > 0.0);
        let clamped = h.clamp(H_MIN_DEFAULT, 1e-3);
        assert!(clamped >= H_MIN_DEFAULT);
    }
}
