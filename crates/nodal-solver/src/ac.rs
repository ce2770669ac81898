//! Small-signal AC and phase sweeps.
//!
//! Each frequency point rebuilds the complex MNA system and solves it.
//! Magnitudes are optionally reported in dB and phases in degrees (both on
//! by default). The phase sweep holds the frequency fixed and rotates a
//! designated V-like source's excitation through cos(phi), recording
//! magnitudes.

use num_complex::Complex;
use nodal_core::circuit::Circuit;
use nodal_core::element::ElementKind;
use nodal_core::plot::{OutputRequest, PlotData};
use nodal_devices::{MnaAssembler, MnaLayout};

use crate::error::{Error, Result};
use crate::linear::solve_complex;
use crate::probe::{Probe, resolve_probes};
use crate::transient::GMIN;

/// Floor applied to magnitudes before the dB conversion.
const DB_FLOOR: f64 = 1e-30;

/// Frequency grid spacing.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SweepKind {
    /// Equally spaced in omega.
    Linear,
    /// Equally spaced in log10(omega).
    Decade,
    /// Equally spaced in log2(omega).
    Octave,
}

/// AC sweep specification.
#[derive(Debug, Clone)]
pub struct AcSweepParams {
    pub kind: SweepKind,
    pub omega_start: f64,
    pub omega_stop: f64,
    pub points: usize,
    /// Report |H| in dB rather than raw magnitude.
    pub mag_in_db: bool,
    /// Report phase in degrees rather than radians.
    pub phase_in_deg: bool,
}

impl AcSweepParams {
    pub fn new(kind: SweepKind, omega_start: f64, omega_stop: f64, points: usize) -> Self {
        Self {
            kind,
            omega_start,
            omega_stop,
            points,
            mag_in_db: true,
            phase_in_deg: true,
        }
    }
}

/// Phase sweep specification: fixed omega, swept excitation phase.
#[derive(Debug, Clone)]
pub struct PhaseSweepParams {
    pub omega: f64,
    pub phi_start: f64,
    pub phi_stop: f64,
    pub points: usize,
    /// Source whose phase is swept; defaults to the first V-like element
    /// (preferring a sinusoid) when absent.
    pub source: Option<String>,
}

/// Build the frequency grid. A single point collapses to the start value.
pub fn frequency_grid(kind: SweepKind, omega_start: f64, omega_stop: f64, points: usize) -> Vec<f64> {
    if points <= 1 {
        return vec![omega_start];
    }
    let n = (points - 1) as f64;
    (0..points)
        .map(|k| {
            let alpha = k as f64 / n;
            match kind {
                SweepKind::Linear => omega_start + alpha * (omega_stop - omega_start),
                SweepKind::Decade => {
                    10f64.powf(omega_start.log10() + alpha * (omega_stop.log10() - omega_start.log10()))
                }
                SweepKind::Octave => {
                    2f64.powf(omega_start.log2() + alpha * (omega_stop.log2() - omega_start.log2()))
                }
            }
        })
        .collect()
}

fn series_names(requests: &[OutputRequest], mag_in_db: bool, with_phase: bool) -> Vec<String> {
    let mut names = Vec::new();
    for request in requests {
        let (letter, target) = match request {
            OutputRequest::Voltage(node) => ('V', node),
            OutputRequest::Current(element) => ('I', element),
        };
        if mag_in_db {
            names.push(format!("{letter}DB({target})"));
        } else {
            names.push(format!("{letter}M({target})"));
        }
        if with_phase {
            names.push(format!("{letter}P({target})"));
        }
    }
    names
}

struct AcPreflight {
    layout: MnaLayout,
    gmin: f64,
    probes: Vec<Probe>,
}

fn preflight(
    circuit: &mut Circuit,
    requests: &[OutputRequest],
    what: &str,
) -> Result<Option<AcPreflight>> {
    circuit.canonicalize_nodes();
    let layout = MnaLayout::build(circuit)?;
    if layout.total_unknowns() == 0 {
        log::warn!("{what}: circuit has no unknowns; returning empty data");
        return Ok(None);
    }
    let gmin = if circuit.is_connected() {
        0.0
    } else {
        log::warn!("{what}: circuit is not connected to ground; proceeding with gmin fallback");
        GMIN
    };
    let probes = resolve_probes(circuit, &layout, requests)?;
    Ok(Some(AcPreflight {
        layout,
        gmin,
        probes,
    }))
}

/// Run an AC sweep: per omega, assemble the complex system, solve, and
/// extract magnitude and phase at every requested variable.
///
/// A singular point emits zeros for all series and the sweep continues.
pub fn run_ac_sweep(
    circuit: &mut Circuit,
    params: &AcSweepParams,
    requests: &[OutputRequest],
) -> Result<PlotData> {
    let mut plot = PlotData::new(series_names(requests, params.mag_in_db, true));
    let Some(pre) = preflight(circuit, requests, "ac sweep")? else {
        return Ok(plot);
    };

    let grid = frequency_grid(params.kind, params.omega_start, params.omega_stop, params.points);
    for &omega in &grid {
        let assembler = MnaAssembler::new(circuit, &pre.layout);
        let mna = assembler.assemble_complex(omega, pre.gmin);
        let (a, b) = mna.into_parts();
        let row = match solve_complex(&a, &b) {
            Ok(solution) => {
                let mut row = Vec::with_capacity(requests.len() * 2);
                for probe in &pre.probes {
                    let phasor = probe.eval_complex(&solution, circuit, omega);
                    let mag = if params.mag_in_db {
                        20.0 * phasor.norm().max(DB_FLOOR).log10()
                    } else {
                        phasor.norm()
                    };
                    let phase = if params.phase_in_deg {
                        phasor.arg().to_degrees()
                    } else {
                        phasor.arg()
                    };
                    row.push(mag);
                    row.push(phase);
                }
                row
            }
            Err(Error::SingularMatrix) => {
                log::warn!("ac sweep: singular matrix at omega = {omega:.6e}; emitting zeros");
                vec![0.0; requests.len() * 2]
            }
            Err(e) => return Err(e),
        };
        plot.push_sample(omega, &row);
    }

    Ok(plot)
}

/// Pick the source whose phase a phase sweep rotates: the named one, or the
/// first V-like element (preferring a sinusoid).
fn designate_source(circuit: &Circuit, requested: Option<&str>) -> Result<String> {
    if let Some(name) = requested {
        return match circuit.find_element(name) {
            Some(element) if element.introduces_extra_variable() => Ok(element.name.clone()),
            _ => Err(Error::UnknownElement(name.to_string())),
        };
    }
    let sinusoid = circuit
        .elements()
        .iter()
        .find(|e| matches!(e.kind, ElementKind::Sinusoid(_)));
    let v_like = sinusoid.or_else(|| {
        circuit.elements().iter().find(|e| {
            matches!(
                e.kind,
                ElementKind::VoltageSource | ElementKind::Pulse(_)
            )
        })
    });
    v_like
        .map(|e| e.name.clone())
        .ok_or_else(|| Error::UnknownElement("no V-like source to sweep".into()))
}

/// Run a phase sweep at fixed omega: for each phi the designated source
/// excites with cos(phi) and the magnitudes at the requested variables are
/// recorded. The circuit is left untouched.
pub fn run_phase_sweep(
    circuit: &mut Circuit,
    params: &PhaseSweepParams,
    requests: &[OutputRequest],
) -> Result<PlotData> {
    let source = designate_source(circuit, params.source.as_deref())?;

    let mut plot = PlotData::new(series_names(requests, false, false));
    let Some(pre) = preflight(circuit, requests, "phase sweep")? else {
        return Ok(plot);
    };

    let grid = frequency_grid(SweepKind::Linear, params.phi_start, params.phi_stop, params.points);
    for &phi in &grid {
        let assembler = MnaAssembler::new(circuit, &pre.layout);
        let excitation = Complex::new(phi.cos(), 0.0);
        let mna = assembler.assemble_complex_with_override(
            params.omega,
            pre.gmin,
            Some((source.as_str(), excitation)),
        );
        let (a, b) = mna.into_parts();
        let row = match solve_complex(&a, &b) {
            Ok(solution) => pre
                .probes
                .iter()
                .map(|p| p.eval_complex(&solution, circuit, params.omega).norm())
                .collect(),
            Err(Error::SingularMatrix) => {
                log::warn!("phase sweep: singular matrix at phi = {phi:.6e}; emitting zeros");
                vec![0.0; requests.len()]
            }
            Err(e) => return Err(e),
        };
        plot.push_sample(phi, &row);
    }

    Ok(plot)
}

#[cfg(test)]
mod tests {
    use super::*;
    use nodal_core::element::Element;
    use nodal_core::registry::GROUND;
    use std::f64::consts::FRAC_PI_2;

    fn rc_lowpass() -> Circuit {
        // V1 = 1V -> R = 1k -> n2 -> C = 1uF -> GND: corner at 1000 rad/s
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
    fn test_grid_shapes() {
        let lin = frequency_grid(SweepKind::Linear, 0.0, 10.0, 11);
        assert_eq!(lin.len(), 11);
        assert!((lin[5] - 5.0).abs() < 1e-12);

        let dec = frequency_grid(SweepKind::Decade, 10.0, 1e6, 61);
        assert_eq!(dec.len(), 61);
        assert!((dec[0] - 10.0).abs() < 1e-9);
        assert!((dec[60] - 1e6).abs() < 1e-3);
        // Log spacing: constant ratio between neighbors
        let ratio = dec[1] / dec[0];
        assert!((dec[31] / dec[30] - ratio).abs() < 1e-9);

        let oct = frequency_grid(SweepKind::Octave, 1.0, 8.0, 4);
        assert!((oct[1] - 2.0).abs() < 1e-12);
        assert!((oct[2] - 4.0).abs() < 1e-12);
    }

    #[test]
    fn test_single_point_grid_collapses_to_start() {
        assert_eq!(frequency_grid(SweepKind::Decade, 42.0, 1e6, 1), vec![42.0]);
    }

    #[test]
    fn test_rc_lowpass_corner() {
        let mut circuit = rc_lowpass();
        let params = AcSweepParams::new(SweepKind::Decade, 10.0, 1e6, 61);
        let plot = run_ac_sweep(
            &mut circuit,
            &params,
            &[OutputRequest::Voltage("n2".into())],
        )
        .unwrap();

        assert_eq!(plot.len(), 61);

        // Find the point nearest the corner at 1000 rad/s
        let k = plot
            .abscissa
            .iter()
            .enumerate()
            .min_by(|(_, a), (_, b)| {
                (*a - 1e3).abs().partial_cmp(&(*b - 1e3).abs()).unwrap()
            })
            .unwrap()
            .0;
        assert!(
            (plot.abscissa[k] - 1e3).abs() / 1e3 < 1e-6,
            "the decade grid should land on the corner exactly"
        );

        let db = plot.series_named("VDB(n2)").unwrap().values[k];
        let phase = plot.series_named("VP(n2)").unwrap().values[k];
        assert!((db + 3.0103).abs() < 0.05, "corner gain {db} dB (expected -3.01)");
        assert!((phase + 45.0).abs() < 1.0, "corner phase {phase} (expected -45)");

        // Passband is flat at 0 dB
        let db0 = plot.series_named("VDB(n2)").unwrap().values[0];
        assert!(db0.abs() < 0.01, "passband gain {db0} dB");
    }

    #[test]
    fn test_raw_magnitude_at_corner() {
        let mut circuit = rc_lowpass();
        let mut params = AcSweepParams::new(SweepKind::Linear, 1e3, 1e3, 1);
        params.mag_in_db = false;
        let plot = run_ac_sweep(
            &mut circuit,
            &params,
            &[OutputRequest::Voltage("n2".into())],
        )
        .unwrap();

        assert_eq!(plot.len(), 1, "N=1 sweeps produce exactly one point");
        let mag = plot.series_named("VM(n2)").unwrap().values[0];
        assert!(
            (mag - std::f64::consts::FRAC_1_SQRT_2).abs() < 1e-3,
            "|H| = {mag} at the corner (expected 0.7071)"
        );
    }

    #[test]
    fn test_phase_sweep_magnitude_follows_cosine() {
        let mut circuit = rc_lowpass();
        let params = PhaseSweepParams {
            omega: 100.0, // well inside the passband
            phi_start: 0.0,
            phi_stop: std::f64::consts::PI,
            points: 5,
            source: None,
        };
        let plot = run_phase_sweep(
            &mut circuit,
            &params,
            &[OutputRequest::Voltage("n2".into())],
        )
        .unwrap();

        assert_eq!(plot.len(), 5);
        let mags = &plot.series_named("VM(n2)").unwrap().values;
        // cos(0) = 1, cos(pi/2) = 0, cos(pi) = -1 (magnitude 1 again)
        assert!((mags[0] - mags[4]).abs() < 1e-6);
        assert!(mags[2].abs() < 1e-6, "quadrature excitation vanishes");
        assert!(mags[0] > 0.99, "passband magnitude near unity");

        // Source untouched afterwards
        assert_eq!(circuit.find_element("V1").unwrap().value, 1.0);
    }

    #[test]
    fn test_phase_sweep_needs_a_source() {
        let mut circuit = Circuit::new();
        let n1 = circuit.registry_mut().resolve("n1").unwrap();
        circuit
            .add_element(Element::resistor("R1", n1, GROUND, 1e3))
            .unwrap();
        let params = PhaseSweepParams {
            omega: 1.0,
            phi_start: 0.0,
            phi_stop: FRAC_PI_2,
            points: 2,
            source: None,
        };
        let result = run_phase_sweep(&mut circuit, &params, &[]);
        assert!(matches!(result, Err(Error::UnknownElement(_))));
    }
}
