//! Output-variable resolution and extraction.
//!
//! Requested variables are resolved to getters once, at run start: a node
//! voltage is a row lookup; an element current is its branch row when the
//! element carries one, and otherwise is computed from terminal voltages
//! (Ohm's law for R, the backward-Euler derivative for C, the source value
//! for I, the re-evaluated diode equation for D, gm * Vctrl for a VCCS).

use nalgebra::DVector;
use num_complex::Complex;
use nodal_core::circuit::Circuit;
use nodal_core::element::{DiodeModel, ElementKind};
use nodal_core::plot::OutputRequest;
use nodal_core::registry::GROUND;
use nodal_devices::diode;
use nodal_devices::MnaLayout;

use crate::error::{Error, Result};

/// Everything a probe needs to produce one sample.
pub struct SampleContext<'a> {
    pub solution: &'a DVector<f64>,
    pub prev_step: &'a DVector<f64>,
    pub h: f64,
    pub circuit: &'a Circuit,
}

#[derive(Debug, Clone)]
enum Getter {
    /// Ground or a node with no equation: always 0.
    Zero,
    NodeVoltage(usize),
    BranchCurrent(usize),
    ResistorCurrent {
        pos: Option<usize>,
        neg: Option<usize>,
        resistance: f64,
    },
    CapacitorCurrent {
        pos: Option<usize>,
        neg: Option<usize>,
        capacitance: f64,
    },
    /// Current source: the (possibly swept) element value at sample time.
    SourceCurrent { element: usize },
    DiodeCurrent {
        pos: Option<usize>,
        neg: Option<usize>,
        model: DiodeModel,
    },
    VccsCurrent {
        ctrl_pos: Option<usize>,
        ctrl_neg: Option<usize>,
        gm: f64,
    },
    CccsCurrent { ctrl_row: usize, gain: f64 },
}

/// A resolved output variable.
#[derive(Debug, Clone)]
pub struct Probe {
    pub name: String,
    getter: Getter,
}

fn voltage_at(row: Option<usize>, solution: &DVector<f64>) -> f64 {
    row.filter(|&r| r < solution.len())
        .map(|r| solution[r])
        .unwrap_or(0.0)
}

fn phasor_at(row: Option<usize>, solution: &DVector<Complex<f64>>) -> Complex<f64> {
    row.filter(|&r| r < solution.len())
        .map(|r| solution[r])
        .unwrap_or_default()
}

impl Probe {
    /// Evaluate against a real solution snapshot.
    pub fn eval(&self, ctx: &SampleContext) -> f64 {
        match &self.getter {
            Getter::Zero => 0.0,
            Getter::NodeVoltage(row) | Getter::BranchCurrent(row) => voltage_at(Some(*row), ctx.solution),
            Getter::ResistorCurrent { pos, neg, resistance } => {
                (voltage_at(*pos, ctx.solution) - voltage_at(*neg, ctx.solution)) / resistance
            }
            Getter::CapacitorCurrent { pos, neg, capacitance } => {
                let now = voltage_at(*pos, ctx.solution) - voltage_at(*neg, ctx.solution);
                let before = voltage_at(*pos, ctx.prev_step) - voltage_at(*neg, ctx.prev_step);
                capacitance * (now - before) / ctx.h
            }
            Getter::SourceCurrent { element } => ctx.circuit.elements()[*element].value,
            Getter::DiodeCurrent { pos, neg, model } => {
                let vd = voltage_at(*pos, ctx.solution) - voltage_at(*neg, ctx.solution);
                diode::diode_current(vd, *model)
            }
            Getter::VccsCurrent { ctrl_pos, ctrl_neg, gm } => {
                gm * (voltage_at(*ctrl_pos, ctx.solution) - voltage_at(*ctrl_neg, ctx.solution))
            }
            Getter::CccsCurrent { ctrl_row, gain } => {
                gain * voltage_at(Some(*ctrl_row), ctx.solution)
            }
        }
    }

    /// Evaluate against a complex solution snapshot at angular frequency
    /// `omega`. Diodes are open in AC.
    pub fn eval_complex(
        &self,
        solution: &DVector<Complex<f64>>,
        circuit: &Circuit,
        omega: f64,
    ) -> Complex<f64> {
        match &self.getter {
            Getter::Zero | Getter::DiodeCurrent { .. } => Complex::default(),
            Getter::NodeVoltage(row) | Getter::BranchCurrent(row) => {
                phasor_at(Some(*row), solution)
            }
            Getter::ResistorCurrent { pos, neg, resistance } => {
                (phasor_at(*pos, solution) - phasor_at(*neg, solution)) / *resistance
            }
            Getter::CapacitorCurrent { pos, neg, capacitance } => {
                let v = phasor_at(*pos, solution) - phasor_at(*neg, solution);
                v * Complex::new(0.0, omega * capacitance)
            }
            Getter::SourceCurrent { element } => {
                Complex::new(circuit.elements()[*element].value, 0.0)
            }
            Getter::VccsCurrent { ctrl_pos, ctrl_neg, gm } => {
                (phasor_at(*ctrl_pos, solution) - phasor_at(*ctrl_neg, solution)) * *gm
            }
            Getter::CccsCurrent { ctrl_row, gain } => {
                phasor_at(Some(*ctrl_row), solution) * *gain
            }
        }
    }
}

/// Resolve requests to getters. Fails with [`Error::UnknownNode`] /
/// [`Error::UnknownElement`] for names the circuit does not know.
pub fn resolve_probes(
    circuit: &Circuit,
    layout: &MnaLayout,
    requests: &[OutputRequest],
) -> Result<Vec<Probe>> {
    requests
        .iter()
        .map(|request| {
            let getter = match request {
                OutputRequest::Voltage(token) => {
                    let id = circuit
                        .registry()
                        .lookup(token)
                        .ok_or_else(|| Error::UnknownNode(token.clone()))?;
                    if id == GROUND {
                        Getter::Zero
                    } else {
                        match layout.node_row(id) {
                            Some(row) => Getter::NodeVoltage(row),
                            // Known label, but no element references it
                            None => Getter::Zero,
                        }
                    }
                }
                OutputRequest::Current(name) => {
                    let (index, element) = circuit
                        .elements()
                        .iter()
                        .enumerate()
                        .find(|(_, e)| e.name == *name)
                        .ok_or_else(|| Error::UnknownElement(name.clone()))?;

                    if let Some(row) = layout.branch_row(&element.name) {
                        Getter::BranchCurrent(row)
                    } else {
                        let pos = layout.node_row(element.node_pos);
                        let neg = layout.node_row(element.node_neg);
                        match &element.kind {
                            ElementKind::Resistor => Getter::ResistorCurrent {
                                pos,
                                neg,
                                resistance: element.value,
                            },
                            ElementKind::Capacitor => Getter::CapacitorCurrent {
                                pos,
                                neg,
                                capacitance: element.value,
                            },
                            ElementKind::CurrentSource => Getter::SourceCurrent { element: index },
                            ElementKind::Diode { model } => Getter::DiodeCurrent {
                                pos,
                                neg,
                                model: *model,
                            },
                            ElementKind::Vccs { ctrl_pos, ctrl_neg } => Getter::VccsCurrent {
                                ctrl_pos: layout.node_row(*ctrl_pos),
                                ctrl_neg: layout.node_row(*ctrl_neg),
                                gm: element.value,
                            },
                            ElementKind::Cccs { controller } => {
                                let ctrl_row = layout
                                    .branch_row(controller)
                                    .ok_or_else(|| Error::UnknownElement(controller.clone()))?;
                                Getter::CccsCurrent {
                                    ctrl_row,
                                    gain: element.value,
                                }
                            }
                            // All remaining kinds carry a branch row
                            _ => Getter::Zero,
                        }
                    }
                }
            };
            Ok(Probe {
                name: request.to_string(),
                getter,
            })
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use nodal_core::element::Element;
    use nodal_devices::MnaAssembler;

    use crate::linear::solve_dense;

    #[test]
    fn test_resistor_current_from_node_voltages() {
        let mut circuit = Circuit::new();
        let n1 = circuit.registry_mut().resolve("n1").unwrap();
        let n2 = circuit.registry_mut().resolve("n2").unwrap();
        circuit
            .add_element(Element::voltage_source("V1", n1, GROUND, 10.0))
            .unwrap();
        circuit
            .add_element(Element::resistor("R1", n1, n2, 1e3))
            .unwrap();
        circuit
            .add_element(Element::resistor("R2", n2, GROUND, 1e3))
            .unwrap();
        circuit.canonicalize_nodes();
        let layout = MnaLayout::build(&mut circuit).unwrap();
        let assembler = MnaAssembler::new(&circuit, &layout);

        let zero = DVector::zeros(layout.total_unknowns());
        let (a, b) = assembler.assemble(1e12, &zero, &zero, 0.0).into_parts();
        let solution = solve_dense(&a, &b).unwrap();

        let probes = resolve_probes(
            &circuit,
            &layout,
            &[
                OutputRequest::Voltage("n2".into()),
                OutputRequest::Current("R1".into()),
                OutputRequest::Current("V1".into()),
            ],
        )
        .unwrap();

        let ctx = SampleContext {
            solution: &solution,
            prev_step: &zero,
            h: 1e12,
            circuit: &circuit,
        };
        assert!((probes[0].eval(&ctx) - 5.0).abs() < 1e-9);
        assert!((probes[1].eval(&ctx) - 5e-3).abs() < 1e-9);
        assert!((probes[2].eval(&ctx) + 5e-3).abs() < 1e-9, "current into n+");
    }

    #[test]
    fn test_ground_probe_is_zero() {
        let mut circuit = Circuit::new();
        let n1 = circuit.registry_mut().resolve("n1").unwrap();
        circuit
            .add_element(Element::resistor("R1", n1, GROUND, 1e3))
            .unwrap();
        circuit.canonicalize_nodes();
        let layout = MnaLayout::build(&mut circuit).unwrap();

        let probes =
            resolve_probes(&circuit, &layout, &[OutputRequest::Voltage("0".into())]).unwrap();
        let solution = DVector::from_vec(vec![3.3]);
        let ctx = SampleContext {
            solution: &solution,
            prev_step: &solution,
            h: 1.0,
            circuit: &circuit,
        };
        assert_eq!(probes[0].eval(&ctx), 0.0);
    }

    #[test]
    fn test_unknown_names_rejected() {
        let mut circuit = Circuit::new();
        let n1 = circuit.registry_mut().resolve("n1").unwrap();
        circuit
            .add_element(Element::resistor("R1", n1, GROUND, 1e3))
            .unwrap();
        circuit.canonicalize_nodes();
        let layout = MnaLayout::build(&mut circuit).unwrap();

        assert!(matches!(
            resolve_probes(&circuit, &layout, &[OutputRequest::Voltage("nope".into())]),
            Err(Error::UnknownNode(_))
        ));
        assert!(matches!(
            resolve_probes(&circuit, &layout, &[OutputRequest::Current("R9".into())]),
            Err(Error::UnknownElement(_))
        ));
    }
}
