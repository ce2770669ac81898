//! Per-kind stamp dispatch.
//!
//! The element set is a tagged variant, so the whole dispatch is one match;
//! the algebra lives in the sibling modules. Stamp functions validate their
//! inputs and warn-skip violations rather than failing: a bad element must
//! not abort the analysis of the rest of the circuit.

use nalgebra::DVector;
use num_complex::Complex;
use nodal_core::element::{Element, ElementKind};
use nodal_core::mna::{ComplexMna, MnaSystem};

use crate::layout::MnaLayout;
use crate::{controlled, diode, passive, sources};

/// Add one element's contribution to the real MNA system.
///
/// `prev_step` is the previous accepted timestep solution (companion-model
/// history); `guess` is the current Newton iterate (nonlinear linearization
/// point); `h` is the timestep.
pub fn stamp(
    element: &Element,
    layout: &MnaLayout,
    mna: &mut MnaSystem,
    prev_step: &DVector<f64>,
    guess: &DVector<f64>,
    h: f64,
) {
    match &element.kind {
        ElementKind::Resistor => passive::stamp_resistor(element, layout, mna),
        ElementKind::Capacitor => passive::stamp_capacitor(element, layout, mna, prev_step, h),
        ElementKind::Inductor => passive::stamp_inductor(element, layout, mna, prev_step, h),
        ElementKind::VoltageSource | ElementKind::Sinusoid(_) | ElementKind::Pulse(_) => {
            sources::stamp_voltage_like(element, layout, mna)
        }
        ElementKind::CurrentSource => sources::stamp_current_source(element, layout, mna),
        ElementKind::Diode { model } => diode::stamp_diode(element, *model, layout, mna, guess),
        ElementKind::Vccs { ctrl_pos, ctrl_neg } => {
            controlled::stamp_vccs(element, *ctrl_pos, *ctrl_neg, layout, mna)
        }
        ElementKind::Vcvs { ctrl_pos, ctrl_neg } => {
            controlled::stamp_vcvs(element, *ctrl_pos, *ctrl_neg, layout, mna)
        }
        ElementKind::Cccs { controller } => {
            controlled::stamp_cccs(element, controller, layout, mna)
        }
        ElementKind::Ccvs { controller } => {
            controlled::stamp_ccvs(element, controller, layout, mna)
        }
    }
}

/// Add one element's contribution to the complex MNA system at `omega`.
///
/// Diodes are treated as open in AC. `phasor_override`, when set, replaces
/// the excitation phasor of a V-like source (phase sweep).
pub fn stamp_ac(
    element: &Element,
    layout: &MnaLayout,
    mna: &mut ComplexMna,
    omega: f64,
    phasor_override: Option<Complex<f64>>,
) {
    match &element.kind {
        ElementKind::Resistor => passive::stamp_resistor_ac(element, layout, mna),
        ElementKind::Capacitor => passive::stamp_capacitor_ac(element, layout, mna, omega),
        ElementKind::Inductor => passive::stamp_inductor_ac(element, layout, mna, omega),
        ElementKind::VoltageSource | ElementKind::Sinusoid(_) | ElementKind::Pulse(_) => {
            sources::stamp_voltage_like_ac(element, layout, mna, phasor_override)
        }
        ElementKind::CurrentSource => sources::stamp_current_source_ac(element, layout, mna),
        ElementKind::Diode { .. } => {} // open in small-signal analysis
        ElementKind::Vccs { ctrl_pos, ctrl_neg } => {
            controlled::stamp_vccs_ac(element, *ctrl_pos, *ctrl_neg, layout, mna)
        }
        ElementKind::Vcvs { ctrl_pos, ctrl_neg } => {
            controlled::stamp_vcvs_ac(element, *ctrl_pos, *ctrl_neg, layout, mna)
        }
        ElementKind::Cccs { controller } => {
            controlled::stamp_cccs_ac(element, controller, layout, mna)
        }
        ElementKind::Ccvs { controller } => {
            controlled::stamp_ccvs_ac(element, controller, layout, mna)
        }
    }
}
