//! Stamps for passive elements: R, C, L.

use nalgebra::DVector;
use num_complex::Complex;
use nodal_core::element::Element;
use nodal_core::mna::{ComplexMna, MnaSystem};

use crate::layout::MnaLayout;

fn node_rows(element: &Element, layout: &MnaLayout) -> (Option<usize>, Option<usize>) {
    (
        layout.node_row(element.node_pos),
        layout.node_row(element.node_neg),
    )
}

fn voltage_across(
    pos: Option<usize>,
    neg: Option<usize>,
    solution: &DVector<f64>,
) -> f64 {
    let take = |row: Option<usize>| {
        row.filter(|&r| r < solution.len())
            .map(|r| solution[r])
            .unwrap_or(0.0)
    };
    take(pos) - take(neg)
}

/// Resistor: the four-entry conductance pattern, G = 1/R.
pub fn stamp_resistor(element: &Element, layout: &MnaLayout, mna: &mut MnaSystem) {
    if element.value <= 0.0 {
        log::warn!("skipping {}: non-positive resistance", element.name);
        return;
    }
    let (pos, neg) = node_rows(element, layout);
    mna.stamp_conductance(pos, neg, 1.0 / element.value);
}

/// Capacitor under backward Euler: Geq = C/h in parallel with a current
/// source Geq * V(n), where V(n) is the previous-timestep voltage.
pub fn stamp_capacitor(
    element: &Element,
    layout: &MnaLayout,
    mna: &mut MnaSystem,
    prev_step: &DVector<f64>,
    h: f64,
) {
    if element.value <= 0.0 {
        log::warn!("skipping {}: non-positive capacitance", element.name);
        return;
    }
    if h <= 0.0 {
        log::warn!("skipping {}: non-positive timestep", element.name);
        return;
    }
    let (pos, neg) = node_rows(element, layout);
    let geq = element.value / h;
    let ieq = geq * voltage_across(pos, neg, prev_step);

    mna.stamp_conductance(pos, neg, geq);
    // The history current charges the positive node
    mna.stamp_current_source(neg, pos, ieq);
}

/// Inductor under backward Euler, keeping its branch-current unknown:
/// V(n1) - V(n2) - (L/h) I(n+1) = -(L/h) I(n).
pub fn stamp_inductor(
    element: &Element,
    layout: &MnaLayout,
    mna: &mut MnaSystem,
    prev_step: &DVector<f64>,
    h: f64,
) {
    if element.value <= 0.0 {
        log::warn!("skipping {}: non-positive inductance", element.name);
        return;
    }
    if h <= 0.0 {
        log::warn!("skipping {}: non-positive timestep", element.name);
        return;
    }
    let (pos, neg) = node_rows(element, layout);
    let Some(k) = layout.branch_row(&element.name) else {
        log::warn!("skipping {}: no branch row assigned", element.name);
        return;
    };

    // KCL coupling: branch current leaves node_pos, enters node_neg
    if let Some(i) = pos {
        mna.add(i, k, 1.0);
        mna.add(k, i, 1.0);
    }
    if let Some(i) = neg {
        mna.sub(i, k, 1.0);
        mna.sub(k, i, 1.0);
    }

    let l_over_h = element.value / h;
    mna.sub(k, k, l_over_h);

    let i_prev = if k < prev_step.len() { prev_step[k] } else { 0.0 };
    mna.sub_rhs(k, l_over_h * i_prev);
}

/// Resistor in AC: the same pattern with Y = 1/R.
pub fn stamp_resistor_ac(element: &Element, layout: &MnaLayout, mna: &mut ComplexMna) {
    if element.value <= 0.0 {
        log::warn!("skipping {}: non-positive resistance", element.name);
        return;
    }
    let (pos, neg) = node_rows(element, layout);
    mna.stamp_conductance(pos, neg, Complex::new(1.0 / element.value, 0.0));
}

/// Capacitor in AC: admittance Y = j*omega*C.
pub fn stamp_capacitor_ac(
    element: &Element,
    layout: &MnaLayout,
    mna: &mut ComplexMna,
    omega: f64,
) {
    if element.value <= 0.0 {
        log::warn!("skipping {}: non-positive capacitance", element.name);
        return;
    }
    let (pos, neg) = node_rows(element, layout);
    mna.stamp_conductance(pos, neg, Complex::new(0.0, omega * element.value));
}

/// Inductor in AC, in branch form: V(n1) - V(n2) - j*omega*L * I = 0.
///
/// Equivalent to the admittance 1/(j*omega*L) but keeps the branch row
/// non-singular and the branch phasor observable; omega = 0 degenerates to
/// the DC short.
pub fn stamp_inductor_ac(
    element: &Element,
    layout: &MnaLayout,
    mna: &mut ComplexMna,
    omega: f64,
) {
    if element.value <= 0.0 {
        log::warn!("skipping {}: non-positive inductance", element.name);
        return;
    }
    let (pos, neg) = node_rows(element, layout);
    let Some(k) = layout.branch_row(&element.name) else {
        log::warn!("skipping {}: no branch row assigned", element.name);
        return;
    };

    let one = Complex::new(1.0, 0.0);
    if let Some(i) = pos {
        mna.add(i, k, one);
        mna.add(k, i, one);
    }
    if let Some(i) = neg {
        mna.sub(i, k, one);
        mna.sub(k, i, one);
    }
    mna.sub(k, k, Complex::new(0.0, omega * element.value));
}
