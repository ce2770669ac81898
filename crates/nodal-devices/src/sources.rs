//! Stamps for independent sources: V, I, and the time-varying V-like
//! sources (sinusoid, pulse).
//!
//! V-like sources carry a branch-current unknown; their cached instantaneous
//! value (refreshed by `Circuit::update_time_dependent_sources`) lands on
//! the branch equation's right-hand side.

use num_complex::Complex;
use nodal_core::element::{Element, ElementKind};
use nodal_core::mna::{ComplexMna, MnaSystem};

use crate::layout::MnaLayout;

/// Independent voltage source (and sinusoid/pulse): branch coupling plus the
/// voltage constraint V(n1) - V(n2) = value.
pub fn stamp_voltage_like(element: &Element, layout: &MnaLayout, mna: &mut MnaSystem) {
    let pos = layout.node_row(element.node_pos);
    let neg = layout.node_row(element.node_neg);
    let Some(k) = layout.branch_row(&element.name) else {
        log::warn!("skipping {}: no branch row assigned", element.name);
        return;
    };

    if let Some(i) = pos {
        mna.add(i, k, 1.0);
        mna.add(k, i, 1.0);
    }
    if let Some(i) = neg {
        mna.sub(i, k, 1.0);
        mna.sub(k, i, 1.0);
    }
    mna.add_rhs(k, element.value);
}

/// Independent current source: value amperes from node_pos, through the
/// source, into node_neg.
pub fn stamp_current_source(element: &Element, layout: &MnaLayout, mna: &mut MnaSystem) {
    let pos = layout.node_row(element.node_pos);
    let neg = layout.node_row(element.node_neg);
    mna.stamp_current_source(pos, neg, element.value);
}

/// The small-signal excitation phasor of a V-like source.
///
/// Sinusoids excite with amplitude and phase; plain and pulse sources with
/// their present value.
pub fn excitation_phasor(element: &Element) -> Complex<f64> {
    match &element.kind {
        ElementKind::Sinusoid(params) => Complex::from_polar(params.amplitude, params.phase),
        _ => Complex::new(element.value, 0.0),
    }
}

/// V-like source in AC: same coupling, phasor excitation on the RHS.
pub fn stamp_voltage_like_ac(
    element: &Element,
    layout: &MnaLayout,
    mna: &mut ComplexMna,
    phasor_override: Option<Complex<f64>>,
) {
    let pos = layout.node_row(element.node_pos);
    let neg = layout.node_row(element.node_neg);
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
    mna.add_rhs(k, phasor_override.unwrap_or_else(|| excitation_phasor(element)));
}

/// Current source in AC: its value as a real phasor on the node rows.
pub fn stamp_current_source_ac(element: &Element, layout: &MnaLayout, mna: &mut ComplexMna) {
    let pos = layout.node_row(element.node_pos);
    let neg = layout.node_row(element.node_neg);
    mna.stamp_current_source(pos, neg, Complex::new(element.value, 0.0));
}
