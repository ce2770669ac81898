//! Diode linearization for Newton iteration.
//!
//! Exponential junction model with a zener reverse region. The forward
//! voltage used for linearization is clamped at [`VD_MAX`] so exp() cannot
//! overflow during early Newton iterates.

use nalgebra::DVector;
use nodal_core::element::{DiodeModel, Element};
use nodal_core::mna::MnaSystem;

use crate::layout::MnaLayout;

/// Saturation current (A).
pub const IS: f64 = 1e-14;
/// Emission coefficient.
pub const EMISSION: f64 = 1.0;
/// Thermal voltage at room temperature (V).
pub const VT: f64 = 0.025852;
/// Forward-bias limit applied to the Newton linearization point (V).
pub const VD_MAX: f64 = 0.85;
/// Zener breakdown voltage (V).
pub const VZ: f64 = 5.1;

/// Linearize the diode around `vd`, returning (Geq, Ieq) such that the
/// companion current is Geq * Vd + Ieq.
pub fn linearize(vd: f64, model: DiodeModel) -> (f64, f64) {
    if model == DiodeModel::Zener && vd < -VZ {
        // Breakdown region: a stiff 1 S conductance clamps Vd near -Vz
        let geq = 1.0;
        (geq, geq * VZ)
    } else {
        let e = (vd / (EMISSION * VT)).exp();
        let id = IS * (e - 1.0);
        let geq = IS / (EMISSION * VT) * e;
        (geq, id - geq * vd)
    }
}

/// The diode equation evaluated at `vd`, for current probes.
pub fn diode_current(vd: f64, model: DiodeModel) -> f64 {
    if model == DiodeModel::Zener && vd < -VZ {
        vd + VZ
    } else {
        IS * ((vd.min(VD_MAX) / (EMISSION * VT)).exp() - 1.0)
    }
}

/// Stamp the linearized companion: Geq on the node pattern, Ieq on the RHS.
///
/// The linearization point is the diode voltage from the current Newton
/// iterate, clamped at [`VD_MAX`].
pub fn stamp_diode(
    element: &Element,
    model: DiodeModel,
    layout: &MnaLayout,
    mna: &mut MnaSystem,
    guess: &DVector<f64>,
) {
    let pos = layout.node_row(element.node_pos);
    let neg = layout.node_row(element.node_neg);

    let take = |row: Option<usize>| {
        row.filter(|&r| r < guess.len())
            .map(|r| guess[r])
            .unwrap_or(0.0)
    };
    let vd = (take(pos) - take(neg)).min(VD_MAX);
    let (geq, ieq) = linearize(vd, model);

    mna.stamp_conductance(pos, neg, geq);
    mna.stamp_current_source(pos, neg, ieq);
}
