//! Controlled source stamps: VCCS (G), VCVS (E), CCCS (F), CCVS (H).
//!
//! Current convention: the controlled current flows from node_pos through
//! the source to node_neg. CCCS/CCVS reach their controller's branch row
//! through the layout; the layout has already validated that the controller
//! exists and carries a branch-current unknown.

use num_complex::Complex;
use nodal_core::element::Element;
use nodal_core::mna::{ComplexMna, MnaSystem};

use crate::layout::MnaLayout;

// ────────────────────── VCCS (G element) ──────────────────────

/// Voltage-controlled current source: I(n1 -> n2) = gm * V(c1, c2).
pub fn stamp_vccs(
    element: &Element,
    ctrl_pos: u32,
    ctrl_neg: u32,
    layout: &MnaLayout,
    mna: &mut MnaSystem,
) {
    let pos = layout.node_row(element.node_pos);
    let neg = layout.node_row(element.node_neg);
    let cp = layout.node_row(ctrl_pos);
    let cn = layout.node_row(ctrl_neg);
    let gm = element.value;

    if let Some(i) = pos {
        if let Some(j) = cp {
            mna.add(i, j, gm);
        }
        if let Some(j) = cn {
            mna.sub(i, j, gm);
        }
    }
    if let Some(i) = neg {
        if let Some(j) = cp {
            mna.sub(i, j, gm);
        }
        if let Some(j) = cn {
            mna.add(i, j, gm);
        }
    }
}

// ────────────────────── VCVS (E element) ──────────────────────

/// Voltage-controlled voltage source: V(n1, n2) = gain * V(c1, c2).
///
/// Carries a branch current like an independent voltage source; the branch
/// equation is V(n1) - V(n2) - gain * (V(c1) - V(c2)) = 0.
pub fn stamp_vcvs(
    element: &Element,
    ctrl_pos: u32,
    ctrl_neg: u32,
    layout: &MnaLayout,
    mna: &mut MnaSystem,
) {
    let pos = layout.node_row(element.node_pos);
    let neg = layout.node_row(element.node_neg);
    let cp = layout.node_row(ctrl_pos);
    let cn = layout.node_row(ctrl_neg);
    let Some(k) = layout.branch_row(&element.name) else {
        log::warn!("skipping {}: no branch row assigned", element.name);
        return;
    };
    let gain = element.value;

    if let Some(i) = pos {
        mna.add(i, k, 1.0);
        mna.add(k, i, 1.0);
    }
    if let Some(i) = neg {
        mna.sub(i, k, 1.0);
        mna.sub(k, i, 1.0);
    }
    if let Some(j) = cp {
        mna.sub(k, j, gain);
    }
    if let Some(j) = cn {
        mna.add(k, j, gain);
    }
}

// ────────────────────── CCCS (F element) ──────────────────────

/// Current-controlled current source: I(n1 -> n2) = gain * I(controller).
pub fn stamp_cccs(element: &Element, controller: &str, layout: &MnaLayout, mna: &mut MnaSystem) {
    let pos = layout.node_row(element.node_pos);
    let neg = layout.node_row(element.node_neg);
    let Some(k_ctrl) = layout.branch_row(controller) else {
        log::warn!("skipping {}: unresolved controller {controller}", element.name);
        return;
    };
    let gain = element.value;

    if let Some(i) = pos {
        mna.add(i, k_ctrl, gain);
    }
    if let Some(i) = neg {
        mna.sub(i, k_ctrl, gain);
    }
}

// ────────────────────── CCVS (H element) ──────────────────────

/// Current-controlled voltage source: V(n1, n2) = gain * I(controller).
pub fn stamp_ccvs(element: &Element, controller: &str, layout: &MnaLayout, mna: &mut MnaSystem) {
    let pos = layout.node_row(element.node_pos);
    let neg = layout.node_row(element.node_neg);
    let Some(k) = layout.branch_row(&element.name) else {
        log::warn!("skipping {}: no branch row assigned", element.name);
        return;
    };
    let Some(k_ctrl) = layout.branch_row(controller) else {
        log::warn!("skipping {}: unresolved controller {controller}", element.name);
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
    mna.sub(k, k_ctrl, element.value);
}

// AC variants: the gains are real, so the patterns carry over unchanged.

pub fn stamp_vccs_ac(
    element: &Element,
    ctrl_pos: u32,
    ctrl_neg: u32,
    layout: &MnaLayout,
    mna: &mut ComplexMna,
) {
    let pos = layout.node_row(element.node_pos);
    let neg = layout.node_row(element.node_neg);
    let cp = layout.node_row(ctrl_pos);
    let cn = layout.node_row(ctrl_neg);
    let gm = Complex::new(element.value, 0.0);

    if let Some(i) = pos {
        if let Some(j) = cp {
            mna.add(i, j, gm);
        }
        if let Some(j) = cn {
            mna.sub(i, j, gm);
        }
    }
    if let Some(i) = neg {
        if let Some(j) = cp {
            mna.sub(i, j, gm);
        }
        if let Some(j) = cn {
            mna.add(i, j, gm);
        }
    }
}

pub fn stamp_vcvs_ac(
    element: &Element,
    ctrl_pos: u32,
    ctrl_neg: u32,
    layout: &MnaLayout,
    mna: &mut ComplexMna,
) {
    let pos = layout.node_row(element.node_pos);
    let neg = layout.node_row(element.node_neg);
    let cp = layout.node_row(ctrl_pos);
    let cn = layout.node_row(ctrl_neg);
    let Some(k) = layout.branch_row(&element.name) else {
        log::warn!("skipping {}: no branch row assigned", element.name);
        return;
    };
    let one = Complex::new(1.0, 0.0);
    let gain = Complex::new(element.value, 0.0);

    if let Some(i) = pos {
        mna.add(i, k, one);
        mna.add(k, i, one);
    }
    if let Some(i) = neg {
        mna.sub(i, k, one);
        mna.sub(k, i, one);
    }
    if let Some(j) = cp {
        mna.sub(k, j, gain);
    }
    if let Some(j) = cn {
        mna.add(k, j, gain);
    }
}

pub fn stamp_cccs_ac(element: &Element, controller: &str, layout: &MnaLayout, mna: &mut ComplexMna) {
    let pos = layout.node_row(element.node_pos);
    let neg = layout.node_row(element.node_neg);
    let Some(k_ctrl) = layout.branch_row(controller) else {
        log::warn!("skipping {}: unresolved controller {controller}", element.name);
        return;
    };
    let gain = Complex::new(element.value, 0.0);

    if let Some(i) = pos {
        mna.add(i, k_ctrl, gain);
    }
    if let Some(i) = neg {
        mna.sub(i, k_ctrl, gain);
    }
}

pub fn stamp_ccvs_ac(element: &Element, controller: &str, layout: &MnaLayout, mna: &mut ComplexMna) {
    let pos = layout.node_row(element.node_pos);
    let neg = layout.node_row(element.node_neg);
    let Some(k) = layout.branch_row(&element.name) else {
        log::warn!("skipping {}: no branch row assigned", element.name);
        return;
    };
    let Some(k_ctrl) = layout.branch_row(controller) else {
        log::warn!("skipping {}: unresolved controller {controller}", element.name);
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
    mna.sub(k, k_ctrl, Complex::new(element.value, 0.0));
}

#[cfg(test)]
mod tests {
    use super::*;
    use nodal_core::circuit::Circuit;
    use nodal_core::element::Element;
    use nodal_core::registry::GROUND;

    /// Circuit with V1 between node a and ground so CCCS/CCVS have a valid
    /// controller, plus sense/output nodes.
    fn harness() -> (Circuit, MnaLayout) {
        let mut circuit = Circuit::new();
        let a = circuit.registry_mut().resolve("a").unwrap();
        let b = circuit.registry_mut().resolve("b").unwrap();
        circuit
            .add_element(Element::voltage_source("V1", a, GROUND, 1.0))
            .unwrap();
        circuit
            .add_element(Element::resistor("R1", a, b, 1e3))
            .unwrap();
        circuit
            .add_element(Element::resistor("R2", b, GROUND, 1e3))
            .unwrap();
        circuit.canonicalize_nodes();
        let layout = MnaLayout::build(&mut circuit).unwrap();
        (circuit, layout)
    }

    #[test]
    fn test_vccs_pattern() {
        let (circuit, layout) = harness();
        let a = circuit.registry().lookup("a").unwrap();
        let b = circuit.registry().lookup("b").unwrap();
        let g = Element::vccs("G1", b, GROUND, a, GROUND, 1e-3);

        let mut mna = MnaSystem::new(layout.num_nodes(), layout.num_branches());
        stamp_vccs(&g, a, GROUND, &layout, &mut mna);

        let row_b = layout.node_row(b).unwrap();
        let col_a = layout.node_row(a).unwrap();
        assert!((mna.matrix()[(row_b, col_a)] - 1e-3).abs() < 1e-15);
    }

    #[test]
    fn test_vcvs_branch_equation() {
        let (mut circuit, _) = harness();
        let a = circuit.registry().lookup("a").unwrap();
        let b = circuit.registry().lookup("b").unwrap();
        circuit
            .add_element(Element::vcvs("E1", b, GROUND, a, GROUND, 2.0))
            .unwrap();
        circuit.canonicalize_nodes();
        let layout = MnaLayout::build(&mut circuit).unwrap();

        let mut mna = MnaSystem::new(layout.num_nodes(), layout.num_branches());
        let e1 = circuit.find_element("E1").unwrap();
        stamp_vcvs(e1, a, GROUND, &layout, &mut mna);

        let k = layout.branch_row("E1").unwrap();
        let row_b = layout.node_row(b).unwrap();
        let col_a = layout.node_row(a).unwrap();
        assert_eq!(mna.matrix()[(row_b, k)], 1.0);
        assert_eq!(mna.matrix()[(k, row_b)], 1.0);
        assert_eq!(mna.matrix()[(k, col_a)], -2.0);
    }

    #[test]
    fn test_cccs_couples_to_controller_branch() {
        let (mut circuit, _) = harness();
        let b = circuit.registry().lookup("b").unwrap();
        circuit
            .add_element(Element::cccs("F1", b, GROUND, "V1", 3.0))
            .unwrap();
        circuit.canonicalize_nodes();
        let layout = MnaLayout::build(&mut circuit).unwrap();

        let mut mna = MnaSystem::new(layout.num_nodes(), layout.num_branches());
        let f1 = circuit.find_element("F1").unwrap();
        stamp_cccs(f1, "V1", &layout, &mut mna);

        let row_b = layout.node_row(b).unwrap();
        let k_ctrl = layout.branch_row("V1").unwrap();
        assert_eq!(mna.matrix()[(row_b, k_ctrl)], 3.0);
    }

    #[test]
    fn test_ccvs_couples_both_branches() {
        let (mut circuit, _) = harness();
        let b = circuit.registry().lookup("b").unwrap();
        circuit
            .add_element(Element::ccvs("H1", b, GROUND, "V1", 100.0))
            .unwrap();
        circuit.canonicalize_nodes();
        let layout = MnaLayout::build(&mut circuit).unwrap();

        let mut mna = MnaSystem::new(layout.num_nodes(), layout.num_branches());
        let h1 = circuit.find_element("H1").unwrap();
        stamp_ccvs(h1, "V1", &layout, &mut mna);

        let k = layout.branch_row("H1").unwrap();
        let k_ctrl = layout.branch_row("V1").unwrap();
        let row_b = layout.node_row(b).unwrap();
        assert_eq!(mna.matrix()[(row_b, k)], 1.0);
        assert_eq!(mna.matrix()[(k, row_b)], 1.0);
        assert_eq!(mna.matrix()[(k, k_ctrl)], -100.0);
    }
}
