//! Unknown-vector layout and full-system assembly.
//!
//! Rows 0..N-1 are the non-ground node voltages in ascending id order; rows
//! N..N+M-1 are the branch currents of extra-variable elements in insertion
//! order. The layout is deterministic for identical circuit snapshots and is
//! invalidated by any structural mutation.

use std::collections::{BTreeMap, HashMap};

use nalgebra::DVector;
use num_complex::Complex;
use nodal_core::circuit::Circuit;
use nodal_core::element::ElementKind;
use nodal_core::mna::{ComplexMna, MnaSystem};
use nodal_core::registry::GROUND;

use crate::error::{Error, Result};
use crate::stamp;

/// Row assignment for one circuit snapshot.
#[derive(Debug, Clone)]
pub struct MnaLayout {
    node_rows: BTreeMap<u32, usize>,
    branch_rows: HashMap<String, usize>,
    num_nodes: usize,
    num_branches: usize,
}

impl MnaLayout {
    /// Lay out the unknown vector for a canonicalized circuit.
    ///
    /// Writes each extra-variable element's `extra_index` back into the
    /// circuit and resolves CCCS/CCVS controller names, failing with
    /// [`Error::UnresolvedController`] when a controller is missing or does
    /// not introduce a branch current.
    pub fn build(circuit: &mut Circuit) -> Result<Self> {
        let node_rows: BTreeMap<u32, usize> = circuit
            .referenced_nodes()
            .into_iter()
            .filter(|&id| id != GROUND)
            .enumerate()
            .map(|(row, id)| (id, row))
            .collect();
        let num_nodes = node_rows.len();

        let mut branch_rows = HashMap::new();
        let mut next = 0usize;
        for element in circuit.elements_mut() {
            if element.introduces_extra_variable() {
                element.extra_index = Some(next);
                branch_rows.insert(element.name.clone(), num_nodes + next);
                next += 1;
            } else {
                element.extra_index = None;
            }
        }

        for element in circuit.elements() {
            if let ElementKind::Cccs { controller } | ElementKind::Ccvs { controller } =
                &element.kind
            {
                if !branch_rows.contains_key(controller) {
                    return Err(Error::UnresolvedController {
                        element: element.name.clone(),
                        controller: controller.clone(),
                    });
                }
            }
        }

        Ok(Self {
            node_rows,
            branch_rows,
            num_nodes,
            num_branches: next,
        })
    }

    /// Matrix row of a node voltage; `None` for ground or unknown ids.
    pub fn node_row(&self, id: u32) -> Option<usize> {
        self.node_rows.get(&id).copied()
    }

    /// Matrix row of an element's branch current, if it has one.
    pub fn branch_row(&self, name: &str) -> Option<usize> {
        self.branch_rows.get(name).copied()
    }

    pub fn num_nodes(&self) -> usize {
        self.num_nodes
    }

    pub fn num_branches(&self) -> usize {
        self.num_branches
    }

    pub fn total_unknowns(&self) -> usize {
        self.num_nodes + self.num_branches
    }

    /// Node ids with their rows, in row order.
    pub fn node_ids(&self) -> impl Iterator<Item = (u32, usize)> + '_ {
        self.node_rows.iter().map(|(&id, &row)| (id, row))
    }
}

/// Assembles MNA systems for a circuit snapshot under a fixed layout.
pub struct MnaAssembler<'a> {
    circuit: &'a Circuit,
    layout: &'a MnaLayout,
}

impl<'a> MnaAssembler<'a> {
    pub fn new(circuit: &'a Circuit, layout: &'a MnaLayout) -> Self {
        Self { circuit, layout }
    }

    pub fn circuit(&self) -> &Circuit {
        self.circuit
    }

    pub fn layout(&self) -> &MnaLayout {
        self.layout
    }

    /// Assemble the real system at timestep `h`.
    ///
    /// `prev_step` is the solution of the previous accepted timestep
    /// (companion-model history); `guess` is the current Newton iterate
    /// (diode linearization point). They coincide for the first iteration
    /// and for linear circuits. A positive `gmin` adds a conductance to
    /// ground on every node row.
    pub fn assemble(
        &self,
        h: f64,
        prev_step: &DVector<f64>,
        guess: &DVector<f64>,
        gmin: f64,
    ) -> MnaSystem {
        let mut mna = MnaSystem::new(self.layout.num_nodes(), self.layout.num_branches());
        for element in self.circuit.elements() {
            stamp::stamp(element, self.layout, &mut mna, prev_step, guess, h);
        }
        if gmin > 0.0 {
            mna.add_gmin(gmin);
        }
        mna
    }

    /// Assemble the complex system at angular frequency `omega`.
    pub fn assemble_complex(&self, omega: f64, gmin: f64) -> ComplexMna {
        self.assemble_complex_with_override(omega, gmin, None)
    }

    /// Assemble the complex system, replacing the excitation phasor of one
    /// named V-like source (used by the phase sweep).
    pub fn assemble_complex_with_override(
        &self,
        omega: f64,
        gmin: f64,
        phasor_override: Option<(&str, Complex<f64>)>,
    ) -> ComplexMna {
        let mut mna = ComplexMna::new(self.layout.num_nodes(), self.layout.num_branches());
        for element in self.circuit.elements() {
            let phasor = match phasor_override {
                Some((name, phasor)) if name == element.name => Some(phasor),
                _ => None,
            };
            stamp::stamp_ac(element, self.layout, &mut mna, omega, phasor);
        }
        if gmin > 0.0 {
            mna.add_gmin(Complex::new(gmin, 0.0));
        }
        mna
    }
}
