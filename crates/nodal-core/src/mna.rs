//! Dense MNA matrix containers.
//!
//! One generic container serves both the real (DC/transient) and complex
//! (AC) analysis paths. Rows/columns 0..N-1 are non-ground node equations,
//! rows N..N+M-1 are the branch equations of extra-variable elements. Stamp
//! helpers take `Option<usize>` rows, with `None` standing for ground
//! (skipped).

use nalgebra::{DMatrix, DVector, Scalar};
use num_complex::Complex;
use num_traits::Zero;
use std::ops::{AddAssign, SubAssign};

/// A dense MNA system: matrix A and right-hand side b.
#[derive(Debug, Clone)]
pub struct MnaMatrix<T: Scalar + Zero> {
    num_nodes: usize,
    num_branches: usize,
    a: DMatrix<T>,
    b: DVector<T>,
}

/// The real MNA system used by DC and transient analysis.
pub type MnaSystem = MnaMatrix<f64>;

/// The complex MNA system used by AC analysis.
pub type ComplexMna = MnaMatrix<Complex<f64>>;

impl<T> MnaMatrix<T>
where
    T: Scalar + Zero + Copy + AddAssign + SubAssign,
{
    /// Create a zeroed system with `num_nodes` node rows and `num_branches`
    /// branch rows.
    pub fn new(num_nodes: usize, num_branches: usize) -> Self {
        let size = num_nodes + num_branches;
        Self {
            num_nodes,
            num_branches,
            a: DMatrix::zeros(size, size),
            b: DVector::zeros(size),
        }
    }

    pub fn size(&self) -> usize {
        self.num_nodes + self.num_branches
    }

    pub fn num_nodes(&self) -> usize {
        self.num_nodes
    }

    pub fn num_branches(&self) -> usize {
        self.num_branches
    }

    pub fn matrix(&self) -> &DMatrix<T> {
        &self.a
    }

    pub fn rhs(&self) -> &DVector<T> {
        &self.b
    }

    /// Add into a matrix entry.
    pub fn add(&mut self, row: usize, col: usize, value: T) {
        self.a[(row, col)] += value;
    }

    /// Subtract from a matrix entry.
    pub fn sub(&mut self, row: usize, col: usize, value: T) {
        self.a[(row, col)] -= value;
    }

    /// Add into a right-hand-side entry.
    pub fn add_rhs(&mut self, row: usize, value: T) {
        self.b[row] += value;
    }

    /// Subtract from a right-hand-side entry.
    pub fn sub_rhs(&mut self, row: usize, value: T) {
        self.b[row] -= value;
    }

    /// Stamp a conductance between two nodes (the standard four-entry
    /// pattern; ground entries are skipped).
    pub fn stamp_conductance(&mut self, pos: Option<usize>, neg: Option<usize>, g: T) {
        if let Some(i) = pos {
            self.a[(i, i)] += g;
        }
        if let Some(i) = neg {
            self.a[(i, i)] += g;
        }
        if let (Some(i), Some(j)) = (pos, neg) {
            self.a[(i, j)] -= g;
            self.a[(j, i)] -= g;
        }
    }

    /// Stamp a current source driving `current` out of `from` and into `to`.
    pub fn stamp_current_source(&mut self, from: Option<usize>, to: Option<usize>, current: T) {
        if let Some(i) = from {
            self.b[i] -= current;
        }
        if let Some(i) = to {
            self.b[i] += current;
        }
    }

    /// Add a small conductance to ground on every node row, regularizing
    /// systems with floating nodes.
    pub fn add_gmin(&mut self, gmin: T) {
        for i in 0..self.num_nodes {
            self.a[(i, i)] += gmin;
        }
    }

    pub fn into_parts(self) -> (DMatrix<T>, DVector<T>) {
        (self.a, self.b)
    }

    pub fn parts(&self) -> (&DMatrix<T>, &DVector<T>) {
        (&self.a, &self.b)
    }
}
