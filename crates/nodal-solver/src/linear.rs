//! Dense linear system solvers.
//!
//! Dense LU with partial pivoting covers the netlists this engine targets
//! (tens to low hundreds of unknowns); a sparse path would not change any
//! observable behavior.

use nalgebra::{DMatrix, DVector};
use num_complex::Complex;

use crate::error::{Error, Result};

/// Solve a real linear system Ax = b using LU decomposition.
pub fn solve_dense(a: &DMatrix<f64>, b: &DVector<f64>) -> Result<DVector<f64>> {
    if a.nrows() != a.ncols() {
        return Err(Error::DimensionMismatch {
            expected: a.nrows(),
            actual: a.ncols(),
        });
    }
    if a.nrows() != b.len() {
        return Err(Error::DimensionMismatch {
            expected: a.nrows(),
            actual: b.len(),
        });
    }

    a.clone().lu().solve(b).ok_or(Error::SingularMatrix)
}

/// Solve a complex linear system Ax = b using LU decomposition.
pub fn solve_complex(
    a: &DMatrix<Complex<f64>>,
    b: &DVector<Complex<f64>>,
) -> Result<DVector<Complex<f64>>> {
    if a.nrows() != a.ncols() {
        return Err(Error::DimensionMismatch {
            expected: a.nrows(),
            actual: a.ncols(),
        });
    }
    if a.nrows() != b.len() {
        return Err(Error::DimensionMismatch {
            expected: a.nrows(),
            actual: b.len(),
        });
    }

    a.clone().lu().solve(b).ok_or(Error::SingularMatrix)
}

#[cfg(test)]
mod tests {
    use super::*;
    use nalgebra::{dmatrix, dvector};

    #[test]
    fn test_solve_simple() {
        // 2x + y = 5
        // x + 3y = 6
        // Solution: x = 1.8, y = 1.4
        let a = dmatrix![2.0, 1.0; 1.0, 3.0];
        let b = dvector![5.0, 6.0];

        let x = solve_dense(&a, &b).unwrap();

        assert!((x[0] - 1.8).abs() < 1e-10);
        assert!((x[1] - 1.4).abs() < 1e-10);
    }

    #[test]
    fn test_singular_matrix() {
        let a = dmatrix![1.0, 2.0; 2.0, 4.0]; // Singular (row 2 = 2 * row 1)
        let b = dvector![1.0, 2.0];

        let result = solve_dense(&a, &b);
        assert!(matches!(result, Err(Error::SingularMatrix)));
    }

    #[test]
    fn test_dimension_mismatch() {
        let a = dmatrix![1.0, 2.0; 3.0, 4.0];
        let b = dvector![1.0, 2.0, 3.0];

        let result = solve_dense(&a, &b);
        assert!(matches!(result, Err(Error::DimensionMismatch { .. })));
    }

    #[test]
    fn test_solve_complex_simple() {
        // (2+i)x + y = 5+i
        // x + (3-i)y = 6
        let a = dmatrix![
            Complex::new(2.0, 1.0), Complex::new(1.0, 0.0);
            Complex::new(1.0, 0.0), Complex::new(3.0, -1.0)
        ];
        let b = dvector![Complex::new(5.0, 1.0), Complex::new(6.0, 0.0)];

        let x = solve_complex(&a, &b).unwrap();

        // Verify by computing Ax and comparing to b
        let ax0 = a[(0, 0)] * x[0] + a[(0, 1)] * x[1];
        let ax1 = a[(1, 0)] * x[0] + a[(1, 1)] * x[1];
        assert!((ax0 - b[0]).norm() < 1e-10, "Ax[0] mismatch");
        assert!((ax1 - b[1]).norm() < 1e-10, "Ax[1] mismatch");
    }

    #[test]
    fn test_solve_complex_singular() {
        let a = dmatrix![
            Complex::new(1.0, 1.0), Complex::new(2.0, 2.0);
            Complex::new(2.0, 2.0), Complex::new(4.0, 4.0)
        ];
        let b = dvector![Complex::new(1.0, 0.0), Complex::new(2.0, 0.0)];

        let result = solve_complex(&a, &b);
        assert!(matches!(result, Err(Error::SingularMatrix)));
    }
}
