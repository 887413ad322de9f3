//! First-order expansions of vector-valued functions.

use crate::numeric::Real;
use nalgebra::{DMatrix, DVector};

/// Linear approximation `f(x, u) ≈ f + dfdx * dx + dfdu * du` around an operating point.
#[derive(Clone, Debug, Default, PartialEq)]
pub struct VectorFunctionLinearApproximation {
    /// Function value at the operating point
    pub f: DVector<Real>,
    /// Jacobian with respect to the state
    pub dfdx: DMatrix<Real>,
    /// Jacobian with respect to the input
    pub dfdu: DMatrix<Real>,
}

impl VectorFunctionLinearApproximation {
    /// All-zero approximation with `nv` rows, `nx` state columns and `nu` input columns.
    pub fn zeros(nv: usize, nx: usize, nu: usize) -> Self {
        Self {
            f: DVector::zeros(nv),
            dfdx: DMatrix::zeros(nv, nx),
            dfdu: DMatrix::zeros(nv, nu),
        }
    }

    pub fn num_outputs(&self) -> usize {
        self.f.len()
    }

    pub fn num_states(&self) -> usize {
        self.dfdx.ncols()
    }

    pub fn num_inputs(&self) -> usize {
        self.dfdu.ncols()
    }

    /// Evaluates the expansion at `(dx, du)` relative to the operating point.
    pub fn evaluate(&self, dx: &DVector<Real>, du: &DVector<Real>) -> DVector<Real> {
        &self.f + &self.dfdx * dx + &self.dfdu * du
    }
}
