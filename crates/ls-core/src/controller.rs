//! Control policies used for closed-loop evaluation.

use crate::error::{DynamicsError, DynamicsResult};
use crate::numeric::{Real, ensure_len};
use nalgebra::{DMatrix, DVector};

/// A control policy `u = π(t, x)`.
///
/// Controllers are shared read-only between evaluation contexts, hence `Send + Sync`.
pub trait Controller: Send + Sync {
    fn compute_input(&self, t: Real, x: &DVector<Real>) -> DynamicsResult<DVector<Real>>;
}

/// Time-invariant affine feedback `u = K x + l`.
#[derive(Clone, Debug, PartialEq)]
pub struct LinearController {
    gain: DMatrix<Real>,
    bias: DVector<Real>,
}

impl LinearController {
    pub fn new(gain: DMatrix<Real>, bias: DVector<Real>) -> DynamicsResult<Self> {
        if bias.len() != gain.nrows() {
            return Err(DynamicsError::DimensionMismatch {
                what: "controller bias",
                expected: gain.nrows(),
                actual: bias.len(),
            });
        }
        if gain.iter().chain(bias.iter()).any(|v| !v.is_finite()) {
            return Err(DynamicsError::NonFinite {
                what: "controller coefficients",
            });
        }
        Ok(Self { gain, bias })
    }

    /// Open-loop controller that always returns `u`.
    pub fn constant(state_dim: usize, u: DVector<Real>) -> DynamicsResult<Self> {
        Self::new(DMatrix::zeros(u.len(), state_dim), u)
    }

    pub fn state_dim(&self) -> usize {
        self.gain.ncols()
    }

    pub fn input_dim(&self) -> usize {
        self.gain.nrows()
    }
}

impl Controller for LinearController {
    fn compute_input(&self, _t: Real, x: &DVector<Real>) -> DynamicsResult<DVector<Real>> {
        ensure_len(x, self.state_dim(), "controller state")?;
        Ok(&self.gain * x + &self.bias)
    }
}
