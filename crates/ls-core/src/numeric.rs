use crate::DynamicsError;
use nalgebra::{DMatrix, DVector};

/// Floating point type used throughout system
pub type Real = f64;

/// One tolerance for everything
#[derive(Clone, Copy, Debug)]
pub struct Tolerances {
    pub abs: Real,
    pub rel: Real,
}

impl Default for Tolerances {
    fn default() -> Self {
        Self {
            abs: 1e-12,
            rel: 1e-9,
        }
    }
}

pub fn nearly_equal(a: Real, b: Real, tol: Tolerances) -> bool {
    let diff = (a - b).abs();
    if diff <= tol.abs {
        return true;
    }
    diff <= tol.rel * a.abs().max(b.abs())
}

/// Element-wise [`nearly_equal`] over two vectors of the same length.
pub fn vectors_nearly_equal(a: &DVector<Real>, b: &DVector<Real>, tol: Tolerances) -> bool {
    a.len() == b.len() && a.iter().zip(b.iter()).all(|(&x, &y)| nearly_equal(x, y, tol))
}

/// Element-wise [`nearly_equal`] over two matrices of the same shape.
pub fn matrices_nearly_equal(a: &DMatrix<Real>, b: &DMatrix<Real>, tol: Tolerances) -> bool {
    a.shape() == b.shape() && a.iter().zip(b.iter()).all(|(&x, &y)| nearly_equal(x, y, tol))
}

pub fn ensure_finite(v: &DVector<Real>, what: &'static str) -> Result<(), DynamicsError> {
    if v.iter().all(|x| x.is_finite()) {
        Ok(())
    } else {
        Err(DynamicsError::NonFinite { what })
    }
}

pub fn ensure_len(v: &DVector<Real>, expected: usize, what: &'static str) -> Result<(), DynamicsError> {
    if v.len() == expected {
        Ok(())
    } else {
        Err(DynamicsError::DimensionMismatch {
            what,
            expected,
            actual: v.len(),
        })
    }
}

/// Stacks `top` over `bottom`.
pub fn concatenate(top: &DVector<Real>, bottom: &DVector<Real>) -> DVector<Real> {
    let mut out = DVector::zeros(top.len() + bottom.len());
    out.rows_mut(0, top.len()).copy_from(top);
    out.rows_mut(top.len(), bottom.len()).copy_from(bottom);
    out
}
