//! Continuous-time linear filter used to shape the system.

use crate::error::{LoopshapingResult, invalid};
use ls_core::Real;
use nalgebra::{DMatrix, DVector};

/// State-space filter
///
/// ```text
/// dx_f/dt = A x_f + B u_f
///     y_f = C x_f + D u_f
/// ```
#[derive(Clone, Debug, PartialEq)]
pub struct Filter {
    a: DMatrix<Real>,
    b: DMatrix<Real>,
    c: DMatrix<Real>,
    d: DMatrix<Real>,
}

impl Filter {
    /// Create a filter, checking that the four matrices have consistent shapes.
    pub fn new(
        a: DMatrix<Real>,
        b: DMatrix<Real>,
        c: DMatrix<Real>,
        d: DMatrix<Real>,
    ) -> LoopshapingResult<Self> {
        let n = a.nrows();
        if n == 0 {
            return Err(invalid("filter must have at least one state"));
        }
        if a.ncols() != n {
            return Err(invalid(format!("filter A must be square, got {}x{}", n, a.ncols())));
        }
        if b.nrows() != n {
            return Err(invalid(format!("filter B must have {} rows, got {}", n, b.nrows())));
        }
        if c.ncols() != n {
            return Err(invalid(format!(
                "filter C must have {} columns, got {}",
                n,
                c.ncols()
            )));
        }
        if d.shape() != (c.nrows(), b.ncols()) {
            return Err(invalid(format!(
                "filter D must be {}x{}, got {}x{}",
                c.nrows(),
                b.ncols(),
                d.nrows(),
                d.ncols()
            )));
        }
        let all = a.iter().chain(b.iter()).chain(c.iter()).chain(d.iter());
        if all.copied().any(|v| !v.is_finite()) {
            return Err(invalid("filter matrices must be finite"));
        }
        Ok(Self { a, b, c, d })
    }

    /// First-order low-pass `1 / (tau s + 1)` on each of `channels` independent channels.
    pub fn low_pass(tau: Real, channels: usize) -> LoopshapingResult<Self> {
        if tau <= 0.0 || !tau.is_finite() {
            return Err(invalid("low-pass time constant must be positive"));
        }
        Self::new(
            DMatrix::identity(channels, channels) * (-1.0 / tau),
            DMatrix::identity(channels, channels) * (1.0 / tau),
            DMatrix::identity(channels, channels),
            DMatrix::zeros(channels, channels),
        )
    }

    pub fn num_states(&self) -> usize {
        self.a.nrows()
    }

    pub fn num_inputs(&self) -> usize {
        self.b.ncols()
    }

    pub fn num_outputs(&self) -> usize {
        self.c.nrows()
    }

    pub fn a(&self) -> &DMatrix<Real> {
        &self.a
    }

    pub fn b(&self) -> &DMatrix<Real> {
        &self.b
    }

    pub fn c(&self) -> &DMatrix<Real> {
        &self.c
    }

    pub fn d(&self) -> &DMatrix<Real> {
        &self.d
    }

    /// `A x_f + B u_f`
    pub fn flow_map(&self, x: &DVector<Real>, u: &DVector<Real>) -> DVector<Real> {
        &self.a * x + &self.b * u
    }

    /// `C x_f + D u_f`
    pub fn output(&self, x: &DVector<Real>, u: &DVector<Real>) -> DVector<Real> {
        &self.c * x + &self.d * u
    }
}
