//! The hybrid system collaborator: flow map, jump map and guard surfaces.

use crate::approximation::VectorFunctionLinearApproximation;
use crate::error::DynamicsResult;
use crate::numeric::Real;
use nalgebra::{DMatrix, DVector};

/// Per-evaluation cache owned by a system.
///
/// A solver requests the cache once per operating point; the system then reads
/// whatever it stored while evaluating flow maps, jump maps and their expansions
/// at that point. Both hooks default to doing nothing.
pub trait PreComputation: Clone + Send + Sync {
    /// Prepare for flow-map evaluations at `(t, x, u)`.
    fn request(&mut self, _t: Real, _x: &DVector<Real>, _u: &DVector<Real>) {}

    /// Prepare for jump-map evaluations at `(t, x)`.
    fn request_pre_jump(&mut self, _t: Real, _x: &DVector<Real>) {}
}

/// Cache for systems that have nothing to precompute.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct NoPreComputation;

impl PreComputation for NoPreComputation {}

/// Hybrid dynamical system expressed in its own state and input coordinates.
///
/// Implementors provide the continuous flow map and its expansion. Jump maps,
/// guard surfaces and time derivatives have defaults matching a system that
/// never jumps and never triggers an event:
/// - jump map: identity
/// - guard surfaces: the constant `[-1]`
/// - time derivatives: zero
///
/// Systems are `Clone` so that every evaluation thread can own an independent copy.
pub trait SystemDynamics: Clone + Send + Sync {
    /// Cache type requested before each evaluation.
    type PreComp: PreComputation;

    /// Number of states.
    fn state_dim(&self) -> usize;

    /// Number of inputs.
    fn input_dim(&self) -> usize;

    /// Fresh cache for this system.
    fn pre_computation(&self) -> Self::PreComp;

    /// State derivative `dx/dt = f(t, x, u)`.
    fn flow_map(
        &self,
        t: Real,
        x: &DVector<Real>,
        u: &DVector<Real>,
        pre: &Self::PreComp,
    ) -> DynamicsResult<DVector<Real>>;

    /// First-order expansion of [`SystemDynamics::flow_map`] around `(x, u)`.
    fn flow_map_linear_approximation(
        &self,
        t: Real,
        x: &DVector<Real>,
        u: &DVector<Real>,
        pre: &Self::PreComp,
    ) -> DynamicsResult<VectorFunctionLinearApproximation>;

    /// State right after a transition at `(t, x)`.
    fn jump_map(
        &self,
        _t: Real,
        x: &DVector<Real>,
        _pre: &Self::PreComp,
    ) -> DynamicsResult<DVector<Real>> {
        Ok(x.clone())
    }

    /// First-order expansion of [`SystemDynamics::jump_map`]. Jumps take no input,
    /// so `dfdu` always has zero columns.
    fn jump_map_linear_approximation(
        &self,
        t: Real,
        x: &DVector<Real>,
        pre: &Self::PreComp,
    ) -> DynamicsResult<VectorFunctionLinearApproximation> {
        let f = self.jump_map(t, x, pre)?;
        Ok(VectorFunctionLinearApproximation {
            dfdx: DMatrix::identity(f.len(), x.len()),
            dfdu: DMatrix::zeros(f.len(), 0),
            f,
        })
    }

    /// Guard surfaces; a transition fires when one of them crosses zero.
    fn guard_surfaces(&self, _t: Real, _x: &DVector<Real>) -> DynamicsResult<DVector<Real>> {
        Ok(DVector::from_element(1, -1.0))
    }

    fn guard_surfaces_linear_approximation(
        &self,
        t: Real,
        x: &DVector<Real>,
        u: &DVector<Real>,
    ) -> DynamicsResult<VectorFunctionLinearApproximation> {
        let f = self.guard_surfaces(t, x)?;
        Ok(VectorFunctionLinearApproximation {
            dfdx: DMatrix::zeros(f.len(), x.len()),
            dfdu: DMatrix::zeros(f.len(), u.len()),
            f,
        })
    }

    fn flow_map_derivative_time(
        &self,
        _t: Real,
        x: &DVector<Real>,
        _u: &DVector<Real>,
    ) -> DynamicsResult<DVector<Real>> {
        Ok(DVector::zeros(x.len()))
    }

    fn jump_map_derivative_time(
        &self,
        _t: Real,
        x: &DVector<Real>,
        _u: &DVector<Real>,
    ) -> DynamicsResult<DVector<Real>> {
        Ok(DVector::zeros(x.len()))
    }

    fn guard_surfaces_derivative_time(
        &self,
        t: Real,
        x: &DVector<Real>,
        _u: &DVector<Real>,
    ) -> DynamicsResult<DVector<Real>> {
        let g = self.guard_surfaces(t, x)?;
        Ok(DVector::zeros(g.len()))
    }
}
