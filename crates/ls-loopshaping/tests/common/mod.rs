//! Shared test systems and helpers.
#![allow(dead_code)]

use ls_core::{
    DynamicsError, DynamicsResult, NoPreComputation, PreComputation, Real, SystemDynamics,
    VectorFunctionLinearApproximation,
};
use ls_loopshaping::{Filter, LoopshapingDefinition, LoopshapingDynamics, LoopshapingType};
use nalgebra::{DMatrix, DVector};
use std::sync::Arc;

pub fn vec(v: &[Real]) -> DVector<Real> {
    DVector::from_row_slice(v)
}

pub fn mat(rows: usize, cols: usize, v: &[Real]) -> DMatrix<Real> {
    DMatrix::from_row_slice(rows, cols, v)
}

/// Cache that remembers the last system-space operating point it was asked for.
#[derive(Clone, Debug, Default)]
pub struct BallPreComp {
    pub flow: Option<(Real, DVector<Real>, DVector<Real>)>,
    pub jump: Option<(Real, DVector<Real>)>,
}

impl PreComputation for BallPreComp {
    fn request(&mut self, t: Real, x: &DVector<Real>, u: &DVector<Real>) {
        self.flow = Some((t, x.clone(), u.clone()));
    }

    fn request_pre_jump(&mut self, t: Real, x: &DVector<Real>) {
        self.jump = Some((t, x.clone()));
    }
}

/// Thrust-controlled bouncing ball, `x = [height, velocity]`, one input per thruster.
///
/// - flow: `[v, sum(u) - g + wind * t]`
/// - jump: `[h, -restitution * v]`
/// - guard: `[h]`
///
/// Evaluations fail if the cache was not requested for the same point.
#[derive(Clone, Debug)]
pub struct BouncingBall {
    pub gravity: Real,
    pub restitution: Real,
    pub wind: Real,
    pub thrusters: usize,
}

impl Default for BouncingBall {
    fn default() -> Self {
        Self {
            gravity: 9.81,
            restitution: 0.8,
            wind: 0.1,
            thrusters: 1,
        }
    }
}

impl BouncingBall {
    fn check_flow(&self, x: &DVector<Real>, u: &DVector<Real>, pre: &BallPreComp) -> DynamicsResult<()> {
        match &pre.flow {
            Some((_, px, pu)) if px == x && pu == u => Ok(()),
            _ => Err(DynamicsError::System {
                what: "ball cache does not match the flow evaluation".to_string(),
            }),
        }
    }

    fn check_jump(&self, x: &DVector<Real>, pre: &BallPreComp) -> DynamicsResult<()> {
        match &pre.jump {
            Some((_, px)) if px == x => Ok(()),
            _ => Err(DynamicsError::System {
                what: "ball cache does not match the jump evaluation".to_string(),
            }),
        }
    }
}

impl SystemDynamics for BouncingBall {
    type PreComp = BallPreComp;

    fn state_dim(&self) -> usize {
        2
    }

    fn input_dim(&self) -> usize {
        self.thrusters
    }

    fn pre_computation(&self) -> BallPreComp {
        BallPreComp::default()
    }

    fn flow_map(
        &self,
        t: Real,
        x: &DVector<Real>,
        u: &DVector<Real>,
        pre: &BallPreComp,
    ) -> DynamicsResult<DVector<Real>> {
        self.check_flow(x, u, pre)?;
        Ok(vec(&[x[1], u.sum() - self.gravity + self.wind * t]))
    }

    fn flow_map_linear_approximation(
        &self,
        t: Real,
        x: &DVector<Real>,
        u: &DVector<Real>,
        pre: &BallPreComp,
    ) -> DynamicsResult<VectorFunctionLinearApproximation> {
        Ok(VectorFunctionLinearApproximation {
            f: self.flow_map(t, x, u, pre)?,
            dfdx: mat(2, 2, &[0.0, 1.0, 0.0, 0.0]),
            dfdu: DMatrix::from_fn(2, self.thrusters, |r, _| if r == 1 { 1.0 } else { 0.0 }),
        })
    }

    fn jump_map(&self, _t: Real, x: &DVector<Real>, pre: &BallPreComp) -> DynamicsResult<DVector<Real>> {
        self.check_jump(x, pre)?;
        Ok(vec(&[x[0], -self.restitution * x[1]]))
    }

    fn jump_map_linear_approximation(
        &self,
        t: Real,
        x: &DVector<Real>,
        pre: &BallPreComp,
    ) -> DynamicsResult<VectorFunctionLinearApproximation> {
        Ok(VectorFunctionLinearApproximation {
            f: self.jump_map(t, x, pre)?,
            dfdx: mat(2, 2, &[1.0, 0.0, 0.0, -self.restitution]),
            dfdu: DMatrix::zeros(2, 0),
        })
    }

    fn guard_surfaces(&self, _t: Real, x: &DVector<Real>) -> DynamicsResult<DVector<Real>> {
        Ok(vec(&[x[0]]))
    }

    fn flow_map_derivative_time(
        &self,
        _t: Real,
        _x: &DVector<Real>,
        _u: &DVector<Real>,
    ) -> DynamicsResult<DVector<Real>> {
        Ok(vec(&[0.0, self.wind]))
    }
}

/// Cart with quadratic drag and two force inputs, `x = [p, v]`.
///
/// flow: `[v, f1 + 2 f2 - drag v^2]`
#[derive(Clone, Debug)]
pub struct DragCart {
    pub drag: Real,
}

impl SystemDynamics for DragCart {
    type PreComp = NoPreComputation;

    fn state_dim(&self) -> usize {
        2
    }

    fn input_dim(&self) -> usize {
        2
    }

    fn pre_computation(&self) -> NoPreComputation {
        NoPreComputation
    }

    fn flow_map(
        &self,
        _t: Real,
        x: &DVector<Real>,
        u: &DVector<Real>,
        _pre: &NoPreComputation,
    ) -> DynamicsResult<DVector<Real>> {
        Ok(vec(&[x[1], u[0] + 2.0 * u[1] - self.drag * x[1] * x[1]]))
    }

    fn flow_map_linear_approximation(
        &self,
        t: Real,
        x: &DVector<Real>,
        u: &DVector<Real>,
        pre: &NoPreComputation,
    ) -> DynamicsResult<VectorFunctionLinearApproximation> {
        Ok(VectorFunctionLinearApproximation {
            f: self.flow_map(t, x, u, pre)?,
            dfdx: mat(2, 2, &[0.0, 1.0, 0.0, -2.0 * self.drag * x[1]]),
            dfdu: mat(2, 2, &[0.0, 0.0, 1.0, 2.0]),
        })
    }
}

/// `dx/dt = sqrt(x) + u`, undefined for negative `x`.
#[derive(Clone, Debug)]
pub struct SqrtSystem;

impl SystemDynamics for SqrtSystem {
    type PreComp = NoPreComputation;

    fn state_dim(&self) -> usize {
        1
    }

    fn input_dim(&self) -> usize {
        1
    }

    fn pre_computation(&self) -> NoPreComputation {
        NoPreComputation
    }

    fn flow_map(
        &self,
        _t: Real,
        x: &DVector<Real>,
        u: &DVector<Real>,
        _pre: &NoPreComputation,
    ) -> DynamicsResult<DVector<Real>> {
        if x[0] < 0.0 {
            return Err(DynamicsError::System {
                what: "sqrt of negative state".to_string(),
            });
        }
        Ok(vec(&[x[0].sqrt() + u[0]]))
    }

    fn flow_map_linear_approximation(
        &self,
        t: Real,
        x: &DVector<Real>,
        u: &DVector<Real>,
        pre: &NoPreComputation,
    ) -> DynamicsResult<VectorFunctionLinearApproximation> {
        let f = self.flow_map(t, x, u, pre)?;
        Ok(VectorFunctionLinearApproximation {
            f,
            dfdx: mat(1, 1, &[0.5 / x[0].sqrt()]),
            dfdu: mat(1, 1, &[1.0]),
        })
    }
}

/// Pure integrator filter `dx_f/dt = u_f`, `y = x_f`.
pub fn integrator_filter() -> Filter {
    Filter::new(mat(1, 1, &[0.0]), mat(1, 1, &[1.0]), mat(1, 1, &[1.0]), mat(1, 1, &[0.0])).unwrap()
}

/// Two-state filter with full matrices, one input and one output.
pub fn second_order_filter(feedthrough: Real) -> Filter {
    Filter::new(
        mat(2, 2, &[-1.0, 0.5, -0.25, -2.0]),
        mat(2, 1, &[1.0, 3.0]),
        mat(1, 2, &[2.0, -1.0]),
        mat(1, 1, &[feedthrough]),
    )
    .unwrap()
}

pub fn definition(pattern: LoopshapingType, filter: Filter) -> Arc<LoopshapingDefinition> {
    Arc::new(LoopshapingDefinition::new(pattern, filter).unwrap())
}

pub fn ball_with(pattern: LoopshapingType, filter: Filter) -> LoopshapingDynamics<BouncingBall> {
    LoopshapingDynamics::create(&BouncingBall::default(), definition(pattern, filter)).unwrap()
}

/// Ball for any pattern. The eliminate pattern gets a second thruster and
/// replaces it by the filter output, so `filter` must have no feedthrough.
pub fn ball_for(pattern: LoopshapingType, filter: Filter) -> LoopshapingDynamics<BouncingBall> {
    match pattern {
        LoopshapingType::EliminatePattern => {
            let ball = BouncingBall {
                thrusters: 2,
                ..BouncingBall::default()
            };
            let def = LoopshapingDefinition::eliminate(filter, vec![1]).unwrap();
            LoopshapingDynamics::create(&ball, Arc::new(def)).unwrap()
        }
        _ => ball_with(pattern, filter),
    }
}

/// Central-difference Jacobians of the augmented flow map.
pub fn finite_difference<S: SystemDynamics>(
    dynamics: &mut LoopshapingDynamics<S>,
    t: Real,
    x: &DVector<Real>,
    u: &DVector<Real>,
) -> (DMatrix<Real>, DMatrix<Real>) {
    let h = 1e-6;
    let n = x.len();
    let m = u.len();
    let nv = dynamics.compute_flow_map(t, x, u).unwrap().len();
    let mut dfdx = DMatrix::zeros(nv, n);
    let mut dfdu = DMatrix::zeros(nv, m);
    for i in 0..n {
        let (mut xp, mut xm) = (x.clone(), x.clone());
        xp[i] += h;
        xm[i] -= h;
        let d = (dynamics.compute_flow_map(t, &xp, u).unwrap()
            - dynamics.compute_flow_map(t, &xm, u).unwrap())
            / (2.0 * h);
        dfdx.set_column(i, &d);
    }
    for i in 0..m {
        let (mut up, mut um) = (u.clone(), u.clone());
        up[i] += h;
        um[i] -= h;
        let d = (dynamics.compute_flow_map(t, x, &up).unwrap()
            - dynamics.compute_flow_map(t, x, &um).unwrap())
            / (2.0 * h);
        dfdu.set_column(i, &d);
    }
    (dfdx, dfdu)
}
