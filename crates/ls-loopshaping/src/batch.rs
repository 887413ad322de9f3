//! Parallel evaluation over many operating points.
//!
//! Each rayon worker forks its own [`LoopshapingDynamics`], so caches are never
//! shared while the definition and controller are.

use crate::dynamics::LoopshapingDynamics;
use ls_core::{DynamicsResult, Real, SystemDynamics, VectorFunctionLinearApproximation};
use nalgebra::DVector;
use rayon::prelude::*;
use tracing::trace;

/// One augmented operating point.
#[derive(Clone, Debug, PartialEq)]
pub struct Sample {
    pub t: Real,
    pub x: DVector<Real>,
    pub u: DVector<Real>,
}

impl Sample {
    pub fn new(t: Real, x: DVector<Real>, u: DVector<Real>) -> Self {
        Self { t, x, u }
    }
}

/// Flow maps at every sample, in sample order. Stops at the first error.
pub fn par_flow_maps<S: SystemDynamics>(
    dynamics: &LoopshapingDynamics<S>,
    samples: &[Sample],
) -> DynamicsResult<Vec<DVector<Real>>> {
    trace!(samples = samples.len(), "parallel flow map evaluation");
    samples
        .par_iter()
        .map_init(
            || dynamics.fork(),
            |context, s| context.compute_flow_map(s.t, &s.x, &s.u),
        )
        .collect()
}

/// Flow-map expansions at every sample, in sample order. Stops at the first error.
pub fn par_flow_map_linear_approximations<S: SystemDynamics>(
    dynamics: &LoopshapingDynamics<S>,
    samples: &[Sample],
) -> DynamicsResult<Vec<VectorFunctionLinearApproximation>> {
    trace!(
        samples = samples.len(),
        "parallel flow map linear approximation"
    );
    samples
        .par_iter()
        .map_init(
            || dynamics.fork(),
            |context, s| context.compute_flow_map_linear_approximation(s.t, &s.x, &s.u),
        )
        .collect()
}
