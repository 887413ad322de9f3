//! Per-evaluation decomposition of augmented state and input.

use crate::definition::LoopshapingDefinition;
use ls_core::{PreComputation, Real};
use nalgebra::DVector;
use std::sync::Arc;

/// Snapshot of `(x_system, u_system, x_filter, u_filter)` at one operating point,
/// wrapping the system's own cache.
///
/// Each `request` overwrites the snapshot and forwards the system-space part to
/// the wrapped cache, so both always describe the same `(t, x, u)`. A jump
/// request only carries a state; the input parts are emptied.
#[derive(Clone, Debug)]
pub struct LoopshapingPreComputation<P> {
    definition: Arc<LoopshapingDefinition>,
    system: P,
    x_system: DVector<Real>,
    u_system: DVector<Real>,
    x_filter: DVector<Real>,
    u_filter: DVector<Real>,
}

impl<P: PreComputation> LoopshapingPreComputation<P> {
    pub fn new(definition: Arc<LoopshapingDefinition>, system: P) -> Self {
        Self {
            definition,
            system,
            x_system: DVector::zeros(0),
            u_system: DVector::zeros(0),
            x_filter: DVector::zeros(0),
            u_filter: DVector::zeros(0),
        }
    }

    pub fn definition(&self) -> &Arc<LoopshapingDefinition> {
        &self.definition
    }

    pub fn system_pre_computation(&self) -> &P {
        &self.system
    }

    pub fn system_state(&self) -> &DVector<Real> {
        &self.x_system
    }

    pub fn system_input(&self) -> &DVector<Real> {
        &self.u_system
    }

    pub fn filter_state(&self) -> &DVector<Real> {
        &self.x_filter
    }

    pub fn filter_input(&self) -> &DVector<Real> {
        &self.u_filter
    }
}

impl<P: PreComputation> PreComputation for LoopshapingPreComputation<P> {
    fn request(&mut self, t: Real, x: &DVector<Real>, u: &DVector<Real>) {
        self.x_system = self.definition.system_state(x);
        self.x_filter = self.definition.filter_state(x);
        self.u_system = self.definition.system_input(x, u);
        self.u_filter = self.definition.filter_input(u);
        self.system.request(t, &self.x_system, &self.u_system);
    }

    fn request_pre_jump(&mut self, t: Real, x: &DVector<Real>) {
        self.x_system = self.definition.system_state(x);
        self.x_filter = self.definition.filter_state(x);
        self.u_system = DVector::zeros(0);
        self.u_filter = DVector::zeros(0);
        self.system.request_pre_jump(t, &self.x_system);
    }
}
