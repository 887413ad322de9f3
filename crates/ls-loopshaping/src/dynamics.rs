//! Augmented hybrid dynamics: wrapped system plus loop-shaping filter.

use crate::definition::LoopshapingDefinition;
use crate::error::LoopshapingResult;
use crate::pattern::{FilterPattern, FilterPoint, Pattern};
use crate::precomputation::LoopshapingPreComputation;
use ls_core::{
    Controller, DynamicsError, DynamicsResult, PreComputation, Real, SystemDynamics,
    VectorFunctionLinearApproximation, ensure_finite, ensure_len,
};
use nalgebra::{DMatrix, DVector};
use std::sync::Arc;
use tracing::{debug, warn};

/// A [`SystemDynamics`] augmented with a loop-shaping filter.
///
/// The augmented system is itself a [`SystemDynamics`] whose cache type is
/// [`LoopshapingPreComputation`], so it can be handed to anything that consumes
/// hybrid systems. The `compute_*` methods refresh the cache owned by this
/// instance and evaluate against it.
///
/// Filters never jump and never take part in guard surfaces: on a transition the
/// filter state is carried over unchanged, and guards are evaluated on the
/// system state alone.
///
/// `Clone` copies the wrapped system and the cache but shares the definition and
/// any attached controller. Use one instance per evaluation thread.
#[derive(Clone)]
pub struct LoopshapingDynamics<S: SystemDynamics> {
    system: S,
    definition: Arc<LoopshapingDefinition>,
    pattern: Pattern,
    pre_comp: LoopshapingPreComputation<S::PreComp>,
    controller: Option<Arc<dyn Controller>>,
}

impl<S: SystemDynamics> LoopshapingDynamics<S> {
    /// Wrap a copy of `system` according to `definition`.
    ///
    /// Fails if the definition does not fit the system's input dimension.
    pub fn create(system: &S, definition: Arc<LoopshapingDefinition>) -> LoopshapingResult<Self> {
        definition.validate_against(system.input_dim())?;
        let pre_comp =
            LoopshapingPreComputation::new(Arc::clone(&definition), system.pre_computation());
        let pattern = Pattern::for_definition(&definition, system.input_dim());
        debug!(
            pattern = %definition.pattern(),
            system_states = system.state_dim(),
            system_inputs = system.input_dim(),
            filter_states = definition.num_filter_states(),
            "created loopshaping dynamics"
        );
        Ok(Self {
            system: system.clone(),
            definition,
            pattern,
            pre_comp,
            controller: None,
        })
    }

    /// Independent evaluation context: fresh cache, same definition and controller.
    pub fn fork(&self) -> Self {
        Self {
            system: self.system.clone(),
            definition: Arc::clone(&self.definition),
            pattern: self.pattern.clone(),
            pre_comp: self.pre_computation(),
            controller: self.controller.clone(),
        }
    }

    pub fn definition(&self) -> &Arc<LoopshapingDefinition> {
        &self.definition
    }

    pub fn pattern(&self) -> &Pattern {
        &self.pattern
    }

    pub fn system(&self) -> &S {
        &self.system
    }

    /// Cache filled by the last `compute_*` call.
    pub fn pre_computation_ref(&self) -> &LoopshapingPreComputation<S::PreComp> {
        &self.pre_comp
    }

    pub fn set_controller(&mut self, controller: Arc<dyn Controller>) {
        self.controller = Some(controller);
    }

    pub fn controller(&self) -> Option<&Arc<dyn Controller>> {
        self.controller.as_ref()
    }

    /// Detach the controller.
    pub fn reset(&mut self) {
        self.controller = None;
    }

    pub fn compute_flow_map(
        &mut self,
        t: Real,
        x: &DVector<Real>,
        u: &DVector<Real>,
    ) -> DynamicsResult<DVector<Real>> {
        self.check_dims(x, Some(u));
        self.pre_comp.request(t, x, u);
        self.flow_map(t, x, u, &self.pre_comp)
    }

    pub fn compute_flow_map_linear_approximation(
        &mut self,
        t: Real,
        x: &DVector<Real>,
        u: &DVector<Real>,
    ) -> DynamicsResult<VectorFunctionLinearApproximation> {
        self.check_dims(x, Some(u));
        self.pre_comp.request(t, x, u);
        self.flow_map_linear_approximation(t, x, u, &self.pre_comp)
    }

    pub fn compute_jump_map(&mut self, t: Real, x: &DVector<Real>) -> DynamicsResult<DVector<Real>> {
        self.check_dims(x, None);
        self.pre_comp.request_pre_jump(t, x);
        self.jump_map(t, x, &self.pre_comp)
    }

    pub fn compute_jump_map_linear_approximation(
        &mut self,
        t: Real,
        x: &DVector<Real>,
    ) -> DynamicsResult<VectorFunctionLinearApproximation> {
        self.check_dims(x, None);
        self.pre_comp.request_pre_jump(t, x);
        self.jump_map_linear_approximation(t, x, &self.pre_comp)
    }

    /// Flow map under the attached controller, `u = controller(t, x)`.
    pub fn compute_closed_loop_flow_map(
        &mut self,
        t: Real,
        x: &DVector<Real>,
    ) -> DynamicsResult<DVector<Real>> {
        let controller = self.controller.clone().ok_or_else(|| DynamicsError::InvalidArg {
            what: "closed-loop evaluation requires a controller".to_string(),
        })?;
        let u = controller.compute_input(t, x)?;
        ensure_len(&u, self.input_dim(), "controller input")?;
        ensure_finite(&u, "controller input")?;
        self.compute_flow_map(t, x, &u)
    }

    /// # Panics
    /// If `x` or `u` does not have the augmented dimension.
    fn check_dims(&self, x: &DVector<Real>, u: Option<&DVector<Real>>) {
        assert_eq!(x.len(), self.state_dim(), "augmented state has the wrong dimension");
        if let Some(u) = u {
            assert_eq!(u.len(), self.input_dim(), "augmented input has the wrong dimension");
        }
    }

    /// `u` is `None` for jump evaluations, which take no input.
    ///
    /// # Panics
    /// If `pre` belongs to another definition or was not requested for a state
    /// (and input) of this system's dimension.
    fn check_pre_computation(
        &self,
        pre: &LoopshapingPreComputation<S::PreComp>,
        x: &DVector<Real>,
        u: Option<&DVector<Real>>,
    ) {
        assert!(
            Arc::ptr_eq(pre.definition(), &self.definition),
            "pre-computation belongs to a different loopshaping definition"
        );
        assert_eq!(
            pre.system_state().len() + pre.filter_state().len(),
            x.len(),
            "pre-computation was not requested for this state"
        );
        debug_assert_eq!(
            &self
                .definition
                .concatenate_system_and_filter_state(pre.system_state(), pre.filter_state()),
            x,
            "pre-computation is stale"
        );
        if let Some(u) = u {
            let cached = self
                .definition
                .concatenate_system_and_filter_input(pre.system_input(), pre.filter_input());
            assert_eq!(cached.len(), u.len(), "pre-computation was not requested for this input");
            debug_assert_eq!(&cached, u, "pre-computation is stale");
        }
    }
}

impl<S: SystemDynamics> SystemDynamics for LoopshapingDynamics<S> {
    type PreComp = LoopshapingPreComputation<S::PreComp>;

    fn state_dim(&self) -> usize {
        self.definition.augmented_state_dim(self.system.state_dim())
    }

    fn input_dim(&self) -> usize {
        self.definition.augmented_input_dim(self.system.input_dim())
    }

    fn pre_computation(&self) -> Self::PreComp {
        LoopshapingPreComputation::new(Arc::clone(&self.definition), self.system.pre_computation())
    }

    fn flow_map(
        &self,
        t: Real,
        x: &DVector<Real>,
        u: &DVector<Real>,
        pre: &Self::PreComp,
    ) -> DynamicsResult<DVector<Real>> {
        self.check_pre_computation(pre, x, Some(u));
        let dx_system = self.system.flow_map(
            t,
            pre.system_state(),
            pre.system_input(),
            pre.system_pre_computation(),
        )?;
        let dx_filter = self.pattern.filter_flow_map(
            self.definition.filter(),
            pre.filter_state(),
            pre.filter_input(),
            pre.system_input(),
        );
        Ok(self
            .definition
            .concatenate_system_and_filter_state(&dx_system, &dx_filter))
    }

    fn flow_map_linear_approximation(
        &self,
        t: Real,
        x: &DVector<Real>,
        u: &DVector<Real>,
        pre: &Self::PreComp,
    ) -> DynamicsResult<VectorFunctionLinearApproximation> {
        self.check_pre_computation(pre, x, Some(u));
        let system = self.system.flow_map_linear_approximation(
            t,
            pre.system_state(),
            pre.system_input(),
            pre.system_pre_computation(),
        )?;
        let point = FilterPoint {
            x_filter: pre.filter_state(),
            u_filter: pre.filter_input(),
            u_system: pre.system_input(),
        };
        Ok(self
            .pattern
            .flow_map_linear_approximation(self.definition.filter(), &system, point))
    }

    fn jump_map(
        &self,
        t: Real,
        x: &DVector<Real>,
        pre: &Self::PreComp,
    ) -> DynamicsResult<DVector<Real>> {
        self.check_pre_computation(pre, x, None);
        let jump_system = self
            .system
            .jump_map(t, pre.system_state(), pre.system_pre_computation())?;
        // filter doesn't jump
        Ok(self
            .definition
            .concatenate_system_and_filter_state(&jump_system, pre.filter_state()))
    }

    fn jump_map_linear_approximation(
        &self,
        t: Real,
        x: &DVector<Real>,
        pre: &Self::PreComp,
    ) -> DynamicsResult<VectorFunctionLinearApproximation> {
        self.check_pre_computation(pre, x, None);
        let x_system = pre.system_state();
        let x_filter = pre.filter_state();
        let system = self
            .system
            .jump_map_linear_approximation(t, x_system, pre.system_pre_computation())?;

        let n_j = system.num_outputs();
        let n_xs = x_system.len();
        let n_f = x_filter.len();
        let f = self
            .definition
            .concatenate_system_and_filter_state(&system.f, x_filter);

        let mut dfdx = DMatrix::zeros(n_j + n_f, n_xs + n_f);
        dfdx.view_mut((0, 0), (n_j, n_xs)).copy_from(&system.dfdx);
        dfdx.view_mut((n_j, n_xs), (n_f, n_f)).fill_with_identity();

        Ok(VectorFunctionLinearApproximation {
            dfdu: DMatrix::zeros(f.len(), 0),
            f,
            dfdx,
        })
    }

    fn guard_surfaces(&self, t: Real, x: &DVector<Real>) -> DynamicsResult<DVector<Real>> {
        self.check_dims(x, None);
        let x_system = self.definition.system_state(x);
        self.system.guard_surfaces(t, &x_system)
    }

    fn guard_surfaces_linear_approximation(
        &self,
        _t: Real,
        _x: &DVector<Real>,
        _u: &DVector<Real>,
    ) -> DynamicsResult<VectorFunctionLinearApproximation> {
        warn!("guard surface linear approximation requested on loopshaping dynamics");
        Err(DynamicsError::NotSupported {
            what: "guard surface linear approximation of loopshaping dynamics",
        })
    }

    fn flow_map_derivative_time(
        &self,
        t: Real,
        x: &DVector<Real>,
        u: &DVector<Real>,
    ) -> DynamicsResult<DVector<Real>> {
        let x_system = self.definition.system_state(x);
        let u_system = self.definition.system_input(x, u);
        let dt_system = self.system.flow_map_derivative_time(t, &x_system, &u_system)?;
        let dt_filter = DVector::zeros(self.definition.num_filter_states());
        Ok(self
            .definition
            .concatenate_system_and_filter_state(&dt_system, &dt_filter))
    }

    fn jump_map_derivative_time(
        &self,
        t: Real,
        x: &DVector<Real>,
        u: &DVector<Real>,
    ) -> DynamicsResult<DVector<Real>> {
        let x_system = self.definition.system_state(x);
        // jumps take no input; only a full augmented input is decomposed
        let u_system = if u.len() == self.input_dim() {
            self.definition.system_input(x, u)
        } else {
            DVector::zeros(self.system.input_dim())
        };
        let dt_system = self.system.jump_map_derivative_time(t, &x_system, &u_system)?;
        let dt_filter = DVector::zeros(self.definition.num_filter_states());
        Ok(self
            .definition
            .concatenate_system_and_filter_state(&dt_system, &dt_filter))
    }

    fn guard_surfaces_derivative_time(
        &self,
        _t: Real,
        _x: &DVector<Real>,
        _u: &DVector<Real>,
    ) -> DynamicsResult<DVector<Real>> {
        warn!("guard surface time derivative requested on loopshaping dynamics");
        Err(DynamicsError::NotSupported {
            what: "guard surface time derivative of loopshaping dynamics",
        })
    }
}
