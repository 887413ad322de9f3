//! The three ways a filter can be attached to the wrapped system.
//!
//! Every pattern answers two questions: what drives the filter, and how the
//! system's flow-map expansion is lifted to augmented coordinates. How the
//! augmented input splits into system and filter parts lives in
//! [`LoopshapingDefinition`].

mod eliminate;
mod input;
mod output;

pub use eliminate::EliminatePattern;
pub use input::InputPattern;
pub use output::OutputPattern;

use crate::definition::{LoopshapingDefinition, LoopshapingType};
use crate::filter::Filter;
use ls_core::{Real, VectorFunctionLinearApproximation};
use nalgebra::{DMatrix, DVector};

/// Decomposed operating point handed to a pattern.
#[derive(Clone, Copy, Debug)]
pub struct FilterPoint<'a> {
    pub x_filter: &'a DVector<Real>,
    pub u_filter: &'a DVector<Real>,
    pub u_system: &'a DVector<Real>,
}

pub trait FilterPattern {
    /// `dx_filter/dt`
    fn filter_flow_map(
        &self,
        filter: &Filter,
        x_filter: &DVector<Real>,
        u_filter: &DVector<Real>,
        u_system: &DVector<Real>,
    ) -> DVector<Real>;

    /// Lift the system's flow-map expansion at `point` to augmented coordinates.
    fn flow_map_linear_approximation(
        &self,
        filter: &Filter,
        system: &VectorFunctionLinearApproximation,
        point: FilterPoint<'_>,
    ) -> VectorFunctionLinearApproximation;
}

/// Pattern selected once from a [`LoopshapingDefinition`].
#[derive(Clone, Debug, PartialEq)]
pub enum Pattern {
    Input(InputPattern),
    Output(OutputPattern),
    Eliminate(EliminatePattern),
}

impl Pattern {
    /// Dispatch on the definition's pattern for a system with `system_input_dim` inputs.
    pub fn for_definition(definition: &LoopshapingDefinition, system_input_dim: usize) -> Self {
        match definition.pattern() {
            LoopshapingType::InputPattern => Pattern::Input(InputPattern),
            LoopshapingType::OutputPattern => Pattern::Output(OutputPattern),
            LoopshapingType::EliminatePattern => Pattern::Eliminate(EliminatePattern::new(
                definition.eliminated_inputs().to_vec(),
                definition.direct_inputs(system_input_dim),
            )),
        }
    }

    pub fn kind(&self) -> LoopshapingType {
        match self {
            Pattern::Input(_) => LoopshapingType::InputPattern,
            Pattern::Output(_) => LoopshapingType::OutputPattern,
            Pattern::Eliminate(_) => LoopshapingType::EliminatePattern,
        }
    }

    fn inner(&self) -> &dyn FilterPattern {
        match self {
            Pattern::Input(p) => p,
            Pattern::Output(p) => p,
            Pattern::Eliminate(p) => p,
        }
    }
}

impl FilterPattern for Pattern {
    fn filter_flow_map(
        &self,
        filter: &Filter,
        x_filter: &DVector<Real>,
        u_filter: &DVector<Real>,
        u_system: &DVector<Real>,
    ) -> DVector<Real> {
        self.inner()
            .filter_flow_map(filter, x_filter, u_filter, u_system)
    }

    fn flow_map_linear_approximation(
        &self,
        filter: &Filter,
        system: &VectorFunctionLinearApproximation,
        point: FilterPoint<'_>,
    ) -> VectorFunctionLinearApproximation {
        self.inner()
            .flow_map_linear_approximation(filter, system, point)
    }
}

/// Augmented expansion with the system rows on top and the filter rows below.
///
/// `dfdx` gets `A_s` top-left and the filter `A` bottom-right; the remaining
/// blocks are left to the caller and start at zero.
pub(crate) fn stacked_approximation(
    filter: &Filter,
    system: &VectorFunctionLinearApproximation,
    filter_flow: DVector<Real>,
    num_inputs: usize,
) -> VectorFunctionLinearApproximation {
    let n_s = system.num_outputs();
    let n_f = filter.num_states();
    let mut dfdx = DMatrix::zeros(n_s + n_f, n_s + n_f);
    dfdx.view_mut((0, 0), (n_s, system.num_states()))
        .copy_from(&system.dfdx);
    dfdx.view_mut((n_s, n_s), (n_f, n_f)).copy_from(filter.a());
    VectorFunctionLinearApproximation {
        f: ls_core::concatenate(&system.f, &filter_flow),
        dfdx,
        dfdu: DMatrix::zeros(n_s + n_f, num_inputs),
    }
}
