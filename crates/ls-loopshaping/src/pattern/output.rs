use super::{FilterPattern, FilterPoint, stacked_approximation};
use crate::filter::Filter;
use ls_core::{Real, VectorFunctionLinearApproximation};
use nalgebra::DVector;

/// Filter downstream of the solver: `u = u_s = u_f`, so the filter sees exactly
/// what the system sees.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct OutputPattern;

impl FilterPattern for OutputPattern {
    fn filter_flow_map(
        &self,
        filter: &Filter,
        x_filter: &DVector<Real>,
        _u_filter: &DVector<Real>,
        u_system: &DVector<Real>,
    ) -> DVector<Real> {
        filter.flow_map(x_filter, u_system)
    }

    fn flow_map_linear_approximation(
        &self,
        filter: &Filter,
        system: &VectorFunctionLinearApproximation,
        point: FilterPoint<'_>,
    ) -> VectorFunctionLinearApproximation {
        let n_s = system.num_outputs();
        let n_f = filter.num_states();
        let m = system.num_inputs();
        let filter_flow = self.filter_flow_map(filter, point.x_filter, point.u_filter, point.u_system);
        let mut approx = stacked_approximation(filter, system, filter_flow, m);
        approx.dfdu.view_mut((0, 0), (n_s, m)).copy_from(&system.dfdu);
        approx.dfdu.view_mut((n_s, 0), (n_f, m)).copy_from(filter.b());
        approx
    }
}
