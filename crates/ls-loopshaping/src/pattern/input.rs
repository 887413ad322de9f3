use super::{FilterPattern, FilterPoint, stacked_approximation};
use crate::filter::Filter;
use ls_core::{Real, VectorFunctionLinearApproximation};
use nalgebra::DVector;

/// Filter upstream of the system: `u = u_f`, `u_s = C x_f + D u_f`.
///
/// The filter is driven by `u_f` alone.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct InputPattern;

impl FilterPattern for InputPattern {
    fn filter_flow_map(
        &self,
        filter: &Filter,
        x_filter: &DVector<Real>,
        u_filter: &DVector<Real>,
        _u_system: &DVector<Real>,
    ) -> DVector<Real> {
        filter.flow_map(x_filter, u_filter)
    }

    fn flow_map_linear_approximation(
        &self,
        filter: &Filter,
        system: &VectorFunctionLinearApproximation,
        point: FilterPoint<'_>,
    ) -> VectorFunctionLinearApproximation {
        let n_s = system.num_outputs();
        let n_f = filter.num_states();
        let m = filter.num_inputs();
        let filter_flow = self.filter_flow_map(filter, point.x_filter, point.u_filter, point.u_system);
        let mut approx = stacked_approximation(filter, system, filter_flow, m);

        // chain rule through u_s = C x_f + D u_f
        approx
            .dfdx
            .view_mut((0, n_s), (n_s, n_f))
            .copy_from(&(&system.dfdu * filter.c()));
        approx
            .dfdu
            .view_mut((0, 0), (n_s, m))
            .copy_from(&(&system.dfdu * filter.d()));
        approx.dfdu.view_mut((n_s, 0), (n_f, m)).copy_from(filter.b());
        approx
    }
}
