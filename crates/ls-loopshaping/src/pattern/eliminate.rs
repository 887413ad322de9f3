use super::{FilterPattern, FilterPoint, stacked_approximation};
use crate::filter::Filter;
use ls_core::{Real, VectorFunctionLinearApproximation};
use nalgebra::DVector;

/// Selected system input channels replaced by the filter output.
///
/// `u = [u_s[direct], u_f]` and `u_s[eliminated] = C x_f`. The filter is driven
/// by `u_f`.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct EliminatePattern {
    eliminated: Vec<usize>,
    direct: Vec<usize>,
}

impl EliminatePattern {
    pub fn new(eliminated: Vec<usize>, direct: Vec<usize>) -> Self {
        Self { eliminated, direct }
    }

    pub fn eliminated(&self) -> &[usize] {
        &self.eliminated
    }

    pub fn direct(&self) -> &[usize] {
        &self.direct
    }
}

impl FilterPattern for EliminatePattern {
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
        let r = self.direct.len();
        let m = filter.num_inputs();
        let filter_flow = self.filter_flow_map(filter, point.x_filter, point.u_filter, point.u_system);
        let mut approx = stacked_approximation(filter, system, filter_flow, r + m);

        let b_eliminated = system.dfdu.select_columns(self.eliminated.iter());
        approx
            .dfdx
            .view_mut((0, n_s), (n_s, n_f))
            .copy_from(&(b_eliminated * filter.c()));
        approx
            .dfdu
            .view_mut((0, 0), (n_s, r))
            .copy_from(&system.dfdu.select_columns(self.direct.iter()));
        approx.dfdu.view_mut((n_s, r), (n_f, m)).copy_from(filter.b());
        approx
    }
}
