//! Immutable description of a loop-shaping augmentation.

use crate::error::{LoopshapingError, LoopshapingResult, invalid};
use crate::filter::Filter;
use ls_core::{Real, concatenate};
use nalgebra::DVector;
use std::fmt;
use std::str::FromStr;

/// How the filter is connected to the control channel of the wrapped system.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum LoopshapingType {
    /// The solver drives the filter; the filter output is the system input.
    InputPattern,
    /// The solver drives the system; the system input also drives the filter.
    OutputPattern,
    /// Selected system input channels are replaced by the filter output `C x_f`.
    EliminatePattern,
}

impl LoopshapingType {
    pub fn name(self) -> &'static str {
        match self {
            LoopshapingType::InputPattern => "inputpattern",
            LoopshapingType::OutputPattern => "outputpattern",
            LoopshapingType::EliminatePattern => "eliminatepattern",
        }
    }
}

impl fmt::Display for LoopshapingType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

impl FromStr for LoopshapingType {
    type Err = LoopshapingError;

    /// Accepts `inputpattern`, `input_pattern`, `Input-Pattern` and the like.
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let normalized: String = s
            .trim()
            .chars()
            .filter(|c| *c != '_' && *c != '-')
            .flat_map(char::to_lowercase)
            .collect();
        match normalized.as_str() {
            "inputpattern" => Ok(LoopshapingType::InputPattern),
            "outputpattern" => Ok(LoopshapingType::OutputPattern),
            "eliminatepattern" => Ok(LoopshapingType::EliminatePattern),
            _ => Err(LoopshapingError::UnknownPattern {
                name: s.to_string(),
            }),
        }
    }
}

/// Filter plus augmentation pattern.
///
/// Provides the pure splitting/concatenation rules between augmented and
/// system/filter coordinates. The augmented state is always `[x_system, x_filter]`;
/// the augmented input depends on the pattern:
///
/// | pattern   | augmented `u`          | `u_system`                    | `u_filter`   |
/// |-----------|------------------------|-------------------------------|--------------|
/// | input     | `u_filter`             | `C x_f + D u_f`               | `u`          |
/// | output    | `u_system`             | `u`                           | `u`          |
/// | eliminate | `[u_system[R], u_f]`   | `u_system[E] = C x_f`         | tail of `u`  |
///
/// where `E` are the eliminated channels and `R` the remaining direct ones.
#[derive(Clone, Debug, PartialEq)]
pub struct LoopshapingDefinition {
    pattern: LoopshapingType,
    filter: Filter,
    eliminated_inputs: Vec<usize>,
}

impl LoopshapingDefinition {
    /// Definition for the input or output pattern.
    pub fn new(pattern: LoopshapingType, filter: Filter) -> LoopshapingResult<Self> {
        if pattern == LoopshapingType::EliminatePattern {
            return Err(invalid(
                "eliminate pattern requires the eliminated input channels",
            ));
        }
        Ok(Self {
            pattern,
            filter,
            eliminated_inputs: Vec::new(),
        })
    }

    /// Definition for the eliminate pattern. `eliminated_inputs` lists, in strictly
    /// increasing order, the system input channels driven by the filter output.
    pub fn eliminate(filter: Filter, eliminated_inputs: Vec<usize>) -> LoopshapingResult<Self> {
        if eliminated_inputs.is_empty() {
            return Err(invalid(
                "eliminate pattern needs at least one eliminated input channel",
            ));
        }
        if eliminated_inputs.len() != filter.num_outputs() {
            return Err(invalid(format!(
                "eliminate pattern lists {} channels but the filter has {} outputs",
                eliminated_inputs.len(),
                filter.num_outputs()
            )));
        }
        if eliminated_inputs.windows(2).any(|w| w[0] >= w[1]) {
            return Err(invalid(
                "eliminated input channels must be strictly increasing",
            ));
        }
        if filter.d().iter().any(|v| *v != 0.0) {
            return Err(invalid(
                "eliminate pattern reconstructs inputs from filter state only, D must be zero",
            ));
        }
        Ok(Self {
            pattern: LoopshapingType::EliminatePattern,
            filter,
            eliminated_inputs,
        })
    }

    pub fn pattern(&self) -> LoopshapingType {
        self.pattern
    }

    pub fn filter(&self) -> &Filter {
        &self.filter
    }

    pub fn num_filter_states(&self) -> usize {
        self.filter.num_states()
    }

    /// Eliminated system input channels; empty unless the pattern is eliminate.
    pub fn eliminated_inputs(&self) -> &[usize] {
        &self.eliminated_inputs
    }

    /// System input channels passed straight through from the augmented input.
    pub fn direct_inputs(&self, system_input_dim: usize) -> Vec<usize> {
        (0..system_input_dim)
            .filter(|i| self.eliminated_inputs.binary_search(i).is_err())
            .collect()
    }

    /// Check that this definition can wrap a system with `system_input_dim` inputs.
    pub fn validate_against(&self, system_input_dim: usize) -> LoopshapingResult<()> {
        match self.pattern {
            LoopshapingType::InputPattern => {
                if self.filter.num_outputs() != system_input_dim {
                    return Err(invalid(format!(
                        "input pattern needs {} filter outputs to drive the system inputs, got {}",
                        system_input_dim,
                        self.filter.num_outputs()
                    )));
                }
            }
            LoopshapingType::OutputPattern => {
                if self.filter.num_inputs() != system_input_dim {
                    return Err(invalid(format!(
                        "output pattern needs {} filter inputs to take the system inputs, got {}",
                        system_input_dim,
                        self.filter.num_inputs()
                    )));
                }
            }
            LoopshapingType::EliminatePattern => {
                if let Some(&last) = self.eliminated_inputs.last()
                    && last >= system_input_dim
                {
                    return Err(invalid(format!(
                        "eliminated input channel {} is out of range for a system with {} inputs",
                        last, system_input_dim
                    )));
                }
            }
        }
        Ok(())
    }

    pub fn augmented_state_dim(&self, system_state_dim: usize) -> usize {
        system_state_dim + self.filter.num_states()
    }

    pub fn augmented_input_dim(&self, system_input_dim: usize) -> usize {
        match self.pattern {
            LoopshapingType::InputPattern => self.filter.num_inputs(),
            LoopshapingType::OutputPattern => system_input_dim,
            LoopshapingType::EliminatePattern => {
                system_input_dim - self.eliminated_inputs.len() + self.filter.num_inputs()
            }
        }
    }

    /// # Panics
    /// If `x` is shorter than the filter state.
    pub fn system_state(&self, x: &DVector<Real>) -> DVector<Real> {
        let n_f = self.check_state(x);
        x.rows(0, x.len() - n_f).into_owned()
    }

    /// # Panics
    /// If `x` is shorter than the filter state.
    pub fn filter_state(&self, x: &DVector<Real>) -> DVector<Real> {
        let n_f = self.check_state(x);
        x.rows(x.len() - n_f, n_f).into_owned()
    }

    pub fn concatenate_system_and_filter_state(
        &self,
        x_system: &DVector<Real>,
        x_filter: &DVector<Real>,
    ) -> DVector<Real> {
        concatenate(x_system, x_filter)
    }

    /// Input seen by the wrapped system at augmented `(x, u)`.
    ///
    /// # Panics
    /// If `x` or `u` is too short for this definition.
    pub fn system_input(&self, x: &DVector<Real>, u: &DVector<Real>) -> DVector<Real> {
        match self.pattern {
            LoopshapingType::InputPattern => self.filter.output(&self.filter_state(x), u),
            LoopshapingType::OutputPattern => u.clone(),
            LoopshapingType::EliminatePattern => {
                let num_direct = u.len() - self.check_filter_input(u);
                let reconstructed = self.filter.c() * self.filter_state(x);
                let mut u_system = DVector::zeros(num_direct + self.eliminated_inputs.len());
                let (mut direct, mut eliminated) = (0, 0);
                for channel in 0..u_system.len() {
                    if self.eliminated_inputs.get(eliminated) == Some(&channel) {
                        u_system[channel] = reconstructed[eliminated];
                        eliminated += 1;
                    } else {
                        u_system[channel] = u[direct];
                        direct += 1;
                    }
                }
                u_system
            }
        }
    }

    /// Input driving the filter at augmented input `u`.
    ///
    /// # Panics
    /// If `u` is too short for this definition.
    pub fn filter_input(&self, u: &DVector<Real>) -> DVector<Real> {
        match self.pattern {
            LoopshapingType::InputPattern | LoopshapingType::OutputPattern => u.clone(),
            LoopshapingType::EliminatePattern => {
                let m = self.check_filter_input(u);
                u.rows(u.len() - m, m).into_owned()
            }
        }
    }

    /// Augmented input that splits into `(u_system, u_filter)`.
    pub fn concatenate_system_and_filter_input(
        &self,
        u_system: &DVector<Real>,
        u_filter: &DVector<Real>,
    ) -> DVector<Real> {
        match self.pattern {
            LoopshapingType::InputPattern => u_filter.clone(),
            LoopshapingType::OutputPattern => u_system.clone(),
            LoopshapingType::EliminatePattern => {
                let direct = self.direct_inputs(u_system.len());
                concatenate(&u_system.select_rows(direct.iter()), u_filter)
            }
        }
    }

    fn check_state(&self, x: &DVector<Real>) -> usize {
        let n_f = self.filter.num_states();
        assert!(
            x.len() >= n_f,
            "augmented state of length {} cannot hold {} filter states",
            x.len(),
            n_f
        );
        n_f
    }

    fn check_filter_input(&self, u: &DVector<Real>) -> usize {
        let m = self.filter.num_inputs();
        assert!(
            u.len() >= m,
            "augmented input of length {} cannot hold {} filter inputs",
            u.len(),
            m
        );
        m
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use nalgebra::DMatrix;

    fn two_state_filter() -> Filter {
        Filter::new(
            DMatrix::from_row_slice(2, 2, &[-1.0, 0.0, 0.0, -2.0]),
            DMatrix::from_row_slice(2, 1, &[1.0, 2.0]),
            DMatrix::from_row_slice(1, 2, &[1.0, 1.0]),
            DMatrix::zeros(1, 1),
        )
        .unwrap()
    }

    fn vec(v: &[Real]) -> DVector<Real> {
        DVector::from_row_slice(v)
    }

    #[test]
    fn parses_pattern_names() {
        assert_eq!(
            "inputpattern".parse::<LoopshapingType>().unwrap(),
            LoopshapingType::InputPattern
        );
        assert_eq!(
            "Output_Pattern".parse::<LoopshapingType>().unwrap(),
            LoopshapingType::OutputPattern
        );
        assert_eq!(
            "eliminate-pattern".parse::<LoopshapingType>().unwrap(),
            LoopshapingType::EliminatePattern
        );
        let err = "bandpass".parse::<LoopshapingType>().unwrap_err();
        assert!(matches!(err, LoopshapingError::UnknownPattern { ref name } if name == "bandpass"));
        assert_eq!(LoopshapingType::InputPattern.to_string(), "inputpattern");
    }

    #[test]
    fn state_split_is_left_inverse_of_concatenation() {
        let def = LoopshapingDefinition::new(LoopshapingType::InputPattern, two_state_filter())
            .unwrap();
        let x = vec(&[1.0, 2.0, 3.0, 4.0, 5.0]);
        assert_eq!(def.system_state(&x), vec(&[1.0, 2.0, 3.0]));
        assert_eq!(def.filter_state(&x), vec(&[4.0, 5.0]));
        let joined =
            def.concatenate_system_and_filter_state(&def.system_state(&x), &def.filter_state(&x));
        assert_eq!(joined, x);
    }

    #[test]
    #[should_panic(expected = "cannot hold 2 filter states")]
    fn short_state_is_a_precondition_violation() {
        let def = LoopshapingDefinition::new(LoopshapingType::InputPattern, two_state_filter())
            .unwrap();
        def.system_state(&vec(&[1.0]));
    }

    #[test]
    fn input_pattern_drives_system_through_filter_output() {
        let def = LoopshapingDefinition::new(LoopshapingType::InputPattern, two_state_filter())
            .unwrap();
        let x = vec(&[0.0, 0.25, 0.5]);
        let u = vec(&[7.0]);
        assert_eq!(def.system_input(&x, &u), vec(&[0.75]));
        assert_eq!(def.filter_input(&u), u);
        assert_eq!(def.augmented_input_dim(1), 1);
        assert!(def.validate_against(1).is_ok());
        assert!(def.validate_against(2).is_err());
    }

    #[test]
    fn output_pattern_shares_the_input() {
        let def = LoopshapingDefinition::new(LoopshapingType::OutputPattern, two_state_filter())
            .unwrap();
        let x = vec(&[0.0, 0.25, 0.5]);
        let u = vec(&[7.0]);
        assert_eq!(def.system_input(&x, &u), u);
        assert_eq!(def.filter_input(&u), u);
        assert_eq!(def.concatenate_system_and_filter_input(&u, &u), u);
    }

    #[test]
    fn eliminate_pattern_reconstructs_selected_channels() {
        let def = LoopshapingDefinition::eliminate(two_state_filter(), vec![1]).unwrap();
        // system has 3 inputs, channel 1 eliminated
        let x = vec(&[9.0, 0.25, 0.5]);
        let u = vec(&[10.0, 30.0, 0.1]);
        assert_eq!(def.system_input(&x, &u), vec(&[10.0, 0.75, 30.0]));
        assert_eq!(def.filter_input(&u), vec(&[0.1]));
        assert_eq!(def.direct_inputs(3), vec![0, 2]);
        assert_eq!(def.augmented_input_dim(3), 3);
        let joined = def.concatenate_system_and_filter_input(
            &def.system_input(&x, &u),
            &def.filter_input(&u),
        );
        assert_eq!(joined, u);
        assert!(def.validate_against(1).is_err());
    }

    #[test]
    fn eliminate_pattern_rejects_bad_channel_lists() {
        assert!(LoopshapingDefinition::eliminate(two_state_filter(), vec![]).is_err());
        assert!(LoopshapingDefinition::eliminate(two_state_filter(), vec![0, 1]).is_err());
        assert!(LoopshapingDefinition::new(LoopshapingType::EliminatePattern, two_state_filter())
            .is_err());

        let two_outputs = Filter::new(
            DMatrix::identity(2, 2),
            DMatrix::identity(2, 2),
            DMatrix::identity(2, 2),
            DMatrix::zeros(2, 2),
        )
        .unwrap();
        assert!(LoopshapingDefinition::eliminate(two_outputs.clone(), vec![1, 0]).is_err());
        assert!(LoopshapingDefinition::eliminate(two_outputs, vec![0, 2]).is_ok());
    }

    #[test]
    fn eliminate_pattern_rejects_feedthrough() {
        let feedthrough = Filter::new(
            DMatrix::from_element(1, 1, -1.0),
            DMatrix::from_element(1, 1, 1.0),
            DMatrix::from_element(1, 1, 1.0),
            DMatrix::from_element(1, 1, 0.5),
        )
        .unwrap();
        let err = LoopshapingDefinition::eliminate(feedthrough, vec![0]).unwrap_err();
        assert!(err.to_string().contains("D must be zero"));
    }
}
