//! Serializable loop-shaping configuration and file loading.
//!
//! ```yaml
//! pattern: eliminatepattern
//! filter:
//!   a: [[-10.0]]
//!   b: [[10.0]]
//!   c: [[1.0]]
//!   d: [[0.0]]
//! eliminated_inputs: [1]
//! ```

use crate::definition::{LoopshapingDefinition, LoopshapingType};
use crate::error::{LoopshapingResult, invalid};
use crate::filter::Filter;
use ls_core::Real;
use nalgebra::DMatrix;
use serde::{Deserialize, Serialize};
use std::path::Path;
use tracing::debug;

/// Filter matrices as lists of rows.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct FilterConfig {
    pub a: Vec<Vec<Real>>,
    pub b: Vec<Vec<Real>>,
    #[serde(default)]
    pub c: Vec<Vec<Real>>,
    #[serde(default)]
    pub d: Vec<Vec<Real>>,
}

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct LoopshapingConfig {
    /// Pattern name, see [`LoopshapingType`]'s `FromStr`.
    pub pattern: String,
    pub filter: FilterConfig,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub eliminated_inputs: Vec<usize>,
}

impl FilterConfig {
    pub fn to_filter(&self) -> LoopshapingResult<Filter> {
        let n = self.a.len();
        let a = matrix_from_rows(&self.a, n, "a")?;
        let m = self.b.first().map_or(0, Vec::len);
        let b = matrix_from_rows(&self.b, m, "b")?;
        let c = matrix_from_rows(&self.c, n, "c")?;
        let d = matrix_from_rows(&self.d, m, "d")?;
        Filter::new(a, b, c, d)
    }

    pub fn from_filter(filter: &Filter) -> Self {
        Self {
            a: matrix_to_rows(filter.a()),
            b: matrix_to_rows(filter.b()),
            c: matrix_to_rows(filter.c()),
            d: matrix_to_rows(filter.d()),
        }
    }
}

impl LoopshapingConfig {
    pub fn to_definition(&self) -> LoopshapingResult<LoopshapingDefinition> {
        let pattern: LoopshapingType = self.pattern.parse()?;
        let filter = self.filter.to_filter()?;
        match pattern {
            LoopshapingType::EliminatePattern => {
                LoopshapingDefinition::eliminate(filter, self.eliminated_inputs.clone())
            }
            LoopshapingType::InputPattern | LoopshapingType::OutputPattern => {
                if !self.eliminated_inputs.is_empty() {
                    return Err(invalid(format!(
                        "eliminated_inputs is only valid for the eliminate pattern, not {}",
                        pattern
                    )));
                }
                LoopshapingDefinition::new(pattern, filter)
            }
        }
    }

    pub fn from_definition(definition: &LoopshapingDefinition) -> Self {
        Self {
            pattern: definition.pattern().to_string(),
            filter: FilterConfig::from_filter(definition.filter()),
            eliminated_inputs: definition.eliminated_inputs().to_vec(),
        }
    }
}

pub fn from_yaml_str(content: &str) -> LoopshapingResult<LoopshapingDefinition> {
    let config: LoopshapingConfig = serde_yaml::from_str(content)?;
    config.to_definition()
}

pub fn load_yaml(path: &Path) -> LoopshapingResult<LoopshapingDefinition> {
    debug!(path = %path.display(), "loading loopshaping config");
    let content = std::fs::read_to_string(path)?;
    from_yaml_str(&content)
}

pub fn load_json(path: &Path) -> LoopshapingResult<LoopshapingDefinition> {
    debug!(path = %path.display(), "loading loopshaping config");
    let content = std::fs::read_to_string(path)?;
    let config: LoopshapingConfig = serde_json::from_str(&content)?;
    config.to_definition()
}

pub fn save_yaml(path: &Path, definition: &LoopshapingDefinition) -> LoopshapingResult<()> {
    debug!(path = %path.display(), "saving loopshaping config");
    let content = serde_yaml::to_string(&LoopshapingConfig::from_definition(definition))?;
    std::fs::write(path, content)?;
    Ok(())
}

/// `ncols` is used when `rows` is empty and must match every row otherwise.
fn matrix_from_rows(
    rows: &[Vec<Real>],
    ncols: usize,
    what: &str,
) -> LoopshapingResult<DMatrix<Real>> {
    if let Some(row) = rows.iter().find(|row| row.len() != ncols) {
        return Err(invalid(format!(
            "filter {} rows must have {} entries, found a row with {}",
            what,
            ncols,
            row.len()
        )));
    }
    let flat: Vec<Real> = rows.iter().flatten().copied().collect();
    Ok(DMatrix::from_row_slice(rows.len(), ncols, &flat))
}

fn matrix_to_rows(m: &DMatrix<Real>) -> Vec<Vec<Real>> {
    m.row_iter().map(|row| row.iter().copied().collect()).collect()
}
