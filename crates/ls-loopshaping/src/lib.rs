//! Loop-shaping augmentation of hybrid dynamical systems.
//!
//! A [`LoopshapingDynamics`] wraps any [`ls_core::SystemDynamics`] together with a
//! linear [`Filter`] and presents the pair to solvers as a single hybrid system:
//!
//! - augmented state `x = [x_system, x_filter]`
//! - augmented input composed according to the [`LoopshapingType`]
//! - filters evolve continuously but never jump
//! - guard surfaces only see the system state
//!
//! The [`LoopshapingDefinition`] is immutable and shared behind an `Arc` by every
//! evaluation context built from it.

pub mod batch;
pub mod config;
pub mod definition;
pub mod dynamics;
pub mod error;
pub mod filter;
pub mod pattern;
pub mod precomputation;

pub use batch::{Sample, par_flow_map_linear_approximations, par_flow_maps};
pub use config::{FilterConfig, LoopshapingConfig, from_yaml_str, load_json, load_yaml, save_yaml};
pub use definition::{LoopshapingDefinition, LoopshapingType};
pub use dynamics::LoopshapingDynamics;
pub use error::{LoopshapingError, LoopshapingResult};
pub use filter::Filter;
pub use pattern::{
    EliminatePattern, FilterPattern, FilterPoint, InputPattern, OutputPattern, Pattern,
};
pub use precomputation::LoopshapingPreComputation;
