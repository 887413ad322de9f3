//! ls-core: stable foundation for loopshape.
//!
//! Contains:
//! - numeric (Real + tolerances + vector helpers)
//! - error (shared evaluation error type)
//! - approximation (first-order expansions of vector functions)
//! - system (the hybrid system collaborator and its pre-computation cache)
//! - controller (control policies for closed-loop evaluation)

pub mod approximation;
pub mod controller;
pub mod error;
pub mod numeric;
pub mod system;

// Re-exports: nice ergonomics for downstream crates
pub use approximation::VectorFunctionLinearApproximation;
pub use controller::{Controller, LinearController};
pub use error::{DynamicsError, DynamicsResult};
pub use numeric::*;
pub use system::{NoPreComputation, PreComputation, SystemDynamics};
