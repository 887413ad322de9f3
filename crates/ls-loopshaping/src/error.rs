//! Error types for building loop-shaping systems.

use ls_core::DynamicsError;
use thiserror::Error;

/// Errors raised while configuring or constructing loop-shaping dynamics.
///
/// Evaluation-time failures use [`DynamicsError`] so that errors coming from the
/// wrapped system reach the caller unchanged.
#[derive(Error, Debug)]
pub enum LoopshapingError {
    #[error("Invalid loopshaping definition: {what}")]
    InvalidDefinition { what: String },

    #[error("Unknown loopshaping pattern: {name}")]
    UnknownPattern { name: String },

    #[error("Dynamics error: {0}")]
    Dynamics(#[from] DynamicsError),

    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("YAML error: {0}")]
    Yaml(#[from] serde_yaml::Error),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),
}

pub type LoopshapingResult<T> = Result<T, LoopshapingError>;

pub(crate) fn invalid(what: impl Into<String>) -> LoopshapingError {
    LoopshapingError::InvalidDefinition { what: what.into() }
}
