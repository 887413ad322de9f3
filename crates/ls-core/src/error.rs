use thiserror::Error;

pub type DynamicsResult<T> = Result<T, DynamicsError>;

/// Errors raised while evaluating flow maps, jump maps and guard surfaces.
#[derive(Error, Debug, Clone, PartialEq)]
pub enum DynamicsError {
    #[error("Dimension mismatch for {what}: expected {expected}, got {actual}")]
    DimensionMismatch {
        what: &'static str,
        expected: usize,
        actual: usize,
    },

    #[error("Non-finite numeric value for {what}")]
    NonFinite { what: &'static str },

    #[error("Invalid argument: {what}")]
    InvalidArg { what: String },

    #[error("Operation not supported: {what}")]
    NotSupported { what: &'static str },

    #[error("System dynamics failure: {what}")]
    System { what: String },
}
