//! Error type shared by the sampler and the model constructors.

use thiserror::Error;

/// Convenience alias used throughout the crate.
pub type Result<T> = std::result::Result<T, HmcError>;

#[non_exhaustive]
#[derive(Error, Debug, Clone, PartialEq)]
pub enum HmcError {
    #[error("step size must be finite and positive, got {0}")]
    InvalidStepSize(f64),

    #[error("number of leapfrog steps must be at least 1, got {0}")]
    InvalidLeapfrogSteps(usize),

    #[error("invalid dual averaging setting `{name}` = {value}: {reason}")]
    InvalidSetting {
        name: &'static str,
        value: f64,
        reason: &'static str,
    },

    #[error("model has zero parameters")]
    EmptyParameters,

    #[error("parameter vector has length {found}, model expects {expected}")]
    DimensionMismatch { expected: usize, found: usize },

    #[error("{what}: expected length {expected}, found {found}")]
    ShapeMismatch {
        what: &'static str,
        expected: usize,
        found: usize,
    },

    #[error("invalid model data: {0}")]
    InvalidData(String),

    #[error("log density at the current position is not finite ({value})")]
    NonFiniteLogDensity { value: f64 },
}
