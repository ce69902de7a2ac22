//! Invalid-parameter errors raised before any grid is allocated.

use thiserror::Error;

#[derive(Debug, Clone, PartialEq, Error)]
pub enum SurfaceError {
    #[error("order must be a positive integer, got {0}.")]
    InvalidOrder(i64),
    #[error("sheets must be a positive integer, got {0}.")]
    InvalidSheets(i64),
    #[error("theta_max must be finite and positive, got {0}.")]
    InvalidThetaMax(f64),
    #[error("radius interval must satisfy 0 < radius_min < radius_max, got [{min}, {max}].")]
    InvalidRadiusRange { min: f64, max: f64 },
    #[error("{name} needs at least 2 samples, got {count}.")]
    TooFewSamples { name: &'static str, count: usize },
    #[error("{name} must be finite and non-negative, got {value}.")]
    InvalidSetting { name: &'static str, value: f64 },
    #[error("{name} must be finite, got {value}.")]
    NonFinite { name: &'static str, value: f64 },
    #[error("stride must be at least 1.")]
    ZeroStride,
    #[error("opacity must lie in [0, 1], got {0}.")]
    InvalidOpacity(f64),
}
