//! Error types for glint_animation

use thiserror::Error;

/// Reason an [`AnimatorConfig`](crate::AnimatorConfig) was rejected
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum ConfigViolation {
    /// `bound` is smaller than `initial`
    BoundBelowInitial { initial: i64, bound: i64 },
    /// `step` is zero or negative
    NonPositiveStep(i64),
    /// `interval_ms` is zero or negative
    NonPositiveInterval(i64),
    /// `start_delay_ms` is negative
    NegativeStartDelay(i64),
}

impl std::fmt::Display for ConfigViolation {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            ConfigViolation::BoundBelowInitial { initial, bound } => {
                write!(f, "bound {} is below initial {}", bound, initial)
            }
            ConfigViolation::NonPositiveStep(step) => {
                write!(f, "step must be positive, got {}", step)
            }
            ConfigViolation::NonPositiveInterval(ms) => {
                write!(f, "interval_ms must be positive, got {}", ms)
            }
            ConfigViolation::NegativeStartDelay(ms) => {
                write!(f, "start_delay_ms must not be negative, got {}", ms)
            }
        }
    }
}

/// Errors returned by animation operations
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum AnimationError {
    /// The animator configuration violates its constraints; nothing was scheduled
    #[error("Invalid animator config: {0}")]
    InvalidConfig(ConfigViolation),
}

/// Result type for glint_animation operations
pub type Result<T> = std::result::Result<T, AnimationError>;
