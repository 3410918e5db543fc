//! Error types for the facility projection engine

use thiserror::Error;

use crate::rates::Bucket;

/// Result type for engine operations
pub type Result<T> = std::result::Result<T, EngineError>;

/// Errors that abort a projection run.
///
/// Every variant is a configuration defect or a formula bug. Computation is pure,
/// so retrying the same configuration fails the same way.
#[derive(Error, Debug, Clone, PartialEq)]
pub enum EngineError {
    #[error("Configuration error: {0}")]
    ConfigValidation(#[from] ConfigValidationError),

    #[error("{bucket} over-allocated: channels request {requested:.2} court-hours/week but only {available:.2} exist")]
    OverAllocation { bucket: Bucket, requested: f64, available: f64 },

    #[error("Scaling reconciliation failed: {detail} (expected {expected:.2}, got {actual:.2})")]
    ScalingReconciliation { detail: String, expected: f64, actual: f64 },

    #[error("Revenue ceiling violated for {channel}: revenue {revenue:.2} exceeds ceiling {ceiling:.2}")]
    RevenueCeilingViolation { channel: String, revenue: f64, ceiling: f64 },
}

/// Configuration-time validation failures
#[derive(Error, Debug, Clone, PartialEq)]
pub enum ConfigValidationError {
    #[error("{field} must be within [0, 1], got {value}")]
    InvalidFraction { field: String, value: f64 },

    #[error("{scope} tier mix sums to {sum}, expected 1.0")]
    TierMix { scope: String, sum: f64 },

    #[error("Unknown pricing tier: {0}")]
    UnknownTier(String),

    #[error("Unknown time bucket: {0} (expected \"prime\" or \"off-peak\")")]
    UnknownBucket(String),

    #[error("Invalid value for {field}: {reason}")]
    InvalidValue { field: String, reason: String },
}

impl ConfigValidationError {
    pub(crate) fn invalid(field: impl Into<String>, reason: impl Into<String>) -> Self {
        ConfigValidationError::InvalidValue { field: field.into(), reason: reason.into() }
    }
}

impl EngineError {
    /// True for errors raised while checking the configuration itself
    pub fn is_config_error(&self) -> bool {
        matches!(self, EngineError::ConfigValidation(_))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn config_errors_convert_into_engine_errors() {
        let err: EngineError = ConfigValidationError::UnknownTier("gold".to_string()).into();
        assert!(err.is_config_error());
        assert_eq!(err.to_string(), "Configuration error: Unknown pricing tier: gold");
    }

    #[test]
    fn over_allocation_names_the_bucket() {
        let err = EngineError::OverAllocation { bucket: Bucket::Prime, requested: 160.0, available: 148.0 };
        assert!(!err.is_config_error());
        assert!(err.to_string().starts_with("prime over-allocated"));
    }
}
