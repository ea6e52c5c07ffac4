use thiserror::Error;

pub type Result<T> = std::result::Result<T, BayesError>;

#[derive(Debug, Clone, PartialEq, Error)]
pub enum BayesError {
    /// The hypothesis domain has no values
    #[error("Hypothesis domain is empty")]
    EmptyDomain,

    /// Hypothesis values must be strictly ascending and finite
    #[error("Hypothesis domain is not strictly ascending at index {index}")]
    UnsortedDomain { index: usize },

    /// A prior weight or likelihood was negative or not a number
    #[error("Invalid weight {weight} for hypothesis {hypothesis}")]
    InvalidWeight { hypothesis: f64, weight: f64 },

    /// The observation is impossible under every hypothesis
    #[error("Observation has zero probability under every hypothesis")]
    ZeroEvidence,

    #[error("Invalid parameter {name} = {value}: {constraint}")]
    InvalidParameter {
        name: &'static str,
        value: f64,
        constraint: &'static str,
    },

    /// Percentile or probability outside its valid range
    #[error("Value {value} is outside the valid range [{low}, {high}]")]
    OutOfDomain { value: f64, low: f64, high: f64 },
}

/// Check `value` lies in `[low, high]`, rejecting NaN.
pub(crate) fn check_range(value: f64, low: f64, high: f64) -> Result<f64> {
    if value.is_nan() || value < low || value > high {
        return Err(BayesError::OutOfDomain { value, low, high });
    }
    Ok(value)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_check_range() {
        assert_eq!(check_range(50.0, 0.0, 100.0), Ok(50.0));
        assert_eq!(check_range(0.0, 0.0, 100.0), Ok(0.0));
        assert_eq!(check_range(100.0, 0.0, 100.0), Ok(100.0));
        assert!(check_range(-0.1, 0.0, 100.0).is_err());
        assert!(check_range(100.5, 0.0, 100.0).is_err());
        assert!(check_range(f64::NAN, 0.0, 1.0).is_err());
    }

    #[test]
    fn test_display() {
        let err = BayesError::OutOfDomain {
            value: 2.0,
            low: 0.0,
            high: 1.0,
        };
        assert_eq!(err.to_string(), "Value 2 is outside the valid range [0, 1]");
        assert_eq!(
            BayesError::ZeroEvidence.to_string(),
            "Observation has zero probability under every hypothesis"
        );
    }
}
