use thiserror::Error;

#[derive(Clone, Debug, Error, PartialEq)]
pub enum DomainError {
    #[error("invalid load: {field} must be a positive finite number, got {value}")]
    InvalidLoad { field: &'static str, value: f64 },
    #[error("invalid load: {field} of {value} exceeds the supported maximum of {max}")]
    LoadOutOfRange { field: &'static str, value: f64, max: f64 },
    #[error("unknown tier code `{0}`")]
    UnknownTier(String),
    #[error("custom build {0} exceeds the representable range")]
    BuildOutOfRange(&'static str),
}

#[derive(Clone, Debug, Error, PartialEq)]
pub enum ApplicationError {
    #[error(transparent)]
    Domain(#[from] DomainError),
    #[error("persistence failure: {0}")]
    Persistence(String),
}

#[cfg(test)]
mod tests {
    use crate::errors::{ApplicationError, DomainError};

    #[test]
    fn domain_errors_pass_through_application_layer_unchanged() {
        let error = ApplicationError::from(DomainError::LoadOutOfRange {
            field: "watts",
            value: 2_000_000.0,
            max: 1_000_000.0,
        });

        assert_eq!(
            error.to_string(),
            "invalid load: watts of 2000000 exceeds the supported maximum of 1000000"
        );
    }

    #[test]
    fn build_range_error_names_the_failing_figure() {
        assert_eq!(
            DomainError::BuildOutOfRange("equipment cost").to_string(),
            "custom build equipment cost exceeds the representable range"
        );
    }
}
