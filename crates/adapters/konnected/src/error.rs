//! Konnected adapter error types.

use hearth_domain::error::BridgeError;

/// Errors specific to the Konnected adapter.
#[derive(Debug, thiserror::Error)]
pub enum KonnectedError {
    /// The board could not be reached, answered with an error status or
    /// sent a body that did not decode.
    #[error("konnected request failed")]
    Http(#[from] reqwest::Error),

    /// A webhook body was not a pin report.
    #[error("invalid konnected report")]
    Report(#[from] serde_json::Error),

    #[error("unknown konnected device '{0}'")]
    UnknownDevice(String),

    /// The webhook token was missing or did not match.
    #[error("unauthorized konnected report for '{0}'")]
    Unauthorized(String),

    /// A domain-level error (validation, not-found, etc.).
    #[error("domain error")]
    Domain(#[source] BridgeError),
}

impl KonnectedError {
    /// Convert into a [`BridgeError`] for propagation across port
    /// boundaries.
    #[must_use]
    pub fn into_domain(self) -> BridgeError {
        match self {
            Self::Domain(err) => err,
            other => BridgeError::device(other),
        }
    }
}

impl From<KonnectedError> for BridgeError {
    fn from(err: KonnectedError) -> Self {
        err.into_domain()
    }
}

impl From<BridgeError> for KonnectedError {
    fn from(err: BridgeError) -> Self {
        Self::Domain(err)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use hearth_domain::error::ValidationError;

    #[test]
    fn should_convert_unknown_device_to_device_error() {
        let err: BridgeError = KonnectedError::UnknownDevice("abc".to_string()).into();
        assert!(matches!(err, BridgeError::Device(_)));
    }

    #[test]
    fn should_keep_domain_error_when_round_tripped() {
        let err = KonnectedError::from(BridgeError::from(ValidationError::EmptyName));
        assert!(matches!(
            err.into_domain(),
            BridgeError::Validation(ValidationError::EmptyName)
        ));
    }
}
