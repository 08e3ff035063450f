//! Kasa adapter error types.

use hearth_domain::error::BridgeError;

/// Errors specific to the Kasa adapter.
#[derive(Debug, thiserror::Error)]
pub enum KasaError {
    /// Socket connect, read or write failed.
    #[error("kasa transport error")]
    Io(#[from] std::io::Error),

    /// The device did not answer within the configured timeout.
    #[error("kasa device did not answer in time")]
    Timeout,

    /// The reply was not valid JSON.
    #[error("invalid kasa payload")]
    Json(#[from] serde_json::Error),

    /// The reply was JSON but lacked the expected section.
    #[error("kasa reply has no '{0}' section")]
    Malformed(&'static str),

    /// A TCP reply announced a body longer than any device sends.
    #[error("kasa reply of {0} bytes exceeds the frame limit")]
    FrameTooLarge(usize),

    /// The device answered with a non-zero `err_code`.
    #[error("kasa device rejected {command}: {code} {message}")]
    Rejected {
        command: &'static str,
        code: i64,
        message: String,
    },

    /// `address` is not an IP address.
    #[error("invalid kasa address '{0}'")]
    Address(String),

    /// A strip child id not reported by the device.
    #[error("unknown outlet '{0}'")]
    UnknownChild(String),

    /// A domain-level error (validation, not-found, etc.).
    #[error("domain error")]
    Domain(#[source] BridgeError),
}

impl KasaError {
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

impl From<KasaError> for BridgeError {
    fn from(err: KasaError) -> Self {
        err.into_domain()
    }
}
