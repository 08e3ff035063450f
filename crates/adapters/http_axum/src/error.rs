//! HTTP error types and response mapping.

use axum::Json;
use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use serde::Serialize;

use hearth_domain::error::BridgeError;

/// JSON error body returned by API endpoints.
#[derive(Serialize)]
struct ErrorBody {
    error: String,
}

/// Maps [`BridgeError`] to an HTTP response with appropriate status code.
pub struct ApiError(BridgeError);

impl From<BridgeError> for ApiError {
    fn from(err: BridgeError) -> Self {
        Self(err)
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let (status, message) = match &self.0 {
            BridgeError::Validation(err) => (StatusCode::BAD_REQUEST, err.to_string()),
            BridgeError::NotFound(err) => (StatusCode::NOT_FOUND, err.to_string()),
            BridgeError::Device(err) => {
                tracing::warn!(error = %err, "device error");
                (StatusCode::BAD_GATEWAY, format!("device error: {err}"))
            }
        };

        (status, Json(ErrorBody { error: message })).into_response()
    }
}

/// Errors of the HTTP platform itself.
#[derive(Debug, thiserror::Error)]
pub enum HttpError {
    #[error("unable to bind http listener on {address}")]
    Bind {
        address: String,
        #[source]
        source: std::io::Error,
    },

    /// A domain-level error (validation, not-found, etc.).
    #[error("domain error")]
    Domain(#[source] BridgeError),
}

impl HttpError {
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

impl From<HttpError> for BridgeError {
    fn from(err: HttpError) -> Self {
        err.into_domain()
    }
}
