//! Common error types used across the workspace.
//!
//! Each layer defines its own typed errors and converts into [`BridgeError`]
//! when crossing a port boundary.

/// Top-level error shared by every port.
#[derive(Debug, thiserror::Error)]
pub enum BridgeError {
    /// Input or configuration rejected by a domain invariant.
    #[error("validation error: {0}")]
    Validation(#[from] ValidationError),

    /// A platform, accessory or property could not be found.
    #[error(transparent)]
    NotFound(#[from] NotFoundError),

    /// The device (or the transport to it) failed.
    #[error("device error")]
    Device(#[source] Box<dyn std::error::Error + Send + Sync>),
}

impl BridgeError {
    /// Wrap a transport or protocol failure.
    pub fn device(err: impl std::error::Error + Send + Sync + 'static) -> Self {
        Self::Device(Box::new(err))
    }
}

/// Domain invariant violations.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum ValidationError {
    #[error("name must not be empty")]
    EmptyName,

    #[error("platform must not be empty")]
    EmptyPlatform,

    #[error("an accessory named '{0}' already exists")]
    DuplicateName(String),

    #[error("an accessory with key '{0}' already exists")]
    DuplicateKey(String),

    #[error("property '{0}' is declared twice")]
    DuplicateProperty(String),

    #[error("property '{0}' is read-only")]
    ReadOnlyProperty(String),

    #[error("property '{property}' expects a {expected} value")]
    InvalidValue {
        property: String,
        expected: &'static str,
    },

    #[error("platform '{0}' does not host accessories")]
    NoAccessories(String),

    #[error("unsupported action verb '{0}'")]
    UnknownVerb(String),

    #[error("invalid value '{value}' for action verb '{verb}'")]
    InvalidActionValue { verb: String, value: String },
}

/// A lookup that found nothing.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("{entity} '{id}' not found")]
pub struct NotFoundError {
    /// Kind of thing looked up (`"Platform"`, `"Accessory"`, …).
    pub entity: &'static str,
    /// The key that was looked up.
    pub id: String,
}
