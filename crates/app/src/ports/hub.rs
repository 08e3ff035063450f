//! Hub port — the external accessory hub as seen by device platforms.

use std::sync::Arc;

use hearth_domain::accessory::Accessory;
use hearth_domain::error::BridgeError;
use hearth_domain::id::AccessoryId;

/// Makes accessories visible to the outside world.
pub trait AccessoryHub: Send + Sync {
    /// Expose `accessory` and start forwarding its property changes.
    ///
    /// # Errors
    ///
    /// Returns [`BridgeError::Validation`] if an accessory with the same name
    /// is already published.
    fn publish(&self, accessory: Arc<Accessory>) -> Result<AccessoryId, BridgeError>;
}
