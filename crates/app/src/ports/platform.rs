//! Platform port — lifecycle and accessory map of one device family.
//!
//! A platform bridges a device protocol (smart plugs, alarm boards, …) into
//! the hub. The bootstrap calls the lifecycle methods through the
//! [`PlatformRegistry`](crate::registry::PlatformRegistry):
//!
//! 1. [`startup`](Platform::startup) — open sockets, build clients
//! 2. [`add_accessory`](Platform::add_accessory) — once per configured definition
//! 3. [`background`](Platform::background) — spawn reconciliation ticks and listeners
//! 4. [`shutdown`](Platform::shutdown) — stop background work

use std::sync::Arc;

use async_trait::async_trait;
use hearth_domain::accessory::{Accessory, AccessoryDefinition};
use hearth_domain::error::{BridgeError, ValidationError};

/// A device family adapter.
#[async_trait]
pub trait Platform: Send + Sync {
    /// Unique name identifying this platform (e.g. `"Kasa"`).
    fn name(&self) -> &'static str;

    async fn startup(&self) -> Result<(), BridgeError> {
        Ok(())
    }

    /// Start long-running work and return immediately.
    async fn background(&self) -> Result<(), BridgeError> {
        Ok(())
    }

    async fn shutdown(&self) -> Result<(), BridgeError> {
        Ok(())
    }

    /// Resolve live identity, build and publish the accessory, then index it
    /// under its reconciliation key.
    ///
    /// Platforms that host no accessories keep the default, which rejects.
    async fn add_accessory(&self, def: AccessoryDefinition) -> Result<Arc<Accessory>, BridgeError> {
        Err(ValidationError::NoAccessories(def.platform).into())
    }

    /// Look an accessory up by reconciliation key or by name.
    fn get_accessory(&self, _key: &str) -> Option<Arc<Accessory>> {
        None
    }
}
