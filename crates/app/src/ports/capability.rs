//! Capability ports — the closed set of interfaces a device model exposes.
//!
//! A platform selects the capability once, when the accessory is added, and
//! stores it behind one of these traits. Call sites never see the concrete
//! model.

use std::sync::Arc;

use async_trait::async_trait;
use hearth_domain::error::{BridgeError, ValidationError};
use hearth_domain::property::{Property, PropertyValue};

/// Something that can be switched on and off.
#[async_trait]
pub trait SwitchLike: Send + Sync {
    /// Read the live relay state from hardware.
    async fn is_on(&self) -> Result<bool, BridgeError>;

    async fn set_on(&self, on: bool) -> Result<(), BridgeError>;
}

/// A switch with a 0–100 brightness level.
#[async_trait]
pub trait DimmerLike: SwitchLike {
    async fn brightness(&self) -> Result<u8, BridgeError>;

    async fn set_brightness(&self, level: u8) -> Result<(), BridgeError>;
}

/// Route hub writes of a boolean `property` to `switch`.
///
/// The write is pushed to hardware and the live state read back, so the
/// property ends up holding what the device confirmed.
pub fn wire_switch(property: &Property, switch: Arc<dyn SwitchLike>) {
    let name = property.name().to_string();
    property.on_remote_write(move |value| {
        let switch = Arc::clone(&switch);
        let name = name.clone();
        async move {
            let on = value.as_bool().ok_or(ValidationError::InvalidValue {
                property: name,
                expected: "boolean",
            })?;
            switch.set_on(on).await?;
            Ok::<_, BridgeError>(PropertyValue::Bool(switch.is_on().await?))
        }
    });
}

/// Route hub writes of a 0–100 `property` to `dimmer`.
///
/// Same-value writes are still sent to the device.
pub fn wire_dimmer(property: &Property, dimmer: Arc<dyn DimmerLike>) {
    let name = property.name().to_string();
    property.on_remote_write(move |value| {
        let dimmer = Arc::clone(&dimmer);
        let name = name.clone();
        async move {
            let level = value
                .as_int()
                .and_then(|level| u8::try_from(level).ok())
                .filter(|level| *level <= 100)
                .ok_or(ValidationError::InvalidValue {
                    property: name,
                    expected: "0-100",
                })?;
            dimmer.set_brightness(level).await?;
            Ok::<_, BridgeError>(PropertyValue::Int(i64::from(dimmer.brightness().await?)))
        }
    });
}
