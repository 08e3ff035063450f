//! In-process accessory hub — the hub-exposure platform.
//!
//! Published accessories are indexed by name. Every property change is
//! turned into a [`PropertyChanged`] event on a tokio [`broadcast`] channel;
//! publishing succeeds even when nobody is subscribed.

use std::collections::BTreeMap;
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};

use async_trait::async_trait;
use hearth_domain::accessory::Accessory;
use hearth_domain::error::{BridgeError, NotFoundError, ValidationError};
use hearth_domain::event::PropertyChanged;
use hearth_domain::id::AccessoryId;
use hearth_domain::property::{PropertyChange, PropertyValue};
use tokio::sync::broadcast;

use crate::ports::{AccessoryHub, Platform};

/// Platform name of the hub.
pub const HUB_PLATFORM: &str = "HomeControl";

/// An accessory as the hub sees it.
#[derive(Debug, Clone)]
pub struct Published {
    pub id: AccessoryId,
    pub accessory: Arc<Accessory>,
}

/// Hub exposing accessories to in-process consumers (HTTP API, SSE).
pub struct InProcessHub {
    accessories: Mutex<BTreeMap<String, Published>>,
    sender: broadcast::Sender<PropertyChanged>,
}

impl InProcessHub {
    /// Create a hub whose change channel buffers `capacity` events.
    #[must_use]
    pub fn new(capacity: usize) -> Self {
        let (sender, _) = broadcast::channel(capacity);
        Self {
            accessories: Mutex::new(BTreeMap::new()),
            sender,
        }
    }

    /// Receive every change published *after* this call.
    #[must_use]
    pub fn subscribe(&self) -> broadcast::Receiver<PropertyChanged> {
        self.sender.subscribe()
    }

    /// Published accessories ordered by name.
    #[must_use]
    pub fn accessories(&self) -> Vec<Published> {
        self.lock().values().cloned().collect()
    }

    #[must_use]
    pub fn accessory(&self, name: &str) -> Option<Published> {
        self.lock().get(name).cloned()
    }

    /// Hub → device write of one property.
    ///
    /// # Errors
    ///
    /// Returns [`BridgeError::NotFound`] for an unknown accessory or
    /// property, otherwise whatever the property's remote write failed with.
    pub async fn remote_write(&self, accessory: &str, property: &str, value: PropertyValue) -> Result<PropertyValue, BridgeError> {
        let published = self.accessory(accessory).ok_or_else(|| NotFoundError {
            entity: "Accessory",
            id: accessory.to_string(),
        })?;
        let target = published
            .accessory
            .property(property)
            .cloned()
            .ok_or_else(|| NotFoundError {
                entity: "Property",
                id: format!("{accessory}.{property}"),
            })?;
        tracing::info!(accessory, property, value = %value, "remote write");
        target.remote_write(value).await
    }

    fn lock(&self) -> MutexGuard<'_, BTreeMap<String, Published>> {
        self.accessories.lock().unwrap_or_else(PoisonError::into_inner)
    }
}

impl AccessoryHub for InProcessHub {
    fn publish(&self, accessory: Arc<Accessory>) -> Result<AccessoryId, BridgeError> {
        let id = AccessoryId::random();
        {
            let mut accessories = self.lock();
            if accessories.contains_key(accessory.name()) {
                return Err(ValidationError::DuplicateName(accessory.name().to_string()).into());
            }
            accessories.insert(
                accessory.name().to_string(),
                Published {
                    id,
                    accessory: Arc::clone(&accessory),
                },
            );
        }

        for property in accessory.properties() {
            let sender = self.sender.clone();
            let name = accessory.name().to_string();
            property.subscribe(Arc::new(move |change: &PropertyChange<'_>| {
                let event = PropertyChanged::new(name.clone(), change.property, change.value.clone(), change.origin);
                tracing::debug!(event = %event, "property changed");
                // Sending only fails without subscribers.
                let _ = sender.send(event);
            }));
        }
        tracing::info!(accessory = accessory.name(), id = %id, "accessory published");
        Ok(id)
    }
}

#[async_trait]
impl Platform for InProcessHub {
    fn name(&self) -> &'static str {
        HUB_PLATFORM
    }

    fn get_accessory(&self, key: &str) -> Option<Arc<Accessory>> {
        self.accessory(key).map(|p| p.accessory)
    }
}
