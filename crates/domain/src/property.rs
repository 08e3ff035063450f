//! Properties — the named, mutable, hub-visible values of an accessory.
//!
//! A property is written from two directions:
//!
//! - **device → hub** with [`Property::set`]: the observed hardware value
//!   overwrites the hub-visible one, and listeners are notified only when
//!   the value actually changed.
//! - **hub → device** with [`Property::remote_write`]: the registered
//!   callback pushes the value to hardware and reports what the hardware
//!   confirmed. Only the confirmed value is ever stored, so the hub never
//!   shows a value the hardware rejected.
//!
//! The two directions are not mutually exclusive. A reconciliation landing
//! while a remote write is in flight may be overwritten by the confirmation,
//! and the next reconciliation restores hardware truth.

mod value;

pub use value::PropertyValue;

use std::fmt;
use std::future::Future;
use std::pin::Pin;
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};

use serde::{Deserialize, Serialize};

use crate::error::{BridgeError, ValidationError};
use crate::time::{Timestamp, now};

/// Boxed, sendable future used by callbacks stored in the model.
pub type BoxFuture<T> = Pin<Box<dyn Future<Output = T> + Send>>;

/// Hub → device callback. Receives the requested value and resolves to the
/// value the hardware confirmed.
pub type RemoteWrite = Arc<dyn Fn(PropertyValue) -> BoxFuture<Result<PropertyValue, BridgeError>> + Send + Sync>;

/// Change-notify side effect.
pub type ChangeListener = Arc<dyn Fn(&PropertyChange<'_>) + Send + Sync>;

/// Who caused a change.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ChangeOrigin {
    /// Observed device state, including a confirmation that differs from the request.
    Device,
    /// A value the hub itself just wrote.
    Hub,
}

/// Payload handed to every [`ChangeListener`].
#[derive(Debug)]
pub struct PropertyChange<'a> {
    pub property: &'a str,
    pub value: &'a PropertyValue,
    pub origin: ChangeOrigin,
}

struct Current {
    value: PropertyValue,
    last_changed: Timestamp,
}

/// A single named value exposed to the hub.
pub struct Property {
    name: String,
    current: Mutex<Current>,
    remote_write: Mutex<Option<RemoteWrite>>,
    listeners: Mutex<Vec<ChangeListener>>,
}

impl fmt::Debug for Property {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Property")
            .field("name", &self.name)
            .field("value", &self.get())
            .field("writable", &self.is_writable())
            .finish_non_exhaustive()
    }
}

impl Property {
    /// Create a read-only property holding `initial`.
    pub fn new(name: impl Into<String>, initial: impl Into<PropertyValue>) -> Self {
        Self {
            name: name.into(),
            current: Mutex::new(Current {
                value: initial.into(),
                last_changed: now(),
            }),
            remote_write: Mutex::new(None),
            listeners: Mutex::new(Vec::new()),
        }
    }

    #[must_use]
    pub fn name(&self) -> &str {
        &self.name
    }

    /// Current hub-visible value.
    #[must_use]
    pub fn get(&self) -> PropertyValue {
        lock(&self.current).value.clone()
    }

    #[must_use]
    pub fn last_changed(&self) -> Timestamp {
        lock(&self.current).last_changed
    }

    /// Whether the hub may write this property.
    #[must_use]
    pub fn is_writable(&self) -> bool {
        lock(&self.remote_write).is_some()
    }

    /// Install (or replace) the hub → device callback.
    pub fn on_remote_write<F, Fut>(&self, callback: F)
    where
        F: Fn(PropertyValue) -> Fut + Send + Sync + 'static,
        Fut: Future<Output = Result<PropertyValue, BridgeError>> + Send + 'static,
    {
        let callback: RemoteWrite = Arc::new(move |value| Box::pin(callback(value)));
        *lock(&self.remote_write) = Some(callback);
    }

    /// Register a change-notify side effect.
    pub fn subscribe(&self, listener: ChangeListener) {
        lock(&self.listeners).push(listener);
    }

    /// Overwrite the hub-visible value with observed device state.
    ///
    /// Returns `true` (and notifies listeners) only when the value changed.
    pub fn set(&self, value: impl Into<PropertyValue>) -> bool {
        let value = value.into();
        if !self.store(&value) {
            return false;
        }
        self.emit(&value, ChangeOrigin::Device);
        true
    }

    /// Apply a hub-originated write through the remote-write callback.
    ///
    /// Nothing is stored until the callback answers: the property then holds
    /// the value the hardware confirmed. A failed callback leaves the
    /// property and its listeners untouched.
    ///
    /// # Errors
    ///
    /// Returns [`ValidationError::ReadOnlyProperty`] when no callback is
    /// installed, or whatever the callback failed with.
    pub async fn remote_write(&self, requested: PropertyValue) -> Result<PropertyValue, BridgeError> {
        let callback = lock(&self.remote_write)
            .clone()
            .ok_or_else(|| ValidationError::ReadOnlyProperty(self.name.clone()))?;

        let confirmed = callback(requested.clone()).await?;
        if self.store(&confirmed) {
            let origin = if confirmed == requested {
                ChangeOrigin::Hub
            } else {
                ChangeOrigin::Device
            };
            self.emit(&confirmed, origin);
        }
        Ok(confirmed)
    }

    fn store(&self, value: &PropertyValue) -> bool {
        let mut current = lock(&self.current);
        if current.value == *value {
            return false;
        }
        current.value = value.clone();
        current.last_changed = now();
        true
    }

    fn emit(&self, value: &PropertyValue, origin: ChangeOrigin) {
        let listeners = lock(&self.listeners).clone();
        let change = PropertyChange {
            property: &self.name,
            value,
            origin,
        };
        for listener in &listeners {
            listener(&change);
        }
    }
}

fn lock<T>(mutex: &Mutex<T>) -> MutexGuard<'_, T> {
    mutex.lock().unwrap_or_else(PoisonError::into_inner)
}
