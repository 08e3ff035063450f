//! Hub change events — emitted whenever a published property changes.

use serde::{Deserialize, Serialize};

use crate::id::EventId;
use crate::property::{ChangeOrigin, PropertyValue};
use crate::time::Timestamp;

/// A property of a published accessory took a new value.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PropertyChanged {
    pub id: EventId,
    pub accessory: String,
    pub property: String,
    pub value: PropertyValue,
    pub origin: ChangeOrigin,
    pub timestamp: Timestamp,
}

impl PropertyChanged {
    #[must_use]
    pub fn new(
        accessory: impl Into<String>,
        property: impl Into<String>,
        value: PropertyValue,
        origin: ChangeOrigin,
    ) -> Self {
        Self {
            id: EventId::random(),
            accessory: accessory.into(),
            property: property.into(),
            value,
            origin,
            timestamp: crate::time::now(),
        }
    }
}

impl std::fmt::Display for PropertyChanged {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}.{} = {}", self.accessory, self.property, self.value)
    }
}
