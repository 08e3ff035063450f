//! Accessory — one exposed device or service, owned by one platform.

use std::collections::{BTreeMap, HashSet};
use std::fmt;
use std::sync::Arc;

use serde::{Deserialize, Serialize};

use crate::action::ActionRule;
use crate::error::{BridgeError, ValidationError};
use crate::property::{BoxFuture, Property, PropertyValue};
use crate::zone::ZoneDefinition;

/// Inbound accessory definition, as loaded from configuration.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct AccessoryDefinition {
    pub platform: String,
    pub name: String,
    #[serde(default, alias = "ip")]
    pub address: String,
    #[serde(default)]
    pub username: Option<String>,
    #[serde(default)]
    pub password: Option<String>,
    /// Model hint for platforms that cannot ask the hardware.
    #[serde(default)]
    pub model: Option<String>,
    #[serde(default)]
    pub zones: Vec<ZoneDefinition>,
    #[serde(default)]
    pub actions: Vec<ActionRule>,
}

impl AccessoryDefinition {
    /// Check that the definition can be routed.
    ///
    /// # Errors
    ///
    /// Returns [`BridgeError::Validation`] when `platform` or `name` is empty.
    pub fn validate(&self) -> Result<(), BridgeError> {
        if self.platform.is_empty() {
            return Err(ValidationError::EmptyPlatform.into());
        }
        if self.name.is_empty() {
            return Err(ValidationError::EmptyName.into());
        }
        Ok(())
    }

    #[must_use]
    pub fn credentials(&self) -> Credentials {
        Credentials {
            username: self.username.clone(),
            password: self.password.clone(),
        }
    }
}

/// Optional per-accessory credentials.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Credentials {
    pub username: Option<String>,
    pub password: Option<String>,
}

/// Canonical identity, resolved from hardware (or synthesized).
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct AccessoryInfo {
    pub name: String,
    pub manufacturer: String,
    pub model: String,
    pub serial_number: String,
    pub firmware_revision: String,
    /// Stable numeric id derived from the serial number.
    pub id: u64,
}

impl AccessoryInfo {
    /// Derive a numeric id from the first 12 hex digits of a serial number.
    ///
    /// Returns 0 when the serial does not start with hex.
    #[must_use]
    pub fn numeric_id(serial: &str) -> u64 {
        let prefix: String = serial.chars().take(12).collect();
        u64::from_str_radix(&prefix, 16).unwrap_or(0)
    }
}

/// Capability type the hub sees.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum AccessoryKind {
    Switch,
    Lightbulb,
    PowerStrip,
    SecuritySystem,
}

/// Device-specific action handler, invoked by the dispatcher.
pub type ActionHandler = Arc<dyn Fn(ActionRule) -> BoxFuture<Result<(), BridgeError>> + Send + Sync>;

/// One exposed device or service.
pub struct Accessory {
    platform: String,
    name: String,
    address: String,
    credentials: Credentials,
    kind: AccessoryKind,
    info: AccessoryInfo,
    properties: Vec<Arc<Property>>,
    actions: Vec<ActionRule>,
    handler: Option<ActionHandler>,
}

impl fmt::Debug for Accessory {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Accessory")
            .field("platform", &self.platform)
            .field("name", &self.name)
            .field("address", &self.address)
            .field("kind", &self.kind)
            .field("properties", &self.properties)
            .field("actions", &self.actions.len())
            .field("handler", &self.handler.is_some())
            .finish_non_exhaustive()
    }
}

impl Accessory {
    /// Create a builder for constructing an [`Accessory`].
    #[must_use]
    pub fn builder() -> AccessoryBuilder {
        AccessoryBuilder::default()
    }

    #[must_use]
    pub fn platform(&self) -> &str {
        &self.platform
    }

    #[must_use]
    pub fn name(&self) -> &str {
        &self.name
    }

    #[must_use]
    pub fn address(&self) -> &str {
        &self.address
    }

    #[must_use]
    pub fn credentials(&self) -> &Credentials {
        &self.credentials
    }

    #[must_use]
    pub fn kind(&self) -> AccessoryKind {
        self.kind
    }

    #[must_use]
    pub fn info(&self) -> &AccessoryInfo {
        &self.info
    }

    #[must_use]
    pub fn property(&self, name: &str) -> Option<&Arc<Property>> {
        self.properties.iter().find(|p| p.name() == name)
    }

    #[must_use]
    pub fn properties(&self) -> &[Arc<Property>] {
        &self.properties
    }

    #[must_use]
    pub fn actions(&self) -> &[ActionRule] {
        &self.actions
    }

    /// Rules whose trigger equals `label`, in declared order.
    #[must_use]
    pub fn match_actions(&self, label: &str) -> Vec<ActionRule> {
        self.actions
            .iter()
            .filter(|rule| rule.matches(label))
            .cloned()
            .collect()
    }

    #[must_use]
    pub fn handler(&self) -> Option<&ActionHandler> {
        self.handler.as_ref()
    }

    /// Serializable view of the accessory and its current values.
    #[must_use]
    pub fn snapshot(&self) -> AccessorySnapshot {
        AccessorySnapshot {
            name: self.name.clone(),
            platform: self.platform.clone(),
            kind: self.kind,
            info: self.info.clone(),
            properties: self
                .properties
                .iter()
                .map(|p| (p.name().to_string(), p.get()))
                .collect(),
        }
    }
}

/// Point-in-time view of an [`Accessory`].
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AccessorySnapshot {
    pub name: String,
    pub platform: String,
    pub kind: AccessoryKind,
    pub info: AccessoryInfo,
    pub properties: BTreeMap<String, PropertyValue>,
}

/// Step-by-step builder for [`Accessory`].
#[derive(Default)]
pub struct AccessoryBuilder {
    platform: Option<String>,
    name: Option<String>,
    address: Option<String>,
    credentials: Credentials,
    kind: Option<AccessoryKind>,
    info: AccessoryInfo,
    properties: Vec<Arc<Property>>,
    actions: Vec<ActionRule>,
    handler: Option<ActionHandler>,
}

impl AccessoryBuilder {
    /// Seed platform, name, address, credentials and rules from a definition.
    #[must_use]
    pub fn definition(mut self, def: &AccessoryDefinition) -> Self {
        self.platform = Some(def.platform.clone());
        self.name = Some(def.name.clone());
        self.address = Some(def.address.clone());
        self.credentials = def.credentials();
        self.actions.clone_from(&def.actions);
        self
    }

    #[must_use]
    pub fn platform(mut self, platform: impl Into<String>) -> Self {
        self.platform = Some(platform.into());
        self
    }

    #[must_use]
    pub fn name(mut self, name: impl Into<String>) -> Self {
        self.name = Some(name.into());
        self
    }

    #[must_use]
    pub fn address(mut self, address: impl Into<String>) -> Self {
        self.address = Some(address.into());
        self
    }

    #[must_use]
    pub fn kind(mut self, kind: AccessoryKind) -> Self {
        self.kind = Some(kind);
        self
    }

    /// Hardware identity. Its name, when set, overrides the configured one.
    #[must_use]
    pub fn info(mut self, info: AccessoryInfo) -> Self {
        if !info.name.is_empty() {
            self.name = Some(info.name.clone());
        }
        self.info = info;
        self
    }

    #[must_use]
    pub fn property(mut self, property: Arc<Property>) -> Self {
        self.properties.push(property);
        self
    }

    #[must_use]
    pub fn action(mut self, rule: ActionRule) -> Self {
        self.actions.push(rule);
        self
    }

    #[must_use]
    pub fn handler(mut self, handler: ActionHandler) -> Self {
        self.handler = Some(handler);
        self
    }

    /// Consume the builder, validate, and return an [`Accessory`].
    ///
    /// # Errors
    ///
    /// Returns [`BridgeError::Validation`] if the name or platform is missing
    /// or a property name is declared twice.
    pub fn build(self) -> Result<Accessory, BridgeError> {
        let name = self.name.unwrap_or_default();
        if name.is_empty() {
            return Err(ValidationError::EmptyName.into());
        }
        let platform = self.platform.unwrap_or_default();
        if platform.is_empty() {
            return Err(ValidationError::EmptyPlatform.into());
        }
        let mut seen = HashSet::new();
        for property in &self.properties {
            if !seen.insert(property.name()) {
                return Err(ValidationError::DuplicateProperty(property.name().to_string()).into());
            }
        }
        let mut info = self.info;
        if info.name.is_empty() {
            info.name.clone_from(&name);
        }
        Ok(Accessory {
            platform,
            name,
            address: self.address.unwrap_or_default(),
            credentials: self.credentials,
            kind: self.kind.unwrap_or(AccessoryKind::Switch),
            info,
            properties: self.properties,
            actions: self.actions,
            handler: self.handler,
        })
    }
}
