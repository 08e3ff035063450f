//! Pins and zones of an alarm board.

use serde::{Deserialize, Serialize};

/// What a pin is wired to.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ZoneKind {
    Motion,
    #[serde(alias = "door")]
    Contact,
    Buzzer,
    /// The board's own arm-state output.
    System,
}

/// A configured pin.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ZoneDefinition {
    pub pin: u8,
    #[serde(default)]
    pub name: String,
    #[serde(rename = "type")]
    pub kind: ZoneKind,
}

impl ZoneDefinition {
    /// Name of the property exposing this zone, if it has one.
    ///
    /// Buzzer and system pins are not exposed as sensors.
    #[must_use]
    pub fn property_name(&self) -> Option<String> {
        match self.kind {
            ZoneKind::Motion => Some(format!("zone.{}.motion", self.pin)),
            ZoneKind::Contact => Some(format!("zone.{}.contact", self.pin)),
            ZoneKind::Buzzer | ZoneKind::System => None,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn should_accept_door_as_contact_alias() {
        let zone: ZoneDefinition = toml::from_str("pin = 5\nname = \"Front\"\ntype = \"door\"").unwrap();
        assert_eq!(zone.kind, ZoneKind::Contact);
        assert_eq!(zone.property_name().as_deref(), Some("zone.5.contact"));
    }

    #[test]
    fn should_not_expose_buzzer_as_property() {
        let zone = ZoneDefinition {
            pin: 8,
            name: "Siren".to_string(),
            kind: ZoneKind::Buzzer,
        };
        assert!(zone.property_name().is_none());
    }
}
