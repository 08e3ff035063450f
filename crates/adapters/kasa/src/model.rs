//! Model dispatch table.
//!
//! The capability set of a device is chosen once, from the model string it
//! reports, by looking it up in a static table. Unknown models get the plug
//! capability set.

use hearth_domain::accessory::AccessoryKind;

/// Capability class of a Kasa model.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ModelClass {
    /// Single relay.
    Plug,
    /// Relay plus brightness.
    Dimmer,
    /// Several independently switched outlets.
    Strip,
}

impl ModelClass {
    #[must_use]
    pub fn kind(self) -> AccessoryKind {
        match self {
            Self::Plug => AccessoryKind::Switch,
            Self::Dimmer => AccessoryKind::Lightbulb,
            Self::Strip => AccessoryKind::PowerStrip,
        }
    }
}

const MODELS: &[(&str, ModelClass)] = &[
    ("HS100", ModelClass::Plug),
    ("HS103", ModelClass::Plug),
    ("HS105", ModelClass::Plug),
    ("HS110", ModelClass::Plug),
    ("HS200", ModelClass::Plug),
    ("HS210", ModelClass::Plug),
    ("KP100", ModelClass::Plug),
    ("KP105", ModelClass::Plug),
    ("KP115", ModelClass::Plug),
    ("KP125", ModelClass::Plug),
    ("EP10", ModelClass::Plug),
    ("HS220", ModelClass::Dimmer),
    ("KS220", ModelClass::Dimmer),
    ("ES20M", ModelClass::Dimmer),
    ("HS107", ModelClass::Strip),
    ("HS300", ModelClass::Strip),
    ("KP200", ModelClass::Strip),
    ("KP303", ModelClass::Strip),
    ("KP400", ModelClass::Strip),
    ("EP40", ModelClass::Strip),
];

/// Classify a reported model such as `"HS220(US)"`.
#[must_use]
pub fn classify(model: &str) -> ModelClass {
    let base = model.split('(').next().unwrap_or_default().trim();
    MODELS
        .iter()
        .find(|(name, _)| name.eq_ignore_ascii_case(base))
        .map_or(ModelClass::Plug, |(_, class)| *class)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn should_ignore_region_suffix() {
        assert_eq!(classify("HS220(US)"), ModelClass::Dimmer);
        assert_eq!(classify("KP303(UK)"), ModelClass::Strip);
        assert_eq!(classify("HS200(US)"), ModelClass::Plug);
    }

    #[test]
    fn should_default_unknown_models_to_plug() {
        assert_eq!(classify("KL130(EU)"), ModelClass::Plug);
        assert_eq!(classify(""), ModelClass::Plug);
    }

    #[test]
    fn should_map_classes_to_accessory_kinds() {
        assert_eq!(ModelClass::Dimmer.kind(), AccessoryKind::Lightbulb);
        assert_eq!(ModelClass::Strip.kind(), AccessoryKind::PowerStrip);
    }
}
