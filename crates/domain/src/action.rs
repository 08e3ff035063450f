//! Action Rule — a declarative trigger → effect binding owned by an accessory.

use serde::{Deserialize, Serialize};

/// Trigger labels understood by the dispatcher.
pub mod trigger {
    pub const ON: &str = "On";
    pub const OFF: &str = "Off";
    pub const HOME: &str = "Home";
    pub const AWAY: &str = "Away";
    pub const NIGHT: &str = "Night";
    pub const DISARMED: &str = "Disarmed";
    pub const TRIGGERED: &str = "Triggered";
    /// Strip child switched on.
    pub const OUT_ON: &str = "OutOn";
    /// Strip child switched off.
    pub const OUT_OFF: &str = "OutOff";
}

/// Verbs accepted by device action handlers.
pub mod verb {
    /// `on`/`off`/`1`/`0`, or `<child-id>:<on|off>` for strip outlets.
    pub const SET_RELAY_STATE: &str = "SetRelayState";
    /// 0-100.
    pub const SET_BRIGHTNESS: &str = "SetBrightness";
    /// Switch on after `value` seconds.
    pub const COUNTDOWN_ON: &str = "CountdownOn";
    /// Switch off after `value` seconds.
    pub const COUNTDOWN_OFF: &str = "CountdownOff";
    /// `Home`, `Away`, `Night` or `Disarmed`.
    pub const SET_SECURITY_STATE: &str = "SetSecurityState";
}

/// Parse a switch action value (`on`/`off`, `1`/`0`, `true`/`false`).
#[must_use]
pub fn parse_switch_value(value: &str) -> Option<bool> {
    match value.trim().to_ascii_lowercase().as_str() {
        "on" | "1" | "true" => Some(true),
        "off" | "0" | "false" => Some(false),
        _ => None,
    }
}

/// When an accessory raises `trigger`, ask `target_accessory` on
/// `target_platform` to perform `verb` with `value`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ActionRule {
    pub trigger: String,
    #[serde(rename = "platform")]
    pub target_platform: String,
    #[serde(rename = "accessory")]
    pub target_accessory: String,
    pub verb: String,
    #[serde(default)]
    pub value: String,
}

impl ActionRule {
    /// Exact label equality, no patterns.
    #[must_use]
    pub fn matches(&self, label: &str) -> bool {
        self.trigger == label
    }
}

impl std::fmt::Display for ActionRule {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(
            f,
            "{} -> {}/{} {}({})",
            self.trigger, self.target_platform, self.target_accessory, self.verb, self.value
        )
    }
}
