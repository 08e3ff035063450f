//! Konnected board JSON payloads.

use serde::{Deserialize, Serialize};

/// `GET /status` reply. Fields the bridge does not use are ignored.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct Status {
    pub mac: String,
    pub hw_version: String,
    pub sw_version: String,
    pub sensors: Vec<PinState>,
}

impl Status {
    /// MAC without separators, as used in webhook paths.
    #[must_use]
    pub fn device_id(&self) -> String {
        self.mac.chars().filter(|c| *c != ':' && *c != '-').collect()
    }
}

/// One pin report, from the webhook or `GET /device`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct PinState {
    pub pin: u8,
    pub state: u8,
}

/// `PUT /device` actuator command.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct Command {
    pub pin: u8,
    pub state: u8,
    /// Pulse length in milliseconds.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub momentary: Option<u16>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub times: Option<u16>,
    /// Gap between pulses in milliseconds.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub pause: Option<u16>,
}

impl Command {
    #[must_use]
    pub fn ring(pin: u8) -> Self {
        Self::latch(pin, 1)
    }

    #[must_use]
    pub fn silence(pin: u8) -> Self {
        Self::latch(pin, 0)
    }

    /// One short confirmation beep.
    #[must_use]
    pub fn chirp(pin: u8) -> Self {
        Self {
            momentary: Some(60),
            times: Some(1),
            ..Self::latch(pin, 1)
        }
    }

    /// `times` beeps, one per second.
    #[must_use]
    pub fn intermittent(pin: u8, times: u16) -> Self {
        Self {
            momentary: Some(120),
            times: Some(times),
            pause: Some(880),
            ..Self::latch(pin, 1)
        }
    }

    fn latch(pin: u8, state: u8) -> Self {
        Self {
            pin,
            state,
            momentary: None,
            times: None,
            pause: None,
        }
    }
}
