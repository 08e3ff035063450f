//! Security alarm states and their legal transitions.
//!
//! The rules here are pure; timers and annunciator IO live in the app
//! crate's alarm controller.
//!
//! ```text
//! Disarmed ──arm──▶ {Stay,Away,Night}Armed ──sensor──▶ Triggered
//!     ▲                     │    ▲  └──re-arm──┘             │
//!     └──────disarm─────────┘    │                           │
//!     └──────────────────────────┴───────disarm──────────────┘
//! ```

use serde::{Deserialize, Serialize};

use crate::action::trigger;
use crate::zone::ZoneKind;

/// Current state of a security accessory.
///
/// Discriminants follow the accessory-hub security-system characteristic.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum SecurityState {
    StayArmed = 0,
    AwayArmed = 1,
    NightArmed = 2,
    #[default]
    Disarmed = 3,
    Triggered = 4,
}

impl SecurityState {
    #[must_use]
    pub fn code(self) -> i64 {
        self as i64
    }

    #[must_use]
    pub fn from_code(code: i64) -> Option<Self> {
        match code {
            0 => Some(Self::StayArmed),
            1 => Some(Self::AwayArmed),
            2 => Some(Self::NightArmed),
            3 => Some(Self::Disarmed),
            4 => Some(Self::Triggered),
            _ => None,
        }
    }

    #[must_use]
    pub fn is_armed(self) -> bool {
        matches!(self, Self::StayArmed | Self::AwayArmed | Self::NightArmed)
    }

    /// The action trigger label raised when this state is entered.
    #[must_use]
    pub fn trigger_label(self) -> &'static str {
        match self {
            Self::StayArmed => trigger::HOME,
            Self::AwayArmed => trigger::AWAY,
            Self::NightArmed => trigger::NIGHT,
            Self::Disarmed => trigger::DISARMED,
            Self::Triggered => trigger::TRIGGERED,
        }
    }

    /// Parse an action value (`Home`, `Away`, `Night`, `Disarmed`).
    ///
    /// `Triggered` is not requestable and yields `None`.
    #[must_use]
    pub fn from_label(label: &str) -> Option<Self> {
        match label {
            trigger::HOME | "Stay" => Some(Self::StayArmed),
            trigger::AWAY => Some(Self::AwayArmed),
            trigger::NIGHT => Some(Self::NightArmed),
            trigger::DISARMED | "Off" => Some(Self::Disarmed),
            _ => None,
        }
    }
}

impl std::fmt::Display for SecurityState {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(match self {
            Self::StayArmed => "StayArmed",
            Self::AwayArmed => "AwayArmed",
            Self::NightArmed => "NightArmed",
            Self::Disarmed => "Disarmed",
            Self::Triggered => "Triggered",
        })
    }
}

/// How the annunciator behaves once a sensor trips an armed system.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Annunciation {
    /// Continuous ring right away.
    Instant,
    /// Intermittent chirps for the entry window, then continuous ring.
    Countdown,
}

/// Decide whether an active sensor trips the alarm.
///
/// Contacts trip Away (with a countdown for entry-disarm) and Night
/// (instantly). Motion trips any armed state instantly. An already
/// triggered alarm is not re-triggered.
#[must_use]
pub fn evaluate_sensor(state: SecurityState, zone: ZoneKind, active: bool) -> Option<Annunciation> {
    if !active {
        return None;
    }
    match (state, zone) {
        (SecurityState::AwayArmed, ZoneKind::Contact) => Some(Annunciation::Countdown),
        (SecurityState::NightArmed, ZoneKind::Contact) => Some(Annunciation::Instant),
        (s, ZoneKind::Motion) if s.is_armed() => Some(Annunciation::Instant),
        _ => None,
    }
}

/// Outcome of a target-state request.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ArmDecision {
    /// The state moves.
    Changed {
        from: SecurityState,
        to: SecurityState,
    },
    /// Already in the requested state; echo it back.
    Confirmed(SecurityState),
    /// Ignored; the state stays at `current`.
    Rejected { current: SecurityState },
}

/// Apply an arm/disarm request to the current state.
///
/// Nobody may request `Triggered`. While triggered only a disarm is
/// accepted.
#[must_use]
pub fn evaluate_request(current: SecurityState, requested: SecurityState) -> ArmDecision {
    match (current, requested) {
        (_, SecurityState::Triggered) => ArmDecision::Rejected { current },
        (SecurityState::Triggered, SecurityState::Disarmed) => ArmDecision::Changed {
            from: current,
            to: requested,
        },
        (SecurityState::Triggered, _) => ArmDecision::Rejected { current },
        (from, to) if from == to => ArmDecision::Confirmed(current),
        (from, to) => ArmDecision::Changed { from, to },
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const ARMED: [SecurityState; 3] = [
        SecurityState::StayArmed,
        SecurityState::AwayArmed,
        SecurityState::NightArmed,
    ];

    #[test]
    fn should_start_disarmed() {
        assert_eq!(SecurityState::default(), SecurityState::Disarmed);
    }

    #[test]
    fn should_map_codes_both_ways() {
        for code in 0..=4 {
            assert_eq!(SecurityState::from_code(code).unwrap().code(), code);
        }
        assert!(SecurityState::from_code(5).is_none());
    }

    #[test]
    fn should_reject_arm_requests_when_triggered() {
        for requested in ARMED {
            assert_eq!(
                evaluate_request(SecurityState::Triggered, requested),
                ArmDecision::Rejected {
                    current: SecurityState::Triggered
                }
            );
        }
    }

    #[test]
    fn should_disarm_when_triggered() {
        assert_eq!(
            evaluate_request(SecurityState::Triggered, SecurityState::Disarmed),
            ArmDecision::Changed {
                from: SecurityState::Triggered,
                to: SecurityState::Disarmed
            }
        );
    }

    #[test]
    fn should_confirm_disarm_when_already_disarmed() {
        assert_eq!(
            evaluate_request(SecurityState::Disarmed, SecurityState::Disarmed),
            ArmDecision::Confirmed(SecurityState::Disarmed)
        );
    }

    #[test]
    fn should_never_accept_triggered_as_a_request() {
        assert!(matches!(
            evaluate_request(SecurityState::AwayArmed, SecurityState::Triggered),
            ArmDecision::Rejected { .. }
        ));
    }

    #[test]
    fn should_switch_between_armed_modes() {
        assert_eq!(
            evaluate_request(SecurityState::StayArmed, SecurityState::NightArmed),
            ArmDecision::Changed {
                from: SecurityState::StayArmed,
                to: SecurityState::NightArmed
            }
        );
    }

    #[test]
    fn should_use_countdown_for_contact_when_away() {
        assert_eq!(
            evaluate_sensor(SecurityState::AwayArmed, ZoneKind::Contact, true),
            Some(Annunciation::Countdown)
        );
        assert_eq!(
            evaluate_sensor(SecurityState::NightArmed, ZoneKind::Contact, true),
            Some(Annunciation::Instant)
        );
        assert_eq!(evaluate_sensor(SecurityState::StayArmed, ZoneKind::Contact, true), None);
    }

    #[test]
    fn should_trip_on_motion_in_every_armed_state() {
        for state in ARMED {
            assert_eq!(
                evaluate_sensor(state, ZoneKind::Motion, true),
                Some(Annunciation::Instant)
            );
        }
    }

    #[test]
    fn should_ignore_sensors_when_disarmed_triggered_or_inactive() {
        assert_eq!(evaluate_sensor(SecurityState::Disarmed, ZoneKind::Motion, true), None);
        assert_eq!(evaluate_sensor(SecurityState::Triggered, ZoneKind::Contact, true), None);
        assert_eq!(evaluate_sensor(SecurityState::AwayArmed, ZoneKind::Motion, false), None);
    }

    #[test]
    fn should_map_labels_to_states() {
        assert_eq!(SecurityState::from_label("Home"), Some(SecurityState::StayArmed));
        assert_eq!(SecurityState::from_label("Triggered"), None);
        for state in ARMED {
            assert_eq!(SecurityState::from_label(state.trigger_label()), Some(state));
        }
    }
}
