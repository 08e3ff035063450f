//! # hearth-adapter-konnected
//!
//! Platform for Konnected alarm boards.
//!
//! A board is an HTTP device wired to the zones of a house: motion sensors,
//! door contacts, a buzzer and optionally the arm output of a legacy panel.
//! The bridge reads its identity from `GET /status`, polls `GET /device` for
//! pin states and drives the buzzer with `PUT /device`. The board pushes
//! every pin change to `PUT /konnected/<device-id>` (see [`webhook`]).
//!
//! Each board becomes one security-system accessory whose arm state is run
//! by an [`AlarmController`](hearth_app::alarm::AlarmController).

mod buzzer;
mod client;
mod config;
mod error;
mod platform;
pub mod protocol;
pub mod webhook;

#[cfg(test)]
mod fake;

pub use config::KonnectedConfig;
pub use error::KonnectedError;
pub use platform::{KONNECTED_PLATFORM, KonnectedPlatform};
