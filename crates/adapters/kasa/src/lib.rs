//! # hearth-adapter-kasa
//!
//! Platform for TP-Link Kasa smart plugs, dimmers and power strips.
//!
//! ## How it works
//!
//! Kasa devices speak JSON obfuscated with a running-key XOR stream
//! (see [`cipher`]). Commands go over TCP port 9999 with a 4-byte big-endian
//! length prefix, one round trip per connection. The same payloads without
//! the prefix travel over UDP: a periodic broadcast `get_sysinfo` probe makes
//! every device answer, and each answer is reconciled into the hub as the
//! latest known state of the device at that source IP.
//!
//! ## Supported models
//!
//! | Class | Models | Properties |
//! |-------|--------|------------|
//! | plug / switch | HS100, HS103, HS105, HS110, HS200, HS210, KP100, KP105, KP115, KP125, EP10 | `on` |
//! | dimmer | HS220, KS220, ES20M | `on`, `brightness` |
//! | strip | HS107, HS300, KP200, KP303, KP400, EP40 | `outlet.<child-id>` per child |
//!
//! Anything else is treated as a plug.
//!
//! ## Dependency rule
//!
//! Same as other adapters: depends on `hearth-app` and `hearth-domain`.

pub mod cipher;
mod config;
mod device;
mod error;
pub mod model;
mod platform;
pub mod protocol;
mod reconcile;
mod transport;

#[cfg(test)]
mod fake;

pub use config::KasaConfig;
pub use error::KasaError;
pub use platform::{KASA_PLATFORM, KasaPlatform};
