//! # hearth-app
//!
//! Application layer — orchestration kernel and **port definitions** (traits).
//!
//! ## Responsibilities
//! - Define **port traits** that adapters implement:
//!   - `Platform` — per-device-family lifecycle and accessory map
//!   - `AccessoryHub` — exposes accessories to the outside hub
//!   - `SwitchLike` / `DimmerLike` — closed capability interfaces
//!   - `Annunciator` — the audible device driven by the alarm controller
//! - Provide the **platform registry**, the **action dispatcher**, the
//!   **alarm controller**, the **background scheduler** and the in-process
//!   **hub** (the hub-exposure platform)
//!
//! ## Dependency rule
//! Depends on `hearth-domain` only (plus `tokio` for tasks, timers and channels).
//! Never imports adapter crates. Adapters depend on *this* crate, not the reverse.

pub mod alarm;
pub mod dispatcher;
pub mod hub;
pub mod ports;
pub mod registry;
pub mod scheduler;
