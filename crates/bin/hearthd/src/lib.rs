//! # hearthd — hearth bridge daemon
//!
//! Composition root that wires every platform together and runs the bridge.
//!
//! ## Responsibilities
//! - Parse configuration (env vars, config file)
//! - Construct the hub, the registry and the action dispatcher
//! - Construct every platform, injecting the hub and the dispatcher
//! - Build the axum router and mount the device webhooks
//! - Load the configured accessories
//! - Handle graceful shutdown (SIGTERM/SIGINT)
//!
//! ## Dependency rule
//! This is the **only** crate that depends on all other crates.
//! It is the wiring layer — no domain logic belongs here.

pub mod bridge;
pub mod config;
