//! # hearth-adapter-http-axum
//!
//! HTTP platform built on [axum](https://docs.rs/axum).
//!
//! ## Responsibilities
//! - Serve a **JSON control API** over the in-process hub
//!   (`/api/bridge`, `/api/accessories`, property writes)
//! - Stream hub change events as **Server-Sent Events** (`/api/events`)
//! - Host the webhooks of device families that push to the bridge
//!   (mounted by the composition root, e.g. `/konnected/{device}`)
//!
//! ## Dependency rule
//! Depends on `hearth-app` (hub, platform port) and `hearth-domain` (types
//! used in request/response mapping). Never leaks axum types into the
//! domain.

pub mod api;
pub mod error;
pub mod platform;
pub mod router;
pub mod state;

pub use platform::{HTTP_PLATFORM, HttpPlatform};

#[cfg(test)]
mod testing;
