//! # hearth-domain
//!
//! Pure domain model for the hearth accessory bridge.
//!
//! ## Responsibilities
//! - Foundational types: typed identifiers, error conventions, timestamps
//! - Define **Accessories** (one exposed device/service, owned by one platform)
//! - Define **Properties** (named mutable values with remote-write callbacks
//!   and change-notify side effects)
//! - Define **Action Rules** (declarative trigger → effect bindings)
//! - Define the **security alarm** states and their legal transitions
//! - Define alarm **zones** (pins of an alarm board)
//!
//! ## Dependency rule
//! This crate has **no internal dependencies**.
//! It must never import anything from `app`, adapters, or external IO crates.
//! All IO boundaries are expressed as traits in the `app` crate (ports).

pub mod error;
pub mod id;
pub mod time;

pub mod accessory;
pub mod action;
pub mod alarm;
pub mod event;
pub mod property;
pub mod zone;
