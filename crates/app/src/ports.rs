//! Port definitions — traits that adapters implement.
//!
//! Ports are the boundaries between the orchestration kernel and the device
//! families. They are defined here (in `app`) so that both the kernel and the
//! adapter layer can depend on them without creating circular dependencies.

pub mod annunciator;
pub mod capability;
pub mod hub;
pub mod platform;

pub use annunciator::Annunciator;
pub use capability::{DimmerLike, SwitchLike};
pub use hub::AccessoryHub;
pub use platform::Platform;
