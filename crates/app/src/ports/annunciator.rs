//! Annunciator port — the audible device driven by the alarm controller.

use std::time::Duration;

use async_trait::async_trait;
use hearth_domain::error::BridgeError;

#[async_trait]
pub trait Annunciator: Send + Sync {
    /// Short confirmation beep.
    async fn chirp(&self) -> Result<(), BridgeError>;

    /// Intermittent chirps for roughly `window`.
    async fn intermittent(&self, window: Duration) -> Result<(), BridgeError>;

    /// Continuous annunciation until silenced.
    async fn ring(&self) -> Result<(), BridgeError>;

    async fn silence(&self) -> Result<(), BridgeError>;
}
