//! Konnected platform configuration.

use std::time::Duration;

use hearth_app::alarm::AlarmTimings;
use serde::Deserialize;

/// Configuration for the Konnected platform (`[konnected]` section).
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(default)]
pub struct KonnectedConfig {
    /// Seconds between status re-pulls; 0 disables the tick.
    pub pull_rate_secs: u64,
    pub timeout_secs: u64,
    /// Entry delay before a door event rings, in seconds.
    pub countdown_secs: u64,
    /// Continuous ring is silenced after this many seconds.
    pub max_ring_secs: u64,
    /// Idle connections kept per board. Board firmware handles few sockets.
    pub max_idle_connections: usize,
}

impl Default for KonnectedConfig {
    fn default() -> Self {
        Self {
            pull_rate_secs: 0,
            timeout_secs: 10,
            countdown_secs: 60,
            max_ring_secs: 300,
            max_idle_connections: 5,
        }
    }
}

impl KonnectedConfig {
    #[must_use]
    pub fn timeout(&self) -> Duration {
        match self.timeout_secs {
            0 => Duration::from_secs(10),
            secs => Duration::from_secs(secs),
        }
    }

    #[must_use]
    pub fn pull_rate(&self) -> Duration {
        Duration::from_secs(self.pull_rate_secs)
    }

    #[must_use]
    pub fn timings(&self) -> AlarmTimings {
        AlarmTimings {
            countdown: Duration::from_secs(self.countdown_secs),
            max_ring: Duration::from_secs(self.max_ring_secs),
        }
    }
}
