//! Kasa platform configuration.

use std::time::Duration;

use serde::Deserialize;

/// Configuration for the Kasa platform (`[kasa]` section).
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(default)]
pub struct KasaConfig {
    /// Seconds between broadcast probes; 0 disables the tick.
    pub pull_rate_secs: u64,
    /// Connect + read bound for TCP queries, in seconds.
    pub timeout_secs: u64,
    /// How many times each probe is repeated per tick.
    pub broadcasts: u8,
    /// Device command port.
    pub port: u16,
    pub broadcast_address: String,
    /// Local address of the shared UDP socket.
    pub bind_address: String,
    /// Add devices that answer a probe but are not configured.
    pub discover: bool,
    /// Delay between the steps of multi-command sequences, in milliseconds.
    pub pacing_ms: u64,
}

impl Default for KasaConfig {
    fn default() -> Self {
        Self {
            pull_rate_secs: 60,
            timeout_secs: 10,
            broadcasts: 1,
            port: 9999,
            broadcast_address: "255.255.255.255".to_string(),
            bind_address: "0.0.0.0:0".to_string(),
            discover: false,
            pacing_ms: 1000,
        }
    }
}

impl KasaConfig {
    /// TCP timeout; zero falls back to 10 seconds.
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
    pub fn pacing(&self) -> Duration {
        Duration::from_millis(self.pacing_ms)
    }
}
