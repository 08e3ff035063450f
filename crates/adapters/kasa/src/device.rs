//! A Kasa device handle and the capabilities built on it.

use std::net::SocketAddr;
use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use hearth_app::ports::{DimmerLike, SwitchLike};
use hearth_domain::error::BridgeError;
use tokio::sync::Mutex;

use crate::error::KasaError;
use crate::protocol::{self, SysInfo};
use crate::transport;

/// Name given to countdown rules we create.
const COUNTDOWN_RULE: &str = "hearth";

/// TCP endpoint of one device.
///
/// Queries are serialised: one round trip at a time per device.
#[derive(Debug)]
pub(crate) struct KasaDevice {
    addr: SocketAddr,
    timeout: Duration,
    io: Mutex<()>,
}

impl KasaDevice {
    pub(crate) fn new(addr: SocketAddr, timeout: Duration) -> Self {
        Self {
            addr,
            timeout,
            io: Mutex::new(()),
        }
    }

    pub(crate) fn addr(&self) -> SocketAddr {
        self.addr
    }

    async fn query(&self, command: &str) -> Result<String, KasaError> {
        let _turn = self.io.lock().await;
        tracing::trace!(device = %self.addr, command, "kasa query");
        transport::query(self.addr, command, self.timeout).await
    }

    pub(crate) async fn sysinfo(&self) -> Result<SysInfo, KasaError> {
        protocol::parse_sysinfo(&self.query(protocol::GET_SYSINFO).await?)
    }

    pub(crate) async fn set_relay(&self, on: bool, child: Option<&str>) -> Result<(), KasaError> {
        let reply = self.query(&protocol::set_relay_state(on, child)).await?;
        protocol::check_reply(&reply, "system", "set_relay_state", "system.set_relay_state")
    }

    pub(crate) async fn set_brightness(&self, level: u8) -> Result<(), KasaError> {
        let reply = self.query(&protocol::set_brightness(level)).await?;
        protocol::check_reply(
            &reply,
            "smartlife.iot.dimmer",
            "set_brightness",
            "smartlife.iot.dimmer.set_brightness",
        )
    }

    /// Replace any countdown with one switching to `on` after `delay` seconds.
    ///
    /// The device needs `pacing` between clearing and adding rules.
    pub(crate) async fn countdown(&self, on: bool, delay: u32, child: Option<&str>, pacing: Duration) -> Result<(), KasaError> {
        let reply = self.query(&protocol::countdown_delete_all(child)).await?;
        protocol::check_reply(&reply, "count_down", "delete_all_rules", "count_down.delete_all_rules")?;
        tokio::time::sleep(pacing).await;
        let reply = self
            .query(&protocol::countdown_add(delay, on, COUNTDOWN_RULE, child))
            .await?;
        protocol::check_reply(&reply, "count_down", "add_rule", "count_down.add_rule")
    }
}

/// Single-relay plug or switch.
pub(crate) struct Plug(pub Arc<KasaDevice>);

#[async_trait]
impl SwitchLike for Plug {
    async fn is_on(&self) -> Result<bool, BridgeError> {
        Ok(self.0.sysinfo().await?.is_on())
    }

    async fn set_on(&self, on: bool) -> Result<(), BridgeError> {
        Ok(self.0.set_relay(on, None).await?)
    }
}

/// Dimmer switch.
pub(crate) struct Dimmer(pub Arc<KasaDevice>);

#[async_trait]
impl SwitchLike for Dimmer {
    async fn is_on(&self) -> Result<bool, BridgeError> {
        Ok(self.0.sysinfo().await?.is_on())
    }

    async fn set_on(&self, on: bool) -> Result<(), BridgeError> {
        Ok(self.0.set_relay(on, None).await?)
    }
}

#[async_trait]
impl DimmerLike for Dimmer {
    async fn brightness(&self) -> Result<u8, BridgeError> {
        Ok(self.0.sysinfo().await?.brightness)
    }

    async fn set_brightness(&self, level: u8) -> Result<(), BridgeError> {
        Ok(self.0.set_brightness(level).await?)
    }
}

/// One outlet of a strip, addressed by its child id.
pub(crate) struct Outlet {
    pub device: Arc<KasaDevice>,
    pub child_id: String,
}

#[async_trait]
impl SwitchLike for Outlet {
    async fn is_on(&self) -> Result<bool, BridgeError> {
        let info = self.device.sysinfo().await?;
        let child = info
            .child(&self.child_id)
            .ok_or_else(|| KasaError::UnknownChild(self.child_id.clone()))?;
        Ok(child.state > 0)
    }

    async fn set_on(&self, on: bool) -> Result<(), BridgeError> {
        Ok(self.device.set_relay(on, Some(&self.child_id)).await?)
    }
}
