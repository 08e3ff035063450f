//! Kasa JSON messages.
//!
//! Commands are nested `{"<module>":{"<method>":{...args}}}` objects; replies
//! mirror the shape with an `err_code` in place of the arguments.

use serde::{Deserialize, Serialize};
use serde_json::{Value, json};

use crate::error::KasaError;

/// The broadcast/unicast state probe.
pub const GET_SYSINFO: &str = r#"{"system":{"get_sysinfo":{}}}"#;

/// State reported by `system.get_sysinfo`.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct SysInfo {
    pub sw_ver: String,
    pub hw_ver: String,
    pub model: String,
    #[serde(rename = "deviceId")]
    pub device_id: String,
    pub alias: String,
    pub mac: String,
    pub relay_state: u8,
    pub brightness: u8,
    pub children: Vec<ChildInfo>,
}

/// One outlet of a power strip.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct ChildInfo {
    pub id: String,
    pub state: u8,
    pub alias: String,
    pub on_time: u64,
}

impl SysInfo {
    #[must_use]
    pub fn is_on(&self) -> bool {
        self.relay_state > 0
    }

    /// Look a child up by its stable id.
    #[must_use]
    pub fn child(&self, id: &str) -> Option<&ChildInfo> {
        self.children.iter().find(|c| c.id == id)
    }
}

#[derive(Deserialize)]
struct SysInfoReply {
    system: Option<SystemSection>,
}

#[derive(Deserialize)]
struct SystemSection {
    get_sysinfo: Option<SysInfo>,
}

/// Whether a decrypted payload carries a sysinfo section.
#[must_use]
pub fn is_sysinfo(payload: &str) -> bool {
    payload.contains("\"get_sysinfo\"")
}

/// Parse a `get_sysinfo` reply.
///
/// # Errors
///
/// Returns [`KasaError::Json`] for invalid JSON and [`KasaError::Malformed`]
/// when the sysinfo section is missing.
pub fn parse_sysinfo(payload: &str) -> Result<SysInfo, KasaError> {
    let reply: SysInfoReply = serde_json::from_str(payload)?;
    reply
        .system
        .and_then(|s| s.get_sysinfo)
        .ok_or(KasaError::Malformed("system.get_sysinfo"))
}

/// Verify `err_code == 0` at `reply[module][method]`.
///
/// # Errors
///
/// Returns [`KasaError::Rejected`] on a non-zero code and
/// [`KasaError::Malformed`] when the section is missing.
pub fn check_reply(payload: &str, module: &'static str, method: &'static str, command: &'static str) -> Result<(), KasaError> {
    let reply: Value = serde_json::from_str(payload)?;
    let section = &reply[module][method];
    match section["err_code"].as_i64() {
        Some(0) => Ok(()),
        Some(code) => Err(KasaError::Rejected {
            command,
            code,
            message: section["err_msg"].as_str().unwrap_or_default().to_string(),
        }),
        None => Err(KasaError::Malformed(command)),
    }
}

fn with_child(mut command: Value, child: Option<&str>) -> String {
    if let Some(child) = child {
        command["context"] = json!({ "child_ids": [child] });
    }
    command.to_string()
}

#[must_use]
pub fn set_relay_state(on: bool, child: Option<&str>) -> String {
    with_child(
        json!({ "system": { "set_relay_state": { "state": u8::from(on) } } }),
        child,
    )
}

#[must_use]
pub fn set_brightness(level: u8) -> String {
    json!({ "smartlife.iot.dimmer": { "set_brightness": { "brightness": level } } }).to_string()
}

#[must_use]
pub fn countdown_delete_all(child: Option<&str>) -> String {
    with_child(json!({ "count_down": { "delete_all_rules": {} } }), child)
}

/// Switch to `on` after `delay` seconds.
#[must_use]
pub fn countdown_add(delay: u32, on: bool, name: &str, child: Option<&str>) -> String {
    with_child(
        json!({ "count_down": { "add_rule": {
            "enable": 1,
            "delay": delay,
            "act": u8::from(on),
            "name": name,
        } } }),
        child,
    )
}
