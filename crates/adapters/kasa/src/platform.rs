//! The Kasa platform: accessory map, action verbs, probe tick and UDP listener.

use std::collections::{HashMap, HashSet};
use std::net::{IpAddr, SocketAddr};
use std::sync::{Arc, Mutex, MutexGuard, OnceLock, PoisonError};
use std::time::Duration;

use async_trait::async_trait;
use hearth_app::dispatcher::ActionDispatcher;
use hearth_app::ports::capability::{wire_dimmer, wire_switch};
use hearth_app::ports::{AccessoryHub, Platform};
use hearth_app::scheduler::{Liveness, spawn_periodic};
use hearth_domain::accessory::{Accessory, AccessoryDefinition, AccessoryInfo, ActionHandler};
use hearth_domain::action::{ActionRule, parse_switch_value, trigger, verb};
use hearth_domain::error::{BridgeError, ValidationError};
use hearth_domain::property::{BoxFuture, Property};
use tokio::task::JoinHandle;

use crate::config::KasaConfig;
use crate::device::{Dimmer, KasaDevice, Outlet, Plug};
use crate::error::KasaError;
use crate::model::{self, ModelClass};
use crate::protocol::{self, SysInfo};
use crate::reconcile::Exposed;
use crate::transport::UdpChannel;

/// Platform name used in accessory definitions and action rules.
pub const KASA_PLATFORM: &str = "Kasa";

const MANUFACTURER: &str = "TP-Link";

/// Kasa device family.
pub struct KasaPlatform {
    shared: Arc<Shared>,
}

#[derive(Clone)]
struct Entry {
    accessory: Arc<Accessory>,
    exposed: Arc<Exposed>,
}

struct Udp {
    channel: UdpChannel,
    broadcast: SocketAddr,
}

struct Shared {
    config: KasaConfig,
    hub: Arc<dyn AccessoryHub>,
    dispatcher: ActionDispatcher,
    /// Keyed by the IP replies come from.
    devices: Mutex<HashMap<IpAddr, Entry>>,
    /// Keys of accessories still being added.
    reserved: Mutex<HashSet<IpAddr>>,
    discovering: Mutex<HashSet<IpAddr>>,
    udp: OnceLock<Arc<Udp>>,
    liveness: Liveness,
    tasks: Mutex<Vec<JoinHandle<()>>>,
}

impl KasaPlatform {
    #[must_use]
    pub fn new(config: KasaConfig, hub: Arc<dyn AccessoryHub>, dispatcher: ActionDispatcher) -> Self {
        Self {
            shared: Arc::new(Shared {
                config,
                hub,
                dispatcher,
                devices: Mutex::new(HashMap::new()),
                reserved: Mutex::new(HashSet::new()),
                discovering: Mutex::new(HashSet::new()),
                udp: OnceLock::new(),
                liveness: Liveness::new(),
                tasks: Mutex::new(Vec::new()),
            }),
        }
    }

    /// Feed one decrypted datagram; returns how many properties changed.
    pub fn handle_datagram(&self, from: IpAddr, payload: &str) -> usize {
        self.shared.handle_datagram(from, payload)
    }

    #[cfg(test)]
    fn udp_addr(&self) -> Option<SocketAddr> {
        self.shared.udp.get().and_then(|udp| udp.channel.local_addr().ok())
    }
}

#[async_trait]
impl Platform for KasaPlatform {
    fn name(&self) -> &'static str {
        KASA_PLATFORM
    }

    async fn startup(&self) -> Result<(), BridgeError> {
        if self.shared.udp.get().is_some() {
            return Ok(());
        }
        let config = &self.shared.config;
        let ip: IpAddr = config
            .broadcast_address
            .parse()
            .map_err(|_| KasaError::Address(config.broadcast_address.clone()))?;
        let channel = UdpChannel::bind(&config.bind_address).await?;
        let udp = Arc::new(Udp {
            channel,
            broadcast: SocketAddr::new(ip, config.port),
        });
        if self.shared.udp.set(udp).is_err() {
            tracing::debug!(bind = %config.bind_address, "kasa socket already bound by a concurrent startup, dropping ours");
        }
        tracing::info!(bind = %config.bind_address, broadcast = %ip, "kasa platform started");
        Ok(())
    }

    async fn background(&self) -> Result<(), BridgeError> {
        let Some(udp) = self.shared.udp.get().cloned() else {
            tracing::warn!("kasa platform not started, no background work");
            return Ok(());
        };
        let mut tasks = lock(&self.shared.tasks);

        let shared = Arc::clone(&self.shared);
        tasks.push(tokio::spawn(listen(shared, Arc::clone(&udp))));

        let shared = Arc::clone(&self.shared);
        if let Some(handle) = spawn_periodic(
            "kasa-probe",
            self.shared.config.pull_rate(),
            self.shared.liveness.clone(),
            move || {
                let shared = Arc::clone(&shared);
                let udp = Arc::clone(&udp);
                async move { shared.probe(&udp).await }
            },
        ) {
            tasks.push(handle);
        }
        Ok(())
    }

    async fn shutdown(&self) -> Result<(), BridgeError> {
        self.shared.liveness.stop();
        for task in lock(&self.shared.tasks).drain(..) {
            task.abort();
        }
        tracing::info!("kasa platform stopped");
        Ok(())
    }

    async fn add_accessory(&self, def: AccessoryDefinition) -> Result<Arc<Accessory>, BridgeError> {
        self.shared.add_accessory(def).await
    }

    fn get_accessory(&self, key: &str) -> Option<Arc<Accessory>> {
        let devices = lock(&self.shared.devices);
        if let Ok(ip) = key.parse::<IpAddr>() {
            return devices.get(&ip).map(|e| Arc::clone(&e.accessory));
        }
        devices
            .values()
            .find(|e| e.accessory.name() == key)
            .map(|e| Arc::clone(&e.accessory))
    }
}

impl Shared {
    async fn add_accessory(&self, def: AccessoryDefinition) -> Result<Arc<Accessory>, BridgeError> {
        let ip: IpAddr = def
            .address
            .parse()
            .map_err(|_| KasaError::Address(def.address.clone()))?;
        let _reservation = self.reserve(ip)?;

        let device = Arc::new(KasaDevice::new(
            SocketAddr::new(ip, self.config.port),
            self.config.timeout(),
        ));
        let info = device.sysinfo().await?;
        let class = model::classify(&info.model);
        let exposed = Arc::new(expose(class, &info, &device));

        let mut builder = Accessory::builder()
            .definition(&def)
            .kind(class.kind())
            .info(identity(&info))
            .handler(action_handler(Arc::clone(&device), Arc::clone(&exposed), self.config.pacing()));
        for property in exposed.properties() {
            builder = builder.property(property);
        }
        let accessory = Arc::new(builder.build()?);

        if lock(&self.devices).values().any(|e| e.accessory.name() == accessory.name()) {
            return Err(ValidationError::DuplicateName(accessory.name().to_string()).into());
        }
        self.hub.publish(Arc::clone(&accessory))?;
        self.bind_rules(&accessory, &exposed);

        lock(&self.devices).insert(
            ip,
            Entry {
                accessory: Arc::clone(&accessory),
                exposed,
            },
        );
        tracing::info!(
            accessory = accessory.name(),
            ip = %ip,
            model = %info.model,
            class = ?class,
            "kasa accessory added"
        );
        Ok(accessory)
    }

    /// Claim `ip` until the returned guard drops. The entry is inserted into
    /// `devices` before that, so the key is never free in between.
    fn reserve(&self, ip: IpAddr) -> Result<Reservation<'_>, BridgeError> {
        let devices = lock(&self.devices);
        if devices.contains_key(&ip) || !lock(&self.reserved).insert(ip) {
            return Err(ValidationError::DuplicateKey(ip.to_string()).into());
        }
        Ok(Reservation { shared: self, ip })
    }

    fn bind_rules(&self, accessory: &Arc<Accessory>, exposed: &Exposed) {
        match exposed {
            Exposed::Plug { on } | Exposed::Dimmer { on, .. } => {
                self.dispatcher.bind_switch(accessory, on.name(), trigger::ON, trigger::OFF);
            }
            Exposed::Strip { outlets } => {
                for (_, outlet) in outlets {
                    self.dispatcher
                        .bind_switch(accessory, outlet.name(), trigger::OUT_ON, trigger::OUT_OFF);
                }
            }
        }
    }

    fn handle_datagram(self: &Arc<Self>, from: IpAddr, payload: &str) -> usize {
        if payload == protocol::GET_SYSINFO {
            tracing::trace!(from = %from, "own probe echoed");
            return 0;
        }
        let entry = lock(&self.devices).get(&from).cloned();
        let Some(entry) = entry else {
            if self.config.discover && protocol::is_sysinfo(payload) {
                self.discover(from);
            }
            return 0;
        };
        if !protocol::is_sysinfo(payload) {
            tracing::debug!(from = %from, payload, "unhandled kasa datagram");
            return 0;
        }
        match protocol::parse_sysinfo(payload) {
            Ok(info) => {
                let changed = entry.exposed.reconcile(&info);
                if changed > 0 {
                    tracing::info!(accessory = entry.accessory.name(), changed, "kasa state reconciled");
                }
                changed
            }
            Err(err) => {
                tracing::warn!(from = %from, error = %err, "invalid kasa datagram");
                0
            }
        }
    }

    fn discover(self: &Arc<Self>, ip: IpAddr) {
        if !lock(&self.discovering).insert(ip) {
            return;
        }
        tracing::info!(ip = %ip, "adding previously unknown kasa device");
        let shared = Arc::clone(self);
        tokio::spawn(async move {
            let def = AccessoryDefinition {
                platform: KASA_PLATFORM.to_string(),
                name: ip.to_string(),
                address: ip.to_string(),
                ..AccessoryDefinition::default()
            };
            if let Err(err) = shared.add_accessory(def).await {
                tracing::warn!(ip = %ip, error = %err, "kasa discovery failed");
            }
            lock(&shared.discovering).remove(&ip);
        });
    }

    async fn probe(&self, udp: &Udp) {
        for _ in 0..self.config.broadcasts {
            if let Err(err) = udp.channel.probe(udp.broadcast, protocol::GET_SYSINFO).await {
                tracing::warn!(target = %udp.broadcast, error = %err, "kasa probe failed");
            }
        }
    }
}

struct Reservation<'a> {
    shared: &'a Shared,
    ip: IpAddr,
}

impl Drop for Reservation<'_> {
    fn drop(&mut self) {
        lock(&self.shared.reserved).remove(&self.ip);
    }
}

async fn listen(shared: Arc<Shared>, udp: Arc<Udp>) {
    while shared.liveness.is_alive() {
        match udp.channel.recv().await {
            Ok((from, payload)) => {
                tracing::trace!(from = %from, payload, "kasa datagram");
                shared.handle_datagram(from, &payload);
            }
            Err(err) => {
                tracing::warn!(error = %err, "kasa listener error");
                tokio::time::sleep(Duration::from_secs(1)).await;
            }
        }
    }
}

fn identity(info: &SysInfo) -> AccessoryInfo {
    AccessoryInfo {
        name: info.alias.clone(),
        manufacturer: MANUFACTURER.to_string(),
        model: info.model.clone(),
        serial_number: info.device_id.clone(),
        firmware_revision: info.sw_ver.clone(),
        id: AccessoryInfo::numeric_id(&info.device_id),
    }
}

fn expose(class: ModelClass, info: &SysInfo, device: &Arc<KasaDevice>) -> Exposed {
    match class {
        ModelClass::Plug => {
            let on = Arc::new(Property::new("on", info.is_on()));
            wire_switch(&on, Arc::new(Plug(Arc::clone(device))));
            Exposed::Plug { on }
        }
        ModelClass::Dimmer => {
            let on = Arc::new(Property::new("on", info.is_on()));
            let brightness = Arc::new(Property::new("brightness", info.brightness));
            let dimmer = Arc::new(Dimmer(Arc::clone(device)));
            wire_switch(&on, dimmer.clone());
            wire_dimmer(&brightness, dimmer);
            Exposed::Dimmer { on, brightness }
        }
        ModelClass::Strip => {
            let outlets = info
                .children
                .iter()
                .map(|child| {
                    let property = Arc::new(Property::new(Exposed::outlet_property(&child.id), child.state > 0));
                    wire_switch(
                        &property,
                        Arc::new(Outlet {
                            device: Arc::clone(device),
                            child_id: child.id.clone(),
                        }),
                    );
                    (child.id.clone(), property)
                })
                .collect();
            Exposed::Strip { outlets }
        }
    }
}

fn action_handler(device: Arc<KasaDevice>, exposed: Arc<Exposed>, pacing: Duration) -> ActionHandler {
    Arc::new(move |rule: ActionRule| -> BoxFuture<Result<(), BridgeError>> {
        let device = Arc::clone(&device);
        let exposed = Arc::clone(&exposed);
        Box::pin(async move { perform(&device, &exposed, &rule, pacing).await })
    })
}

async fn perform(device: &KasaDevice, exposed: &Exposed, rule: &ActionRule, pacing: Duration) -> Result<(), BridgeError> {
    let invalid = || ValidationError::InvalidActionValue {
        verb: rule.verb.clone(),
        value: rule.value.clone(),
    };
    let (child, value) = split_child(exposed, &rule.value);

    match rule.verb.as_str() {
        verb::SET_RELAY_STATE => {
            let on = parse_switch_value(value).ok_or_else(invalid)?;
            device.set_relay(on, child).await?;
        }
        verb::SET_BRIGHTNESS => {
            if !matches!(exposed, Exposed::Dimmer { .. }) {
                return Err(invalid().into());
            }
            let level = value
                .trim()
                .parse::<u8>()
                .ok()
                .filter(|level| *level <= 100)
                .ok_or_else(invalid)?;
            device.set_brightness(level).await?;
        }
        verb::COUNTDOWN_ON | verb::COUNTDOWN_OFF => {
            let delay = value.trim().parse::<u32>().map_err(|_| invalid())?;
            device
                .countdown(rule.verb == verb::COUNTDOWN_ON, delay, child, pacing)
                .await?;
            return Ok(());
        }
        other => return Err(ValidationError::UnknownVerb(other.to_string()).into()),
    }

    let info = device.sysinfo().await?;
    exposed.reconcile(&info);
    Ok(())
}

/// Strip values may target one outlet as `<child-id>:<value>`.
fn split_child<'a>(exposed: &Exposed, value: &'a str) -> (Option<&'a str>, &'a str) {
    match (exposed, value.split_once(':')) {
        (Exposed::Strip { .. }, Some((child, rest))) => (Some(child), rest),
        _ => (None, value),
    }
}

fn lock<T>(mutex: &Mutex<T>) -> MutexGuard<'_, T> {
    mutex.lock().unwrap_or_else(PoisonError::into_inner)
}
