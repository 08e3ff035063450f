//! # hearth-adapter-virtual
//!
//! Hardware-less switches. They exist so that action rules have something
//! to drive (a "scene" switch flipped by a door contact) and so that the hub
//! can expose buttons that only run rules.
//!
//! ## Models
//!
//! | `model` | Behaviour |
//! |---------|-----------|
//! | *(anything else)* | Stateful switch; `on` changes fire the `On` / `Off` rules |
//! | `stateless` | Momentary button; switching it on fires the `On` rules and it reads off again |
//!
//! ## Dependency rule
//!
//! Depends on `hearth-app` (port traits) and `hearth-domain` only.

mod switch;

use std::collections::HashMap;
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};

use async_trait::async_trait;
use hearth_app::dispatcher::ActionDispatcher;
use hearth_app::ports::{AccessoryHub, Platform};
use hearth_domain::accessory::{Accessory, AccessoryDefinition, AccessoryInfo, AccessoryKind};
use hearth_domain::error::{BridgeError, ValidationError};

pub use switch::SwitchModel;
use switch::VirtualSwitch;

/// Platform name used in accessory definitions and action rules.
pub const VIRTUAL_PLATFORM: &str = "Virtual";

const MANUFACTURER: &str = "hearth";
const MODEL: &str = "Virtual Switch";

/// Platform for virtual switches, indexed by name.
pub struct VirtualPlatform {
    hub: Arc<dyn AccessoryHub>,
    dispatcher: ActionDispatcher,
    switches: Mutex<HashMap<String, Arc<VirtualSwitch>>>,
}

impl VirtualPlatform {
    #[must_use]
    pub fn new(hub: Arc<dyn AccessoryHub>, dispatcher: ActionDispatcher) -> Self {
        Self {
            hub,
            dispatcher,
            switches: Mutex::new(HashMap::new()),
        }
    }

    fn lock(&self) -> MutexGuard<'_, HashMap<String, Arc<VirtualSwitch>>> {
        self.switches.lock().unwrap_or_else(PoisonError::into_inner)
    }
}

#[async_trait]
impl Platform for VirtualPlatform {
    fn name(&self) -> &'static str {
        VIRTUAL_PLATFORM
    }

    async fn add_accessory(&self, def: AccessoryDefinition) -> Result<Arc<Accessory>, BridgeError> {
        if self.lock().contains_key(&def.name) {
            return Err(ValidationError::DuplicateName(def.name).into());
        }
        let model = SwitchModel::from_hint(def.model.as_deref());
        let switch = VirtualSwitch::new(model, self.dispatcher.clone());

        let serial = synthesized_serial(&def.name);
        let accessory = Accessory::builder()
            .definition(&def)
            .kind(AccessoryKind::Switch)
            .info(AccessoryInfo {
                name: def.name.clone(),
                manufacturer: MANUFACTURER.to_string(),
                model: MODEL.to_string(),
                id: AccessoryInfo::numeric_id(&serial),
                serial_number: serial,
                firmware_revision: env!("CARGO_PKG_VERSION").to_string(),
            })
            .property(switch.property())
            .handler(switch.handler())
            .build()?;
        let accessory = Arc::new(accessory);

        self.hub.publish(Arc::clone(&accessory))?;
        switch.attach(Arc::clone(&accessory));
        self.lock().insert(def.name, switch);
        tracing::info!(accessory = accessory.name(), model = ?model, "virtual switch added");
        Ok(accessory)
    }

    fn get_accessory(&self, key: &str) -> Option<Arc<Accessory>> {
        self.lock().get(key).and_then(|s| s.accessory().cloned())
    }
}

/// Stable serial number for a name: 64-bit FNV-1a in hex.
fn synthesized_serial(name: &str) -> String {
    let hash = name.bytes().fold(0xcbf2_9ce4_8422_2325_u64, |hash, byte| {
        (hash ^ u64::from(byte)).wrapping_mul(0x0000_0100_0000_01b3)
    });
    format!("{hash:016x}")
}
