//! The Konnected platform: one alarm accessory per board.

use std::collections::HashMap;
use std::sync::{Arc, Mutex, MutexGuard, PoisonError, Weak};

use async_trait::async_trait;
use hearth_app::alarm::{AlarmController, SECURITY_STATE};
use hearth_app::dispatcher::ActionDispatcher;
use hearth_app::ports::{AccessoryHub, Platform};
use hearth_app::scheduler::{Liveness, spawn_periodic};
use hearth_domain::accessory::{Accessory, AccessoryDefinition, AccessoryInfo, AccessoryKind, ActionHandler};
use hearth_domain::action::{ActionRule, verb};
use hearth_domain::alarm::SecurityState;
use hearth_domain::error::{BridgeError, NotFoundError, ValidationError};
use hearth_domain::property::{BoxFuture, Property, PropertyValue};
use hearth_domain::zone::ZoneKind;
use tokio::task::JoinHandle;

use crate::buzzer::Buzzer;
use crate::client::{self, BoardClient};
use crate::config::KonnectedConfig;
use crate::error::KonnectedError;
use crate::protocol::PinState;

/// Platform name used in accessory definitions and action rules.
pub const KONNECTED_PLATFORM: &str = "Konnected";

const MANUFACTURER: &str = "Konnected.io";

type Alarm = AlarmController<Buzzer>;

/// Konnected alarm boards, indexed by device id.
pub struct KonnectedPlatform {
    shared: Arc<Shared>,
}

struct Zone {
    kind: ZoneKind,
    property: Option<Arc<Property>>,
}

struct Board {
    id: String,
    accessory: Arc<Accessory>,
    client: BoardClient,
    zones: HashMap<u8, Zone>,
    alarm: Arc<Alarm>,
    /// Bearer token the board must present on the webhook.
    token: Option<String>,
}

struct Shared {
    config: KonnectedConfig,
    http: reqwest::Client,
    hub: Arc<dyn AccessoryHub>,
    dispatcher: ActionDispatcher,
    boards: Mutex<HashMap<String, Arc<Board>>>,
    liveness: Liveness,
    tasks: Mutex<Vec<JoinHandle<()>>>,
}

impl KonnectedPlatform {
    /// # Errors
    ///
    /// Returns [`KonnectedError::Http`] when the pooled HTTP client cannot
    /// be built.
    pub fn new(
        config: KonnectedConfig,
        hub: Arc<dyn AccessoryHub>,
        dispatcher: ActionDispatcher,
    ) -> Result<Self, KonnectedError> {
        let http = client::pooled(&config)?;
        Ok(Self {
            shared: Arc::new(Shared {
                config,
                http,
                hub,
                dispatcher,
                boards: Mutex::new(HashMap::new()),
                liveness: Liveness::new(),
                tasks: Mutex::new(Vec::new()),
            }),
        })
    }

    /// Process one webhook call from `device`.
    ///
    /// An empty body asks for a status re-pull.
    ///
    /// # Errors
    ///
    /// Fails for unknown devices, bad tokens, undecodable bodies and failed
    /// re-pulls. Callers acknowledge the board regardless.
    pub async fn handle_webhook(&self, device: &str, token: Option<&str>, body: &[u8]) -> Result<(), KonnectedError> {
        let board = self.shared.board(device)?;
        if let Some(expected) = board.token.as_deref()
            && token != Some(expected)
        {
            return Err(KonnectedError::Unauthorized(device.to_string()));
        }
        if body.iter().all(u8::is_ascii_whitespace) {
            tracing::debug!(device, "empty konnected report, pulling status");
            return self.shared.repull(&board).await;
        }
        let report: PinState = serde_json::from_slice(body)?;
        tracing::debug!(device, pin = report.pin, state = report.state, "konnected report");
        apply(&board, report).await;
        Ok(())
    }
}

#[async_trait]
impl Platform for KonnectedPlatform {
    fn name(&self) -> &'static str {
        KONNECTED_PLATFORM
    }

    async fn background(&self) -> Result<(), BridgeError> {
        let shared = Arc::clone(&self.shared);
        if let Some(handle) = spawn_periodic(
            "konnected-pull",
            self.shared.config.pull_rate(),
            self.shared.liveness.clone(),
            move || {
                let shared = Arc::clone(&shared);
                async move { shared.repull_all().await }
            },
        ) {
            lock(&self.shared.tasks).push(handle);
        }
        Ok(())
    }

    async fn shutdown(&self) -> Result<(), BridgeError> {
        self.shared.liveness.stop();
        for task in lock(&self.shared.tasks).drain(..) {
            task.abort();
        }
        Ok(())
    }

    async fn add_accessory(&self, def: AccessoryDefinition) -> Result<Arc<Accessory>, BridgeError> {
        self.shared.add_accessory(def).await
    }

    fn get_accessory(&self, key: &str) -> Option<Arc<Accessory>> {
        let boards = lock(&self.shared.boards);
        boards
            .get(key)
            .or_else(|| boards.values().find(|b| b.accessory.name() == key))
            .map(|b| Arc::clone(&b.accessory))
    }
}

impl Shared {
    fn board(&self, id: &str) -> Result<Arc<Board>, KonnectedError> {
        lock(&self.boards)
            .get(id)
            .cloned()
            .ok_or_else(|| KonnectedError::UnknownDevice(id.to_string()))
    }

    async fn add_accessory(&self, def: AccessoryDefinition) -> Result<Arc<Accessory>, BridgeError> {
        let client = BoardClient::new(self.http.clone(), &def.address);
        let status = client.status().await?;
        let id = def
            .username
            .clone()
            .filter(|u| !u.is_empty())
            .unwrap_or_else(|| status.device_id());
        if lock(&self.boards).contains_key(&id) {
            return Err(ValidationError::DuplicateKey(id).into());
        }

        let mut zones = HashMap::new();
        let mut buzzer = None;
        for zone in &def.zones {
            let property = match zone.kind {
                ZoneKind::Motion => zone.property_name().map(|name| Arc::new(Property::new(name, false))),
                ZoneKind::Contact => zone.property_name().map(|name| Arc::new(Property::new(name, 0_u8))),
                ZoneKind::Buzzer => {
                    buzzer = Some(zone.pin);
                    None
                }
                ZoneKind::System => None,
            };
            tracing::debug!(device = %id, pin = zone.pin, zone = %zone.name, kind = ?zone.kind, "konnected zone");
            if zones.insert(zone.pin, Zone { kind: zone.kind, property }).is_some() {
                return Err(ValidationError::DuplicateKey(format!("{id} pin {}", zone.pin)).into());
            }
        }

        let alarm = Arc::new(AlarmController::new(
            def.name.clone(),
            Arc::new(Buzzer::new(client.clone(), buzzer)),
            self.config.timings(),
        ));
        wire_security_state(&alarm);

        let info = AccessoryInfo {
            name: def.name.clone(),
            manufacturer: MANUFACTURER.to_string(),
            model: status.hw_version.clone(),
            serial_number: id.clone(),
            firmware_revision: status.sw_version.clone(),
            id: AccessoryInfo::numeric_id(&id),
        };
        let mut builder = Accessory::builder()
            .definition(&def)
            .kind(AccessoryKind::SecuritySystem)
            .info(info)
            .property(Arc::clone(alarm.property()))
            .handler(action_handler(Arc::downgrade(&alarm)));
        let mut pins: Vec<_> = zones.iter().collect();
        pins.sort_by_key(|(pin, _)| **pin);
        for (_, zone) in pins {
            if let Some(property) = &zone.property {
                builder = builder.property(Arc::clone(property));
            }
        }
        let accessory = Arc::new(builder.build()?);
        self.hub.publish(Arc::clone(&accessory))?;

        let weak = Arc::downgrade(&accessory);
        let dispatcher = self.dispatcher.clone();
        alarm.on_transition(Arc::new(move |state: SecurityState| {
            if let Some(accessory) = weak.upgrade() {
                dispatcher.trigger(&accessory, state.trigger_label());
            }
        }));

        let board = Arc::new(Board {
            id: id.clone(),
            accessory: Arc::clone(&accessory),
            client,
            zones,
            alarm,
            token: def.password.clone().filter(|p| !p.is_empty()),
        });
        lock(&self.boards).insert(id.clone(), Arc::clone(&board));
        for report in status.sensors {
            apply(&board, report).await;
        }
        tracing::info!(accessory = accessory.name(), device = %id, model = %status.hw_version, "konnected board added");
        Ok(accessory)
    }

    async fn repull(&self, board: &Board) -> Result<(), KonnectedError> {
        for report in board.client.pins().await? {
            apply(board, report).await;
        }
        Ok(())
    }

    async fn repull_all(&self) {
        let boards: Vec<_> = lock(&self.boards).values().cloned().collect();
        for board in boards {
            if let Err(err) = self.repull(&board).await {
                tracing::warn!(device = %board.id, error = %err, "konnected status pull failed");
            }
        }
    }
}

/// Reflect one pin report in the hub and feed it to the alarm.
async fn apply(board: &Board, report: PinState) {
    let Some(zone) = board.zones.get(&report.pin) else {
        tracing::debug!(device = %board.id, pin = report.pin, "report for unconfigured pin");
        return;
    };
    match zone.kind {
        ZoneKind::Motion | ZoneKind::Contact => {
            let changed = match (&zone.property, zone.kind) {
                (Some(property), ZoneKind::Motion) => property.set(report.state == 1),
                (Some(property), _) => property.set(report.state),
                (None, _) => false,
            };
            if changed {
                board.alarm.sensor_event(zone.kind, report.state != 0);
            }
        }
        ZoneKind::System => {
            let reported = if report.state == 0 {
                SecurityState::Disarmed
            } else {
                SecurityState::AwayArmed
            };
            board.alarm.observe_board_state(reported).await;
        }
        ZoneKind::Buzzer => {}
    }
}

/// Hub writes of `security_state` become arm requests.
fn wire_security_state(alarm: &Arc<Alarm>) {
    let weak = Arc::downgrade(alarm);
    alarm.property().on_remote_write(move |value: PropertyValue| {
        let weak = weak.clone();
        async move {
            let requested = value
                .as_int()
                .and_then(SecurityState::from_code)
                .ok_or(ValidationError::InvalidValue {
                    property: SECURITY_STATE.to_string(),
                    expected: "security state code",
                })?;
            let alarm = upgrade(&weak)?;
            Ok::<_, BridgeError>(PropertyValue::Int(alarm.request_state(requested).await.code()))
        }
    });
}

fn action_handler(alarm: Weak<Alarm>) -> ActionHandler {
    Arc::new(move |rule: ActionRule| -> BoxFuture<Result<(), BridgeError>> {
        let alarm = alarm.clone();
        Box::pin(async move {
            if rule.verb != verb::SET_SECURITY_STATE {
                return Err(ValidationError::UnknownVerb(rule.verb).into());
            }
            let requested = SecurityState::from_label(&rule.value).ok_or_else(|| ValidationError::InvalidActionValue {
                verb: rule.verb.clone(),
                value: rule.value.clone(),
            })?;
            upgrade(&alarm)?.request_state(requested).await;
            Ok(())
        })
    })
}

fn upgrade(alarm: &Weak<Alarm>) -> Result<Arc<Alarm>, BridgeError> {
    alarm.upgrade().ok_or_else(|| {
        NotFoundError {
            entity: "Alarm",
            id: SECURITY_STATE.to_string(),
        }
        .into()
    })
}

fn lock<T>(mutex: &Mutex<T>) -> MutexGuard<'_, T> {
    mutex.lock().unwrap_or_else(PoisonError::into_inner)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::fake::FakeBoard;
    use crate::protocol::Command;
    use hearth_app::hub::InProcessHub;
    use hearth_app::registry::PlatformRegistry;
    use hearth_domain::action::trigger;
    use hearth_domain::zone::ZoneDefinition;
    use std::time::Duration;

    const DEVICE: &str = "84f3eb123456";

    struct Harness {
        hub: Arc<InProcessHub>,
        platform: Arc<KonnectedPlatform>,
        registry: Arc<PlatformRegistry>,
    }

    fn harness() -> Harness {
        let registry = Arc::new(PlatformRegistry::new());
        let hub = Arc::new(InProcessHub::new(64));
        let platform = Arc::new(
            KonnectedPlatform::new(KonnectedConfig::default(), hub.clone(), ActionDispatcher::new(&registry)).unwrap(),
        );
        assert!(registry.register(platform.clone()));
        Harness { hub, platform, registry }
    }

    fn zone(pin: u8, kind: ZoneKind) -> ZoneDefinition {
        ZoneDefinition {
            pin,
            name: format!("zone {pin}"),
            kind,
        }
    }

    fn definition(board: &FakeBoard) -> AccessoryDefinition {
        AccessoryDefinition {
            platform: KONNECTED_PLATFORM.to_string(),
            name: "House".to_string(),
            address: board.address(),
            zones: vec![
                zone(1, ZoneKind::Motion),
                zone(2, ZoneKind::Contact),
                zone(5, ZoneKind::Buzzer),
                zone(6, ZoneKind::System),
            ],
            ..AccessoryDefinition::default()
        }
    }

    fn arm_rule(value: &str) -> ActionRule {
        ActionRule {
            trigger: trigger::ON.to_string(),
            target_platform: KONNECTED_PLATFORM.to_string(),
            target_accessory: DEVICE.to_string(),
            verb: verb::SET_SECURITY_STATE.to_string(),
            value: value.to_string(),
        }
    }

    fn state(accessory: &Accessory) -> PropertyValue {
        accessory.property(SECURITY_STATE).unwrap().get()
    }

    async fn eventually(mut condition: impl FnMut() -> bool) {
        tokio::time::timeout(Duration::from_secs(5), async {
            while !condition() {
                tokio::time::sleep(Duration::from_millis(10)).await;
            }
        })
        .await
        .unwrap();
    }

    #[tokio::test]
    async fn should_publish_board_with_zone_properties() {
        let board = FakeBoard::spawn(&[(1, 0), (2, 1)]).await;
        let h = harness();

        let accessory = h.platform.add_accessory(definition(&board)).await.unwrap();

        assert_eq!(accessory.kind(), AccessoryKind::SecuritySystem);
        assert_eq!(accessory.info().manufacturer, "Konnected.io");
        assert_eq!(accessory.info().model, "2.3.0");
        assert_eq!(accessory.info().firmware_revision, "2.3.4");
        assert_eq!(accessory.info().serial_number, DEVICE);
        assert_eq!(accessory.info().id, 0x84f3_eb12_3456);
        let names: Vec<_> = accessory.properties().iter().map(|p| p.name().to_string()).collect();
        assert_eq!(names, vec![SECURITY_STATE, "zone.1.motion", "zone.2.contact"]);
        assert_eq!(accessory.property("zone.2.contact").unwrap().get(), PropertyValue::Int(1));
        assert_eq!(state(&accessory), PropertyValue::Int(SecurityState::Disarmed.code()));
        assert!(h.platform.get_accessory(DEVICE).is_some());
        assert!(h.platform.get_accessory("House").is_some());
        assert!(h.hub.accessory("House").is_some());
    }

    #[tokio::test]
    async fn should_index_board_by_configured_device_id() {
        let board = FakeBoard::spawn(&[]).await;
        let h = harness();
        let def = AccessoryDefinition {
            username: Some("board-a".to_string()),
            ..definition(&board)
        };

        let accessory = h.platform.add_accessory(def).await.unwrap();

        assert_eq!(accessory.info().serial_number, "board-a");
        assert!(h.platform.get_accessory("board-a").is_some());
        assert!(h.platform.get_accessory(DEVICE).is_none());
    }

    #[tokio::test]
    async fn should_drop_board_when_unreachable() {
        let closed = {
            let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
            listener.local_addr().unwrap()
        };
        let h = harness();
        let def = AccessoryDefinition {
            platform: KONNECTED_PLATFORM.to_string(),
            name: "House".to_string(),
            address: closed.to_string(),
            ..AccessoryDefinition::default()
        };

        let result = h.platform.add_accessory(def).await;

        assert!(matches!(result, Err(BridgeError::Device(_))));
        assert!(h.hub.accessories().is_empty());
    }

    #[tokio::test]
    async fn should_arm_from_action_and_chirp() {
        let board = FakeBoard::spawn(&[]).await;
        let h = harness();
        let accessory = h.platform.add_accessory(definition(&board)).await.unwrap();

        let handler = accessory.handler().unwrap();
        handler(arm_rule("Away")).await.unwrap();

        assert_eq!(state(&accessory), PropertyValue::Int(SecurityState::AwayArmed.code()));
        assert_eq!(board.commands(), vec![Command::chirp(5)]);
    }

    #[tokio::test]
    async fn should_reject_unknown_security_label() {
        let board = FakeBoard::spawn(&[]).await;
        let h = harness();
        let accessory = h.platform.add_accessory(definition(&board)).await.unwrap();
        let handler = accessory.handler().unwrap();

        let result = handler(arm_rule("Vacation")).await;

        assert!(matches!(
            result,
            Err(BridgeError::Validation(ValidationError::InvalidActionValue { .. }))
        ));
    }

    #[tokio::test]
    async fn should_start_countdown_when_door_opens_while_away() {
        let board = FakeBoard::spawn(&[(2, 0)]).await;
        let h = harness();
        let accessory = h.platform.add_accessory(definition(&board)).await.unwrap();
        accessory.handler().unwrap()(arm_rule("Away")).await.unwrap();

        h.platform
            .handle_webhook(DEVICE, None, br#"{"pin":2,"state":1}"#)
            .await
            .unwrap();

        assert_eq!(state(&accessory), PropertyValue::Int(SecurityState::Triggered.code()));
        eventually(|| board.commands().contains(&Command::intermittent(5, 60))).await;
    }

    #[tokio::test]
    async fn should_ignore_report_when_token_mismatches() {
        let board = FakeBoard::spawn(&[(1, 0)]).await;
        let h = harness();
        let def = AccessoryDefinition {
            password: Some("secret".to_string()),
            ..definition(&board)
        };
        let accessory = h.platform.add_accessory(def).await.unwrap();
        let report = br#"{"pin":1,"state":1}"#;

        let denied = h.platform.handle_webhook(DEVICE, Some("wrong"), report).await;
        let missing = h.platform.handle_webhook(DEVICE, None, report).await;

        assert!(matches!(denied, Err(KonnectedError::Unauthorized(_))));
        assert!(matches!(missing, Err(KonnectedError::Unauthorized(_))));
        assert_eq!(accessory.property("zone.1.motion").unwrap().get(), PropertyValue::Bool(false));

        h.platform.handle_webhook(DEVICE, Some("secret"), report).await.unwrap();
        assert_eq!(accessory.property("zone.1.motion").unwrap().get(), PropertyValue::Bool(true));
    }

    #[tokio::test]
    async fn should_pull_status_when_body_empty() {
        let board = FakeBoard::spawn(&[(1, 0)]).await;
        let h = harness();
        let accessory = h.platform.add_accessory(definition(&board)).await.unwrap();
        board.set_pin(1, 1);

        h.platform.handle_webhook(DEVICE, None, b"").await.unwrap();

        assert_eq!(accessory.property("zone.1.motion").unwrap().get(), PropertyValue::Bool(true));
    }

    #[tokio::test]
    async fn should_follow_board_system_pin_without_chirp() {
        let board = FakeBoard::spawn(&[]).await;
        let h = harness();
        let accessory = h.platform.add_accessory(definition(&board)).await.unwrap();

        h.platform
            .handle_webhook(DEVICE, None, br#"{"pin":6,"state":1}"#)
            .await
            .unwrap();

        assert_eq!(state(&accessory), PropertyValue::Int(SecurityState::AwayArmed.code()));
        assert!(board.commands().is_empty());
    }

    #[tokio::test]
    async fn should_reject_report_for_unknown_device() {
        let h = harness();

        let result = h.platform.handle_webhook("nope", None, br#"{"pin":1,"state":1}"#).await;

        assert!(matches!(result, Err(KonnectedError::UnknownDevice(_))));
    }

    #[tokio::test]
    async fn should_arm_when_hub_writes_security_state() {
        let board = FakeBoard::spawn(&[]).await;
        let h = harness();
        h.platform.add_accessory(definition(&board)).await.unwrap();

        let confirmed = h
            .hub
            .remote_write("House", SECURITY_STATE, PropertyValue::Int(SecurityState::NightArmed.code()))
            .await
            .unwrap();

        assert_eq!(confirmed, PropertyValue::Int(SecurityState::NightArmed.code()));
    }

    #[tokio::test]
    async fn should_run_matching_rules_on_transition() {
        let board = FakeBoard::spawn(&[]).await;
        let h = harness();
        let house = AccessoryDefinition {
            actions: vec![ActionRule {
                trigger: trigger::AWAY.to_string(),
                target_platform: KONNECTED_PLATFORM.to_string(),
                target_accessory: "Garage".to_string(),
                verb: verb::SET_SECURITY_STATE.to_string(),
                value: "Away".to_string(),
            }],
            ..definition(&board)
        };
        let garage_board = FakeBoard::spawn(&[]).await;
        let garage = AccessoryDefinition {
            name: "Garage".to_string(),
            username: Some("garage".to_string()),
            zones: vec![zone(5, ZoneKind::Buzzer)],
            ..definition(&garage_board)
        };
        let house = h.registry.add_accessory(house).await.unwrap();
        let garage = h.registry.add_accessory(garage).await.unwrap();

        house.handler().unwrap()(arm_rule("Away")).await.unwrap();

        eventually(|| state(&garage) == PropertyValue::Int(SecurityState::AwayArmed.code())).await;
    }
}
