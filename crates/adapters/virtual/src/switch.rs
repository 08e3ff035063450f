//! Virtual switch — an `on` property with no hardware behind it.

use std::sync::{Arc, OnceLock, Weak};

use hearth_app::dispatcher::ActionDispatcher;
use hearth_domain::accessory::{Accessory, ActionHandler};
use hearth_domain::action::{ActionRule, parse_switch_value, trigger, verb};
use hearth_domain::error::{BridgeError, NotFoundError, ValidationError};
use hearth_domain::property::{BoxFuture, Property, PropertyValue};

pub(crate) const ON: &str = "on";

/// How a virtual switch reacts to being switched on.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SwitchModel {
    /// Holds its state.
    Stateful,
    /// Momentary button: fires the `On` rules and drops back to off.
    Stateless,
}

impl SwitchModel {
    /// Read the model hint of an accessory definition.
    #[must_use]
    pub fn from_hint(hint: Option<&str>) -> Self {
        match hint {
            Some(hint) if hint.trim().to_ascii_lowercase().starts_with("stateless") => Self::Stateless,
            _ => Self::Stateful,
        }
    }
}

pub(crate) struct VirtualSwitch {
    model: SwitchModel,
    on: Arc<Property>,
    dispatcher: ActionDispatcher,
    accessory: OnceLock<Arc<Accessory>>,
}

impl VirtualSwitch {
    pub(crate) fn new(model: SwitchModel, dispatcher: ActionDispatcher) -> Arc<Self> {
        let switch = Arc::new(Self {
            model,
            on: Arc::new(Property::new(ON, false)),
            dispatcher,
            accessory: OnceLock::new(),
        });
        let weak = Arc::downgrade(&switch);
        switch.on.on_remote_write(move |value: PropertyValue| {
            let weak = weak.clone();
            async move {
                let on = value.as_bool().ok_or(ValidationError::InvalidValue {
                    property: ON.to_string(),
                    expected: "boolean",
                })?;
                Ok::<_, BridgeError>(PropertyValue::Bool(upgrade(&weak)?.press(on)))
            }
        });
        switch
    }

    pub(crate) fn property(&self) -> Arc<Property> {
        Arc::clone(&self.on)
    }

    pub(crate) fn accessory(&self) -> Option<&Arc<Accessory>> {
        self.accessory.get()
    }

    /// Bind the published accessory. Stateful switches fire `On`/`Off`
    /// rules on every change from here on.
    pub(crate) fn attach(&self, accessory: Arc<Accessory>) {
        if self.model == SwitchModel::Stateful {
            self.dispatcher.bind_switch(&accessory, ON, trigger::ON, trigger::OFF);
        }
        let _ = self.accessory.set(accessory);
    }

    pub(crate) fn handler(self: &Arc<Self>) -> ActionHandler {
        let weak = Arc::downgrade(self);
        Arc::new(move |rule: ActionRule| -> BoxFuture<Result<(), BridgeError>> {
            let weak = weak.clone();
            Box::pin(async move {
                if rule.verb != verb::SET_RELAY_STATE {
                    return Err(ValidationError::UnknownVerb(rule.verb).into());
                }
                let on = parse_switch_value(&rule.value).ok_or_else(|| ValidationError::InvalidActionValue {
                    verb: rule.verb.clone(),
                    value: rule.value.clone(),
                })?;
                let switch = upgrade(&weak)?;
                let value = switch.press(on);
                switch.on.set(value);
                Ok(())
            })
        })
    }

    /// Apply a switch request and return the resulting state.
    fn press(&self, on: bool) -> bool {
        match self.model {
            SwitchModel::Stateful => on,
            SwitchModel::Stateless => {
                if on && let Some(accessory) = self.accessory.get() {
                    self.dispatcher.trigger(accessory, trigger::ON);
                }
                false
            }
        }
    }
}

fn upgrade(switch: &Weak<VirtualSwitch>) -> Result<Arc<VirtualSwitch>, BridgeError> {
    switch.upgrade().ok_or_else(|| {
        NotFoundError {
            entity: "Switch",
            id: ON.to_string(),
        }
        .into()
    })
}
