//! Action dispatcher — resolves and invokes the targets of action rules.
//!
//! Every rule is dispatched on its own task. A rule whose platform or
//! accessory cannot be resolved, or whose target has no handler, is logged
//! and dropped without affecting the others. There is no retry and no
//! ordering between rules.

use std::sync::{Arc, Weak};

use hearth_domain::accessory::Accessory;
use hearth_domain::action::ActionRule;
use hearth_domain::property::PropertyChange;
use tokio::task::JoinHandle;

use crate::registry::PlatformRegistry;

/// What happened to one dispatched rule.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DispatchOutcome {
    Invoked,
    UnknownPlatform,
    UnknownAccessory,
    NoHandler,
    HandlerFailed,
}

/// Runs action rules against the platforms of a registry.
#[derive(Clone)]
pub struct ActionDispatcher {
    registry: Weak<PlatformRegistry>,
}

impl ActionDispatcher {
    /// The dispatcher holds the registry weakly so platforms can own one.
    #[must_use]
    pub fn new(registry: &Arc<PlatformRegistry>) -> Self {
        Self {
            registry: Arc::downgrade(registry),
        }
    }

    /// Dispatch each rule on its own task.
    ///
    /// Must be called from within a tokio runtime.
    pub fn run_actions(&self, rules: Vec<ActionRule>) -> Vec<JoinHandle<DispatchOutcome>> {
        rules
            .into_iter()
            .map(|rule| {
                let registry = self.registry.clone();
                tokio::spawn(dispatch(registry, rule))
            })
            .collect()
    }

    /// Run the rules of `accessory` that match `label`.
    pub fn trigger(&self, accessory: &Accessory, label: &str) -> Vec<JoinHandle<DispatchOutcome>> {
        let rules = accessory.match_actions(label);
        if !rules.is_empty() {
            tracing::info!(accessory = accessory.name(), trigger = label, rules = rules.len(), "running actions");
        }
        self.run_actions(rules)
    }

    /// Fire `on_label` / `off_label` rules whenever the boolean `property`
    /// of `accessory` changes.
    pub fn bind_switch(&self, accessory: &Arc<Accessory>, property: &str, on_label: &'static str, off_label: &'static str) {
        let Some(target) = accessory.property(property) else {
            return;
        };
        let weak = Arc::downgrade(accessory);
        let dispatcher = self.clone();
        target.subscribe(Arc::new(move |change: &PropertyChange<'_>| {
            let Some(accessory) = weak.upgrade() else {
                return;
            };
            let label = if change.value.as_bool().unwrap_or(false) {
                on_label
            } else {
                off_label
            };
            dispatcher.trigger(&accessory, label);
        }));
    }
}

async fn dispatch(registry: Weak<PlatformRegistry>, rule: ActionRule) -> DispatchOutcome {
    let Some(platform) = registry.upgrade().and_then(|r| r.lookup(&rule.target_platform)) else {
        tracing::warn!(platform = %rule.target_platform, rule = %rule, "action target platform not found");
        return DispatchOutcome::UnknownPlatform;
    };
    let Some(accessory) = platform.get_accessory(&rule.target_accessory) else {
        tracing::warn!(accessory = %rule.target_accessory, rule = %rule, "action target accessory not found");
        return DispatchOutcome::UnknownAccessory;
    };
    let Some(handler) = accessory.handler().cloned() else {
        tracing::info!(accessory = accessory.name(), rule = %rule, "action target has no handler");
        return DispatchOutcome::NoHandler;
    };
    match handler(rule.clone()).await {
        Ok(()) => {
            tracing::debug!(rule = %rule, "action invoked");
            DispatchOutcome::Invoked
        }
        Err(err) => {
            tracing::warn!(rule = %rule, error = %err, "action failed");
            DispatchOutcome::HandlerFailed
        }
    }
}
