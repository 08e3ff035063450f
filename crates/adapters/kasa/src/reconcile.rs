//! Reconciliation: device state overwrites stale hub state.
//!
//! Every observed snapshot is treated as the latest truth, whatever command
//! it may or may not answer. Properties only notify when the observed value
//! differs, so applying the same snapshot twice is silent the second time.

use std::sync::Arc;

use hearth_domain::property::Property;

use crate::protocol::SysInfo;

/// Hub-visible properties of one Kasa accessory.
#[derive(Debug)]
pub(crate) enum Exposed {
    Plug {
        on: Arc<Property>,
    },
    Dimmer {
        on: Arc<Property>,
        brightness: Arc<Property>,
    },
    Strip {
        /// `(child id, property)` pairs.
        outlets: Vec<(String, Arc<Property>)>,
    },
}

impl Exposed {
    /// Property name of a strip outlet.
    pub(crate) fn outlet_property(child_id: &str) -> String {
        format!("outlet.{child_id}")
    }

    pub(crate) fn properties(&self) -> Vec<Arc<Property>> {
        match self {
            Self::Plug { on } => vec![Arc::clone(on)],
            Self::Dimmer { on, brightness } => vec![Arc::clone(on), Arc::clone(brightness)],
            Self::Strip { outlets } => outlets.iter().map(|(_, p)| Arc::clone(p)).collect(),
        }
    }

    /// Apply `info` and return how many properties changed.
    pub(crate) fn reconcile(&self, info: &SysInfo) -> usize {
        match self {
            Self::Plug { on } => usize::from(on.set(info.is_on())),
            Self::Dimmer { on, brightness } => {
                usize::from(on.set(info.is_on())) + usize::from(brightness.set(info.brightness))
            }
            Self::Strip { outlets } => outlets
                .iter()
                .filter(|(child_id, property)| match info.child(child_id) {
                    Some(child) => property.set(child.state > 0),
                    None => {
                        tracing::debug!(child = %child_id, "outlet missing from report");
                        false
                    }
                })
                .count(),
        }
    }
}
