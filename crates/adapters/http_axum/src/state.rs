//! Shared application state for axum handlers.

use std::sync::Arc;

use hearth_app::hub::InProcessHub;
use serde::Serialize;

/// Identity the bridge reports on `/api/bridge`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct BridgeInfo {
    pub name: String,
    pub id: String,
}

/// Application state shared across all axum handlers.
///
/// Only `Arc`s are cloned per request.
#[derive(Clone)]
pub struct AppState {
    pub hub: Arc<InProcessHub>,
    pub bridge: Arc<BridgeInfo>,
}

impl AppState {
    pub fn new(hub: Arc<InProcessHub>, bridge: BridgeInfo) -> Self {
        Self {
            hub,
            bridge: Arc::new(bridge),
        }
    }
}
