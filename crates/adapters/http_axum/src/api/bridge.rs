//! `GET /api/bridge`.

use axum::Json;
use axum::extract::State;
use serde::Serialize;

use crate::state::AppState;

#[derive(Serialize)]
pub struct BridgeResponse {
    pub name: String,
    pub id: String,
    pub accessories: usize,
}

pub async fn info(State(state): State<AppState>) -> Json<BridgeResponse> {
    Json(BridgeResponse {
        name: state.bridge.name.clone(),
        id: state.bridge.id.clone(),
        accessories: state.hub.accessories().len(),
    })
}
