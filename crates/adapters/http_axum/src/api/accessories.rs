//! JSON handlers for published accessories.

use axum::Json;
use axum::extract::{Path, State};
use serde::{Deserialize, Serialize};

use hearth_app::hub::Published;
use hearth_domain::accessory::AccessorySnapshot;
use hearth_domain::error::{BridgeError, NotFoundError};
use hearth_domain::id::AccessoryId;
use hearth_domain::property::PropertyValue;

use crate::error::ApiError;
use crate::state::AppState;

/// An accessory with its hub id and current property values.
#[derive(Debug, Serialize)]
pub struct AccessoryView {
    pub id: AccessoryId,
    #[serde(flatten)]
    pub accessory: AccessorySnapshot,
}

impl From<&Published> for AccessoryView {
    fn from(published: &Published) -> Self {
        Self {
            id: published.id,
            accessory: published.accessory.snapshot(),
        }
    }
}

/// Request body for a property write.
#[derive(Debug, Deserialize)]
pub struct WriteRequest {
    pub value: PropertyValue,
}

/// The value the device confirmed.
#[derive(Debug, Serialize)]
pub struct WriteResponse {
    pub accessory: String,
    pub property: String,
    pub value: PropertyValue,
}

/// `GET /api/accessories`
pub async fn list(State(state): State<AppState>) -> Json<Vec<AccessoryView>> {
    Json(state.hub.accessories().iter().map(AccessoryView::from).collect())
}

/// `GET /api/accessories/{name}`
pub async fn get(State(state): State<AppState>, Path(name): Path<String>) -> Result<Json<AccessoryView>, ApiError> {
    let published = state.hub.accessory(&name).ok_or_else(|| NotFoundError {
        entity: "Accessory",
        id: name,
    })
    .map_err(BridgeError::from)?;
    Ok(Json(AccessoryView::from(&published)))
}

/// `PUT /api/accessories/{name}/properties/{property}`
pub async fn write(
    State(state): State<AppState>,
    Path((name, property)): Path<(String, String)>,
    Json(req): Json<WriteRequest>,
) -> Result<Json<WriteResponse>, ApiError> {
    let value = state.hub.remote_write(&name, &property, req.value).await?;
    Ok(Json(WriteResponse {
        accessory: name,
        property,
        value,
    }))
}
