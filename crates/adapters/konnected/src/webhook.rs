//! Webhook the boards push pin changes to.
//!
//! The board retries and eventually reboots when it does not get a 200, so
//! every call is answered `{"status":"OK"}`, whatever happened to it.

use std::sync::Arc;

use axum::body::Bytes;
use axum::extract::{Path, State};
use axum::http::HeaderMap;
use axum::http::header::AUTHORIZATION;
use axum::routing::put;
use axum::{Json, Router};
use serde::Serialize;

use crate::platform::KonnectedPlatform;

#[derive(Serialize)]
struct Ack {
    status: &'static str,
}

/// `PUT /{device}`. Mount under the prefix the boards are provisioned with.
pub fn routes(platform: Arc<KonnectedPlatform>) -> Router {
    Router::new().route("/{device}", put(report)).with_state(platform)
}

async fn report(
    State(platform): State<Arc<KonnectedPlatform>>,
    Path(device): Path<String>,
    headers: HeaderMap,
    body: Bytes,
) -> Json<Ack> {
    let token = headers
        .get(AUTHORIZATION)
        .and_then(|value| value.to_str().ok())
        .map(|value| value.strip_prefix("Bearer ").unwrap_or(value));
    if let Err(err) = platform.handle_webhook(&device, token, &body).await {
        tracing::info!(device = %device, error = %err, "konnected report ignored");
    }
    Json(Ack { status: "OK" })
}
