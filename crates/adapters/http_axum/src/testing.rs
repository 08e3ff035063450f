use std::sync::Arc;

use axum::Router;
use axum::body::Body;
use axum::http::Request;
use axum::response::Response;
use http_body_util::BodyExt;

use hearth_app::hub::InProcessHub;
use hearth_app::ports::AccessoryHub;
use hearth_domain::accessory::{Accessory, AccessoryKind};
use hearth_domain::error::BridgeError;
use hearth_domain::property::{Property, PropertyValue};

use crate::state::{AppState, BridgeInfo};

pub struct Fixture {
    pub router: Router,
    pub hub: Arc<InProcessHub>,
    pub on: Arc<Property>,
    pub locked: Arc<Property>,
}

/// A hub with one published switch "Porch":
/// - `on`: writable, echoes the requested value
/// - `power`: read-only
/// - `locked`: writable, the device always fails
pub fn fixture() -> Fixture {
    let hub = Arc::new(InProcessHub::new(16));

    let on = Arc::new(Property::new("on", false));
    on.on_remote_write(|value| async move { Ok(value) });
    let power = Arc::new(Property::new("power", 0_i64));
    let locked = Arc::new(Property::new("locked", false));
    locked.on_remote_write(|_| async { Err::<PropertyValue, _>(BridgeError::device(std::io::Error::other("offline"))) });

    let accessory = Accessory::builder()
        .platform("Virtual")
        .name("Porch")
        .kind(AccessoryKind::Switch)
        .property(Arc::clone(&on))
        .property(power)
        .property(Arc::clone(&locked))
        .build()
        .unwrap();
    hub.publish(Arc::new(accessory)).unwrap();

    let state = AppState::new(
        Arc::clone(&hub),
        BridgeInfo {
            name: "Hearth".to_string(),
            id: "CC:22:3D:E3:CE:30".to_string(),
        },
    );
    Fixture {
        router: crate::router::build(state, Vec::new()),
        hub,
        on,
        locked,
    }
}

pub fn request(method: &str, uri: &str, body: Option<serde_json::Value>) -> Request<Body> {
    let builder = Request::builder().method(method).uri(uri);
    match body {
        Some(json) => builder
            .header("content-type", "application/json")
            .body(Body::from(json.to_string()))
            .unwrap(),
        None => builder.body(Body::empty()).unwrap(),
    }
}

pub async fn json_body(response: Response) -> serde_json::Value {
    let bytes = response.into_body().collect().await.unwrap().to_bytes();
    serde_json::from_slice(&bytes).unwrap()
}
