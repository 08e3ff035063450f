//! JSON API handler modules.

#[allow(clippy::missing_errors_doc)]
pub mod accessories;
pub mod bridge;
pub mod sse;

use axum::Router;
use axum::routing::{get, put};

use crate::state::AppState;

/// Build the `/api` sub-router.
pub fn routes() -> Router<AppState> {
    Router::new()
        .route("/bridge", get(bridge::info))
        // Accessories
        .route("/accessories", get(accessories::list))
        .route("/accessories/{name}", get(accessories::get))
        .route("/accessories/{name}/properties/{property}", put(accessories::write))
        // Events
        .route("/events", get(sse::stream))
}
