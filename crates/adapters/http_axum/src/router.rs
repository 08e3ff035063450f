//! Axum router assembly.

use axum::Router;
use axum::routing::get;
use tower_http::trace::TraceLayer;

use crate::state::AppState;

/// Build the top-level axum [`Router`].
///
/// Serves the JSON API under `/api` and nests every `(prefix, router)`
/// mount next to it. Mounts carry their own state, which is how device
/// families plug their webhooks in without this crate knowing them.
/// Includes a [`TraceLayer`] that logs each HTTP request/response at the
/// `DEBUG` level using the `tracing` ecosystem.
pub fn build(state: AppState, mounts: Vec<(String, Router)>) -> Router {
    let router = Router::new()
        .route("/health", get(health_check))
        .nest("/api", crate::api::routes())
        .with_state(state);

    mounts
        .into_iter()
        .fold(router, |router, (prefix, mount)| router.nest(&prefix, mount))
        .layer(TraceLayer::new_for_http())
}

async fn health_check() -> &'static str {
    "OK"
}
