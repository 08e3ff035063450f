//! Server-Sent Events (SSE) stream of hub changes.

use axum::extract::State;
use axum::response::sse::{Event, KeepAlive, Sse};
use tokio_stream::StreamExt;
use tokio_stream::wrappers::BroadcastStream;
use tokio_stream::wrappers::errors::BroadcastStreamRecvError;

use crate::state::AppState;

/// `GET /api/events` — SSE stream of property changes.
///
/// Each [`PropertyChanged`](hearth_domain::event::PropertyChanged) is sent
/// as a JSON `data:` frame of a `property_changed` event. The stream runs
/// until the client disconnects.
pub async fn stream(
    State(state): State<AppState>,
) -> Sse<impl tokio_stream::Stream<Item = Result<Event, std::convert::Infallible>>> {
    let changes = BroadcastStream::new(state.hub.subscribe()).filter_map(|result| match result {
        Ok(change) => match serde_json::to_string(&change) {
            Ok(json) => Some(Ok(Event::default().event("property_changed").data(json))),
            Err(err) => {
                tracing::warn!(%err, "failed to serialize change for SSE stream");
                None
            }
        },
        Err(BroadcastStreamRecvError::Lagged(n)) => {
            tracing::warn!(skipped = n, "SSE subscriber lagged, some changes were dropped");
            None
        }
    });

    Sse::new(changes).keep_alive(KeepAlive::default())
}

#[cfg(test)]
mod tests {
    use crate::testing::{fixture, request};
    use axum::http::StatusCode;
    use axum::http::header::CONTENT_TYPE;
    use http_body_util::BodyExt;
    use std::time::Duration;
    use tower::ServiceExt;

    #[tokio::test]
    async fn should_stream_property_changes() {
        let fx = fixture();
        let response = fx.router.oneshot(request("GET", "/api/events", None)).await.unwrap();
        assert_eq!(response.status(), StatusCode::OK);
        assert_eq!(response.headers()[CONTENT_TYPE], "text/event-stream");

        fx.on.set(true);

        let mut body = response.into_body();
        let frame = tokio::time::timeout(Duration::from_secs(5), body.frame())
            .await
            .unwrap()
            .unwrap()
            .unwrap();
        let text = String::from_utf8(frame.into_data().unwrap().to_vec()).unwrap();
        assert!(text.starts_with("event: property_changed"));
        assert!(text.contains(r#""accessory":"Porch""#));
        assert!(text.contains(r#""origin":"device""#));
    }
}
