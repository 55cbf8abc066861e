//! Notification stream (Server-Sent Events)
//!
//! Each notification is sent with the SSE `event` field set to its action
//! (`RO_CREATE`, `STORY_MOVE`, ...) and the JSON payload as data.

use std::convert::Infallible;
use std::time::Duration;

use axum::extract::{Query, State};
use axum::http::StatusCode;
use axum::response::sse::{Event, KeepAlive, Sse};
use futures::stream::{Stream, StreamExt};
use nms_common::events::Topic;
use serde::Deserialize;
use tokio_stream::wrappers::BroadcastStream;
use tracing::{debug, warn};

use super::AppState;

#[derive(Debug, Default, Deserialize)]
pub struct EventsQuery {
    /// `rundown`, `story`, or a full topic path; all topics when absent
    pub topic: Option<String>,
}

/// GET /events[?topic=...]
pub async fn event_stream(
    State(state): State<AppState>,
    Query(query): Query<EventsQuery>,
) -> Result<Sse<impl Stream<Item = Result<Event, Infallible>>>, (StatusCode, String)> {
    let filter = match query.topic.as_deref() {
        None => None,
        Some(raw) => Some(
            Topic::parse(raw)
                .ok_or_else(|| (StatusCode::BAD_REQUEST, format!("Unknown topic: {}", raw)))?,
        ),
    };
    debug!(topic = ?filter, "New SSE client connected");

    let stream = BroadcastStream::new(state.bus.subscribe()).filter_map(move |result| async move {
        match result {
            Ok(notification) => {
                if filter.is_some_and(|topic| topic != notification.topic) {
                    return None;
                }
                match serde_json::to_string(&notification.event) {
                    Ok(json) => Some(Ok(Event::default()
                        .event(notification.event.action())
                        .data(json))),
                    Err(e) => {
                        warn!("Failed to serialize notification: {}", e);
                        None
                    }
                }
            }
            Err(e) => {
                // Lagged subscriber; skipped notifications are not replayed
                warn!("SSE stream error: {:?}", e);
                None
            }
        }
    });

    Ok(Sse::new(stream).keep_alive(
        KeepAlive::new()
            .interval(Duration::from_secs(15))
            .text("keep-alive"),
    ))
}
