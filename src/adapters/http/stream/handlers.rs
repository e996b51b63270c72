//! Server-sent event stream for live dashboards.
//!
//! Each request opens a [`DashboardSession`]. The session lives inside the
//! response stream, so when the client disconnects axum drops the stream and
//! the session unregisters from the hub.

use std::convert::Infallible;
use std::sync::Arc;
use std::time::Duration;

use axum::{
    extract::State,
    response::sse::{Event, KeepAlive, Sse},
};
use futures::stream::{self, Stream};
use tokio::sync::watch;

use crate::adapters::hub::BroadcastHub;

use super::session::{DashboardSession, StreamMessage};

#[derive(Clone)]
pub struct StreamState {
    hub: Arc<BroadcastHub>,
    shutdown: watch::Receiver<bool>,
    keep_alive: Duration,
}

impl StreamState {
    pub fn new(hub: Arc<BroadcastHub>, shutdown: watch::Receiver<bool>, keep_alive: Duration) -> Self {
        Self {
            hub,
            shutdown,
            keep_alive,
        }
    }
}

/// GET /api/stream - Live state events as SSE
pub async fn stream_state(
    State(state): State<StreamState>,
) -> Sse<impl Stream<Item = Result<Event, Infallible>>> {
    let session = DashboardSession::open(&state.hub, state.shutdown.clone());

    let events = stream::unfold(session, |mut session| async move {
        let event = session.next_event().await?;
        Some((Ok(to_sse_event(&StreamMessage::from(&event))), session))
    });

    Sse::new(events).keep_alive(KeepAlive::new().interval(state.keep_alive))
}

fn to_sse_event(message: &StreamMessage) -> Event {
    match serde_json::to_string(message) {
        Ok(data) => Event::default().data(data),
        Err(e) => {
            tracing::error!(error = %e, "Failed to encode stream message");
            Event::default().comment("encode error")
        }
    }
}
