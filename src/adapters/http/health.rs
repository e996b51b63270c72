//! Broker connection health endpoint.

use std::sync::Arc;

use axum::{extract::State, http::StatusCode, response::IntoResponse, routing::get, Json, Router};
use chrono::{DateTime, Utc};
use serde::Serialize;

use crate::domain::connection::{ConnectionState, ConnectionStatus};
use crate::ports::MessageBus;

#[derive(Debug, Clone, Serialize)]
pub struct BrokerHealthResponse {
    pub state: ConnectionState,
    pub connected: bool,
    pub since: DateTime<Utc>,
    pub failed_attempts: u32,
}

impl From<ConnectionStatus> for BrokerHealthResponse {
    fn from(status: ConnectionStatus) -> Self {
        Self {
            state: status.state,
            connected: status.state.accepts_publishes(),
            since: status.since,
            failed_attempts: status.failed_attempts,
        }
    }
}

/// GET /api/health/broker - 200 while connected, 503 otherwise
pub async fn broker_health(State(bus): State<Arc<dyn MessageBus>>) -> impl IntoResponse {
    let response = BrokerHealthResponse::from(bus.status());
    let status = if response.connected {
        StatusCode::OK
    } else {
        StatusCode::SERVICE_UNAVAILABLE
    };
    (status, Json(response))
}

pub fn health_routes(bus: Arc<dyn MessageBus>) -> Router {
    Router::new()
        .route("/health/broker", get(broker_health))
        .with_state(bus)
}
