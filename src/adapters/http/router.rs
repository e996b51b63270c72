//! Application router: route groups plus cross-cutting layers.

use std::sync::Arc;
use std::time::Duration;

use http::{HeaderValue, Method};
use axum::Router;
use tokio::sync::watch;
use tower_http::{
    compression::CompressionLayer,
    cors::{Any, CorsLayer},
    request_id::{MakeRequestUuid, PropagateRequestIdLayer, SetRequestIdLayer},
    timeout::TimeoutLayer,
    trace::TraceLayer,
};

use crate::adapters::hub::BroadcastHub;
use crate::application::{CommandDispatcher, GetDeviceStateHandler};
use crate::config::ServerConfig;
use crate::ports::MessageBus;

use super::device::{device_routes, DeviceHandlers};
use super::health::health_routes;
use super::stream::{stream_routes, StreamState};

/// Everything the HTTP surface needs from the running bridge.
#[derive(Clone)]
pub struct AppState {
    pub dispatcher: Arc<CommandDispatcher>,
    pub device_state: Arc<GetDeviceStateHandler>,
    pub hub: Arc<BroadcastHub>,
    pub bus: Arc<dyn MessageBus>,
    pub shutdown: watch::Receiver<bool>,
    pub keep_alive: Duration,
}

/// Builds the full router.
///
/// The request timeout and compression apply to request/response routes only;
/// the dashboard stream stays open until the client or the server ends it.
pub fn app_router(state: AppState, server: &ServerConfig) -> Router {
    let request_routes = Router::new()
        .nest(
            "/device",
            device_routes(DeviceHandlers::new(state.dispatcher, state.device_state)),
        )
        .nest("/api", health_routes(state.bus))
        .layer(CompressionLayer::new())
        .layer(TimeoutLayer::new(server.request_timeout()));

    let stream = Router::new().nest(
        "/api",
        stream_routes(StreamState::new(state.hub, state.shutdown, state.keep_alive)),
    );

    request_routes
        .merge(stream)
        .layer(TraceLayer::new_for_http())
        .layer(PropagateRequestIdLayer::x_request_id())
        .layer(SetRequestIdLayer::x_request_id(MakeRequestUuid))
        .layer(cors_layer(&server.cors_origins_list()))
}

fn cors_layer(origins: &[String]) -> CorsLayer {
    let cors = CorsLayer::new()
        .allow_methods([Method::GET, Method::POST])
        .allow_headers(Any);

    if origins.is_empty() {
        return cors.allow_origin(Any);
    }

    let origins: Vec<HeaderValue> = origins
        .iter()
        .filter_map(|origin| match origin.parse::<HeaderValue>() {
            Ok(value) => Some(value),
            Err(_) => {
                tracing::warn!(origin = %origin, "Ignoring invalid CORS origin");
                None
            }
        })
        .collect();
    cors.allow_origin(origins)
}
