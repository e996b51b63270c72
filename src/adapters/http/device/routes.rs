//! HTTP routes for device endpoints.

use axum::{
    routing::{get, post},
    Router,
};

use super::handlers::{number_input, provide_value, send_command, toggle, DeviceHandlers};

/// Creates the device router with all endpoints.
pub fn device_routes(handlers: DeviceHandlers) -> Router {
    Router::new()
        .route("/:device_id/command/:action_name", post(send_command))
        .route("/:device_id/toggle/:action_name", post(toggle))
        .route("/:device_id/number_input/:action_name", post(number_input))
        .route("/:device_id/provide_value/:action_name", get(provide_value))
        .with_state(handlers)
}
