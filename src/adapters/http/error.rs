//! JSON error bodies and error → status mapping shared by all routes.

use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use serde::Serialize;

use crate::application::DispatchError;
use crate::ports::{BusError, StoreError};

/// Error response body.
#[derive(Debug, Clone, Serialize)]
pub struct ErrorResponse {
    pub code: String,
    pub message: String,
}

impl ErrorResponse {
    pub fn bad_request(message: impl Into<String>) -> Self {
        Self::new("BAD_REQUEST", message)
    }

    pub fn not_found(resource_type: &str, id: &str) -> Self {
        Self::new("NOT_FOUND", format!("{} not found: {}", resource_type, id))
    }

    pub fn unavailable(message: impl Into<String>) -> Self {
        Self::new("SERVICE_UNAVAILABLE", message)
    }

    pub fn bad_gateway(message: impl Into<String>) -> Self {
        Self::new("BAD_GATEWAY", message)
    }

    pub fn internal(message: impl Into<String>) -> Self {
        Self::new("INTERNAL_ERROR", message)
    }

    fn new(code: &str, message: impl Into<String>) -> Self {
        Self {
            code: code.to_string(),
            message: message.into(),
        }
    }
}

pub(crate) fn error_response(status: StatusCode, body: ErrorResponse) -> Response {
    (status, Json(body)).into_response()
}

pub(crate) fn handle_store_error(error: StoreError) -> Response {
    match error {
        StoreError::NotFound(what) => {
            error_response(StatusCode::NOT_FOUND, ErrorResponse::not_found("Record", &what))
        }
        StoreError::Database(msg) => {
            tracing::error!(error = %msg, "State store failure");
            error_response(
                StatusCode::INTERNAL_SERVER_ERROR,
                ErrorResponse::internal("State store unavailable"),
            )
        }
    }
}

pub(crate) fn handle_bus_error(error: BusError) -> Response {
    match error {
        BusError::NotConnected { .. } => error_response(
            StatusCode::SERVICE_UNAVAILABLE,
            ErrorResponse::unavailable(error.to_string()),
        ),
        BusError::InvalidTopic { .. } => {
            error_response(StatusCode::BAD_REQUEST, ErrorResponse::bad_request(error.to_string()))
        }
        BusError::Client(_) | BusError::ConnectionLost(_) => error_response(
            StatusCode::BAD_GATEWAY,
            ErrorResponse::bad_gateway(error.to_string()),
        ),
    }
}

pub(crate) fn handle_dispatch_error(error: DispatchError) -> Response {
    match error {
        DispatchError::UnknownDevice(id) => error_response(
            StatusCode::NOT_FOUND,
            ErrorResponse::not_found("Device", &id.to_string()),
        ),
        DispatchError::InvalidAction(_) => {
            error_response(StatusCode::BAD_REQUEST, ErrorResponse::bad_request(error.to_string()))
        }
        DispatchError::Store(e) => handle_store_error(e),
        DispatchError::Publish(e) => handle_bus_error(e),
    }
}
