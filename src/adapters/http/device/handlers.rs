//! HTTP handlers for device command and value endpoints.

use std::sync::Arc;

use axum::{
    extract::{rejection::JsonRejection, Path, State},
    http::{header, StatusCode},
    response::{IntoResponse, Response},
    Json,
};

use crate::adapters::http::error::{
    error_response, handle_dispatch_error, handle_store_error, ErrorResponse,
};
use crate::application::{CommandDispatcher, GetDeviceStateHandler, GetDeviceStateQuery};
use crate::domain::foundation::DeviceId;

use super::dto::{CommandResponse, NumberInputRequest};

#[derive(Clone)]
pub struct DeviceHandlers {
    dispatcher: Arc<CommandDispatcher>,
    state_handler: Arc<GetDeviceStateHandler>,
}

impl DeviceHandlers {
    pub fn new(dispatcher: Arc<CommandDispatcher>, state_handler: Arc<GetDeviceStateHandler>) -> Self {
        Self {
            dispatcher,
            state_handler,
        }
    }
}

/// POST /device/:device_id/command/:action_name - Publish the body as a command
pub async fn send_command(
    State(handlers): State<DeviceHandlers>,
    Path((device_id, action_name)): Path<(String, String)>,
    body: String,
) -> Response {
    let device_id = match parse_device_id(&device_id) {
        Ok(id) => id,
        Err(response) => return response,
    };

    match handlers
        .dispatcher
        .dispatch(device_id, &action_name, &body)
        .await
    {
        Ok(result) => accepted(result.into()),
        Err(e) => handle_dispatch_error(e),
    }
}

/// POST /device/:device_id/toggle/:action_name - Flip an on/off action
pub async fn toggle(
    State(handlers): State<DeviceHandlers>,
    Path((device_id, action_name)): Path<(String, String)>,
) -> Response {
    let device_id = match parse_device_id(&device_id) {
        Ok(id) => id,
        Err(response) => return response,
    };

    match handlers.dispatcher.toggle(device_id, &action_name).await {
        Ok(result) => accepted(result.into()),
        Err(e) => handle_dispatch_error(e),
    }
}

/// POST /device/:device_id/number_input/:action_name - Send a numeric value
pub async fn number_input(
    State(handlers): State<DeviceHandlers>,
    Path((device_id, action_name)): Path<(String, String)>,
    body: Result<Json<NumberInputRequest>, JsonRejection>,
) -> Response {
    let device_id = match parse_device_id(&device_id) {
        Ok(id) => id,
        Err(response) => return response,
    };
    let Ok(Json(req)) = body else {
        return error_response(
            StatusCode::BAD_REQUEST,
            ErrorResponse::bad_request("Expected a JSON body with a 'value' field"),
        );
    };
    let Some(value) = req.payload() else {
        return error_response(
            StatusCode::BAD_REQUEST,
            ErrorResponse::bad_request("'value' must be a number or a string"),
        );
    };

    match handlers
        .dispatcher
        .number_input(device_id, &action_name, &value)
        .await
    {
        Ok(result) => accepted(result.into()),
        Err(e) => handle_dispatch_error(e),
    }
}

/// GET /device/:device_id/provide_value/:action_name - Last known state as plain text
pub async fn provide_value(
    State(handlers): State<DeviceHandlers>,
    Path((device_id, action_name)): Path<(String, String)>,
) -> Response {
    let device_id = match parse_device_id(&device_id) {
        Ok(id) => id,
        Err(response) => return response,
    };

    let query = GetDeviceStateQuery {
        device_id,
        action_name,
    };
    match handlers.state_handler.handle(query).await {
        Ok(state) => (
            StatusCode::OK,
            [(header::CONTENT_TYPE, "text/plain; charset=utf-8")],
            state,
        )
            .into_response(),
        Err(e) => handle_store_error(e),
    }
}

fn parse_device_id(raw: &str) -> Result<DeviceId, Response> {
    raw.parse::<DeviceId>().map_err(|_| {
        error_response(
            StatusCode::BAD_REQUEST,
            ErrorResponse::bad_request("Invalid device ID"),
        )
    })
}

fn accepted(response: CommandResponse) -> Response {
    (StatusCode::ACCEPTED, Json(response)).into_response()
}
