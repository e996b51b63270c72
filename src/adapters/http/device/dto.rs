//! HTTP DTOs for device command endpoints.

use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::application::DispatchResult;

/// Body of `POST /device/:device_id/number_input/:action_name`.
#[derive(Debug, Clone, Deserialize)]
pub struct NumberInputRequest {
    pub value: Value,
}

impl NumberInputRequest {
    /// The value as the text published to the device. Strings go out
    /// verbatim, numbers as their JSON text.
    pub fn payload(&self) -> Option<String> {
        match &self.value {
            Value::String(s) => Some(s.clone()),
            Value::Number(n) => Some(n.to_string()),
            _ => None,
        }
    }
}

/// Response for an accepted command.
#[derive(Debug, Clone, Serialize)]
pub struct CommandResponse {
    pub device_uuid: String,
    pub topic: String,
}

impl From<DispatchResult> for CommandResponse {
    fn from(result: DispatchResult) -> Self {
        Self {
            device_uuid: result.uuid.to_string(),
            topic: result.topic,
        }
    }
}
