//! Message normalization: raw bus message → validated [`StatePush`].
//!
//! Topic shape is `<namespace>/<deviceUUID>/...`; the UUID is always the
//! first level after the namespace. The payload is a JSON object carrying an
//! `action_name` and a field named after that action holding the new state:
//!
//! ```text
//! topic:   state/abc-123/state
//! payload: {"action_name":"temp","temp":"21.5"}
//! ```
//!
//! Every failure is a [`NormalizeError`]. Callers log and drop the message;
//! a bad message never stops ingestion.

use serde_json::{Map, Value};
use thiserror::Error;

use crate::domain::foundation::DeviceUuid;

use super::state_event::StatePush;

/// Canonical payload key naming the action.
pub const ACTION_NAME_KEY: &str = "action_name";

/// Key used by older firmware.
const LEGACY_ACTION_NAME_KEY: &str = "Action_name";

/// Why a bus message could not be turned into a state push.
#[derive(Debug, Error)]
pub enum NormalizeError {
    #[error("topic '{topic}' is not under namespace '{namespace}'")]
    NamespaceMismatch { topic: String, namespace: String },

    #[error("topic '{topic}' has no device segment")]
    MissingDeviceSegment { topic: String },

    #[error("topic '{topic}' has an invalid device segment: {reason}")]
    InvalidDeviceSegment { topic: String, reason: String },

    #[error("payload is not valid JSON: {0}")]
    MalformedJson(#[from] serde_json::Error),

    #[error("payload must be a JSON object")]
    NotAnObject,

    #[error("payload has no '{ACTION_NAME_KEY}' field")]
    MissingActionName,

    #[error("'{ACTION_NAME_KEY}' must be a non-empty string")]
    InvalidActionName,

    #[error("payload has no state field for action '{action_name}'")]
    MissingState { action_name: String },

    #[error("state for action '{action_name}' is null")]
    NullState { action_name: String },
}

/// Parses messages published under one topic namespace.
#[derive(Debug, Clone)]
pub struct MessageNormalizer {
    namespace: String,
}

impl MessageNormalizer {
    /// `namespace` may span several levels (`login/request`). Surrounding
    /// slashes are ignored.
    pub fn new(namespace: impl AsRef<str>) -> Self {
        Self {
            namespace: namespace.as_ref().trim_matches('/').to_string(),
        }
    }

    pub fn namespace(&self) -> &str {
        &self.namespace
    }

    /// Normalizes one raw message into a state push.
    pub fn normalize(&self, topic: &str, payload: &[u8]) -> Result<StatePush, NormalizeError> {
        let uuid = self.device_uuid(topic)?;
        let (action_name, state) = parse_state_payload(payload)?;

        Ok(StatePush {
            uuid,
            action_name,
            state,
        })
    }

    /// Extracts the device UUID level that follows the namespace.
    pub fn device_uuid(&self, topic: &str) -> Result<DeviceUuid, NormalizeError> {
        let rest = topic
            .strip_prefix(self.namespace.as_str())
            .and_then(|rest| rest.strip_prefix('/'))
            .ok_or_else(|| NormalizeError::NamespaceMismatch {
                topic: topic.to_string(),
                namespace: self.namespace.clone(),
            })?;

        let segment = rest.split('/').next().unwrap_or_default();
        if segment.is_empty() {
            return Err(NormalizeError::MissingDeviceSegment {
                topic: topic.to_string(),
            });
        }

        DeviceUuid::new(segment).map_err(|e| NormalizeError::InvalidDeviceSegment {
            topic: topic.to_string(),
            reason: e.to_string(),
        })
    }
}

fn parse_state_payload(payload: &[u8]) -> Result<(String, String), NormalizeError> {
    let value: Value = serde_json::from_slice(payload)?;
    let Value::Object(fields) = value else {
        return Err(NormalizeError::NotAnObject);
    };

    let action_name = action_name(&fields)?;
    let state = match fields.get(action_name) {
        None => {
            return Err(NormalizeError::MissingState {
                action_name: action_name.to_string(),
            })
        }
        Some(Value::Null) => {
            return Err(NormalizeError::NullState {
                action_name: action_name.to_string(),
            })
        }
        Some(Value::String(state)) => state.clone(),
        // Numbers, booleans and structured values travel as their JSON text.
        Some(other) => other.to_string(),
    };

    Ok((action_name.to_string(), state))
}

fn action_name(fields: &Map<String, Value>) -> Result<&str, NormalizeError> {
    let raw = fields
        .get(ACTION_NAME_KEY)
        .or_else(|| fields.get(LEGACY_ACTION_NAME_KEY))
        .ok_or(NormalizeError::MissingActionName)?;

    match raw.as_str() {
        Some(name) if !name.is_empty() => Ok(name),
        _ => Err(NormalizeError::InvalidActionName),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn state_normalizer() -> MessageNormalizer {
        MessageNormalizer::new("state")
    }

    #[test]
    fn normalizes_well_formed_state_push() {
        let push = state_normalizer()
            .normalize(
                "state/abc-123/state",
                br#"{"action_name":"temp","temp":"21.5"}"#,
            )
            .unwrap();

        assert_eq!(push.uuid.as_str(), "abc-123");
        assert_eq!(push.action_name, "temp");
        assert_eq!(push.state, "21.5");
    }

    #[test]
    fn accepts_topic_without_trailing_levels() {
        let normalizer = MessageNormalizer::new("provide_value/");
        let push = normalizer
            .normalize("provide_value/soil-1", br#"{"action_name":"moisture","moisture":"40"}"#)
            .unwrap();
        assert_eq!(push.uuid.as_str(), "soil-1");
    }

    #[test]
    fn accepts_legacy_action_name_key() {
        let push = state_normalizer()
            .normalize("state/abc/state", br#"{"Action_name":"light","light":"on"}"#)
            .unwrap();
        assert_eq!(push.action_name, "light");
        assert_eq!(push.state, "on");
    }

    #[test]
    fn non_string_state_is_kept_as_json_text() {
        let push = state_normalizer()
            .normalize("state/abc/state", br#"{"action_name":"temp","temp":21.5}"#)
            .unwrap();
        assert_eq!(push.state, "21.5");

        let push = state_normalizer()
            .normalize(
                "state/abc/state",
                br#"{"action_name":"rgb","rgb":{"r":1,"g":2,"b":3}}"#,
            )
            .unwrap();
        assert_eq!(push.state, r#"{"b":3,"g":2,"r":1}"#);
    }

    #[test]
    fn rejects_topic_outside_namespace() {
        let err = state_normalizer()
            .normalize("other/abc/state", br#"{"action_name":"a","a":"1"}"#)
            .unwrap_err();
        assert!(matches!(err, NormalizeError::NamespaceMismatch { .. }));

        let err = state_normalizer()
            .normalize("statefoo/abc", br#"{"action_name":"a","a":"1"}"#)
            .unwrap_err();
        assert!(matches!(err, NormalizeError::NamespaceMismatch { .. }));
    }

    #[test]
    fn rejects_topic_without_device_segment() {
        let err = state_normalizer()
            .normalize("state//state", br#"{"action_name":"a","a":"1"}"#)
            .unwrap_err();
        assert!(matches!(err, NormalizeError::MissingDeviceSegment { .. }));
    }

    #[test]
    fn rejects_wildcard_device_segment() {
        let err = state_normalizer().device_uuid("state/+/state").unwrap_err();
        assert!(matches!(err, NormalizeError::InvalidDeviceSegment { .. }));
    }

    #[test]
    fn rejects_malformed_json() {
        let err = state_normalizer()
            .normalize("state/abc/state", b"{not json")
            .unwrap_err();
        assert!(matches!(err, NormalizeError::MalformedJson(_)));
    }

    #[test]
    fn rejects_non_object_payload() {
        let err = state_normalizer()
            .normalize("state/abc/state", br#"["temp","21.5"]"#)
            .unwrap_err();
        assert!(matches!(err, NormalizeError::NotAnObject));
    }

    #[test]
    fn rejects_missing_action_name() {
        let err = state_normalizer()
            .normalize("state/abc/state", br#"{"temp":"21.5"}"#)
            .unwrap_err();
        assert!(matches!(err, NormalizeError::MissingActionName));
    }

    #[test]
    fn rejects_empty_or_non_string_action_name() {
        let err = state_normalizer()
            .normalize("state/abc/state", br#"{"action_name":""}"#)
            .unwrap_err();
        assert!(matches!(err, NormalizeError::InvalidActionName));

        let err = state_normalizer()
            .normalize("state/abc/state", br#"{"action_name":5}"#)
            .unwrap_err();
        assert!(matches!(err, NormalizeError::InvalidActionName));
    }

    #[test]
    fn rejects_missing_or_null_state_field() {
        let err = state_normalizer()
            .normalize("state/abc/state", br#"{"action_name":"temp","humidity":"40"}"#)
            .unwrap_err();
        assert!(matches!(err, NormalizeError::MissingState { ref action_name } if action_name == "temp"));

        let err = state_normalizer()
            .normalize("state/abc/state", br#"{"action_name":"temp","temp":null}"#)
            .unwrap_err();
        assert!(matches!(err, NormalizeError::NullState { .. }));
    }
}
