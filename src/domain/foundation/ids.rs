//! Strongly-typed identifier value objects.

use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;
use uuid::Uuid;

use super::ValidationError;

/// Server-assigned internal identifier of a registered device.
///
/// Used by every persisted row. Never appears on the bus.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct DeviceId(i32);

impl DeviceId {
    /// Wraps a database-assigned identifier.
    pub fn new(id: i32) -> Self {
        Self(id)
    }

    /// Returns the raw integer value.
    pub fn value(&self) -> i32 {
        self.0
    }
}

impl From<i32> for DeviceId {
    fn from(id: i32) -> Self {
        Self(id)
    }
}

impl fmt::Display for DeviceId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl FromStr for DeviceId {
    type Err = ValidationError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        s.trim()
            .parse::<i32>()
            .map(Self)
            .map_err(|_| ValidationError::invalid_format("device_id", "expected an integer"))
    }
}

/// Device-chosen external identifier used in bus topics.
///
/// Devices pick this at first login; it is opaque to the server and is not
/// required to be an RFC 4122 UUID. It must be a single, non-empty topic
/// level, so MQTT separators and wildcards are rejected.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct DeviceUuid(String);

impl DeviceUuid {
    /// Validates and wraps a device UUID.
    pub fn new(value: impl Into<String>) -> Result<Self, ValidationError> {
        let value = value.into();
        if value.is_empty() {
            return Err(ValidationError::empty_field("uuid"));
        }
        if value.contains(|c: char| matches!(c, '/' | '+' | '#')) {
            return Err(ValidationError::invalid_format(
                "uuid",
                "must not contain '/', '+' or '#'",
            ));
        }
        Ok(Self(value))
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl TryFrom<String> for DeviceUuid {
    type Error = ValidationError;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        Self::new(value)
    }
}

impl From<DeviceUuid> for String {
    fn from(uuid: DeviceUuid) -> Self {
        uuid.0
    }
}

impl fmt::Display for DeviceUuid {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// Unique identifier for a live dashboard subscriber.
///
/// Generated server-side when a session registers with the hub.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct SubscriberId(Uuid);

impl SubscriberId {
    /// Create a new random subscriber ID.
    pub fn new() -> Self {
        Self(Uuid::new_v4())
    }
}

impl Default for SubscriberId {
    fn default() -> Self {
        Self::new()
    }
}

impl fmt::Display for SubscriberId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn device_id_parses_from_path_segment() {
        let id: DeviceId = "7".parse().unwrap();
        assert_eq!(id, DeviceId::new(7));
        assert_eq!(id.to_string(), "7");
    }

    #[test]
    fn device_id_rejects_non_numeric_input() {
        assert!("seven".parse::<DeviceId>().is_err());
        assert!("".parse::<DeviceId>().is_err());
    }

    #[test]
    fn device_uuid_accepts_opaque_identifiers() {
        let uuid = DeviceUuid::new("abc-123").unwrap();
        assert_eq!(uuid.as_str(), "abc-123");
    }

    #[test]
    fn device_uuid_rejects_empty_value() {
        assert!(matches!(
            DeviceUuid::new(""),
            Err(ValidationError::EmptyField { .. })
        ));
    }

    #[test]
    fn device_uuid_rejects_topic_separators_and_wildcards() {
        assert!(DeviceUuid::new("abc/123").is_err());
        assert!(DeviceUuid::new("abc+").is_err());
        assert!(DeviceUuid::new("#").is_err());
    }

    #[test]
    fn device_uuid_deserializes_through_validation() {
        let ok: Result<DeviceUuid, _> = serde_json::from_str(r#""esp32-01""#);
        assert!(ok.is_ok());

        let bad: Result<DeviceUuid, _> = serde_json::from_str(r#""a/b""#);
        assert!(bad.is_err());
    }

    #[test]
    fn subscriber_ids_are_unique() {
        assert_ne!(SubscriberId::new(), SubscriberId::new());
        assert_eq!(SubscriberId::new().to_string().len(), 36);
    }
}
