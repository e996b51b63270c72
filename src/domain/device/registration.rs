//! Device registration records announced on login.

use serde::{Deserialize, Serialize};
use std::fmt;

use crate::domain::foundation::DeviceUuid;

/// Kind of hardware a device reports at login.
///
/// Selects the action template the registry attaches to the device. Types
/// the server has no template for are kept verbatim.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(from = "String", into = "String")]
pub enum DeviceType {
    OnOff,
    SingleMetricSensor,
    Other(String),
}

impl DeviceType {
    pub fn as_str(&self) -> &str {
        match self {
            DeviceType::OnOff => "on_off",
            DeviceType::SingleMetricSensor => "single_metric_sensor",
            DeviceType::Other(name) => name,
        }
    }
}

impl From<String> for DeviceType {
    fn from(value: String) -> Self {
        match value.as_str() {
            "on_off" => DeviceType::OnOff,
            "single_metric_sensor" => DeviceType::SingleMetricSensor,
            _ => DeviceType::Other(value),
        }
    }
}

impl From<DeviceType> for String {
    fn from(device_type: DeviceType) -> Self {
        device_type.as_str().to_string()
    }
}

impl fmt::Display for DeviceType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Registration record a device publishes on its login topic.
///
/// The registry owns the persisted form; the bridge only ever resolves
/// `DeviceId` by `uuid` afterwards.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DeviceRegistration {
    pub uuid: DeviceUuid,
    pub name: String,
    pub device_type: DeviceType,
    /// Device-specific actions on top of the type's template, as raw JSON.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub custom_actions: Option<serde_json::Value>,
}

impl DeviceRegistration {
    /// Custom actions as JSON text, the way the registry stores them.
    pub fn custom_actions_json(&self) -> Option<String> {
        self.custom_actions
            .as_ref()
            .filter(|v| !v.is_null())
            .map(|v| v.to_string())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn deserializes_login_payload_from_firmware() {
        let payload = r#"{"uuid":"esp32-light","name":"Kitchen light","device_type":"on_off"}"#;

        let registration: DeviceRegistration = serde_json::from_str(payload).unwrap();

        assert_eq!(registration.uuid.as_str(), "esp32-light");
        assert_eq!(registration.name, "Kitchen light");
        assert_eq!(registration.device_type, DeviceType::OnOff);
        assert!(registration.custom_actions_json().is_none());
    }

    #[test]
    fn unknown_device_types_are_preserved() {
        let registration: DeviceRegistration = serde_json::from_value(json!({
            "uuid": "x1",
            "name": "Thermostat",
            "device_type": "thermostat"
        }))
        .unwrap();

        assert_eq!(
            registration.device_type,
            DeviceType::Other("thermostat".to_string())
        );
        assert_eq!(registration.device_type.to_string(), "thermostat");
    }

    #[test]
    fn custom_actions_are_kept_as_json_text() {
        let registration: DeviceRegistration = serde_json::from_value(json!({
            "uuid": "soil-1",
            "name": "Soil",
            "device_type": "single_metric_sensor",
            "custom_actions": {"calibrate": "button"}
        }))
        .unwrap();

        assert_eq!(
            registration.custom_actions_json().as_deref(),
            Some(r#"{"calibrate":"button"}"#)
        );
    }

    #[test]
    fn rejects_login_with_invalid_uuid() {
        let result: Result<DeviceRegistration, _> = serde_json::from_value(json!({
            "uuid": "a/b",
            "name": "Broken",
            "device_type": "on_off"
        }));
        assert!(result.is_err());
    }
}
