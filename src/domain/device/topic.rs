//! Topic templates and MQTT topic-filter matching.
//!
//! Device topics put the UUID in a fixed level; outbound command topics are
//! rendered from configured templates with `{uuid}` and `{action}`
//! placeholders.

use serde::Deserialize;
use std::fmt;

use crate::domain::foundation::{DeviceUuid, ValidationError};

const UUID_PLACEHOLDER: &str = "{uuid}";
const ACTION_PLACEHOLDER: &str = "{action}";

/// Outbound topic pattern, e.g. `number_input/{uuid}/{action}`.
///
/// A template without `{uuid}` is treated as a namespace and the UUID is
/// appended as its last level, so `cmd/` and `cmd` both render `cmd/<uuid>`.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(try_from = "String")]
pub struct TopicTemplate(String);

impl TopicTemplate {
    pub fn new(template: impl Into<String>) -> Result<Self, ValidationError> {
        let template = template.into();
        if template.trim_matches('/').is_empty() {
            return Err(ValidationError::empty_field("topic_template"));
        }
        if template.contains(|c: char| matches!(c, '+' | '#')) {
            return Err(ValidationError::invalid_format(
                "topic_template",
                "publish topics cannot contain wildcards",
            ));
        }
        Ok(Self(template))
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }

    /// Renders the concrete topic for one device and action.
    pub fn render(&self, uuid: &DeviceUuid, action: &str) -> String {
        let topic = self.0.replace(ACTION_PLACEHOLDER, action);
        if topic.contains(UUID_PLACEHOLDER) {
            topic.replace(UUID_PLACEHOLDER, uuid.as_str())
        } else if topic.ends_with('/') {
            format!("{}{}", topic, uuid)
        } else {
            format!("{}/{}", topic, uuid)
        }
    }
}

impl TryFrom<String> for TopicTemplate {
    type Error = ValidationError;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        Self::new(value)
    }
}

impl fmt::Display for TopicTemplate {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// Builds a device topic or filter under `namespace`: `<namespace>/<device>[/<suffix>]`.
pub fn device_topic(namespace: &str, device: &str, suffix: Option<&str>) -> String {
    let namespace = namespace.trim_end_matches('/');
    match suffix {
        Some(suffix) => format!("{}/{}/{}", namespace, device, suffix.trim_start_matches('/')),
        None => format!("{}/{}", namespace, device),
    }
}

/// MQTT topic-filter match with `+` (one level) and `#` (all remaining levels).
pub fn topic_matches(filter: &str, topic: &str) -> bool {
    let mut filter_levels = filter.split('/');
    let mut topic_levels = topic.split('/');

    loop {
        match (filter_levels.next(), topic_levels.next()) {
            (Some("#"), _) => return true,
            (Some("+"), Some(_)) => {}
            (Some(f), Some(t)) if f == t => {}
            (None, None) => return true,
            _ => return false,
        }
    }
}
