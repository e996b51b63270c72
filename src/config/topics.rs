//! Bus topic layout

use serde::Deserialize;

use crate::domain::device::{device_topic, TopicTemplate};

use super::error::ValidationError;

/// Namespaces devices publish under and templates for server-to-device topics.
///
/// Templates take `{uuid}` and `{action}` placeholders; a template without
/// `{uuid}` gets the UUID appended as its last level.
#[derive(Debug, Clone, Deserialize)]
pub struct TopicsConfig {
    /// Device state pushes: `<state_namespace>/<uuid>/state`
    #[serde(default = "default_state_namespace")]
    pub state_namespace: String,

    /// Sensor value pushes: `<provide_value_namespace>/<uuid>`
    #[serde(default = "default_provide_value_namespace")]
    pub provide_value_namespace: String,

    /// Device logins: `<login_request_namespace>/<uuid>`
    #[serde(default = "default_login_request_namespace")]
    pub login_request_namespace: String,

    /// Login acknowledgements: `<login_response_namespace>/<uuid>`
    #[serde(default = "default_login_response_namespace")]
    pub login_response_namespace: String,

    #[serde(default = "default_command_template")]
    pub command_template: String,

    #[serde(default = "default_toggle_template")]
    pub toggle_template: String,

    #[serde(default = "default_number_input_template")]
    pub number_input_template: String,
}

impl TopicsConfig {
    pub fn state_filter(&self) -> String {
        device_topic(&self.state_namespace, "+", Some("state"))
    }

    pub fn provide_value_filter(&self) -> String {
        device_topic(&self.provide_value_namespace, "+", None)
    }

    pub fn login_request_filter(&self) -> String {
        device_topic(&self.login_request_namespace, "+", None)
    }

    pub fn command_template(&self) -> Result<TopicTemplate, ValidationError> {
        template("command_template", &self.command_template)
    }

    pub fn toggle_template(&self) -> Result<TopicTemplate, ValidationError> {
        template("toggle_template", &self.toggle_template)
    }

    pub fn number_input_template(&self) -> Result<TopicTemplate, ValidationError> {
        template("number_input_template", &self.number_input_template)
    }

    /// Validate topic layout
    pub fn validate(&self) -> Result<(), ValidationError> {
        namespace("state_namespace", &self.state_namespace)?;
        namespace("provide_value_namespace", &self.provide_value_namespace)?;
        namespace("login_request_namespace", &self.login_request_namespace)?;
        namespace("login_response_namespace", &self.login_response_namespace)?;
        self.command_template()?;
        self.toggle_template()?;
        self.number_input_template()?;
        Ok(())
    }
}

fn namespace(name: &'static str, value: &str) -> Result<(), ValidationError> {
    if value.trim_matches('/').is_empty() {
        return Err(ValidationError::InvalidTopic {
            name,
            reason: "namespace cannot be empty".to_string(),
        });
    }
    if value.contains(|c: char| matches!(c, '+' | '#')) {
        return Err(ValidationError::InvalidTopic {
            name,
            reason: "namespace cannot contain wildcards".to_string(),
        });
    }
    Ok(())
}

fn template(name: &'static str, value: &str) -> Result<TopicTemplate, ValidationError> {
    TopicTemplate::new(value).map_err(|e| ValidationError::InvalidTopic {
        name,
        reason: e.to_string(),
    })
}

impl Default for TopicsConfig {
    fn default() -> Self {
        Self {
            state_namespace: default_state_namespace(),
            provide_value_namespace: default_provide_value_namespace(),
            login_request_namespace: default_login_request_namespace(),
            login_response_namespace: default_login_response_namespace(),
            command_template: default_command_template(),
            toggle_template: default_toggle_template(),
            number_input_template: default_number_input_template(),
        }
    }
}

fn default_state_namespace() -> String {
    "state".to_string()
}

fn default_provide_value_namespace() -> String {
    "provide_value".to_string()
}

fn default_login_request_namespace() -> String {
    "login/request".to_string()
}

fn default_login_response_namespace() -> String {
    "login/response".to_string()
}

fn default_command_template() -> String {
    "cmd/{uuid}".to_string()
}

fn default_toggle_template() -> String {
    "toggle/{uuid}".to_string()
}

fn default_number_input_template() -> String {
    "number_input/{uuid}/{action}".to_string()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::foundation::DeviceUuid;

    #[test]
    fn default_filters_match_device_firmware() {
        let topics = TopicsConfig::default();
        assert_eq!(topics.state_filter(), "state/+/state");
        assert_eq!(topics.provide_value_filter(), "provide_value/+");
        assert_eq!(topics.login_request_filter(), "login/request/+");
        assert!(topics.validate().is_ok());
    }

    #[test]
    fn default_templates_render_expected_topics() {
        let topics = TopicsConfig::default();
        let uuid = DeviceUuid::new("abc-123").unwrap();

        assert_eq!(topics.command_template().unwrap().render(&uuid, "toggle"), "cmd/abc-123");
        assert_eq!(topics.toggle_template().unwrap().render(&uuid, "light"), "toggle/abc-123");
        assert_eq!(
            topics.number_input_template().unwrap().render(&uuid, "brightness"),
            "number_input/abc-123/brightness"
        );
    }

    #[test]
    fn wildcard_namespace_is_rejected() {
        let topics = TopicsConfig {
            state_namespace: "state/#".to_string(),
            ..Default::default()
        };
        assert!(matches!(
            topics.validate(),
            Err(ValidationError::InvalidTopic { name: "state_namespace", .. })
        ));
    }

    #[test]
    fn blank_template_is_rejected() {
        let topics = TopicsConfig {
            command_template: "/".to_string(),
            ..Default::default()
        };
        assert!(matches!(
            topics.validate(),
            Err(ValidationError::InvalidTopic { name: "command_template", .. })
        ));
    }
}
