//! Broker connection configuration

use secrecy::SecretString;
use serde::Deserialize;
use std::time::Duration;

use crate::domain::connection::ReconnectPolicy;

use super::error::ValidationError;

/// MQTT broker connection settings
#[derive(Debug, Clone, Deserialize)]
pub struct MqttConfig {
    #[serde(default = "default_host")]
    pub host: String,

    #[serde(default = "default_port")]
    pub port: u16,

    /// Client identifier presented to the broker
    #[serde(default = "default_client_id")]
    pub client_id: String,

    pub username: Option<String>,

    pub password: Option<SecretString>,

    #[serde(default = "default_keep_alive")]
    pub keep_alive_secs: u64,

    /// Capacity of the client's outgoing request channel
    #[serde(default = "default_request_capacity")]
    pub request_capacity: usize,

    /// Delay before the first reconnect attempt, in milliseconds
    #[serde(default = "default_initial_backoff")]
    pub initial_backoff_ms: u64,

    /// Reconnect backoff ceiling, in seconds
    #[serde(default = "default_max_backoff")]
    pub max_backoff_secs: u64,

    /// Give up after this many failed reconnects; unset retries forever
    pub max_reconnect_attempts: Option<u32>,
}

impl MqttConfig {
    pub fn keep_alive(&self) -> Duration {
        Duration::from_secs(self.keep_alive_secs)
    }

    pub fn reconnect_policy(&self) -> ReconnectPolicy {
        ReconnectPolicy::new(
            Duration::from_millis(self.initial_backoff_ms),
            Duration::from_secs(self.max_backoff_secs),
            self.max_reconnect_attempts,
        )
    }

    /// Validate broker configuration
    pub fn validate(&self) -> Result<(), ValidationError> {
        if self.host.is_empty() {
            return Err(ValidationError::MissingRequired("DEVICE_DASHBOARD__MQTT__HOST"));
        }
        if self.port == 0 {
            return Err(ValidationError::InvalidPort);
        }
        if self.client_id.is_empty() {
            return Err(ValidationError::MissingRequired("DEVICE_DASHBOARD__MQTT__CLIENT_ID"));
        }
        if self.password.is_some() && self.username.is_none() {
            return Err(ValidationError::PasswordWithoutUsername);
        }
        if self.keep_alive_secs < 5 {
            return Err(ValidationError::KeepAliveTooShort);
        }
        if self.request_capacity == 0 {
            return Err(ValidationError::InvalidRequestCapacity);
        }
        if self.initial_backoff_ms == 0
            || self.max_backoff_secs == 0
            || Duration::from_millis(self.initial_backoff_ms) > Duration::from_secs(self.max_backoff_secs)
        {
            return Err(ValidationError::InvalidBackoff);
        }
        Ok(())
    }
}

impl Default for MqttConfig {
    fn default() -> Self {
        Self {
            host: default_host(),
            port: default_port(),
            client_id: default_client_id(),
            username: None,
            password: None,
            keep_alive_secs: default_keep_alive(),
            request_capacity: default_request_capacity(),
            initial_backoff_ms: default_initial_backoff(),
            max_backoff_secs: default_max_backoff(),
            max_reconnect_attempts: None,
        }
    }
}

fn default_host() -> String {
    "localhost".to_string()
}

fn default_port() -> u16 {
    1883
}

fn default_client_id() -> String {
    "device-dashboard".to_string()
}

fn default_keep_alive() -> u64 {
    30
}

fn default_request_capacity() -> usize {
    64
}

fn default_initial_backoff() -> u64 {
    500
}

fn default_max_backoff() -> u64 {
    10
}
