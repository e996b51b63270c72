//! Application configuration module
//!
//! Type-safe configuration loaded from environment variables with the
//! `config` and `dotenvy` crates. Variables use the `DEVICE_DASHBOARD`
//! prefix and `__` between nested keys.
//!
//! # Example
//!
//! ```no_run
//! use device_dashboard::config::AppConfig;
//!
//! let config = AppConfig::load().expect("Failed to load configuration");
//! config.validate().expect("Invalid configuration");
//!
//! println!("Broker at {}:{}", config.mqtt.host, config.mqtt.port);
//! ```

mod database;
mod error;
mod hub;
mod mqtt;
mod server;
mod topics;

pub use database::DatabaseConfig;
pub use error::{ConfigError, ValidationError};
pub use hub::{HubConfig, OverflowPolicy};
pub use mqtt::MqttConfig;
pub use server::{Environment, ServerConfig};
pub use topics::TopicsConfig;

use serde::Deserialize;

/// Root application configuration
///
/// Load using [`AppConfig::load()`] which reads from environment variables.
#[derive(Debug, Clone, Deserialize)]
pub struct AppConfig {
    /// HTTP server (host, port, environment, log filter)
    #[serde(default)]
    pub server: ServerConfig,

    /// PostgreSQL connection
    pub database: DatabaseConfig,

    /// Broker connection and reconnect policy
    #[serde(default)]
    pub mqtt: MqttConfig,

    /// Topic namespaces and command templates
    #[serde(default)]
    pub topics: TopicsConfig,

    /// Dashboard fan-out
    #[serde(default)]
    pub hub: HubConfig,
}

impl AppConfig {
    /// Load configuration from environment variables
    ///
    /// Reads `.env` if present, then every `DEVICE_DASHBOARD__*` variable:
    ///
    /// - `DEVICE_DASHBOARD__MQTT__HOST=broker` -> `mqtt.host = "broker"`
    /// - `DEVICE_DASHBOARD__DATABASE__URL=...` -> `database.url = ...`
    ///
    /// # Errors
    ///
    /// Returns `ConfigError` if a required value is missing or a value
    /// cannot be parsed into its field type.
    pub fn load() -> Result<Self, ConfigError> {
        dotenvy::dotenv().ok();

        let config = config::Config::builder()
            .add_source(
                config::Environment::default()
                    .prefix("DEVICE_DASHBOARD")
                    .separator("__"),
            )
            .build()?
            .try_deserialize()?;

        Ok(config)
    }

    /// Validate all configuration values
    ///
    /// # Errors
    ///
    /// Returns the first `ValidationError` found.
    pub fn validate(&self) -> Result<(), ValidationError> {
        self.server.validate()?;
        self.database.validate()?;
        self.mqtt.validate()?;
        self.topics.validate()?;
        self.hub.validate()?;
        Ok(())
    }

    /// Check if running in production environment
    pub fn is_production(&self) -> bool {
        self.server.is_production()
    }
}
