//! Configuration error types

use thiserror::Error;

/// Errors that can occur during configuration loading
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("Configuration loading failed: {0}")]
    LoadError(#[from] config::ConfigError),

    #[error("Validation failed: {0}")]
    ValidationFailed(#[from] ValidationError),
}

/// Errors that can occur during configuration validation
#[derive(Debug, Error)]
pub enum ValidationError {
    #[error("Required configuration missing: {0}")]
    MissingRequired(&'static str),

    #[error("Invalid port number")]
    InvalidPort,

    #[error("Invalid bind address: {0}")]
    InvalidBindAddress(String),

    #[error("Invalid request timeout")]
    InvalidTimeout,

    #[error("Invalid database URL format")]
    InvalidDatabaseUrl,

    #[error("Pool min_connections exceeds max_connections")]
    InvalidPoolSize,

    #[error("Pool size exceeds maximum allowed (100)")]
    PoolSizeTooLarge,

    #[error("MQTT password set without a username")]
    PasswordWithoutUsername,

    #[error("MQTT keep-alive must be at least 5 seconds")]
    KeepAliveTooShort,

    #[error("MQTT request capacity must be positive")]
    InvalidRequestCapacity,

    #[error("Reconnect backoff must be positive and initial backoff must not exceed the ceiling")]
    InvalidBackoff,

    #[error("Invalid topic '{name}': {reason}")]
    InvalidTopic { name: &'static str, reason: String },

    #[error("Hub mailbox capacity must be between 1 and 4096")]
    InvalidMailboxCapacity,
}
