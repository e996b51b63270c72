//! Lifecycle listener that reports transitions through `tracing`.

use std::time::Duration;

use crate::domain::connection::ConnectionListener;

/// Logs every connection transition of one broker connection.
#[derive(Debug, Clone)]
pub struct LoggingListener {
    broker: String,
}

impl LoggingListener {
    pub fn new(host: &str, port: u16) -> Self {
        Self {
            broker: format!("{}:{}", host, port),
        }
    }
}

impl ConnectionListener for LoggingListener {
    fn on_connect(&self) {
        tracing::info!(broker = %self.broker, "Connected to message broker");
    }

    fn on_connection_lost(&self, reason: &str) {
        tracing::warn!(broker = %self.broker, reason, "Message broker connection lost");
    }

    fn on_reconnecting(&self, attempt: u32, delay: Duration) {
        tracing::info!(
            broker = %self.broker,
            attempt,
            delay_ms = delay.as_millis() as u64,
            "Reconnecting to message broker"
        );
    }

    fn on_disconnected(&self) {
        tracing::info!(broker = %self.broker, "Disconnected from message broker");
    }
}
