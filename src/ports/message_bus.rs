//! MessageBus port - Publish/subscribe access to the device message bus.
//!
//! Handlers register interest in a topic filter and are invoked for every
//! matching message. The transport decides how many run concurrently; no
//! ordering is promised across topics.

use async_trait::async_trait;
use std::fmt;
use std::sync::Arc;
use thiserror::Error;

use crate::domain::connection::{ConnectionState, ConnectionStatus};

/// Delivery guarantee requested for a publish or subscription.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub enum QoS {
    #[default]
    AtMostOnce,
    AtLeastOnce,
    ExactlyOnce,
}

impl QoS {
    pub fn level(&self) -> u8 {
        match self {
            QoS::AtMostOnce => 0,
            QoS::AtLeastOnce => 1,
            QoS::ExactlyOnce => 2,
        }
    }
}

/// One message as delivered by the bus.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BusMessage {
    pub topic: String,
    pub payload: Vec<u8>,
}

impl BusMessage {
    pub fn new(topic: impl Into<String>, payload: impl Into<Vec<u8>>) -> Self {
        Self {
            topic: topic.into(),
            payload: payload.into(),
        }
    }

    /// Payload as text, lossily decoded.
    pub fn payload_str(&self) -> std::borrow::Cow<'_, str> {
        String::from_utf8_lossy(&self.payload)
    }
}

/// Errors from publishing or subscribing.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum BusError {
    /// The connection is not up. Retrying only helps while the bus is
    /// still reconnecting.
    #[error("message bus is not connected (state: {state})")]
    NotConnected { state: ConnectionState },

    #[error("message bus client error: {0}")]
    Client(String),

    #[error("message bus connection lost: {0}")]
    ConnectionLost(String),

    #[error("invalid topic '{topic}': {reason}")]
    InvalidTopic { topic: String, reason: String },
}

impl BusError {
    /// `Disconnected` is terminal: shutdown or an exhausted reconnect policy.
    pub fn is_retryable(&self) -> bool {
        match self {
            BusError::NotConnected { state } => *state != ConnectionState::Disconnected,
            BusError::ConnectionLost(_) => true,
            BusError::Client(_) | BusError::InvalidTopic { .. } => false,
        }
    }
}

/// Outcome a handler reports for one message.
///
/// The bus only logs it; a failing message never stops delivery of the next.
#[derive(Debug, Error)]
pub enum HandlerError {
    /// The message itself was unusable and has been dropped.
    #[error("message rejected: {0}")]
    Rejected(String),

    /// Processing failed for reasons outside the message.
    #[error("message processing failed: {0}")]
    Failed(String),
}

/// Handler for messages arriving on a subscribed filter.
#[async_trait]
pub trait MessageHandler: Send + Sync {
    /// Process one message.
    ///
    /// Duplicates are possible after a reconnect, so handling the same
    /// message twice must be harmless.
    async fn handle(&self, message: BusMessage) -> Result<(), HandlerError>;

    /// Handler name for logging.
    fn name(&self) -> &'static str;
}

/// Port for the broker connection.
#[async_trait]
pub trait MessageBus: Send + Sync {
    /// Publishes one message. Fails fast with `NotConnected` while the
    /// connection is down; nothing is queued.
    async fn publish(
        &self,
        topic: &str,
        qos: QoS,
        retain: bool,
        payload: Vec<u8>,
    ) -> Result<(), BusError>;

    /// Subscribes `handler` to `filter`. The subscription survives
    /// reconnects.
    async fn subscribe(
        &self,
        filter: &str,
        qos: QoS,
        handler: Arc<dyn MessageHandler>,
    ) -> Result<(), BusError>;

    /// Current lifecycle snapshot.
    fn status(&self) -> ConnectionStatus;
}

impl fmt::Display for QoS {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "QoS{}", self.level())
    }
}
