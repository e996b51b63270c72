//! In-memory message bus for testing.
//!
//! Delivers synchronously: `deliver` awaits every matching handler before
//! returning, so tests can assert right after it. Publishes are captured for
//! assertions instead of going anywhere.
//!
//! # Panics
//!
//! Test helpers use `.expect()` on lock operations. Do not use in production.

use async_trait::async_trait;
use std::sync::{Arc, Mutex};

use crate::domain::connection::{
    ConnectionLifecycle, ConnectionStatus, NoopListener, ReconnectPolicy,
};
use crate::ports::{BusError, BusMessage, HandlerError, MessageBus, MessageHandler, QoS};

use crate::adapters::mqtt::SubscriptionTable;

/// A message captured by [`InMemoryMessageBus::publish`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PublishedMessage {
    pub topic: String,
    pub qos: QoS,
    pub retain: bool,
    pub payload: Vec<u8>,
}

impl PublishedMessage {
    pub fn payload_str(&self) -> std::borrow::Cow<'_, str> {
        String::from_utf8_lossy(&self.payload)
    }
}

pub struct InMemoryMessageBus {
    lifecycle: Mutex<ConnectionLifecycle>,
    subscriptions: SubscriptionTable,
    published: Mutex<Vec<PublishedMessage>>,
    replayed: Mutex<Vec<(String, QoS)>>,
}

impl InMemoryMessageBus {
    /// Creates a bus that is already connected.
    pub fn new() -> Self {
        let mut lifecycle = ConnectionLifecycle::new(ReconnectPolicy::default(), Arc::new(NoopListener));
        lifecycle
            .begin_connect()
            .and_then(|_| lifecycle.connected())
            .expect("InMemoryMessageBus: fresh lifecycle must connect");

        Self {
            lifecycle: Mutex::new(lifecycle),
            subscriptions: SubscriptionTable::new(),
            published: Mutex::new(Vec::new()),
            replayed: Mutex::new(Vec::new()),
        }
    }

    // === Test Helpers ===

    /// Delivers one message to every matching handler and returns their
    /// results in registration order.
    pub async fn deliver(
        &self,
        topic: &str,
        payload: impl Into<Vec<u8>>,
    ) -> Vec<Result<(), HandlerError>> {
        let message = BusMessage::new(topic, payload);
        let mut results = Vec::new();
        for handler in self.subscriptions.handlers_for(topic) {
            results.push(handler.handle(message.clone()).await);
        }
        results
    }

    /// Simulates a transport failure on a live connection.
    pub fn drop_connection(&self) {
        self.lifecycle
            .lock()
            .expect("InMemoryMessageBus: lifecycle lock poisoned")
            .connection_failed("simulated transport failure")
            .expect("InMemoryMessageBus: connection must be up to drop");
    }

    /// Simulates a successful reconnect, replaying every subscription.
    pub fn restore_connection(&self) {
        self.lifecycle
            .lock()
            .expect("InMemoryMessageBus: lifecycle lock poisoned")
            .connected()
            .expect("InMemoryMessageBus: connection must be reconnecting");
        self.replayed
            .lock()
            .expect("InMemoryMessageBus: replayed lock poisoned")
            .extend(self.subscriptions.filters());
    }

    /// Filters replayed by `restore_connection`, in replay order.
    pub fn replayed_filters(&self) -> Vec<(String, QoS)> {
        self.replayed
            .lock()
            .expect("InMemoryMessageBus: replayed lock poisoned")
            .clone()
    }

    pub fn published(&self) -> Vec<PublishedMessage> {
        self.published
            .lock()
            .expect("InMemoryMessageBus: published lock poisoned")
            .clone()
    }

    pub fn subscribed_filters(&self) -> Vec<(String, QoS)> {
        self.subscriptions.filters()
    }
}

impl Default for InMemoryMessageBus {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl MessageBus for InMemoryMessageBus {
    async fn publish(
        &self,
        topic: &str,
        qos: QoS,
        retain: bool,
        payload: Vec<u8>,
    ) -> Result<(), BusError> {
        let state = self.status().state;
        if !state.accepts_publishes() {
            return Err(BusError::NotConnected { state });
        }

        self.published
            .lock()
            .expect("InMemoryMessageBus: published lock poisoned")
            .push(PublishedMessage {
                topic: topic.to_string(),
                qos,
                retain,
                payload,
            });
        Ok(())
    }

    async fn subscribe(
        &self,
        filter: &str,
        qos: QoS,
        handler: Arc<dyn MessageHandler>,
    ) -> Result<(), BusError> {
        self.subscriptions.insert(filter, qos, handler);
        Ok(())
    }

    fn status(&self) -> ConnectionStatus {
        self.lifecycle
            .lock()
            .expect("InMemoryMessageBus: lifecycle lock poisoned")
            .status()
    }
}
