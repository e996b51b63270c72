//! CommandDispatcher - Dashboard command → device topic publish.
//!
//! Resolves the device's bus UUID, renders the topic from the configured
//! template and publishes fire-and-forget (QoS 0, not retained). Nothing is
//! queued or retried: a publish while the broker is down fails straight back
//! to the caller.

use std::sync::Arc;
use thiserror::Error;

use crate::domain::device::TopicTemplate;
use crate::domain::foundation::{DeviceId, DeviceUuid};
use crate::ports::{BusError, MessageBus, QoS, StateStore, StoreError};

/// Why a command did not reach the bus.
#[derive(Debug, Error)]
pub enum DispatchError {
    #[error("unknown device {0}")]
    UnknownDevice(DeviceId),

    #[error("state store failure: {0}")]
    Store(#[from] StoreError),

    #[error(transparent)]
    Publish(#[from] BusError),

    #[error("invalid action name '{0}'")]
    InvalidAction(String),
}

/// Outbound topic templates for each command variant.
#[derive(Debug, Clone)]
pub struct CommandTopics {
    pub command: TopicTemplate,
    pub toggle: TopicTemplate,
    pub number_input: TopicTemplate,
}

/// Result of a dispatched command.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DispatchResult {
    pub topic: String,
    pub uuid: DeviceUuid,
}

/// Publishes dashboard commands to devices.
pub struct CommandDispatcher {
    store: Arc<dyn StateStore>,
    bus: Arc<dyn MessageBus>,
    topics: CommandTopics,
}

impl CommandDispatcher {
    pub fn new(store: Arc<dyn StateStore>, bus: Arc<dyn MessageBus>, topics: CommandTopics) -> Self {
        Self { store, bus, topics }
    }

    /// Generic command: publishes `value` on the command topic.
    pub async fn dispatch(
        &self,
        device_id: DeviceId,
        action_name: &str,
        value: &str,
    ) -> Result<DispatchResult, DispatchError> {
        self.send(&self.topics.command, device_id, action_name, value)
            .await
    }

    /// Toggle: the payload is the action being flipped.
    pub async fn toggle(
        &self,
        device_id: DeviceId,
        action_name: &str,
    ) -> Result<DispatchResult, DispatchError> {
        self.send(&self.topics.toggle, device_id, action_name, action_name)
            .await
    }

    pub async fn number_input(
        &self,
        device_id: DeviceId,
        action_name: &str,
        value: &str,
    ) -> Result<DispatchResult, DispatchError> {
        self.send(&self.topics.number_input, device_id, action_name, value)
            .await
    }

    async fn send(
        &self,
        template: &TopicTemplate,
        device_id: DeviceId,
        action_name: &str,
        payload: &str,
    ) -> Result<DispatchResult, DispatchError> {
        validate_action_name(action_name)?;

        let uuid = match self.store.resolve_uuid(device_id).await {
            Ok(uuid) => uuid,
            Err(e) if e.is_not_found() => return Err(DispatchError::UnknownDevice(device_id)),
            Err(e) => return Err(e.into()),
        };

        let topic = template.render(&uuid, action_name);
        if let Err(e) = self
            .bus
            .publish(&topic, QoS::AtMostOnce, false, payload.as_bytes().to_vec())
            .await
        {
            tracing::warn!(
                device_id = %device_id,
                topic = %topic,
                error = %e,
                "Command publish failed"
            );
            return Err(e.into());
        }

        tracing::debug!(device_id = %device_id, topic = %topic, "Command published");
        Ok(DispatchResult { topic, uuid })
    }
}

fn validate_action_name(action_name: &str) -> Result<(), DispatchError> {
    if action_name.is_empty() || action_name.contains(|c: char| matches!(c, '/' | '+' | '#')) {
        return Err(DispatchError::InvalidAction(action_name.to_string()));
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::adapters::memory::{InMemoryDeviceStore, InMemoryMessageBus};

    fn topics() -> CommandTopics {
        CommandTopics {
            command: TopicTemplate::new("cmd/").unwrap(),
            toggle: TopicTemplate::new("toggle/{uuid}").unwrap(),
            number_input: TopicTemplate::new("number_input/{uuid}/{action}").unwrap(),
        }
    }

    async fn setup() -> (CommandDispatcher, Arc<InMemoryMessageBus>) {
        let store = InMemoryDeviceStore::new();
        store
            .insert_device(DeviceId::new(7), DeviceUuid::new("abc-123").unwrap())
            .await;
        let bus = Arc::new(InMemoryMessageBus::new());
        let dispatcher = CommandDispatcher::new(Arc::new(store), bus.clone(), topics());
        (dispatcher, bus)
    }

    #[tokio::test]
    async fn dispatch_publishes_value_on_command_topic() {
        let (dispatcher, bus) = setup().await;

        let result = dispatcher.dispatch(DeviceId::new(7), "toggle", "on").await.unwrap();

        assert_eq!(result.topic, "cmd/abc-123");
        let published = bus.published();
        assert_eq!(published.len(), 1);
        assert_eq!(published[0].topic, "cmd/abc-123");
        assert_eq!(published[0].payload_str(), "on");
        assert_eq!(published[0].qos, QoS::AtMostOnce);
        assert!(!published[0].retain);
    }

    #[tokio::test]
    async fn toggle_sends_action_name_as_payload() {
        let (dispatcher, bus) = setup().await;

        dispatcher.toggle(DeviceId::new(7), "light").await.unwrap();

        let published = bus.published();
        assert_eq!(published[0].topic, "toggle/abc-123");
        assert_eq!(published[0].payload_str(), "light");
    }

    #[tokio::test]
    async fn number_input_renders_action_level() {
        let (dispatcher, bus) = setup().await;

        dispatcher
            .number_input(DeviceId::new(7), "brightness", "80")
            .await
            .unwrap();

        let published = bus.published();
        assert_eq!(published[0].topic, "number_input/abc-123/brightness");
        assert_eq!(published[0].payload_str(), "80");
    }

    #[tokio::test]
    async fn unknown_device_is_reported() {
        let (dispatcher, bus) = setup().await;

        let err = dispatcher.dispatch(DeviceId::new(99), "toggle", "on").await.unwrap_err();

        assert!(matches!(err, DispatchError::UnknownDevice(id) if id.value() == 99));
        assert!(bus.published().is_empty());
    }

    #[tokio::test]
    async fn publish_while_disconnected_fails_fast() {
        let (dispatcher, bus) = setup().await;
        bus.drop_connection();

        let err = dispatcher.dispatch(DeviceId::new(7), "toggle", "on").await.unwrap_err();

        match err {
            DispatchError::Publish(bus_err) => {
                assert!(matches!(bus_err, BusError::NotConnected { .. }));
                assert!(bus_err.is_retryable());
            }
            other => panic!("expected publish error, got {other:?}"),
        }
        assert!(bus.published().is_empty());
    }

    #[tokio::test]
    async fn rejects_action_names_that_break_topics() {
        let (dispatcher, _) = setup().await;

        for bad in ["", "a/b", "+", "#"] {
            let err = dispatcher.number_input(DeviceId::new(7), bad, "1").await.unwrap_err();
            assert!(matches!(err, DispatchError::InvalidAction(_)));
        }
    }
}
