//! DeviceLoginHandler - Registers devices announcing themselves on the bus.
//!
//! A device publishes its registration record on `login/request/<uuid>`.
//! The handler inserts it (or refreshes `last_login` for a known UUID) and
//! acknowledges with `y` on `login/response/<uuid>`.

use async_trait::async_trait;
use std::sync::Arc;
use thiserror::Error;

use crate::domain::device::{device_topic, DeviceRegistration, MessageNormalizer, NormalizeError};
use crate::domain::foundation::{DeviceId, DeviceUuid};
use crate::ports::{BusError, BusMessage, DeviceRegistry, HandlerError, MessageBus, MessageHandler, QoS, StoreError};

/// Acknowledgement payload devices wait for after logging in.
pub const LOGIN_ACK: &[u8] = b"y";

#[derive(Debug, Error)]
pub enum LoginError {
    #[error("malformed login payload: {0}")]
    Malformed(#[from] serde_json::Error),

    #[error(transparent)]
    Topic(#[from] NormalizeError),

    #[error("login topic names '{topic_uuid}' but payload names '{payload_uuid}'")]
    UuidMismatch {
        topic_uuid: DeviceUuid,
        payload_uuid: DeviceUuid,
    },

    #[error("device registration failed: {0}")]
    Registry(#[from] StoreError),

    #[error("login acknowledgement failed: {0}")]
    Acknowledge(#[from] BusError),
}

impl From<LoginError> for HandlerError {
    fn from(err: LoginError) -> Self {
        match err {
            LoginError::Malformed(_) | LoginError::Topic(_) | LoginError::UuidMismatch { .. } => {
                HandlerError::Rejected(err.to_string())
            }
            LoginError::Registry(_) | LoginError::Acknowledge(_) => HandlerError::Failed(err.to_string()),
        }
    }
}

pub struct DeviceLoginHandler {
    registry: Arc<dyn DeviceRegistry>,
    bus: Arc<dyn MessageBus>,
    request_topics: MessageNormalizer,
    response_namespace: String,
}

impl DeviceLoginHandler {
    pub fn new(
        registry: Arc<dyn DeviceRegistry>,
        bus: Arc<dyn MessageBus>,
        request_namespace: &str,
        response_namespace: impl Into<String>,
    ) -> Self {
        Self {
            registry,
            bus,
            request_topics: MessageNormalizer::new(request_namespace),
            response_namespace: response_namespace.into(),
        }
    }

    /// Registers the device in `payload` and acknowledges the login.
    pub async fn login(&self, topic: &str, payload: &[u8]) -> Result<DeviceId, LoginError> {
        let topic_uuid = self.request_topics.device_uuid(topic)?;
        let registration: DeviceRegistration = serde_json::from_slice(payload)?;
        if registration.uuid != topic_uuid {
            return Err(LoginError::UuidMismatch {
                topic_uuid,
                payload_uuid: registration.uuid,
            });
        }

        let device_id = self.registry.register(&registration).await?;
        tracing::info!(
            device_id = %device_id,
            uuid = %registration.uuid,
            device_type = %registration.device_type,
            "Device logged in"
        );

        let response = device_topic(&self.response_namespace, registration.uuid.as_str(), None);
        self.bus
            .publish(&response, QoS::AtMostOnce, false, LOGIN_ACK.to_vec())
            .await?;

        Ok(device_id)
    }
}

#[async_trait]
impl MessageHandler for DeviceLoginHandler {
    async fn handle(&self, message: BusMessage) -> Result<(), HandlerError> {
        self.login(&message.topic, &message.payload).await?;
        Ok(())
    }

    fn name(&self) -> &'static str {
        "DeviceLoginHandler"
    }
}
