//! StateIngestor - Bus message → persisted and broadcast state event.
//!
//! ```text
//! bus message ─► normalize ─► resolve uuid ─┬─► store.upsert_state
//!                                           └─► broadcaster.broadcast
//! ```
//!
//! Persistence and broadcast run side by side and neither waits for the
//! other to succeed: dashboards stay live while the store is failing.

use async_trait::async_trait;
use std::sync::Arc;
use thiserror::Error;

use crate::domain::device::{MessageNormalizer, NormalizeError, StateEvent};
use crate::domain::foundation::DeviceUuid;
use crate::ports::{BusMessage, HandlerError, MessageHandler, StateBroadcaster, StateStore, StoreError};

/// Why a state message was not fully processed.
#[derive(Debug, Error)]
pub enum IngestError {
    #[error(transparent)]
    Normalize(#[from] NormalizeError),

    #[error("unknown device '{0}'")]
    UnknownDevice(DeviceUuid),

    /// Resolution failed, or the upsert failed after the broadcast went out.
    #[error("state store failure: {0}")]
    Store(#[from] StoreError),
}

impl From<IngestError> for HandlerError {
    fn from(err: IngestError) -> Self {
        match err {
            IngestError::Normalize(_) | IngestError::UnknownDevice(_) => {
                HandlerError::Rejected(err.to_string())
            }
            IngestError::Store(_) => HandlerError::Failed(err.to_string()),
        }
    }
}

/// Handles state pushes for one topic namespace.
pub struct StateIngestor {
    normalizer: MessageNormalizer,
    store: Arc<dyn StateStore>,
    broadcaster: Arc<dyn StateBroadcaster>,
}

impl StateIngestor {
    pub fn new(
        normalizer: MessageNormalizer,
        store: Arc<dyn StateStore>,
        broadcaster: Arc<dyn StateBroadcaster>,
    ) -> Self {
        Self {
            normalizer,
            store,
            broadcaster,
        }
    }

    /// Processes one raw message and returns the event it produced.
    pub async fn ingest(&self, topic: &str, payload: &[u8]) -> Result<StateEvent, IngestError> {
        let push = self.normalizer.normalize(topic, payload)?;

        let device_id = match self.store.resolve_device_id(&push.uuid).await {
            Ok(id) => id,
            Err(e) if e.is_not_found() => return Err(IngestError::UnknownDevice(push.uuid)),
            Err(e) => return Err(e.into()),
        };
        let event = push.into_event(device_id);

        let (persisted, report) = tokio::join!(
            self.store
                .upsert_state(event.device_id(), event.action_name(), event.state()),
            async { self.broadcaster.broadcast(&event) },
        );

        tracing::debug!(
            device_id = %event.device_id(),
            action_name = event.action_name(),
            delivered = report.delivered,
            dropped = report.dropped,
            "State event broadcast"
        );
        persisted?;

        Ok(event)
    }
}

#[async_trait]
impl MessageHandler for StateIngestor {
    async fn handle(&self, message: BusMessage) -> Result<(), HandlerError> {
        self.ingest(&message.topic, &message.payload).await?;
        Ok(())
    }

    fn name(&self) -> &'static str {
        "StateIngestor"
    }
}
