//! StateStore port - Durable latest-state storage for device actions.
//!
//! The store owns the UUID↔DeviceID mapping and one row per
//! `(device_id, action_name)` holding the last state that arrived.

use async_trait::async_trait;
use thiserror::Error;

use crate::domain::device::DeviceRegistration;
use crate::domain::foundation::{DeviceId, DeviceUuid};

/// Errors raised by storage adapters.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum StoreError {
    #[error("{0} not found")]
    NotFound(String),

    #[error("database error: {0}")]
    Database(String),
}

impl StoreError {
    pub fn device_uuid_not_found(uuid: &DeviceUuid) -> Self {
        StoreError::NotFound(format!("device with uuid '{}'", uuid))
    }

    pub fn device_id_not_found(id: DeviceId) -> Self {
        StoreError::NotFound(format!("device {}", id))
    }

    pub fn state_not_found(id: DeviceId, action_name: &str) -> Self {
        StoreError::NotFound(format!("state of action '{}' on device {}", action_name, id))
    }

    pub fn is_not_found(&self) -> bool {
        matches!(self, StoreError::NotFound(_))
    }
}

/// Port for reading and writing device state.
///
/// Implementations must be safe to call concurrently from many message
/// handlers at once.
#[async_trait]
pub trait StateStore: Send + Sync {
    /// Looks up the internal ID of a registered device.
    ///
    /// # Errors
    ///
    /// - `NotFound` if the UUID was never registered
    async fn resolve_device_id(&self, uuid: &DeviceUuid) -> Result<DeviceId, StoreError>;

    /// Reverse lookup used when dispatching commands.
    ///
    /// # Errors
    ///
    /// - `NotFound` if no device has this ID
    async fn resolve_uuid(&self, device_id: DeviceId) -> Result<DeviceUuid, StoreError>;

    /// Stores `state` as the latest value of `(device_id, action_name)`.
    ///
    /// Idempotent and last-write-wins by arrival order.
    async fn upsert_state(
        &self,
        device_id: DeviceId,
        action_name: &str,
        state: &str,
    ) -> Result<(), StoreError>;

    /// Returns the last stored state of `(device_id, action_name)`.
    ///
    /// # Errors
    ///
    /// - `NotFound` if nothing was ever stored for the pair
    async fn fetch_last_state(
        &self,
        device_id: DeviceId,
        action_name: &str,
    ) -> Result<String, StoreError>;
}

/// Port for registering devices that log in over the bus.
#[async_trait]
pub trait DeviceRegistry: Send + Sync {
    /// Inserts the device, or refreshes its last login if the UUID is known.
    ///
    /// The returned ID never changes for a given UUID.
    async fn register(&self, registration: &DeviceRegistration) -> Result<DeviceId, StoreError>;
}
