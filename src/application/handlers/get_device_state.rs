//! GetDeviceStateHandler - Query handler for the last known action state.

use std::sync::Arc;

use crate::domain::foundation::DeviceId;
use crate::ports::{StateStore, StoreError};

/// Query for the last state a device reported for one action.
#[derive(Debug, Clone)]
pub struct GetDeviceStateQuery {
    pub device_id: DeviceId,
    pub action_name: String,
}

pub struct GetDeviceStateHandler {
    store: Arc<dyn StateStore>,
}

impl GetDeviceStateHandler {
    pub fn new(store: Arc<dyn StateStore>) -> Self {
        Self { store }
    }

    /// Returns the stored state, or `NotFound` if none was ever pushed.
    pub async fn handle(&self, query: GetDeviceStateQuery) -> Result<String, StoreError> {
        self.store
            .fetch_last_state(query.device_id, &query.action_name)
            .await
    }
}
