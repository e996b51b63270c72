//! Canonical device state events.

use crate::domain::foundation::{DeviceId, DeviceUuid};

/// A validated state push that still addresses its device by bus UUID.
///
/// Produced by the normalizer before the UUID has been resolved against the
/// device registry.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StatePush {
    pub uuid: DeviceUuid,
    pub action_name: String,
    pub state: String,
}

impl StatePush {
    /// Binds the push to the resolved internal device identifier.
    pub fn into_event(self, device_id: DeviceId) -> StateEvent {
        StateEvent {
            device_id,
            action_name: self.action_name,
            state: self.state,
        }
    }
}

/// "This device's named action now holds this state."
///
/// Immutable once built. The store consumes it once and every hub subscriber
/// receives its own copy.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct StateEvent {
    device_id: DeviceId,
    action_name: String,
    state: String,
}

impl StateEvent {
    pub fn new(device_id: DeviceId, action_name: impl Into<String>, state: impl Into<String>) -> Self {
        Self {
            device_id,
            action_name: action_name.into(),
            state: state.into(),
        }
    }

    pub fn device_id(&self) -> DeviceId {
        self.device_id
    }

    pub fn action_name(&self) -> &str {
        &self.action_name
    }

    /// Opaque state payload. May itself be JSON text.
    pub fn state(&self) -> &str {
        &self.state
    }
}
