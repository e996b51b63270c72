//! One live dashboard session: a hub subscription raced against shutdown.

use std::sync::Arc;

use serde::Serialize;
use tokio::sync::watch;

use crate::adapters::hub::{BroadcastHub, Subscription};
use crate::domain::device::StateEvent;

/// Wire form of a state event on the dashboard stream.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct StreamMessage {
    #[serde(rename = "deviceID")]
    pub device_id: i32,
    #[serde(rename = "actionName")]
    pub action_name: String,
    pub state: String,
}

impl From<&StateEvent> for StreamMessage {
    fn from(event: &StateEvent) -> Self {
        Self {
            device_id: event.device_id().value(),
            action_name: event.action_name().to_string(),
            state: event.state().to_string(),
        }
    }
}

/// A registered dashboard session.
///
/// Owns its hub [`Subscription`], so dropping the session on any exit path
/// (client gone, shutdown, error) unregisters it.
#[derive(Debug)]
pub struct DashboardSession {
    subscription: Subscription,
    shutdown: watch::Receiver<bool>,
}

impl DashboardSession {
    pub fn open(hub: &Arc<BroadcastHub>, shutdown: watch::Receiver<bool>) -> Self {
        let subscription = hub.register();
        tracing::debug!(
            subscriber_id = %subscription.id(),
            subscribers = hub.subscriber_count(),
            "Dashboard session opened"
        );
        Self {
            subscription,
            shutdown,
        }
    }

    /// Waits for the next event. `None` once the server is shutting down or
    /// the hub has removed this subscriber.
    pub async fn next_event(&mut self) -> Option<StateEvent> {
        if *self.shutdown.borrow() {
            return None;
        }

        tokio::select! {
            event = self.subscription.recv() => event,
            _ = self.shutdown.changed() => None,
        }
    }
}

impl Drop for DashboardSession {
    fn drop(&mut self) {
        tracing::debug!(subscriber_id = %self.subscription.id(), "Dashboard session closed");
    }
}
