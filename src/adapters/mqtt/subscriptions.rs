//! Registry of topic-filter subscriptions and their handlers.

use std::sync::{Arc, PoisonError, RwLock};

use crate::domain::device::topic_matches;
use crate::ports::{BusMessage, HandlerError, MessageHandler, QoS};

struct Entry {
    filter: String,
    qos: QoS,
    handler: Arc<dyn MessageHandler>,
}

/// Every filter the process has subscribed to, in registration order.
///
/// Outlives individual broker sessions: the table is replayed on every
/// successful (re)connect.
#[derive(Default)]
pub struct SubscriptionTable {
    entries: RwLock<Vec<Entry>>,
}

impl SubscriptionTable {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn insert(&self, filter: &str, qos: QoS, handler: Arc<dyn MessageHandler>) {
        self.entries
            .write()
            .unwrap_or_else(PoisonError::into_inner)
            .push(Entry {
                filter: filter.to_string(),
                qos,
                handler,
            });
    }

    /// Removes the most recent entry registering `handler` on `filter`.
    pub fn remove(&self, filter: &str, handler: &Arc<dyn MessageHandler>) -> bool {
        let mut entries = self.entries.write().unwrap_or_else(PoisonError::into_inner);
        let position = entries
            .iter()
            .rposition(|entry| entry.filter == filter && Arc::ptr_eq(&entry.handler, handler));
        match position {
            Some(index) => {
                entries.remove(index);
                true
            }
            None => false,
        }
    }

    /// Distinct filters with the highest QoS requested for each.
    pub fn filters(&self) -> Vec<(String, QoS)> {
        let entries = self.entries.read().unwrap_or_else(PoisonError::into_inner);
        let mut filters: Vec<(String, QoS)> = Vec::new();
        for entry in entries.iter() {
            match filters.iter_mut().find(|(f, _)| *f == entry.filter) {
                Some((_, qos)) if entry.qos.level() > qos.level() => *qos = entry.qos,
                Some(_) => {}
                None => filters.push((entry.filter.clone(), entry.qos)),
            }
        }
        filters
    }

    /// Handlers whose filter matches `topic`.
    pub fn handlers_for(&self, topic: &str) -> Vec<Arc<dyn MessageHandler>> {
        self.entries
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .iter()
            .filter(|entry| topic_matches(&entry.filter, topic))
            .map(|entry| entry.handler.clone())
            .collect()
    }

    pub fn len(&self) -> usize {
        self.entries
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

/// Runs `handler` on `message` and logs the outcome.
pub(crate) async fn run_handler(handler: Arc<dyn MessageHandler>, message: BusMessage) {
    let topic = message.topic.clone();
    match handler.handle(message).await {
        Ok(()) => {
            tracing::trace!(handler = handler.name(), topic = %topic, "Message handled");
        }
        Err(HandlerError::Rejected(reason)) => {
            tracing::warn!(handler = handler.name(), topic = %topic, %reason, "Message dropped");
        }
        Err(HandlerError::Failed(reason)) => {
            tracing::error!(handler = handler.name(), topic = %topic, %reason, "Message handling failed");
        }
    }
}
