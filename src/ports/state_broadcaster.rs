//! StateBroadcaster port - Fan-out of state events to live sessions.

use crate::domain::device::StateEvent;

/// Result of one fan-out.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct BroadcastReport {
    /// Subscribers that received the event.
    pub delivered: usize,
    /// Subscribers whose mailbox was full.
    pub dropped: usize,
    /// Subscribers removed during this fan-out.
    pub removed: usize,
}

/// Port for pushing state events to every live dashboard session.
///
/// `broadcast` runs on the bus delivery path and must never wait on a
/// subscriber.
pub trait StateBroadcaster: Send + Sync {
    fn broadcast(&self, event: &StateEvent) -> BroadcastReport;
}
