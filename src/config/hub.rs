//! Broadcast hub configuration

use serde::Deserialize;
use std::time::Duration;

use super::error::ValidationError;

/// What happens to a subscriber whose mailbox is full.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize, Default)]
#[serde(rename_all = "snake_case")]
pub enum OverflowPolicy {
    /// Skip this event for that subscriber and keep it registered.
    #[default]
    DropNewest,
    /// Remove the subscriber; its stream ends once drained.
    Disconnect,
}

/// Fan-out settings for live dashboard sessions
#[derive(Debug, Clone, Deserialize)]
pub struct HubConfig {
    /// Pending events each session may queue
    #[serde(default = "default_mailbox_capacity")]
    pub mailbox_capacity: usize,

    #[serde(default)]
    pub overflow_policy: OverflowPolicy,

    /// Interval of keep-alive comments on idle streams, in seconds
    #[serde(default = "default_keep_alive")]
    pub keep_alive_secs: u64,
}

impl HubConfig {
    pub fn keep_alive(&self) -> Duration {
        Duration::from_secs(self.keep_alive_secs)
    }

    pub fn validate(&self) -> Result<(), ValidationError> {
        if self.mailbox_capacity == 0 || self.mailbox_capacity > 4096 {
            return Err(ValidationError::InvalidMailboxCapacity);
        }
        if self.keep_alive_secs == 0 {
            return Err(ValidationError::InvalidTimeout);
        }
        Ok(())
    }
}

impl Default for HubConfig {
    fn default() -> Self {
        Self {
            mailbox_capacity: default_mailbox_capacity(),
            overflow_policy: OverflowPolicy::default(),
            keep_alive_secs: default_keep_alive(),
        }
    }
}

fn default_mailbox_capacity() -> usize {
    32
}

fn default_keep_alive() -> u64 {
    15
}
