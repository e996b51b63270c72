//! Connection lifecycle driver.
//!
//! Owns the [`ConnectionState`], counts failed reconnect attempts and tells
//! the transport whether to retry and after how long. Every transition is
//! validated through [`StateMachine`] and reported to a
//! [`ConnectionListener`], so the whole lifecycle runs without a broker.

use chrono::{DateTime, Utc};
use serde::Serialize;
use std::sync::Arc;
use std::time::Duration;

use crate::domain::foundation::{StateMachine, ValidationError};

use super::policy::ReconnectPolicy;
use super::state::ConnectionState;

/// Observer of lifecycle transitions.
///
/// Called synchronously on the task driving the connection; implementations
/// must not block.
pub trait ConnectionListener: Send + Sync {
    /// Entered `Connected`, initially or after a reconnect.
    fn on_connect(&self) {}

    /// Transport failed while `Connected`.
    fn on_connection_lost(&self, _reason: &str) {}

    /// Reconnect attempt `attempt` is scheduled after `delay`.
    fn on_reconnecting(&self, _attempt: u32, _delay: Duration) {}

    /// Entered `Disconnected` after shutdown, a failed initial connect or an
    /// exhausted reconnect policy.
    fn on_disconnected(&self) {}
}

/// Listener that ignores every transition.
#[derive(Debug, Default, Clone, Copy)]
pub struct NoopListener;

impl ConnectionListener for NoopListener {}

/// What the transport should do after a failure.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ReconnectDecision {
    Retry { attempt: u32, delay: Duration },
    GiveUp,
}

/// Snapshot of the lifecycle for health reporting.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct ConnectionStatus {
    pub state: ConnectionState,
    pub since: DateTime<Utc>,
    pub failed_attempts: u32,
}

pub struct ConnectionLifecycle {
    state: ConnectionState,
    since: DateTime<Utc>,
    failed_attempts: u32,
    policy: ReconnectPolicy,
    listener: Arc<dyn ConnectionListener>,
}

impl ConnectionLifecycle {
    pub fn new(policy: ReconnectPolicy, listener: Arc<dyn ConnectionListener>) -> Self {
        Self {
            state: ConnectionState::Disconnected,
            since: Utc::now(),
            failed_attempts: 0,
            policy,
            listener,
        }
    }

    pub fn state(&self) -> ConnectionState {
        self.state
    }

    pub fn policy(&self) -> &ReconnectPolicy {
        &self.policy
    }

    pub fn status(&self) -> ConnectionStatus {
        ConnectionStatus {
            state: self.state,
            since: self.since,
            failed_attempts: self.failed_attempts,
        }
    }

    /// `Disconnected → Connecting`.
    pub fn begin_connect(&mut self) -> Result<(), ValidationError> {
        self.transition(ConnectionState::Connecting)
    }

    /// Broker acknowledged the session.
    pub fn connected(&mut self) -> Result<(), ValidationError> {
        self.transition(ConnectionState::Connected)?;
        self.failed_attempts = 0;
        self.listener.on_connect();
        Ok(())
    }

    /// Transport reported a failure.
    ///
    /// A failed initial connect is final. A failure while connected enters
    /// `Reconnecting`; further failures there consume reconnect attempts
    /// until the policy is exhausted.
    pub fn connection_failed(&mut self, reason: &str) -> Result<ReconnectDecision, ValidationError> {
        match self.state {
            ConnectionState::Connecting => {
                self.disconnect()?;
                Ok(ReconnectDecision::GiveUp)
            }
            ConnectionState::Connected => {
                self.transition(ConnectionState::Reconnecting)?;
                self.listener.on_connection_lost(reason);
                self.schedule_retry()
            }
            ConnectionState::Reconnecting => self.schedule_retry(),
            ConnectionState::Disconnected => Err(ValidationError::invalid_format(
                "state_transition",
                "connection failure reported while Disconnected",
            )),
        }
    }

    /// Explicit shutdown. Idempotent.
    pub fn shutdown(&mut self) -> Result<(), ValidationError> {
        if self.state == ConnectionState::Disconnected {
            return Ok(());
        }
        self.disconnect()
    }

    fn schedule_retry(&mut self) -> Result<ReconnectDecision, ValidationError> {
        let attempt = self.failed_attempts + 1;
        if !self.policy.allows(attempt) {
            self.disconnect()?;
            return Ok(ReconnectDecision::GiveUp);
        }

        self.failed_attempts = attempt;
        let delay = self.policy.delay(attempt);
        self.listener.on_reconnecting(attempt, delay);
        Ok(ReconnectDecision::Retry { attempt, delay })
    }

    fn disconnect(&mut self) -> Result<(), ValidationError> {
        self.transition(ConnectionState::Disconnected)?;
        self.listener.on_disconnected();
        Ok(())
    }

    fn transition(&mut self, target: ConnectionState) -> Result<(), ValidationError> {
        self.state = self.state.transition_to(target)?;
        self.since = Utc::now();
        Ok(())
    }
}

impl std::fmt::Debug for ConnectionLifecycle {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ConnectionLifecycle")
            .field("state", &self.state)
            .field("since", &self.since)
            .field("failed_attempts", &self.failed_attempts)
            .field("policy", &self.policy)
            .finish_non_exhaustive()
    }
}
