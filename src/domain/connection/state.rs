//! Lifecycle state of the broker connection.

use serde::{Deserialize, Serialize};
use std::fmt;

use crate::domain::foundation::StateMachine;

/// State of the single broker connection a process owns.
///
/// `Disconnected` is both the initial state and the state after an explicit
/// shutdown or an exhausted reconnect policy.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Default)]
#[serde(rename_all = "snake_case")]
pub enum ConnectionState {
    #[default]
    Disconnected,
    Connecting,
    Connected,
    Reconnecting,
}

impl ConnectionState {
    /// Returns true if publishes can be handed to the client right now.
    pub fn accepts_publishes(&self) -> bool {
        matches!(self, ConnectionState::Connected)
    }
}

impl StateMachine for ConnectionState {
    fn can_transition_to(&self, target: &Self) -> bool {
        use ConnectionState::*;
        matches!(
            (self, target),
            (Disconnected, Connecting)
                | (Connecting, Connected)
                | (Connecting, Disconnected)
                | (Connected, Reconnecting)
                | (Connected, Disconnected)
                | (Reconnecting, Connected)
                | (Reconnecting, Disconnected)
        )
    }

    fn valid_transitions(&self) -> Vec<Self> {
        use ConnectionState::*;
        match self {
            Disconnected => vec![Connecting],
            Connecting => vec![Connected, Disconnected],
            Connected => vec![Reconnecting, Disconnected],
            Reconnecting => vec![Connected, Disconnected],
        }
    }
}

impl fmt::Display for ConnectionState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            ConnectionState::Disconnected => "Disconnected",
            ConnectionState::Connecting => "Connecting",
            ConnectionState::Connected => "Connected",
            ConnectionState::Reconnecting => "Reconnecting",
        };
        write!(f, "{}", s)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use ConnectionState::*;

    const ALL: [ConnectionState; 4] = [Disconnected, Connecting, Connected, Reconnecting];

    #[test]
    fn default_is_disconnected() {
        assert_eq!(ConnectionState::default(), Disconnected);
    }

    #[test]
    fn happy_path_reaches_connected() {
        let state = Disconnected.transition_to(Connecting).unwrap();
        let state = state.transition_to(Connected).unwrap();
        assert_eq!(state, Connected);
    }

    #[test]
    fn transport_failure_goes_through_reconnecting() {
        let state = Connected.transition_to(Reconnecting).unwrap();
        assert_eq!(state.transition_to(Connected), Ok(Connected));
        assert_eq!(state.transition_to(Disconnected), Ok(Disconnected));
    }

    #[test]
    fn cannot_skip_connecting() {
        assert!(Disconnected.transition_to(Connected).is_err());
        assert!(Disconnected.transition_to(Reconnecting).is_err());
        assert!(Connecting.transition_to(Reconnecting).is_err());
    }

    #[test]
    fn self_transitions_are_rejected() {
        for state in ALL {
            assert!(!state.can_transition_to(&state), "{} -> {}", state, state);
        }
    }

    #[test]
    fn valid_transitions_agree_with_can_transition_to() {
        for from in ALL {
            for to in ALL {
                assert_eq!(
                    from.valid_transitions().contains(&to),
                    from.can_transition_to(&to),
                    "{} -> {}",
                    from,
                    to
                );
            }
        }
    }

    #[test]
    fn no_state_is_terminal() {
        for state in ALL {
            assert!(!state.is_terminal());
        }
    }

    #[test]
    fn only_connected_accepts_publishes() {
        assert!(Connected.accepts_publishes());
        assert!(!Reconnecting.accepts_publishes());
        assert!(!Connecting.accepts_publishes());
        assert!(!Disconnected.accepts_publishes());
    }

    #[test]
    fn serializes_to_snake_case_json() {
        assert_eq!(serde_json::to_string(&Reconnecting).unwrap(), "\"reconnecting\"");
    }
}
