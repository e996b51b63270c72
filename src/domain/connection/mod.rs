//! Connection module - Broker connection lifecycle.
//!
//! ```text
//! Disconnected → Connecting → Connected ⇄ Reconnecting
//!                     ↓            ↓           ↓
//!                Disconnected  Disconnected  Disconnected
//! ```

mod lifecycle;
mod policy;
mod state;

pub use lifecycle::{
    ConnectionLifecycle, ConnectionListener, ConnectionStatus, NoopListener, ReconnectDecision,
};
pub use policy::ReconnectPolicy;
pub use state::ConnectionState;
