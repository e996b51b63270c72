//! Foundation module - Shared domain primitives.
//!
//! Identifiers, the state machine trait and validation errors used across
//! the device, connection and hub code.

mod errors;
mod ids;
mod state_machine;

pub use errors::ValidationError;
pub use ids::{DeviceId, DeviceUuid, SubscriberId};
pub use state_machine::StateMachine;
