//! Ports - Interfaces for external dependencies.
//!
//! Following hexagonal architecture, ports define the contracts between
//! the application handlers and the outside world. Adapters implement them.
//!
//! - `MessageBus` / `MessageHandler` - Broker publish and subscription
//! - `StateStore` / `DeviceRegistry` - Device identity and latest state
//! - `StateBroadcaster` - Fan-out to live dashboard sessions

mod message_bus;
mod state_broadcaster;
mod state_store;

pub use message_bus::{BusError, BusMessage, HandlerError, MessageBus, MessageHandler, QoS};
pub use state_broadcaster::{BroadcastReport, StateBroadcaster};
pub use state_store::{DeviceRegistry, StateStore, StoreError};
