//! In-memory adapters for tests and local runs.

mod message_bus;
mod state_store;

pub use message_bus::{InMemoryMessageBus, PublishedMessage};
pub use state_store::InMemoryDeviceStore;
