//! Adapters - Implementations of port interfaces.
//!
//! - `mqtt` - Broker connection over rumqttc
//! - `postgres` - Device registry and state store over sqlx
//! - `hub` - In-process fan-out to dashboard sessions
//! - `http` - axum routes for streams, commands and health
//! - `memory` - In-memory ports for tests and local runs

pub mod http;
pub mod hub;
pub mod memory;
pub mod mqtt;
pub mod postgres;

pub use hub::{BroadcastHub, Subscription};
pub use memory::{InMemoryDeviceStore, InMemoryMessageBus, PublishedMessage};
pub use mqtt::{LoggingListener, MqttMessageBus};
pub use postgres::PostgresDeviceStore;
