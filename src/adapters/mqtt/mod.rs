//! MQTT adapter - broker connection manager built on `rumqttc`.

mod connection_manager;
mod listener;
mod subscriptions;

pub use connection_manager::MqttMessageBus;
pub use listener::LoggingListener;
pub use subscriptions::SubscriptionTable;
