//! Device Dashboard - real-time bridge between a device message bus and
//! live dashboard sessions.
//!
//! Devices publish state over MQTT; this crate normalizes those messages,
//! persists the latest state per device action, fans every update out to the
//! connected dashboards and carries dashboard commands back onto the bus.

pub mod adapters;
pub mod application;
pub mod config;
pub mod domain;
pub mod ports;
