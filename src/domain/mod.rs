//! Domain layer containing the bridge's pure types and rules.
//!
//! # Module Organization
//!
//! - `foundation` - Shared primitives (identifiers, validation errors, state machine trait)
//! - `device` - Device identity, state events, message normalization and topics
//! - `connection` - Broker connection lifecycle and reconnect policy

pub mod connection;
pub mod device;
pub mod foundation;
