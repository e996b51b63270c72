//! Device module - Identity, registration and state events of bus devices.
//!
//! Everything here is pure: parsing, validation and topic construction. The
//! resolution of UUIDs to device IDs lives behind the store ports.

mod normalizer;
mod registration;
mod state_event;
mod topic;

pub use normalizer::{MessageNormalizer, NormalizeError, ACTION_NAME_KEY};
pub use registration::{DeviceRegistration, DeviceType};
pub use state_event::{StateEvent, StatePush};
pub use topic::{device_topic, topic_matches, TopicTemplate};
