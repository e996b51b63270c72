//! Broadcast hub adapter - fans state events out to live dashboard sessions.

mod broadcast_hub;

pub use broadcast_hub::{BroadcastHub, Subscription};
