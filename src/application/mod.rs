//! Application layer - Handlers orchestrating domain rules over the ports.
//!
//! Bus-facing handlers implement [`MessageHandler`](crate::ports::MessageHandler);
//! HTTP-facing ones are called directly by the router.

pub mod handlers;

pub use handlers::{
    CommandDispatcher, CommandTopics, DeviceLoginHandler, DispatchError, DispatchResult,
    GetDeviceStateHandler, GetDeviceStateQuery, IngestError, LoginError, StateIngestor, LOGIN_ACK,
};
