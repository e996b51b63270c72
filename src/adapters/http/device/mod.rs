//! HTTP adapter for device commands and value polling.

mod dto;
mod handlers;
mod routes;

pub use dto::{CommandResponse, NumberInputRequest};
pub use handlers::DeviceHandlers;
pub use routes::device_routes;
