//! HTTP adapters - Dashboard stream, device commands and health.

mod device;
mod error;
mod health;
mod router;
mod stream;

pub use device::{device_routes, CommandResponse, DeviceHandlers, NumberInputRequest};
pub use error::ErrorResponse;
pub use health::{health_routes, BrokerHealthResponse};
pub use router::{app_router, AppState};
pub use stream::{stream_routes, DashboardSession, StreamMessage, StreamState};
