//! HTTP adapter for the live dashboard stream.

mod handlers;
mod routes;
mod session;

pub use handlers::StreamState;
pub use routes::stream_routes;
pub use session::{DashboardSession, StreamMessage};
