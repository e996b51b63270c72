//! Message, command and query handlers.

mod command_dispatcher;
mod device_login;
mod get_device_state;
mod state_ingestor;

pub use command_dispatcher::{CommandDispatcher, CommandTopics, DispatchError, DispatchResult};
pub use device_login::{DeviceLoginHandler, LoginError, LOGIN_ACK};
pub use get_device_state::{GetDeviceStateHandler, GetDeviceStateQuery};
pub use state_ingestor::{IngestError, StateIngestor};
