//! Client side of the Blender addon socket protocol: newline-delimited JSON,
//! one request and one response per connection.

mod connection;
mod error;
mod protocol;

pub use connection::{
    BlenderConnection, CommandTransport, DEFAULT_CONNECT_TIMEOUT, DEFAULT_HOST, DEFAULT_PORT,
    DEFAULT_TIMEOUT,
};
pub use error::BridgeError;
pub use protocol::{Command, Response, STATUS_SUCCESS};
