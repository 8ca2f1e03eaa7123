use std::io;
use std::time::Duration;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum BridgeError {
    #[error(
        "could not connect to Blender at {host}:{port}. Make sure Blender is running with the MCP addon enabled"
    )]
    ConnectionRefused { host: String, port: u16 },
    #[error("command timed out after {} seconds", .after.as_secs_f64())]
    Timeout { after: Duration },
    #[error("invalid JSON response from Blender: {0}")]
    InvalidResponse(#[source] serde_json::Error),
    #[error("no response from Blender")]
    NoResponse,
    #[error("failed encoding command: {0}")]
    Encode(#[source] serde_json::Error),
    #[error("communication error with Blender: {0}")]
    Communication(#[source] io::Error),
}

impl BridgeError {
    pub fn is_timeout(&self) -> bool {
        matches!(self, Self::Timeout { .. })
    }
}

pub(crate) fn is_timeout_kind(kind: io::ErrorKind) -> bool {
    matches!(kind, io::ErrorKind::TimedOut | io::ErrorKind::WouldBlock)
}

pub(crate) fn is_unreachable_kind(kind: io::ErrorKind) -> bool {
    matches!(
        kind,
        io::ErrorKind::ConnectionRefused
            | io::ErrorKind::HostUnreachable
            | io::ErrorKind::NetworkUnreachable
            | io::ErrorKind::AddrNotAvailable
            | io::ErrorKind::NotFound
    )
}
