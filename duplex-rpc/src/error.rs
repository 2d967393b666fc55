use serde::{Deserialize, Serialize};
use thiserror::Error;

#[derive(Debug, Serialize, Deserialize, Clone, PartialEq, Error)]
pub enum Error {
    /// Failed to dial or listen. Contains the underlying IO error
    #[error("Connection error: {0}")]
    ConnectionError(String),
    /// No handler is registered for a requested method
    #[error("Method `{0}` is not registered")]
    NoEndpoint(String),
    /// Method had been registered already
    #[error("Method `{0}` is already registered")]
    AlreadyRegistered(String),
    /// Peer disconnected
    #[error("Peer disconnected")]
    PeerDisconnected,
    /// Call deadline passed before the call completed
    #[error("Call deadline exceeded")]
    DeadlineExceeded,
    /// Peer abandoned the call
    #[error("Call cancelled")]
    Cancelled,
    /// Outgoing record doesn't serialize. Contains serialization error
    #[error("Invalid call params: {0}")]
    ParamsTypeError(String),
    /// Incoming record doesn't deserialize into a requested type. Contains deserialization error
    #[error("Invalid result type: {0}")]
    ResultTypeError(String),
    /// Peer violated call protocol: unexpected frame, bad frame size, send after half-close
    #[error("Protocol error: {0}")]
    ProtocolError(String),
    /// Internal library error. Should never happen
    #[error("Internal duplex error: {0}. Please report the issue")]
    InternalError(String),
    /// Handler returned an application error
    #[error("Handler returned an error: {0}")]
    HandlerError(String),
}

impl Error {
    /// Deadline or peer cancellation
    pub fn is_cancellation(&self) -> bool {
        matches!(self, Error::DeadlineExceeded | Error::Cancelled)
    }
}

pub type Result<T> = std::result::Result<T, Error>;
