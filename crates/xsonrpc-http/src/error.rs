//! Transport errors. These never travel over the wire; RPC-level failures
//! are [`Fault`]s.

use thiserror::Error;
use xsonrpc::Fault;

/// Result type for server operations
pub type ServerResult<T> = Result<T, ServerError>;

/// Result type for client operations
pub type ClientResult<T> = Result<T, ClientError>;

#[derive(Debug, Error)]
pub enum ServerError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Registration error: {0}")]
    Registration(#[from] xsonrpc::Error),

    #[error("Configuration error: {0}")]
    Config(String),
}

#[derive(Debug, Error)]
pub enum ClientError {
    #[error("Invalid URL: {0}")]
    InvalidUrl(String),

    #[error("Connection error: {0}")]
    Connection(#[from] reqwest::Error),

    #[error("HTTP request failed with status {0}")]
    Status(u16),

    /// The response body could not be decoded
    #[error("Invalid response: {0}")]
    InvalidResponse(Fault),

    /// The server answered with a fault
    #[error("Fault {}: {}", .0.code(), .0.string())]
    Fault(Fault),

    #[error("{0} does not support notifications")]
    NotificationUnsupported(&'static str),
}

impl ClientError {
    /// The fault returned by the server, if that is what this error is
    pub fn fault(&self) -> Option<&Fault> {
        match self {
            ClientError::Fault(fault) => Some(fault),
            _ => None,
        }
    }
}
