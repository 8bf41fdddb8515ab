//! Error types for cache administration

use serde::{Serialize, Serializer};
use std::fmt;
use thiserror::Error;

/// Result type alias for admin operations.
pub type Result<T> = std::result::Result<T, AdminError>;

/// Result codes reported by the cache client, numbered like libmemcached's.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ResultCode {
    Success,
    Failure,
    ConnectionFailure,
    WriteFailure,
    ReadFailure,
    ProtocolError,
    ClientError,
    ServerError,
    NoServers,
    Timeout,
}

impl ResultCode {
    /// Numeric value of the code
    pub fn code(self) -> u16 {
        match self {
            ResultCode::Success => 0,
            ResultCode::Failure => 1,
            ResultCode::ConnectionFailure => 3,
            ResultCode::WriteFailure => 5,
            ResultCode::ReadFailure => 6,
            ResultCode::ProtocolError => 8,
            ResultCode::ClientError => 9,
            ResultCode::ServerError => 10,
            ResultCode::NoServers => 20,
            ResultCode::Timeout => 31,
        }
    }

    pub fn is_success(self) -> bool {
        self == ResultCode::Success
    }

    /// Codes raised below the protocol, before any server answered.
    pub fn is_transport(self) -> bool {
        matches!(
            self,
            ResultCode::ConnectionFailure
                | ResultCode::WriteFailure
                | ResultCode::ReadFailure
                | ResultCode::NoServers
                | ResultCode::Timeout
        )
    }

    /// Human readable label, e.g. `SERVER ERROR`
    pub fn label(self) -> &'static str {
        match self {
            ResultCode::Success => "SUCCESS",
            ResultCode::Failure => "FAILURE",
            ResultCode::ConnectionFailure => "CONNECTION FAILURE",
            ResultCode::WriteFailure => "WRITE FAILURE",
            ResultCode::ReadFailure => "READ FAILURE",
            ResultCode::ProtocolError => "PROTOCOL ERROR",
            ResultCode::ClientError => "CLIENT ERROR",
            ResultCode::ServerError => "SERVER ERROR",
            ResultCode::NoServers => "NO SERVERS DEFINED",
            ResultCode::Timeout => "A TIMEOUT OCCURRED",
        }
    }
}

impl fmt::Display for ResultCode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} ({})", self.label(), self.code())
    }
}

impl Serialize for ResultCode {
    fn serialize<S: Serializer>(&self, serializer: S) -> std::result::Result<S::Ok, S::Error> {
        serializer.serialize_u16(self.code())
    }
}

/// Error reported by a [`CacheClient`](crate::client::CacheClient) call.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("{message}")]
pub struct ClientError {
    pub code: ResultCode,
    pub message: String,
}

impl ClientError {
    pub fn new(code: ResultCode, message: impl Into<String>) -> Self {
        Self {
            code,
            message: message.into(),
        }
    }
}

/// Errors surfaced by [`CacheAdmin`](crate::admin::CacheAdmin).
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum AdminError {
    /// The admin service was built without a cache client.
    #[error("The memcached client is not configured")]
    ClientNotConfigured,

    /// The client answered with a non-success result code.
    #[error("{message}")]
    OperationFailed { code: ResultCode, message: String },

    /// The client could not complete the call at all.
    #[error("{0}")]
    ClientFault(String),
}

impl From<ClientError> for AdminError {
    fn from(err: ClientError) -> Self {
        if err.code.is_transport() {
            AdminError::ClientFault(err.message)
        } else {
            AdminError::OperationFailed {
                code: err.code,
                message: err.message,
            }
        }
    }
}
