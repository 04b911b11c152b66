use thiserror::Error;

use crate::token_cache::error::AuthError;

/// Errors returned by the call drivers.
#[derive(Debug, Error)]
pub enum CallError {
    /// The service or transport failed the call.
    #[error("call failed: {0}")]
    Status(#[from] tonic::Status),

    /// A credential required by the call could not be obtained.
    #[error(transparent)]
    Auth(#[from] AuthError),

    /// A header could not be encoded as transport metadata.
    #[error("invalid metadata entry '{key}'")]
    InvalidMetadata { key: String },

    /// Reading the upload payload failed.
    #[error("payload read error")]
    Io(#[from] std::io::Error),

    /// The receiving side of an outbound stream went away before the message was accepted.
    #[error("outbound stream closed by peer")]
    StreamClosed,

    /// The driver misused a stream, e.g. completed it twice. This is a bug, not a call failure.
    #[error("stream usage error: {0}")]
    Usage(&'static str),
}

impl CallError {
    /// The gRPC status behind this error, if the failure came from the service or transport.
    pub fn status(&self) -> Option<&tonic::Status> {
        match self {
            CallError::Status(status) | CallError::Auth(AuthError::Call(status)) => Some(status),
            _ => None,
        }
    }
}
