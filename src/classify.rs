//! Classification of call failures.
//!
//! [`classify`] maps a [`CallError`] to the [`ErrorKind`] callers react to and pulls out the
//! trailing diagnostics the server attached, pair by pair.

use tonic::Code;
use tracing::{error, warn};

use crate::driver::error::CallError;
use crate::metadata::CallMetadata;
use crate::token_cache::error::AuthError;

/// How a caller should react to a failure.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorKind {
    /// The credential was missing or refused; retrying after a refresh is reasonable.
    Unauthenticated,
    /// The caller is not allowed to do this. Terminal for the call.
    PermissionDenied,
    /// Connection-level failure; retry is a caller policy decision.
    Transport,
    /// The driver misused a stream. Indicates a bug.
    Usage,
    Unknown,
}

/// A classified failure with its diagnostics.
#[derive(Debug, Clone, PartialEq)]
pub struct Classification {
    pub kind: ErrorKind,
    /// gRPC status code, when the failure came from the service or transport.
    pub code: Option<Code>,
    pub message: String,
    /// Trailing metadata attached to the failure.
    ///
    /// Every pair is kept, but the transport groups values by key: repeated keys keep the order
    /// of their values, while interleaving across different keys is not preserved.
    pub diagnostics: CallMetadata,
}

impl Classification {
    /// Whether refreshing the credential and retrying once is worthwhile.
    pub fn is_auth_retryable(&self) -> bool {
        self.kind == ErrorKind::Unauthenticated
    }

    /// Emit the failure and each diagnostic pair as separate log events.
    pub fn log(&self) {
        match self.kind {
            ErrorKind::PermissionDenied | ErrorKind::Usage => {
                error!(kind = ?self.kind, code = ?self.code, message = %self.message, "Call failed");
            }
            _ => {
                warn!(kind = ?self.kind, code = ?self.code, message = %self.message, "Call failed");
            }
        }

        for (key, value) in self.diagnostics.iter() {
            error!(key, value, "Failure diagnostic");
        }
    }
}

/// Classify `error`, keeping every trailing diagnostic pair.
pub fn classify(error: &CallError) -> Classification {
    let kind = match error {
        CallError::Status(status) | CallError::Auth(AuthError::Call(status)) => {
            kind_for_code(status.code())
        }
        CallError::Auth(
            AuthError::Rejected { .. } | AuthError::Expired { .. } | AuthError::NoCredential,
        ) => {
            ErrorKind::Unauthenticated
        }
        CallError::StreamClosed => ErrorKind::Transport,
        CallError::Usage(_) => ErrorKind::Usage,
        CallError::Auth(_) | CallError::InvalidMetadata { .. } | CallError::Io(_) => {
            ErrorKind::Unknown
        }
    };

    let (code, message, diagnostics) = match error.status() {
        Some(status) => (
            Some(status.code()),
            status.message().to_string(),
            CallMetadata::from_metadata_map(status.metadata()),
        ),
        None => (None, error.to_string(), CallMetadata::new()),
    };

    Classification {
        kind,
        code,
        message,
        diagnostics,
    }
}

fn kind_for_code(code: Code) -> ErrorKind {
    match code {
        Code::Unauthenticated => ErrorKind::Unauthenticated,
        Code::PermissionDenied => ErrorKind::PermissionDenied,
        Code::Unavailable
        | Code::DeadlineExceeded
        | Code::Cancelled
        | Code::Aborted
        | Code::ResourceExhausted => ErrorKind::Transport,
        _ => ErrorKind::Unknown,
    }
}
