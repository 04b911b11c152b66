//! Error types for credential refresh.

/// Indicates that a usable credential could not be obtained.
///
/// The call that needed the credential must not be attempted.
#[derive(Debug, thiserror::Error)]
pub enum AuthError {
    /// The authentication endpoint answered but refused the credentials.
    #[error("authentication rejected for user '{username}'")]
    Rejected { username: String },

    /// The authentication call itself failed.
    #[error("authentication call failed: {0}")]
    Call(#[from] tonic::Status),

    /// The service issued a token without an expiration.
    #[error("token response carried no expiration")]
    MissingExpiration,

    /// The expiration could not be represented as a point in time.
    #[error("token expiration is out of range: {0}")]
    InvalidExpiration(#[from] prost_types::TimestampError),

    /// The service issued a token that had already expired.
    #[error("token expired at {expires_at:?} before it could be used")]
    Expired { expires_at: std::time::SystemTime },

    /// No usable credential is held and none was requested.
    #[error("no usable credential is held")]
    NoCredential,
}
