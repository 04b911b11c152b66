use std::time::Duration;

use bon::Builder;

use crate::metadata::CallMetadata;
use crate::payload::DEFAULT_CHUNK_SIZE;
use crate::token_cache::Credentials;

pub const DEFAULT_ENDPOINT: &str = "http://localhost:5000";

/// Configuration for the employee client.
#[derive(Debug, Clone, Builder)]
pub struct ClientConfig {
    /// URI of the employee service.
    #[builder(into, default = DEFAULT_ENDPOINT.to_string())]
    pub endpoint: String,

    /// Presented to the authentication endpoint whenever the token must be refreshed.
    pub credentials: Credentials,

    /// Identity/context headers sent with the authenticated unary call, after `Authorization`.
    #[builder(default)]
    pub unary_headers: CallMetadata,

    /// Headers sent with the photo upload stream.
    #[builder(default)]
    pub upload_headers: CallMetadata,

    /// Headers sent with the bidirectional save stream.
    #[builder(default)]
    pub exchange_headers: CallMetadata,

    /// Upper bound on the size of one upload message.
    #[builder(default = DEFAULT_CHUNK_SIZE)]
    pub chunk_size: usize,

    /// How long to wait for the transport connection to be established.
    #[builder(default = Duration::from_secs(10))]
    pub connect_timeout: Duration,
}
