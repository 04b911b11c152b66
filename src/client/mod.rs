//! Orchestration of the four interaction shapes against one service.
//!
//! [`EmployeeClient`] owns the channel and the [`TokenCache`]. For every call it refreshes the
//! credential when the call needs one, builds the headers, runs the matching driver and
//! classifies any failure before returning it. A failed call never poisons the client; the next
//! call starts from scratch.
//!
//! ```ignore
//! use employee_client::{ClientConfig, Credentials, EmployeeClient, GrpcChannel, Interaction};
//!
//! let config = ClientConfig::builder()
//!     .endpoint("http://localhost:5000")
//!     .credentials(Credentials::new("admin", "1qaz2wsxE"))
//!     .build();
//!
//! let channel = GrpcChannel::connect(&config).await?;
//! let client = EmployeeClient::new(channel, config);
//!
//! let employee = client.get_by_no(1994).await?;
//! let outcome = client.execute(Interaction::ServerStream, &workload).await?;
//! ```

mod config;

use std::fmt;
use std::path::PathBuf;
use std::str::FromStr;

use async_stream::try_stream;
use bytes::Bytes;
use futures::{Stream, StreamExt};
use tracing::{debug, info, warn};

use crate::channel::EmployeeChannel;
use crate::classify::classify;
use crate::driver::error::CallError;
use crate::driver::{Exchange, Upload, bidi, client_stream, server_stream, unary};
use crate::employee_proto::{EmployeeRequest, EmployeeResponse, GetAllRequest, GetByNoRequest};
use crate::metadata::{CallKind, CallMetadata, MetadataBuilder};
use crate::payload::{ChunkSource, ChunkedReader};
use crate::token_cache::TokenCache;

pub use config::{ClientConfig, DEFAULT_ENDPOINT};

/// The interaction shape selected for one run.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Interaction {
    Unary,
    ServerStream,
    ClientStream,
    Bidirectional,
}

impl Interaction {
    /// Whether the call carries the bearer token.
    pub fn call_kind(self) -> CallKind {
        match self {
            Interaction::Unary => CallKind::Authenticated,
            Interaction::ServerStream | Interaction::ClientStream | Interaction::Bidirectional => {
                CallKind::Anonymous
            }
        }
    }
}

impl fmt::Display for Interaction {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Interaction::Unary => "unary",
            Interaction::ServerStream => "server-stream",
            Interaction::ClientStream => "client-stream",
            Interaction::Bidirectional => "bidi",
        };
        f.write_str(name)
    }
}

/// The identifier did not name an interaction.
#[derive(Debug, thiserror::Error)]
#[error("unknown interaction '{0}'")]
pub struct UnknownInteraction(pub String);

impl FromStr for Interaction {
    type Err = UnknownInteraction;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim() {
            "1" | "unary" => Ok(Interaction::Unary),
            "2" | "server-stream" => Ok(Interaction::ServerStream),
            "3" | "client-stream" => Ok(Interaction::ClientStream),
            "4" | "bidi" => Ok(Interaction::Bidirectional),
            other => Err(UnknownInteraction(other.to_string())),
        }
    }
}

/// Where the photo for an upload comes from.
#[derive(Debug, Clone)]
pub enum Photo {
    File(PathBuf),
    Bytes(Bytes),
}

/// Caller-supplied payloads for each interaction.
#[derive(Debug, Clone)]
pub struct Workload {
    pub employee_no: i32,
    pub photo: Photo,
    pub records: Vec<EmployeeRequest>,
}

/// What a call produced.
#[derive(Debug, Clone, PartialEq)]
pub enum Outcome {
    Employee(EmployeeResponse),
    Employees(Vec<EmployeeResponse>),
    Uploaded(Upload),
    Exchanged(Exchange),
    /// The selector named no interaction; nothing was called.
    Skipped,
}

/// Runs calls against the employee service over any [`EmployeeChannel`].
pub struct EmployeeClient<C> {
    channel: C,
    tokens: TokenCache,
    config: ClientConfig,
}

impl<C> EmployeeClient<C>
where
    C: EmployeeChannel,
{
    pub fn new(channel: C, config: ClientConfig) -> Self {
        Self {
            channel,
            tokens: TokenCache::new(),
            config,
        }
    }

    pub fn tokens(&self) -> &TokenCache {
        &self.tokens
    }

    pub fn config(&self) -> &ClientConfig {
        &self.config
    }

    pub fn channel(&self) -> &C {
        &self.channel
    }

    /// Run the interaction named by `option`.
    ///
    /// An unrecognized identifier is not an error: it is logged and yields [`Outcome::Skipped`].
    pub async fn run_option(
        &self,
        option: &str,
        workload: &Workload,
    ) -> Result<Outcome, CallError> {
        match option.parse::<Interaction>() {
            Ok(interaction) => self.execute(interaction, workload).await,
            Err(e) => {
                warn!(option, error = %e, "No suitable option");
                Ok(Outcome::Skipped)
            }
        }
    }

    /// Run one interaction with the matching payload from `workload`.
    pub async fn execute(
        &self,
        interaction: Interaction,
        workload: &Workload,
    ) -> Result<Outcome, CallError> {
        info!(%interaction, "Running interaction");

        match interaction {
            Interaction::Unary => self
                .get_by_no(workload.employee_no)
                .await
                .map(Outcome::Employee),
            Interaction::ServerStream => self.get_all().await.map(Outcome::Employees),
            Interaction::ClientStream => {
                let upload = match &workload.photo {
                    Photo::File(path) => self.add_photo_file(path).await,
                    Photo::Bytes(bytes) => {
                        let source =
                            ChunkedReader::from_bytes(bytes.clone(), self.config.chunk_size);
                        let mut source = report(source.map_err(CallError::from))?;
                        self.add_photo(&mut source).await
                    }
                };
                upload.map(Outcome::Uploaded)
            }
            Interaction::Bidirectional => self
                .save_all(workload.records.clone())
                .await
                .map(Outcome::Exchanged),
        }
    }

    /// Fetch one employee by number. Authenticated.
    ///
    /// An `Unauthenticated` answer from the service invalidates the token, refreshes it and
    /// retries the call once.
    pub async fn get_by_no(&self, no: i32) -> Result<EmployeeResponse, CallError> {
        let result = match self.try_get_by_no(no).await {
            Err(e @ CallError::Status(_)) if classify(&e).is_auth_retryable() => {
                warn!(no, "Token refused by service, refreshing and retrying once");
                self.tokens.invalidate();
                self.try_get_by_no(no).await
            }
            other => other,
        };

        report(result)
            .inspect(|response| info!(employee = ?response.employee, "Employee received"))
    }

    async fn try_get_by_no(&self, no: i32) -> Result<EmployeeResponse, CallError> {
        self.tokens
            .ensure(&self.channel, &self.config.credentials)
            .await?;
        let metadata = self.metadata(Interaction::Unary, &self.config.unary_headers)?;
        unary::call(&self.channel, GetByNoRequest { no }, metadata).await
    }

    /// Stream every employee lazily. The call starts on first poll.
    pub fn get_all_stream(
        &self,
    ) -> impl Stream<Item = Result<EmployeeResponse, CallError>> + Send + '_ {
        try_stream! {
            let metadata = self.metadata(Interaction::ServerStream, &CallMetadata::new())?;
            for await response in server_stream::open(&self.channel, GetAllRequest {}, metadata) {
                yield response?;
            }
        }
    }

    /// Fetch every employee, in server order.
    pub async fn get_all(&self) -> Result<Vec<EmployeeResponse>, CallError> {
        let mut stream = std::pin::pin!(self.get_all_stream());
        let mut employees = Vec::new();

        while let Some(next) = stream.next().await {
            let response = report(next)?;
            debug!(employee = ?response.employee, "Employee streamed");
            employees.push(response);
        }

        info!(count = employees.len(), "Server stream drained");
        Ok(employees)
    }

    /// Upload a photo from any chunk source.
    pub async fn add_photo<S>(&self, source: &mut S) -> Result<Upload, CallError>
    where
        S: ChunkSource + ?Sized,
    {
        let metadata = self.metadata(Interaction::ClientStream, &self.config.upload_headers)?;
        let result = client_stream::upload(&self.channel, metadata, source).await;
        report(result).inspect(|upload| {
            let outcome = if upload.response.is_ok {
                "Success"
            } else {
                "Failed"
            };
            info!(chunks = upload.chunks, outcome, "Photo uploaded");
        })
    }

    /// Upload the photo stored at `path`, chunked by the configured size.
    pub async fn add_photo_file(&self, path: &std::path::Path) -> Result<Upload, CallError> {
        let mut source = report(
            ChunkedReader::open(path, self.config.chunk_size)
                .await
                .map_err(CallError::from),
        )?;
        self.add_photo(&mut source).await
    }

    /// Send `records` and collect whatever the server streams back.
    pub async fn save_all(&self, records: Vec<EmployeeRequest>) -> Result<Exchange, CallError> {
        let metadata = self.metadata(Interaction::Bidirectional, &self.config.exchange_headers)?;
        let result = bidi::exchange(&self.channel, metadata, records).await;
        report(result).inspect(|exchange| {
            for response in &exchange.received {
                debug!(employee = ?response.employee, "Client received data");
            }
        })
    }

    fn metadata(
        &self,
        interaction: Interaction,
        extra: &CallMetadata,
    ) -> Result<CallMetadata, CallError> {
        let metadata = MetadataBuilder::new(&self.tokens).build(interaction.call_kind(), extra)?;
        Ok(metadata)
    }
}

/// Log a failure with its diagnostics and hand the result back unchanged.
fn report<T>(result: Result<T, CallError>) -> Result<T, CallError> {
    result.inspect_err(|e| classify(e).log())
}
