//! # employee-client
//!
//! A gRPC client for `employee.EmployeeService` that exercises the four interaction shapes
//! (unary, server stream, client stream and bidirectional stream) with token authentication and
//! per-call metadata.
//!
//! The pieces, leaves first:
//!
//! * [`token_cache`]: the current credential and its single-writer refresh.
//! * [`metadata`]: per-call headers, including the bearer token.
//! * [`driver`]: one driver per interaction shape over an abstract [`EmployeeChannel`].
//! * [`classify`]: maps failures to the kinds callers react to, keeping trailing diagnostics.
//! * [`client`]: selects an interaction and ties the rest together.

pub mod channel;
pub mod classify;
pub mod client;
pub mod driver;
pub mod employee_proto;
pub mod metadata;
pub mod payload;
pub mod token_cache;

pub use channel::{EmployeeChannel, GrpcChannel};
pub use classify::{Classification, ErrorKind, classify};
pub use client::{ClientConfig, EmployeeClient, Interaction, Outcome, Photo, Workload};
pub use driver::{CallError, Exchange, Upload};
pub use metadata::{CallKind, CallMetadata, MetadataBuilder};
pub use payload::{ChunkSource, ChunkedReader};
pub use token_cache::error::AuthError;
pub use token_cache::{Credential, Credentials, TokenCache};
