//! Call drivers, one per interaction shape.
//!
//! Each driver takes an [`EmployeeChannel`](crate::channel::EmployeeChannel), the headers for the
//! call and its payload, and implements the control flow and ordering contract of that shape:
//!
//! * [`unary::call`]: one request, one response.
//! * [`server_stream::open`]: one request, a lazy stream of responses.
//! * [`client_stream::upload`]: a chunked upload, completed explicitly, then one response.
//! * [`bidi::exchange`]: concurrent outbound and inbound streams joined before returning.

pub mod bidi;
pub mod client_stream;
pub mod error;
pub mod server_stream;
pub mod sink;
pub mod unary;

pub use bidi::Exchange;
pub use client_stream::Upload;
pub use error::CallError;
pub use sink::{Completion, RequestSink, RequestStream, request_stream};
