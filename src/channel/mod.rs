//! The RPC channel capability consumed by the call drivers.
//!
//! [`EmployeeChannel`] exposes the four interaction shapes of the employee service plus the
//! authentication endpoint. [`GrpcChannel`] is the tonic-backed implementation; tests use a
//! scripted in-memory double.

mod grpc;

#[cfg(test)]
pub(crate) mod mock;

use std::pin::Pin;

use futures::Stream;
use tonic::{Request, Response, Status};

use crate::driver::sink::RequestStream;
use crate::employee_proto::{
    AddPhotoRequest, AddPhotoResponse, EmployeeRequest, EmployeeResponse, GetAllRequest,
    GetByNoRequest, TokenRequest, TokenResponse,
};

pub use grpc::GrpcChannel;

/// Messages flowing from the client to the server on a streaming call.
pub type OutboundStream<T> = RequestStream<T>;

/// Messages flowing from the server to the client on a streaming call.
pub type InboundStream<T> = Pin<Box<dyn Stream<Item = Result<T, Status>> + Send + 'static>>;

/// A channel able to perform every call of `employee.EmployeeService`.
///
/// Failures are reported as [`Status`], which carries the code, message and any trailing
/// metadata attached by the server. Successful responses carry the leading response headers.
#[tonic::async_trait]
pub trait EmployeeChannel: Send + Sync {
    /// Authenticate with username/password and obtain a token.
    async fn create_token(
        &self,
        request: Request<TokenRequest>,
    ) -> Result<Response<TokenResponse>, Status>;

    /// Single request, single response.
    async fn get_by_no(
        &self,
        request: Request<GetByNoRequest>,
    ) -> Result<Response<EmployeeResponse>, Status>;

    /// Single request, response stream.
    async fn get_all(
        &self,
        request: Request<GetAllRequest>,
    ) -> Result<Response<InboundStream<EmployeeResponse>>, Status>;

    /// Request stream, single response.
    async fn add_photo(
        &self,
        request: Request<OutboundStream<AddPhotoRequest>>,
    ) -> Result<Response<AddPhotoResponse>, Status>;

    /// Request stream, response stream.
    async fn save_all(
        &self,
        request: Request<OutboundStream<EmployeeRequest>>,
    ) -> Result<Response<InboundStream<EmployeeResponse>>, Status>;
}
