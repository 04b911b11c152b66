use tonic::codegen::http::uri::PathAndQuery;
use tonic::transport::{Channel, Endpoint};
use tonic::{Request, Response, Status};
use tonic_prost::ProstCodec;
use tracing::{debug, info};

use crate::channel::{EmployeeChannel, InboundStream, OutboundStream};
use crate::client::ClientConfig;
use crate::employee_proto::{
    AddPhotoRequest, AddPhotoResponse, EmployeeRequest, EmployeeResponse, GetAllRequest,
    GetByNoRequest, TokenRequest, TokenResponse,
};

const CREATE_TOKEN: &str = "/employee.EmployeeService/CreateToken";
const GET_BY_NO: &str = "/employee.EmployeeService/GetByNo";
const GET_ALL: &str = "/employee.EmployeeService/GetAll";
const ADD_PHOTO: &str = "/employee.EmployeeService/AddPhoto";
const SAVE_ALL: &str = "/employee.EmployeeService/SaveAll";

/// An [`EmployeeChannel`] backed by a tonic transport channel.
///
/// Cloning is cheap; every call works on its own clone of the underlying [`tonic::client::Grpc`]
/// so calls on the same channel may overlap.
#[derive(Debug, Clone)]
pub struct GrpcChannel {
    inner: tonic::client::Grpc<Channel>,
}

impl GrpcChannel {
    /// Wrap an already established transport channel.
    pub fn new(channel: Channel) -> Self {
        Self {
            inner: tonic::client::Grpc::new(channel),
        }
    }

    /// Connect to the endpoint named in `config`.
    ///
    /// # Errors
    ///
    /// Returns an error if the endpoint URI is invalid or the connection cannot be established
    /// within the configured connect timeout.
    pub async fn connect(config: &ClientConfig) -> Result<Self, tonic::transport::Error> {
        info!(endpoint = %config.endpoint, "Connecting to employee service");

        let channel = Endpoint::from_shared(config.endpoint.clone())?
            .connect_timeout(config.connect_timeout)
            .connect()
            .await?;

        info!(endpoint = %config.endpoint, "Channel established");
        Ok(Self::new(channel))
    }

    /// Wait until the transport can accept a new call and hand out a client for it.
    async fn ready(&self, path: &'static str) -> Result<tonic::client::Grpc<Channel>, Status> {
        let mut grpc = self.inner.clone();
        grpc.ready()
            .await
            .map_err(|e| Status::unavailable(format!("service was not ready: {e}")))?;
        debug!(path, "Channel ready");
        Ok(grpc)
    }
}

#[tonic::async_trait]
impl EmployeeChannel for GrpcChannel {
    async fn create_token(
        &self,
        request: Request<TokenRequest>,
    ) -> Result<Response<TokenResponse>, Status> {
        let mut grpc = self.ready(CREATE_TOKEN).await?;
        grpc.unary(
            request,
            PathAndQuery::from_static(CREATE_TOKEN),
            ProstCodec::default(),
        )
        .await
    }

    async fn get_by_no(
        &self,
        request: Request<GetByNoRequest>,
    ) -> Result<Response<EmployeeResponse>, Status> {
        let mut grpc = self.ready(GET_BY_NO).await?;
        grpc.unary(
            request,
            PathAndQuery::from_static(GET_BY_NO),
            ProstCodec::default(),
        )
        .await
    }

    async fn get_all(
        &self,
        request: Request<GetAllRequest>,
    ) -> Result<Response<InboundStream<EmployeeResponse>>, Status> {
        let mut grpc = self.ready(GET_ALL).await?;
        let response = grpc
            .server_streaming(
                request,
                PathAndQuery::from_static(GET_ALL),
                ProstCodec::default(),
            )
            .await?;
        Ok(response.map(|stream| Box::pin(stream) as InboundStream<EmployeeResponse>))
    }

    async fn add_photo(
        &self,
        request: Request<OutboundStream<AddPhotoRequest>>,
    ) -> Result<Response<AddPhotoResponse>, Status> {
        let mut grpc = self.ready(ADD_PHOTO).await?;
        grpc.client_streaming(
            request,
            PathAndQuery::from_static(ADD_PHOTO),
            ProstCodec::default(),
        )
        .await
    }

    async fn save_all(
        &self,
        request: Request<OutboundStream<EmployeeRequest>>,
    ) -> Result<Response<InboundStream<EmployeeResponse>>, Status> {
        let mut grpc = self.ready(SAVE_ALL).await?;
        let response = grpc
            .streaming(
                request,
                PathAndQuery::from_static(SAVE_ALL),
                ProstCodec::default(),
            )
            .await?;
        Ok(response.map(|stream| Box::pin(stream) as InboundStream<EmployeeResponse>))
    }
}
