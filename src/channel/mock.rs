//! Scripted in-memory [`EmployeeChannel`] used by the unit tests.

use std::collections::VecDeque;
use std::sync::Mutex;
use std::sync::atomic::{AtomicUsize, Ordering};

use bytes::Bytes;
use futures::StreamExt;
use tonic::metadata::MetadataMap;
use tonic::{Request, Response, Status};

use crate::channel::{EmployeeChannel, InboundStream, OutboundStream};
use crate::driver::sink::Completion;
use crate::employee_proto::{
    AddPhotoRequest, AddPhotoResponse, Employee, EmployeeRequest, EmployeeResponse,
    GetAllRequest, GetByNoRequest, TokenRequest, TokenResponse,
};

/// How the bidirectional call behaves on the server side.
#[derive(Debug, Clone)]
pub enum SaveAllScript {
    /// Echo each inbound record immediately, then send one summary record once the client
    /// completes its side.
    EchoThenSummary,
    /// Hold every response until the client completes, then send them all.
    ReplyAfterCompletion,
    /// Fail the response stream after `after` records have been received.
    FailAfter { after: usize, status: Status },
    /// Echo the first `after` records, then stop reading and end the response stream cleanly.
    FinishAfter(usize),
    /// Reject the call before any headers are sent.
    Reject(Status),
}

/// `completed` counts request streams that reached their end after an explicit completion.
/// `completion` is the flag of the last request stream, kept even when the server stopped
/// reading early.
#[derive(Debug, Default)]
pub struct UploadLog {
    pub chunks: Vec<Bytes>,
    pub completed: usize,
    pub completion: Option<Completion>,
}

#[derive(Debug, Default)]
pub struct ExchangeLog {
    pub received: Vec<EmployeeRequest>,
    pub completed: usize,
    pub completion: Option<Completion>,
}

impl ExchangeLog {
    pub fn client_completed(&self) -> bool {
        self.completion.as_ref().is_some_and(Completion::is_completed)
    }
}

pub struct MockChannel {
    pub tokens: Mutex<VecDeque<Result<TokenResponse, Status>>>,
    pub token_calls: AtomicUsize,
    pub unary: Mutex<VecDeque<Result<EmployeeResponse, Status>>>,
    pub unary_metadata: Mutex<Vec<MetadataMap>>,
    pub all: Vec<Result<EmployeeResponse, Status>>,
    pub all_calls: AtomicUsize,
    pub upload_result: Mutex<Option<Result<AddPhotoResponse, Status>>>,
    /// Answer after reading this many chunks instead of waiting for the stream to end.
    pub upload_read_limit: Option<usize>,
    pub upload_log: std::sync::Arc<Mutex<UploadLog>>,
    pub upload_metadata: Mutex<Vec<MetadataMap>>,
    pub save_all: SaveAllScript,
    pub response_headers: Vec<(&'static str, &'static str)>,
    pub exchange_log: std::sync::Arc<Mutex<ExchangeLog>>,
}

impl Default for MockChannel {
    fn default() -> Self {
        Self {
            tokens: Mutex::new(VecDeque::new()),
            token_calls: AtomicUsize::new(0),
            unary: Mutex::new(VecDeque::new()),
            unary_metadata: Mutex::new(Vec::new()),
            all: Vec::new(),
            all_calls: AtomicUsize::new(0),
            upload_result: Mutex::new(None),
            upload_read_limit: None,
            upload_log: Default::default(),
            upload_metadata: Mutex::new(Vec::new()),
            save_all: SaveAllScript::EchoThenSummary,
            response_headers: Vec::new(),
            exchange_log: Default::default(),
        }
    }
}

pub fn employee(no: i32, first_name: &str) -> Employee {
    Employee {
        id: no * 10,
        no,
        first_name: first_name.to_string(),
        last_name: "test".to_string(),
        ..Default::default()
    }
}

pub fn employee_response(no: i32, first_name: &str) -> EmployeeResponse {
    EmployeeResponse {
        employee: Some(employee(no, first_name)),
    }
}

pub fn token_response(token: &str, expires_in_secs: i64) -> TokenResponse {
    let now = std::time::SystemTime::now()
        .duration_since(std::time::UNIX_EPOCH)
        .unwrap()
        .as_secs() as i64;
    TokenResponse {
        token: token.to_string(),
        expiration: Some(prost_types::Timestamp {
            seconds: now + expires_in_secs,
            nanos: 0,
        }),
        success: true,
    }
}

impl MockChannel {
    pub fn with_tokens(self, tokens: Vec<Result<TokenResponse, Status>>) -> Self {
        *self.tokens.lock().unwrap() = tokens.into();
        self
    }

    pub fn with_unary(self, responses: Vec<Result<EmployeeResponse, Status>>) -> Self {
        *self.unary.lock().unwrap() = responses.into();
        self
    }

    pub fn with_upload_result(self, result: Result<AddPhotoResponse, Status>) -> Self {
        *self.upload_result.lock().unwrap() = Some(result);
        self
    }
}

#[tonic::async_trait]
impl EmployeeChannel for MockChannel {
    async fn create_token(
        &self,
        _request: Request<TokenRequest>,
    ) -> Result<Response<TokenResponse>, Status> {
        self.token_calls.fetch_add(1, Ordering::SeqCst);
        // Yield so concurrent refreshers get a chance to race.
        tokio::task::yield_now().await;
        let next = self
            .tokens
            .lock()
            .unwrap()
            .pop_front()
            .unwrap_or_else(|| Err(Status::unavailable("no scripted token")));
        next.map(Response::new)
    }

    async fn get_by_no(
        &self,
        request: Request<GetByNoRequest>,
    ) -> Result<Response<EmployeeResponse>, Status> {
        self.unary_metadata
            .lock()
            .unwrap()
            .push(request.metadata().clone());
        let next = self
            .unary
            .lock()
            .unwrap()
            .pop_front()
            .unwrap_or_else(|| Err(Status::not_found("no scripted response")));
        next.map(Response::new)
    }

    async fn get_all(
        &self,
        _request: Request<GetAllRequest>,
    ) -> Result<Response<InboundStream<EmployeeResponse>>, Status> {
        self.all_calls.fetch_add(1, Ordering::SeqCst);
        let items = self.all.clone();
        Ok(Response::new(
            Box::pin(futures::stream::iter(items)) as InboundStream<EmployeeResponse>
        ))
    }

    async fn add_photo(
        &self,
        request: Request<OutboundStream<AddPhotoRequest>>,
    ) -> Result<Response<AddPhotoResponse>, Status> {
        self.upload_metadata
            .lock()
            .unwrap()
            .push(request.metadata().clone());
        let mut inbound = request.into_inner();
        let completion = inbound.completion();
        self.upload_log.lock().unwrap().completion = Some(completion.clone());

        let limit = self.upload_read_limit.unwrap_or(usize::MAX);
        let mut read = 0;
        let mut ended = false;
        while read < limit {
            match inbound.next().await {
                Some(chunk) => {
                    self.upload_log.lock().unwrap().chunks.push(chunk.data);
                    read += 1;
                }
                None => {
                    ended = true;
                    break;
                }
            }
        }
        drop(inbound);

        if ended && completion.is_completed() {
            self.upload_log.lock().unwrap().completed += 1;
        }
        let result = self
            .upload_result
            .lock()
            .unwrap()
            .take()
            .unwrap_or(Ok(AddPhotoResponse { is_ok: true }));
        result.map(Response::new)
    }

    async fn save_all(
        &self,
        request: Request<OutboundStream<EmployeeRequest>>,
    ) -> Result<Response<InboundStream<EmployeeResponse>>, Status> {
        let mut inbound = request.into_inner();
        let completion = inbound.completion();
        self.exchange_log.lock().unwrap().completion = Some(completion.clone());

        if let SaveAllScript::Reject(status) = &self.save_all {
            return Err(status.clone());
        }

        let log = std::sync::Arc::clone(&self.exchange_log);
        let script = self.save_all.clone();

        let outbound = async_stream::stream! {
            let mut held = Vec::new();
            while let Some(record) = inbound.next().await {
                log.lock().unwrap().received.push(record.clone());
                let count = log.lock().unwrap().received.len();
                match &script {
                    SaveAllScript::EchoThenSummary => {
                        yield Ok(EmployeeResponse { employee: record.employee });
                    }
                    SaveAllScript::ReplyAfterCompletion => held.push(record),
                    SaveAllScript::FailAfter { after, status } if count >= *after => {
                        yield Err(status.clone());
                        return;
                    }
                    SaveAllScript::FinishAfter(after) => {
                        yield Ok(EmployeeResponse { employee: record.employee });
                        if count >= *after {
                            drop(inbound);
                            return;
                        }
                    }
                    _ => {}
                }
            }
            if completion.is_completed() {
                log.lock().unwrap().completed += 1;
            }
            for record in held {
                yield Ok(EmployeeResponse { employee: record.employee });
            }
            if let SaveAllScript::EchoThenSummary = script {
                yield Ok(employee_response(0, "summary"));
            }
        };

        let mut response = Response::new(Box::pin(outbound) as InboundStream<EmployeeResponse>);
        for (key, value) in &self.response_headers {
            response
                .metadata_mut()
                .append(*key, value.parse().unwrap());
        }
        Ok(response)
    }
}
