use async_stream::try_stream;
use futures::{Stream, StreamExt};
use tracing::debug;

use crate::channel::EmployeeChannel;
use crate::driver::error::CallError;
use crate::employee_proto::{EmployeeResponse, GetAllRequest};
use crate::metadata::CallMetadata;

/// Open a server-stream call as a lazy sequence of responses.
///
/// Nothing is sent until the stream is first polled. Responses are yielded in server-send order,
/// one at a time. The stream ends after the server finishes or after the first error. Dropping
/// it early releases the call.
pub fn open<'a, C>(
    channel: &'a C,
    request: GetAllRequest,
    metadata: CallMetadata,
) -> impl Stream<Item = Result<EmployeeResponse, CallError>> + Send + 'a
where
    C: EmployeeChannel + ?Sized,
{
    try_stream! {
        let request = metadata.into_request(request)?;
        let mut inbound = channel.get_all(request).await?.into_inner();

        let mut received = 0usize;
        while let Some(message) = inbound.next().await {
            let message = message?;
            received += 1;
            yield message;
        }

        debug!(received, "Server stream finished");
    }
}
