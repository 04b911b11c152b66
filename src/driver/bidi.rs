use futures::StreamExt;
use tracing::{debug, info, warn};

use crate::channel::EmployeeChannel;
use crate::driver::error::CallError;
use crate::driver::sink::request_stream;
use crate::employee_proto::{EmployeeRequest, EmployeeResponse};
use crate::metadata::CallMetadata;

/// Result of a completed bidirectional exchange.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Exchange {
    /// Records sent before the completion signal.
    pub sent: usize,
    /// Leading response headers, available before the first inbound record.
    pub headers: CallMetadata,
    /// Inbound records in arrival order.
    pub received: Vec<EmployeeResponse>,
}

/// Run a bidirectional call: send every record then complete, while concurrently reading the
/// response headers and draining the inbound stream.
///
/// The two directions run as independent activities joined before returning. The outbound side
/// always sends its completion signal exactly once, whatever happens inbound, because the server
/// may keep its own stream open until it sees it. The exchange is finished only when completion
/// has been sent and the inbound stream has drained or failed.
///
/// A server may end its side before reading every record. The closed request stream then only
/// means the peer is finished: sending stops, completion is still signalled, and the exchange
/// succeeds with the records sent so far. If both directions fail, the inbound error wins since
/// it carries the server's status.
pub async fn exchange<C>(
    channel: &C,
    metadata: CallMetadata,
    records: Vec<EmployeeRequest>,
) -> Result<Exchange, CallError>
where
    C: EmployeeChannel + ?Sized,
{
    let (mut sink, outbound_stream) = request_stream::<EmployeeRequest>();
    let request = metadata.into_request(outbound_stream)?;
    let total = records.len();

    let outbound = async move {
        let mut failure = None;
        for record in records {
            match sink.send(record).await {
                Ok(()) => {}
                Err(CallError::StreamClosed) => {
                    debug!(sent = sink.sent(), total, "Server stopped reading records");
                    break;
                }
                Err(e) => {
                    failure = Some(e);
                    break;
                }
            }
        }
        sink.complete()?;

        if let Some(e) = failure {
            return Err(e);
        }
        Ok::<_, CallError>(sink.sent())
    };

    let inbound = async {
        let response = channel.save_all(request).await?;

        let headers = CallMetadata::from_metadata_map(response.metadata());
        for (key, value) in headers.iter() {
            debug!(key, value, "Response header");
        }

        let mut stream = response.into_inner();
        let mut received = Vec::new();
        while let Some(message) = stream.next().await {
            received.push(message?);
        }

        Ok::<_, CallError>((headers, received))
    };

    let (outbound, inbound) = tokio::join!(outbound, inbound);

    match (outbound, inbound) {
        (Ok(sent), Ok((headers, received))) => {
            info!(sent, received = received.len(), "Exchange finished");
            Ok(Exchange {
                sent,
                headers,
                received,
            })
        }
        (outbound, Err(e)) => {
            warn!(
                total,
                sent = outbound.as_ref().ok().copied(),
                error = %e,
                "Inbound stream failed"
            );
            Err(e)
        }
        (Err(e), Ok((_, received))) => {
            warn!(
                total,
                received = received.len(),
                error = %e,
                "Outbound stream failed"
            );
            Err(e)
        }
    }
}
