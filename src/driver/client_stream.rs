use tracing::{debug, info};

use crate::channel::EmployeeChannel;
use crate::driver::error::CallError;
use crate::driver::sink::request_stream;
use crate::employee_proto::{AddPhotoRequest, AddPhotoResponse};
use crate::metadata::CallMetadata;
use crate::payload::ChunkSource;

/// Result of a completed upload.
#[derive(Debug, Clone, PartialEq)]
pub struct Upload {
    pub response: AddPhotoResponse,
    pub chunks: usize,
    pub bytes: usize,
}

/// Stream `source` to the server one chunk per message, complete the stream, then return the
/// server's single response.
///
/// Chunks are sent in read order and the completion signal is sent exactly once, also for an
/// empty source. The call is polled alongside the sends so the transport keeps moving.
///
/// A server may answer before it has read everything. Once it has, the closed request stream
/// means the peer is finished: sending stops and its answer is returned. A read failure drops the
/// call without waiting for a response.
pub async fn upload<C, S>(
    channel: &C,
    metadata: CallMetadata,
    source: &mut S,
) -> Result<Upload, CallError>
where
    C: EmployeeChannel + ?Sized,
    S: ChunkSource + ?Sized,
{
    let (mut sink, outbound) = request_stream::<AddPhotoRequest>();
    let request = metadata.into_request(outbound)?;
    let mut bytes = 0usize;

    let response = {
        let send = async {
            while let Some(data) = source.next_chunk().await? {
                let len = data.len();
                sink.send(AddPhotoRequest { data }).await?;
                bytes += len;
                debug!(chunk = sink.sent(), bytes, "Sent upload chunk");
            }
            sink.complete()?;
            Ok::<_, CallError>(())
        };
        let call = async { channel.add_photo(request).await.map_err(CallError::from) };
        tokio::pin!(send, call);

        tokio::select! {
            sent = &mut send => match sent {
                Ok(()) => call.await,
                Err(CallError::StreamClosed) => {
                    debug!("Server stopped reading the upload");
                    call.await
                }
                Err(e) => Err(e),
            },
            response = &mut call => response,
        }
    }?;

    if !sink.is_completed() {
        debug!(chunks = sink.sent(), "Server answered before the upload completed");
        sink.complete()?;
    }

    let response = response.into_inner();
    let chunks = sink.sent();

    info!(chunks, bytes, is_ok = response.is_ok, "Upload finished");

    Ok(Upload {
        response,
        chunks,
        bytes,
    })
}
