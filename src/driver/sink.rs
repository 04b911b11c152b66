use std::pin::Pin;
use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};
use std::task::{Context, Poll};

use futures::Stream;
use tokio::sync::mpsc;
use tokio_stream::wrappers::ReceiverStream;
use tracing::debug;

use crate::driver::error::CallError;

/// Create the send side of a streaming call and the stream handed to the channel.
///
/// At most one message is in flight: [`RequestSink::send`] suspends until the transport has taken
/// the previous one.
pub fn request_stream<T>() -> (RequestSink<T>, RequestStream<T>)
where
    T: Send + 'static,
{
    let (sender, receiver) = mpsc::channel(1);
    let completion = Completion::default();
    let sink = RequestSink {
        sender: Some(sender),
        sent: 0,
        completion: completion.clone(),
    };
    let stream = RequestStream {
        inner: ReceiverStream::new(receiver),
        completion,
    };
    (sink, stream)
}

/// Shared flag recording that the client completed its side explicitly.
#[derive(Debug, Clone, Default)]
pub struct Completion(Arc<AtomicBool>);

impl Completion {
    pub fn is_completed(&self) -> bool {
        self.0.load(Ordering::Acquire)
    }

    fn mark(&self) {
        self.0.store(true, Ordering::Release);
    }
}

/// The receiving half of [`request_stream`], consumed by the transport.
///
/// The stream ends both on [`RequestSink::complete`] and when the sink is dropped;
/// [`RequestStream::completion`] tells the two apart.
#[derive(Debug)]
pub struct RequestStream<T> {
    inner: ReceiverStream<T>,
    completion: Completion,
}

impl<T> RequestStream<T> {
    /// Handle that outlives the stream and reports whether the sender completed explicitly.
    pub fn completion(&self) -> Completion {
        self.completion.clone()
    }
}

impl<T> Stream for RequestStream<T> {
    type Item = T;

    fn poll_next(mut self: Pin<&mut Self>, cx: &mut Context<'_>) -> Poll<Option<T>> {
        Pin::new(&mut self.inner).poll_next(cx)
    }

    fn size_hint(&self) -> (usize, Option<usize>) {
        self.inner.size_hint()
    }
}

/// The client's send cursor on a streaming call.
///
/// The stream ends for the server once [`RequestSink::complete`] is called. Dropping the sink
/// without completing also ends it; this is how an abandoned call releases the stream.
#[derive(Debug)]
pub struct RequestSink<T> {
    sender: Option<mpsc::Sender<T>>,
    sent: usize,
    completion: Completion,
}

impl<T> RequestSink<T> {
    /// Send one message, waiting until the transport accepts it.
    ///
    /// # Errors
    ///
    /// * [`CallError::Usage`] if the sink was already completed.
    /// * [`CallError::StreamClosed`] if the receiving side is gone.
    pub async fn send(&mut self, message: T) -> Result<(), CallError> {
        let sender = self
            .sender
            .as_ref()
            .ok_or(CallError::Usage("send after stream completion"))?;

        sender
            .send(message)
            .await
            .map_err(|_| CallError::StreamClosed)?;

        self.sent += 1;
        Ok(())
    }

    /// Signal that no more messages will be sent. Must be called exactly once.
    pub fn complete(&mut self) -> Result<(), CallError> {
        match self.sender.take() {
            Some(_) => {
                self.completion.mark();
                debug!(sent = self.sent, "Outbound stream completed");
                Ok(())
            }
            None => Err(CallError::Usage("stream completed twice")),
        }
    }

    /// Number of messages accepted so far.
    pub fn sent(&self) -> usize {
        self.sent
    }

    pub fn is_completed(&self) -> bool {
        self.sender.is_none()
    }
}
