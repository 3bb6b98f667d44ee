//! Streaming backpressure via bounded channels.
//!
//! Wraps a chunk stream in a bounded `tokio::sync::mpsc::channel` so the
//! producer suspends when the consumer falls behind. Without this, a fast
//! provider can fill unbounded memory while a slow consumer (rate-limited
//! client, busy UI thread) catches up. The buffer holds chunks, never the
//! full response.
//!
//! Applied by the [`Dispatcher`](super::Dispatcher) to `stream_chat`
//! results. Dropping the returned stream stops the producer task, which
//! releases the adapter's underlying connection — that is the cancellation
//! path; no separate token exists.

use futures_util::StreamExt;
use tokio_stream::wrappers::ReceiverStream;

use crate::adapter::ChunkStream;

/// Default number of chunks buffered between producer and consumer.
pub const DEFAULT_STREAM_BUFFER: usize = 64;

/// Wrap a chunk stream in a bounded channel for backpressure.
///
/// Spawns a producer task that pulls from `inner` and sends chunks through
/// a bounded `mpsc` channel. When the channel is full, the producer waits
/// until the consumer reads. If the consumer drops the stream, the
/// producer stops.
///
/// # Panics
///
/// Requires a tokio runtime context (called within an async fn).
pub(crate) fn bounded_chunk_stream(inner: ChunkStream, buffer_size: usize) -> ChunkStream {
    let (tx, rx) = tokio::sync::mpsc::channel(buffer_size);

    tokio::spawn(async move {
        let mut inner = inner;
        while let Some(chunk) = inner.next().await {
            if tx.send(chunk).await.is_err() {
                break; // receiver dropped
            }
        }
    });

    Box::pin(ReceiverStream::new(rx))
}
