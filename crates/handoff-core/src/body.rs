//! Body primitives.
//!
//! Incoming bodies are in-memory buffers handed out as zero-copy chunk
//! streams. Outgoing bodies are the writing half of a bounded frame pipe
//! whose reading half is drained by the [`Transport`](crate::Transport).

use std::pin::Pin;
use std::task::{Context, Poll};

use bytes::{Bytes, BytesMut};
use futures_core::Stream;
use tokio::sync::mpsc;
use tracing::{debug, trace};

use crate::error::{BodyError, StreamError};
use crate::fields::Fields;

/// Default chunk size for breaking buffered bodies into stream chunks (64 KB).
pub const DEFAULT_CHUNK_SIZE: usize = 64 * 1024;

/// A type-erased async stream of byte chunks.
pub type ByteStream = Pin<Box<dyn Stream<Item = Bytes> + Send>>;

/// Yields a `Bytes` buffer in fixed-size chunks without copying.
///
/// Each `poll_next` returns a single `Bytes::slice()` sharing the
/// original allocation's refcount and advances the offset.
pub(crate) struct ChunkedBytesStream {
    buf: Bytes,
    chunk_size: usize,
    offset: usize,
}

impl ChunkedBytesStream {
    pub fn new(buf: Bytes, chunk_size: usize) -> Self {
        assert!(chunk_size > 0, "chunk_size must be > 0");
        Self {
            buf,
            chunk_size,
            offset: 0,
        }
    }
}

impl Stream for ChunkedBytesStream {
    type Item = Bytes;

    fn poll_next(self: Pin<&mut Self>, _cx: &mut Context<'_>) -> Poll<Option<Self::Item>> {
        let this = self.get_mut();
        if this.offset >= this.buf.len() {
            return Poll::Ready(None);
        }
        let end = std::cmp::min(this.offset + this.chunk_size, this.buf.len());
        let chunk = this.buf.slice(this.offset..end);
        this.offset = end;
        Poll::Ready(Some(chunk))
    }
}

/// One unit travelling from an [`OutgoingBody`] to its transport drain.
#[derive(Debug)]
pub(crate) enum BodyFrame {
    Data(Bytes),
    Finished(Option<Fields>),
}

/// What the transport collected from a finished body.
#[derive(Debug)]
pub(crate) struct CollectedBody {
    pub data: Bytes,
    pub trailers: Option<Fields>,
}

/// The write-only body of an [`OutgoingResponse`](crate::OutgoingResponse).
///
/// Bytes are written through the [`OutputStream`] returned by
/// [`write()`](OutgoingBody::write). The stream borrows the body, so it
/// must be gone before [`finish()`](OutgoingBody::finish) can consume the
/// body; nothing can be written once the body is sealed.
#[derive(Debug)]
pub struct OutgoingBody {
    tx: mpsc::Sender<BodyFrame>,
    pending: BytesMut,
    budget: usize,
}

impl OutgoingBody {
    pub(crate) fn new(tx: mpsc::Sender<BodyFrame>, budget: usize) -> Self {
        Self {
            tx,
            pending: BytesMut::with_capacity(budget),
            budget,
        }
    }

    /// Borrow the body's output stream.
    pub fn write(&mut self) -> OutputStream<'_> {
        OutputStream { body: self }
    }

    /// Seal the body, flushing any buffered bytes and attaching `trailers`.
    ///
    /// Trailers become immutable once sent.
    ///
    /// ```
    /// # async fn respond(mut body: handoff_core::OutgoingBody) -> Result<(), handoff_core::StreamError> {
    /// body.write().blocking_write_and_flush(b"done").await?;
    /// body.finish(None).await?;
    /// # Ok(())
    /// # }
    /// ```
    ///
    /// `finish` consumes the body, so a write after it does not compile:
    ///
    /// ```compile_fail,E0382
    /// # async fn respond(mut body: handoff_core::OutgoingBody) -> Result<(), handoff_core::StreamError> {
    /// body.finish(None).await?;
    /// body.write().write(b"late")?;
    /// # Ok(())
    /// # }
    /// ```
    pub async fn finish(mut self, trailers: Option<Fields>) -> Result<(), StreamError> {
        self.flush_pending().await?;
        let trailers = trailers.map(Fields::into_immutable);
        let has_trailers = trailers.is_some();
        self.tx
            .send(BodyFrame::Finished(trailers))
            .await
            .map_err(|_| StreamError::Closed)?;
        debug!(has_trailers, "outgoing body finished");
        Ok(())
    }

    async fn flush_pending(&mut self) -> Result<(), StreamError> {
        if self.pending.is_empty() {
            return Ok(());
        }
        let chunk = self.pending.split().freeze();
        trace!(len = chunk.len(), "flushing body chunk");
        self.tx
            .send(BodyFrame::Data(chunk))
            .await
            .map_err(|_| StreamError::Closed)
    }
}

/// A buffered writer over an [`OutgoingBody`].
///
/// At most `write_budget` bytes may sit in the buffer between flushes.
/// Flushing hands the buffer to the transport and suspends while the
/// transport pipe is full.
#[derive(Debug)]
pub struct OutputStream<'a> {
    body: &'a mut OutgoingBody,
}

impl OutputStream<'_> {
    /// How many bytes may be written before the next flush.
    pub fn check_write(&self) -> Result<usize, StreamError> {
        if self.body.tx.is_closed() {
            return Err(StreamError::Closed);
        }
        Ok(self.body.budget - self.body.pending.len())
    }

    /// Buffer `bytes` without flushing.
    pub fn write(&mut self, bytes: &[u8]) -> Result<(), StreamError> {
        let permitted = self.check_write()?;
        if bytes.len() > permitted {
            return Err(StreamError::BudgetExceeded {
                requested: bytes.len(),
                permitted,
            });
        }
        self.body.pending.extend_from_slice(bytes);
        Ok(())
    }

    /// Hand every buffered byte to the transport.
    pub async fn flush(&mut self) -> Result<(), StreamError> {
        self.body.flush_pending().await
    }

    /// Write `bytes` of any length and return once all of them have been
    /// handed to the transport.
    pub async fn blocking_write_and_flush(&mut self, bytes: &[u8]) -> Result<(), StreamError> {
        self.flush().await?;
        for chunk in bytes.chunks(self.body.budget) {
            self.write(chunk)?;
            self.flush().await?;
        }
        Ok(())
    }
}

/// Collect a body pipe until its finish frame, enforcing `limit`.
///
/// Returning early drops the receiver, which closes the pipe for the writer.
pub(crate) async fn drain(
    mut rx: mpsc::Receiver<BodyFrame>,
    limit: usize,
) -> Result<CollectedBody, BodyError> {
    let mut data = BytesMut::new();
    while let Some(frame) = rx.recv().await {
        match frame {
            BodyFrame::Data(chunk) => {
                if data.len() + chunk.len() > limit {
                    debug!(limit, "body exceeds limit, closing pipe");
                    return Err(BodyError::TooLarge { limit });
                }
                data.extend_from_slice(&chunk);
            }
            BodyFrame::Finished(trailers) => {
                return Ok(CollectedBody {
                    data: data.freeze(),
                    trailers,
                });
            }
        }
    }
    Err(BodyError::Unfinished)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::HeaderError;

    fn collect_sync(stream: &mut ChunkedBytesStream) -> Vec<Bytes> {
        let mut chunks = Vec::new();
        let waker = std::task::Waker::noop();
        let mut cx = Context::from_waker(waker);
        loop {
            match Pin::new(&mut *stream).poll_next(&mut cx) {
                Poll::Ready(Some(chunk)) => chunks.push(chunk),
                Poll::Ready(None) => break,
                Poll::Pending => panic!("ChunkedBytesStream should never pend"),
            }
        }
        chunks
    }

    fn pipe(budget: usize) -> (OutgoingBody, mpsc::Receiver<BodyFrame>) {
        let (tx, rx) = mpsc::channel(64);
        (OutgoingBody::new(tx, budget), rx)
    }

    fn data_frames(rx: &mut mpsc::Receiver<BodyFrame>) -> Vec<Bytes> {
        let mut frames = Vec::new();
        while let Ok(BodyFrame::Data(chunk)) = rx.try_recv() {
            frames.push(chunk);
        }
        frames
    }

    #[test]
    fn chunked_stream_remainder() {
        let data = Bytes::from(vec![0xBB; 3000]);
        let mut stream = ChunkedBytesStream::new(data, 1024);
        let chunks = collect_sync(&mut stream);

        assert_eq!(chunks.len(), 3);
        assert_eq!(chunks[0].len(), 1024);
        assert_eq!(chunks[1].len(), 1024);
        assert_eq!(chunks[2].len(), 952);
    }

    #[test]
    fn chunked_stream_empty_body() {
        let mut stream = ChunkedBytesStream::new(Bytes::new(), 1024);
        assert!(collect_sync(&mut stream).is_empty());
    }

    #[test]
    fn chunked_stream_is_zero_copy() {
        let original = Bytes::from(vec![0xFF; 8192]);
        let ptr_before = original.as_ptr();

        let mut stream = ChunkedBytesStream::new(original, 4096);
        let chunks = collect_sync(&mut stream);

        assert_eq!(chunks[0].as_ptr(), ptr_before);
        assert_eq!(chunks[1].as_ptr(), unsafe { ptr_before.add(4096) });
    }

    #[test]
    #[should_panic(expected = "chunk_size must be > 0")]
    fn chunked_stream_zero_chunk_size_panics() {
        let _ = ChunkedBytesStream::new(Bytes::new(), 0);
    }

    #[test]
    fn check_write_shrinks_as_bytes_are_buffered() {
        let (mut body, _rx) = pipe(8);
        let mut stream = body.write();
        assert_eq!(stream.check_write(), Ok(8));
        stream.write(b"abc").unwrap();
        assert_eq!(stream.check_write(), Ok(5));
    }

    #[test]
    fn write_over_budget_is_rejected() {
        let (mut body, _rx) = pipe(4);
        let mut stream = body.write();
        stream.write(b"ab").unwrap();
        assert_eq!(
            stream.write(b"abc"),
            Err(StreamError::BudgetExceeded {
                requested: 3,
                permitted: 2
            })
        );
    }

    #[test]
    fn write_after_transport_gone_is_closed() {
        let (mut body, rx) = pipe(4);
        drop(rx);
        assert_eq!(body.write().check_write(), Err(StreamError::Closed));
        assert_eq!(body.write().write(b"a"), Err(StreamError::Closed));
    }

    #[tokio::test]
    async fn blocking_write_and_flush_splits_by_budget() {
        let (mut body, mut rx) = pipe(4);
        body.write()
            .blocking_write_and_flush(b"0123456789")
            .await
            .unwrap();

        let frames = data_frames(&mut rx);
        assert_eq!(frames, vec![
            Bytes::from("0123"),
            Bytes::from("4567"),
            Bytes::from("89")
        ]);
    }

    #[tokio::test]
    async fn flush_sends_buffered_bytes_once() {
        let (mut body, mut rx) = pipe(16);
        let mut stream = body.write();
        stream.write(b"hello ").unwrap();
        stream.write(b"world").unwrap();
        stream.flush().await.unwrap();
        stream.flush().await.unwrap();

        assert_eq!(data_frames(&mut rx), vec![Bytes::from("hello world")]);
    }

    #[tokio::test]
    async fn finish_flushes_then_seals_with_trailers() {
        let (mut body, mut rx) = pipe(16);
        body.write().write(b"tail").unwrap();
        let trailers = Fields::from_list([("x-checksum", "abc")]).unwrap();
        body.finish(Some(trailers)).await.unwrap();

        match rx.recv().await {
            Some(BodyFrame::Data(chunk)) => assert_eq!(chunk, "tail"),
            other => panic!("expected data frame, got {other:?}"),
        }
        match rx.recv().await {
            Some(BodyFrame::Finished(Some(mut trailers))) => {
                assert_eq!(trailers.first("x-checksum"), Some(b"abc".as_slice()));
                assert_eq!(trailers.append("x-more", "1"), Err(HeaderError::Immutable));
            }
            other => panic!("expected finish frame, got {other:?}"),
        }
        // The pipe ends after finish: the body was consumed.
        assert!(rx.recv().await.is_none());
    }

    #[tokio::test]
    async fn finish_on_closed_pipe_fails() {
        let (body, rx) = pipe(16);
        drop(rx);
        assert_eq!(body.finish(None).await, Err(StreamError::Closed));
    }

    #[tokio::test]
    async fn drain_collects_until_finish() {
        let (tx, rx) = mpsc::channel(4);
        let collector = tokio::spawn(drain(rx, 1024));

        let mut body = OutgoingBody::new(tx, 3);
        body.write()
            .blocking_write_and_flush(b"Hello, drain!")
            .await
            .unwrap();
        body.finish(None).await.unwrap();

        let collected = collector.await.unwrap().unwrap();
        assert_eq!(collected.data, "Hello, drain!");
        assert!(collected.trailers.is_none());
    }

    #[tokio::test]
    async fn drain_reports_unfinished_body() {
        let (tx, rx) = mpsc::channel(4);
        let collector = tokio::spawn(drain(rx, 1024));

        let mut body = OutgoingBody::new(tx, 16);
        body.write().blocking_write_and_flush(b"partial").await.unwrap();
        drop(body);

        assert_eq!(collector.await.unwrap().unwrap_err(), BodyError::Unfinished);
    }

    #[tokio::test]
    async fn drain_rejects_oversized_body_and_closes_pipe() {
        let (tx, rx) = mpsc::channel(4);
        let collector = tokio::spawn(drain(rx, 4));

        let mut body = OutgoingBody::new(tx, 16);
        body.write().blocking_write_and_flush(b"too long").await.unwrap();

        assert_eq!(
            collector.await.unwrap().unwrap_err(),
            BodyError::TooLarge { limit: 4 }
        );
        assert_eq!(body.write().check_write(), Err(StreamError::Closed));
    }
}
