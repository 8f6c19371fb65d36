//! Byte-to-line decoding for chunked text bodies.
//!
//! Transport chunks are split on `\n` at the byte level and each completed
//! line is decoded on its own. A newline byte never occurs inside a UTF-8
//! multi-byte sequence, so a character cut across two chunks is reassembled
//! before it is decoded.

use std::collections::VecDeque;
use std::pin::Pin;
use std::task::{Context, Poll};

use bytes::{Buf, BytesMut};
use futures::Stream;

/// Incremental line splitter.
#[derive(Debug, Default)]
pub struct LineDecoder {
    /// Bytes of the trailing line that has no terminator yet.
    buffer: BytesMut,
}

impl LineDecoder {
    pub fn new() -> Self {
        Self::default()
    }

    /// Append a transport chunk and return every line it completed, in order.
    ///
    /// Returned lines have the terminator removed, including a `\r` preceding
    /// the `\n`. Empty lines are returned as empty strings.
    pub fn push(&mut self, chunk: &[u8]) -> Vec<String> {
        self.buffer.extend_from_slice(chunk);
        let mut lines = Vec::new();

        while let Some(pos) = self.buffer.iter().position(|&b| b == b'\n') {
            let line = self.buffer.split_to(pos);
            self.buffer.advance(1);

            let line = line.strip_suffix(b"\r").unwrap_or(&line[..]);
            lines.push(String::from_utf8_lossy(line).into_owned());
        }

        lines
    }

    /// Bytes held back waiting for a terminator.
    pub fn pending(&self) -> &[u8] {
        &self.buffer
    }

    /// Drop the unterminated remainder, returning how many bytes were lost.
    pub fn discard(&mut self) -> usize {
        let len = self.buffer.len();
        self.buffer.clear();
        len
    }
}

/// Stream wrapper that yields completed lines from a byte stream.
///
/// Transport errors are passed through unchanged. When the inner stream ends,
/// an unterminated trailing line is discarded.
pub struct LineStream<S> {
    inner: S,
    decoder: LineDecoder,
    pending_lines: VecDeque<String>,
    finished: bool,
}

impl<S> LineStream<S> {
    pub fn new(inner: S) -> Self {
        Self {
            inner,
            decoder: LineDecoder::new(),
            pending_lines: VecDeque::new(),
            finished: false,
        }
    }
}

impl<S, B, E> Stream for LineStream<S>
where
    S: Stream<Item = Result<B, E>> + Unpin,
    B: AsRef<[u8]>,
{
    type Item = Result<String, E>;

    fn poll_next(mut self: Pin<&mut Self>, cx: &mut Context<'_>) -> Poll<Option<Self::Item>> {
        let this = &mut *self;

        // One chunk can hold several lines; drain those before pulling again.
        if let Some(line) = this.pending_lines.pop_front() {
            return Poll::Ready(Some(Ok(line)));
        }

        if this.finished {
            return Poll::Ready(None);
        }

        loop {
            match Pin::new(&mut this.inner).poll_next(cx) {
                Poll::Ready(Some(Ok(bytes))) => {
                    this.pending_lines.extend(this.decoder.push(bytes.as_ref()));

                    if let Some(line) = this.pending_lines.pop_front() {
                        return Poll::Ready(Some(Ok(line)));
                    }
                    // Chunk ended mid-line, keep pulling
                }
                Poll::Ready(Some(Err(e))) => {
                    return Poll::Ready(Some(Err(e)));
                }
                Poll::Ready(None) => {
                    this.finished = true;
                    let dropped = this.decoder.discard();
                    if dropped > 0 {
                        tracing::debug!(bytes = dropped, "discarding unterminated trailing line");
                    }
                    return Poll::Ready(None);
                }
                Poll::Pending => {
                    return Poll::Pending;
                }
            }
        }
    }
}

/// Create a line stream from a byte stream.
pub fn line_stream<S, B, E>(stream: S) -> LineStream<S>
where
    S: Stream<Item = Result<B, E>> + Unpin,
    B: AsRef<[u8]>,
{
    LineStream::new(stream)
}
