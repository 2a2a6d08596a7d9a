use std::collections::VecDeque;
use std::pin::Pin;
use std::task::{Context, Poll};

use futures_util::Stream;

use crate::errors::ChatError;
use crate::protocol::frame::{parse_line, Frame};

const REPLACEMENT: char = '\u{FFFD}';

/// Incremental UTF-8 decoder that carries split multi-byte sequences over to
/// the next chunk. Invalid bytes become U+FFFD.
#[derive(Debug, Default)]
struct Utf8Carry {
    pending: Vec<u8>,
}

impl Utf8Carry {
    fn decode(&mut self, chunk: &[u8], out: &mut String) {
        let owned;
        let mut bytes: &[u8] = if self.pending.is_empty() {
            chunk
        } else {
            self.pending.extend_from_slice(chunk);
            owned = std::mem::take(&mut self.pending);
            &owned
        };

        loop {
            match std::str::from_utf8(bytes) {
                Ok(valid) => {
                    out.push_str(valid);
                    return;
                }
                Err(err) => {
                    let (valid, rest) = bytes.split_at(err.valid_up_to());
                    // `valid_up_to` marks the end of a well-formed prefix.
                    out.push_str(std::str::from_utf8(valid).unwrap_or_default());
                    match err.error_len() {
                        Some(len) => {
                            out.push(REPLACEMENT);
                            bytes = &rest[len..];
                        }
                        None => {
                            self.pending.extend_from_slice(rest);
                            return;
                        }
                    }
                }
            }
        }
    }

    fn flush(&mut self, out: &mut String) {
        if !self.pending.is_empty() {
            out.push_str(&String::from_utf8_lossy(&self.pending));
            self.pending.clear();
        }
    }
}

/// Turns arbitrarily segmented bytes into frames, one per complete line.
#[derive(Debug, Default)]
pub struct LineDecoder {
    utf8: Utf8Carry,
    buffer: String,
}

impl LineDecoder {
    pub fn new() -> Self {
        Self::default()
    }

    /// Feeds one chunk and returns the frames of every line it completed.
    pub fn push(&mut self, chunk: &[u8]) -> Vec<Frame> {
        self.utf8.decode(chunk, &mut self.buffer);

        let Some(last_newline) = self.buffer.rfind('\n') else {
            return Vec::new();
        };
        let rest = self.buffer.split_off(last_newline + 1);
        let complete = std::mem::replace(&mut self.buffer, rest);
        complete.split('\n').filter_map(parse_line).collect()
    }

    /// Flushes whatever is left once the byte stream has ended. The last
    /// record may arrive without a trailing newline.
    pub fn finish(&mut self) -> Vec<Frame> {
        self.utf8.flush(&mut self.buffer);
        let remainder = std::mem::take(&mut self.buffer);
        if remainder.trim().is_empty() {
            return Vec::new();
        }
        remainder.split('\n').filter_map(parse_line).collect()
    }

    /// Bytes of text still waiting for a newline.
    pub fn buffered_len(&self) -> usize {
        self.buffer.len() + self.utf8.pending.len()
    }
}

/// Stream adapter that converts a response body into [`Frame`]s.
///
/// Frames come out in arrival order. A transport error is forwarded once and
/// ends the stream; per-line decode problems never do.
pub struct FrameStream<S> {
    inner: S,
    decoder: LineDecoder,
    ready: VecDeque<Frame>,
    done: bool,
}

impl<S> FrameStream<S> {
    pub fn new(inner: S) -> Self {
        Self {
            inner,
            decoder: LineDecoder::new(),
            ready: VecDeque::new(),
            done: false,
        }
    }
}

impl<S, B> Stream for FrameStream<S>
where
    S: Stream<Item = Result<B, ChatError>> + Unpin,
    B: AsRef<[u8]>,
{
    type Item = Result<Frame, ChatError>;

    fn poll_next(mut self: Pin<&mut Self>, cx: &mut Context<'_>) -> Poll<Option<Self::Item>> {
        let this = &mut *self;
        loop {
            if let Some(frame) = this.ready.pop_front() {
                return Poll::Ready(Some(Ok(frame)));
            }
            if this.done {
                return Poll::Ready(None);
            }

            match Pin::new(&mut this.inner).poll_next(cx) {
                Poll::Ready(Some(Ok(chunk))) => {
                    let frames = this.decoder.push(chunk.as_ref());
                    this.ready.extend(frames);
                }
                Poll::Ready(Some(Err(err))) => {
                    this.done = true;
                    return Poll::Ready(Some(Err(err)));
                }
                Poll::Ready(None) => {
                    let frames = this.decoder.finish();
                    this.ready.extend(frames);
                    this.done = true;
                }
                Poll::Pending => return Poll::Pending,
            }
        }
    }
}
