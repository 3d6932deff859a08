use bytes::{BufMut, Bytes, BytesMut};
use futures::Stream;
use tracing::trace;

use crate::protocol::{BoxError, SplitError};
use crate::split::SplitStream;
use crate::split::window::RingWindow;

/// Receives the output of a [`Split`].
///
/// `receive(bytes, false)` delivers more content of the open segment; `receive(bytes, true)`
/// delivers its final content (possibly empty) and closes it. The next call belongs to the next
/// segment.
pub trait SegmentReceiver {
    fn receive(&mut self, bytes: Bytes, last: bool);
}

impl<F: FnMut(Bytes, bool)> SegmentReceiver for F {
    fn receive(&mut self, bytes: Bytes, last: bool) {
        self(bytes, last);
    }
}

/// Push-based splitter of a byte stream into delimiter-separated segments.
///
/// Input is processed byte by byte. A byte enters the sliding window; once the window is full the
/// byte it displaces can no longer be part of a delimiter and moves into the segment buffer. When
/// the window equals the delimiter the buffered content closes the current segment and the window
/// is reset. Whatever the buffer holds at the end of a [`push`](Split::push) is delivered right
/// away, so a segment never has to fit in memory.
#[derive(Debug)]
pub struct Split {
    delimiter: Bytes,
    window: RingWindow,
    buffer: BytesMut,
}

impl Split {
    pub fn new(delimiter: impl Into<Bytes>) -> Result<Self, SplitError> {
        let delimiter = delimiter.into();
        if delimiter.is_empty() {
            return Err(SplitError::EmptyDelimiter);
        }

        let window = RingWindow::new(delimiter.len());
        Ok(Self { delimiter, window, buffer: BytesMut::new() })
    }

    pub fn delimiter(&self) -> &[u8] {
        &self.delimiter
    }

    /// Feeds the next chunk of input.
    pub fn push<R: SegmentReceiver + ?Sized>(&mut self, chunk: &[u8], receiver: &mut R) {
        for &byte in chunk {
            if let Some(oldest) = self.window.push(byte) {
                self.buffer.put_u8(oldest);
            }

            if self.window.matches(&self.delimiter) {
                trace!(size = self.buffer.len(), "delimiter matched, closing segment");
                receiver.receive(self.buffer.split().freeze(), true);
                self.window.clear();
            }
        }

        if !self.buffer.is_empty() {
            receiver.receive(self.buffer.split().freeze(), false);
        }
    }

    /// Signals the end of input: the bytes still held by the window never completed a delimiter
    /// and become the trailing content of the last segment, which is then closed.
    pub fn complete<R: SegmentReceiver + ?Sized>(&mut self, receiver: &mut R) {
        self.buffer.extend(self.window.iter());
        self.window.clear();
        receiver.receive(self.buffer.split().freeze(), true);
    }

    /// Abandons the open segment after an upstream failure; nothing of it is delivered.
    pub fn abort(&mut self) {
        self.window.clear();
        self.buffer.clear();
    }

    /// Splits `upstream` into a stream of lazily pulled segments.
    pub fn split<S, E>(self, upstream: S) -> SplitStream
    where
        S: Stream<Item = Result<Bytes, E>> + Send + 'static,
        E: Into<BoxError> + 'static,
    {
        SplitStream::new(self, upstream)
    }
}
