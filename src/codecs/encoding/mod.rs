use ::codecs::{EventSink, LogEvent, NewlineDelimitedEncoder};
use bytes::{Bytes, BytesMut};
use tokio_util::codec::Encoder as _;

use crate::internal_events::EncoderFramingError;

/// Collects encoded events as newline delimited bytes, ready to be written
/// out.
#[derive(Debug, Default)]
pub struct FramedLines {
    framer: NewlineDelimitedEncoder,
    buffer: BytesMut,
    pending: usize,
}

impl FramedLines {
    /// Creates an empty buffer.
    pub fn new() -> Self {
        Self::default()
    }

    /// The number of events currently buffered.
    pub const fn pending(&self) -> usize {
        self.pending
    }

    /// Takes everything buffered so far.
    pub fn take(&mut self) -> Bytes {
        self.pending = 0;
        self.buffer.split().freeze()
    }
}

impl EventSink for FramedLines {
    fn on_event(&mut self, _event: &LogEvent, text: &str) {
        let len = self.buffer.len();
        self.buffer.extend_from_slice(text.as_bytes());
        match self.framer.encode((), &mut self.buffer) {
            Ok(()) => self.pending += 1,
            Err(error) => {
                emit!(EncoderFramingError { error: &error });
                self.buffer.truncate(len);
            }
        }
    }
}
