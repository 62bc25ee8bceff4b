use std::sync::Arc;

use ::codecs::{
    decoding::{BoxedFramingError, Framer, FramingConfig, JsonDecoder, JsonDecoderConfig},
    LogEvent, StreamDecodingError,
};
use bytes::{Bytes, BytesMut};
use snafu::Snafu;

use super::EmitDiagnostics;
use crate::internal_events::{DecoderFramingError, EventsReceived};

/// An error that occurred while reading events from a byte stream.
///
/// Payloads that are not JSON are not errors: they decode to fallback events.
#[derive(Debug, Snafu)]
pub enum DecoderError {
    /// The byte stream could not be split into frames.
    #[snafu(context(false), display("failed framing bytes: {source}"))]
    Framing {
        /// The underlying framing error.
        source: BoxedFramingError,
    },

    /// Reading from the underlying byte stream failed.
    #[snafu(context(false), display("failed reading input: {source}"))]
    Io {
        /// The underlying I/O error.
        source: std::io::Error,
    },
}

impl StreamDecodingError for DecoderError {
    fn can_continue(&self) -> bool {
        match self {
            Self::Framing { source } => source.can_continue(),
            Self::Io { .. } => false,
        }
    }
}

/// A decoder that can decode structured events from a byte stream / byte
/// messages.
#[derive(Debug, Clone)]
pub struct Decoder {
    /// The framer being used.
    pub framer: Framer,
    /// The JSON decoder being used.
    pub decoder: JsonDecoder,
}

impl Default for Decoder {
    fn default() -> Self {
        Self::from_config(&FramingConfig::default(), &JsonDecoderConfig::default())
    }
}

impl Decoder {
    /// Creates a new `Decoder` with the specified `Framer` to produce byte
    /// frames from the byte stream / byte messages and `JsonDecoder` to turn
    /// each frame into an event.
    pub const fn new(framer: Framer, decoder: JsonDecoder) -> Self {
        Self { framer, decoder }
    }

    /// Builds a `Decoder` whose diagnostics are reported as internal events.
    pub fn from_config(framing: &FramingConfig, decoding: &JsonDecoderConfig) -> Self {
        Self::new(
            framing.build(),
            JsonDecoder::with_diagnostics(decoding.charset, Arc::new(EmitDiagnostics)),
        )
    }

    /// Handles the framing result and decodes the frame into an event.
    ///
    /// Emits logs if framing failed.
    fn handle_framing_result(
        &mut self,
        frame: Result<Option<Bytes>, BoxedFramingError>,
    ) -> Result<Option<LogEvent>, DecoderError> {
        let frame = frame.map_err(|error| {
            emit!(DecoderFramingError { error: &error });
            DecoderError::from(error)
        })?;

        Ok(frame.map(|frame| self.decode_frame(&frame)))
    }

    /// Decodes a single frame. Never fails: frames that are not JSON become
    /// fallback events.
    pub fn decode_frame(&self, frame: &[u8]) -> LogEvent {
        let event = self.decoder.decode(frame).into_event();
        emit!(EventsReceived {
            count: 1,
            byte_size: frame.len(),
        });
        event
    }
}

impl tokio_util::codec::Decoder for Decoder {
    type Item = LogEvent;
    type Error = DecoderError;

    fn decode(&mut self, buf: &mut BytesMut) -> Result<Option<Self::Item>, Self::Error> {
        let frame = self.framer.decode(buf);
        self.handle_framing_result(frame)
    }

    fn decode_eof(&mut self, buf: &mut BytesMut) -> Result<Option<Self::Item>, Self::Error> {
        let frame = self.framer.decode_eof(buf);
        self.handle_framing_result(frame)
    }
}
