use bytes::{Bytes, BytesMut};
use serde::{Deserialize, Serialize};
use tokio_util::codec::Decoder;

use super::BoxedFramingError;

/// Config for [`BytesDecoder`]. It has no options.
#[derive(Debug, Clone, Default, Deserialize, Serialize)]
pub struct BytesDecoderConfig;

impl BytesDecoderConfig {
    /// Creates a new `BytesDecoderConfig`.
    pub const fn new() -> Self {
        Self
    }

    /// Build the `BytesDecoder` from this configuration.
    pub const fn build(&self) -> BytesDecoder {
        BytesDecoder::new()
    }
}

/// A framer that treats everything read until end of input as one payload.
///
/// Used when the whole input is a single JSON document, for example when a
/// pretty-printed file is piped in. An empty input still yields one empty
/// payload so that it gets its fallback event.
#[derive(Debug, Clone, Default)]
pub struct BytesDecoder {
    finished: bool,
}

impl BytesDecoder {
    /// Creates a new `BytesDecoder`.
    pub const fn new() -> Self {
        Self { finished: false }
    }
}

impl Decoder for BytesDecoder {
    type Item = Bytes;
    type Error = BoxedFramingError;

    fn decode(&mut self, _src: &mut BytesMut) -> Result<Option<Self::Item>, Self::Error> {
        Ok(None)
    }

    fn decode_eof(&mut self, src: &mut BytesMut) -> Result<Option<Self::Item>, Self::Error> {
        if std::mem::replace(&mut self.finished, true) {
            return Ok(None);
        }
        Ok(Some(src.split().freeze()))
    }
}
