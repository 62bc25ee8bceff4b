use bytes::BytesMut;
use tokio_util::codec::Encoder;

use super::CharacterDelimitedEncoder;
use crate::decoding::BoxedFramingError;

/// An encoder for handling bytes that are delimited by (a) newline(s).
#[derive(Debug, Clone, Copy)]
pub struct NewlineDelimitedEncoder(CharacterDelimitedEncoder);

impl Default for NewlineDelimitedEncoder {
    fn default() -> Self {
        Self::new()
    }
}

impl NewlineDelimitedEncoder {
    /// Creates a new `NewlineDelimitedEncoder`.
    pub const fn new() -> Self {
        Self(CharacterDelimitedEncoder::new(b'\n'))
    }
}

impl Encoder<()> for NewlineDelimitedEncoder {
    type Error = BoxedFramingError;

    fn encode(&mut self, _: (), buffer: &mut BytesMut) -> Result<(), BoxedFramingError> {
        self.0.encode((), buffer)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn encode_appends_newline() {
        let mut codec = NewlineDelimitedEncoder::new();
        let mut buffer = BytesMut::from(r#"{"a":1}"#);
        codec.encode((), &mut buffer).unwrap();

        assert_eq!(buffer, "{\"a\":1}\n");
    }
}
