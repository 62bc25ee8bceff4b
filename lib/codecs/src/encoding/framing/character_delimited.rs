use bytes::{BufMut, BytesMut};
use tokio_util::codec::Encoder;

use crate::decoding::BoxedFramingError;

/// An encoder for handling bytes that are delimited by (a) chosen character(s).
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct CharacterDelimitedEncoder {
    /// The character that delimits byte sequences.
    pub delimiter: u8,
}

impl CharacterDelimitedEncoder {
    /// Creates a `CharacterDelimitedEncoder` with the specified delimiter.
    pub const fn new(delimiter: u8) -> Self {
        Self { delimiter }
    }
}

impl Encoder<()> for CharacterDelimitedEncoder {
    type Error = BoxedFramingError;

    fn encode(&mut self, _: (), buffer: &mut BytesMut) -> Result<(), BoxedFramingError> {
        buffer.put_u8(self.delimiter);
        Ok(())
    }
}
