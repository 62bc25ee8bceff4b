use bytes::{Bytes, BytesMut};
use memchr::memchr;
use serde::{Deserialize, Serialize};
use tokio_util::codec::Decoder;
use tracing::{trace, warn};

use super::BoxedFramingError;

/// Config used to build a `CharacterDelimitedDecoder`.
#[derive(Debug, Clone, Deserialize, Serialize, PartialEq, Eq)]
pub struct CharacterDelimitedDecoderConfig {
    /// Options for the character delimited decoder.
    pub character_delimited: CharacterDelimitedDecoderOptions,
}

impl CharacterDelimitedDecoderConfig {
    /// Creates a `CharacterDelimitedDecoderConfig` with the specified delimiter and default max length.
    pub const fn new(delimiter: u8) -> Self {
        Self {
            character_delimited: CharacterDelimitedDecoderOptions::new(delimiter, None),
        }
    }

    /// Build the `CharacterDelimitedDecoder` from this configuration.
    pub fn build(&self) -> CharacterDelimitedDecoder {
        let CharacterDelimitedDecoderOptions {
            delimiter,
            max_length,
        } = self.character_delimited;
        max_length.map_or(CharacterDelimitedDecoder::new(delimiter), |max_length| {
            CharacterDelimitedDecoder::new_with_max_length(delimiter, max_length)
        })
    }
}

/// Options for building a `CharacterDelimitedDecoder`.
#[derive(Clone, Debug, Deserialize, Serialize, PartialEq, Eq)]
pub struct CharacterDelimitedDecoderOptions {
    /// The character that delimits byte sequences.
    #[serde(with = "ascii_char")]
    pub delimiter: u8,

    /// The maximum length of the byte buffer.
    ///
    /// This length does *not* include the trailing delimiter.
    ///
    /// By default, there is no maximum length enforced. Frames longer than
    /// the limit are discarded and never reach the JSON decoder.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub max_length: Option<usize>,
}

impl CharacterDelimitedDecoderOptions {
    /// Create a `CharacterDelimitedDecoderOptions` with a delimiter and optional max_length.
    pub const fn new(delimiter: u8, max_length: Option<usize>) -> Self {
        Self {
            delimiter,
            max_length,
        }
    }
}

/// A decoder for handling bytes that are delimited by (a) chosen character(s).
#[derive(Copy, Clone, Debug, Eq, PartialEq, Ord, PartialOrd, Hash)]
pub struct CharacterDelimitedDecoder {
    /// The delimiter used to separate byte sequences.
    pub delimiter: u8,
    /// The maximum length of the byte buffer.
    pub max_length: usize,
}

impl CharacterDelimitedDecoder {
    /// Creates a `CharacterDelimitedDecoder` with the specified delimiter.
    pub const fn new(delimiter: u8) -> Self {
        CharacterDelimitedDecoder {
            delimiter,
            max_length: usize::MAX,
        }
    }

    /// Creates a `CharacterDelimitedDecoder` with a maximum frame length limit.
    ///
    /// Any frames longer than `max_length` bytes will be discarded entirely.
    pub const fn new_with_max_length(delimiter: u8, max_length: usize) -> Self {
        CharacterDelimitedDecoder {
            max_length,
            ..CharacterDelimitedDecoder::new(delimiter)
        }
    }

    /// Returns the maximum frame length when decoding.
    pub const fn max_length(&self) -> usize {
        self.max_length
    }

    fn discard(&self, frame_len: usize) {
        warn!(
            message = "Discarding frame larger than max_length.",
            frame_len,
            max_length = self.max_length,
        );
    }
}

impl Decoder for CharacterDelimitedDecoder {
    type Item = Bytes;
    type Error = BoxedFramingError;

    fn decode(&mut self, buf: &mut BytesMut) -> Result<Option<Bytes>, Self::Error> {
        while let Some(end) = memchr(self.delimiter, buf) {
            // The delimiter goes with the frame, kept or not.
            let mut frame = buf.split_to(end + 1);
            if end > self.max_length {
                self.discard(end);
                continue;
            }
            frame.truncate(end);
            trace!(message = "Decoding the frame.", bytes_processed = end);
            return Ok(Some(frame.freeze()));
        }
        Ok(None)
    }

    fn decode_eof(&mut self, buf: &mut BytesMut) -> Result<Option<Bytes>, Self::Error> {
        if let Some(frame) = self.decode(buf)? {
            return Ok(Some(frame));
        }
        if buf.is_empty() {
            return Ok(None);
        }

        let rest = buf.split();
        if rest.len() > self.max_length {
            self.discard(rest.len());
            return Ok(None);
        }
        Ok(Some(rest.freeze()))
    }
}

mod ascii_char {
    use serde::{de, Deserialize, Deserializer, Serializer};

    /// Deserialize an ASCII character as `u8`.
    pub(super) fn deserialize<'de, D>(deserializer: D) -> Result<u8, D::Error>
    where
        D: Deserializer<'de>,
    {
        let character = char::deserialize(deserializer)?;
        if character.is_ascii() {
            Ok(character as u8)
        } else {
            Err(de::Error::custom(format!(
                "invalid character: {character}, expected character in ASCII range"
            )))
        }
    }

    /// Serialize an `u8` as ASCII character.
    pub(super) fn serialize<S>(character: &u8, serializer: S) -> Result<S::Ok, S::Error>
    where
        S: Serializer,
    {
        serializer.serialize_char(*character as char)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn decode_splits_on_delimiter() {
        let mut codec = CharacterDelimitedDecoder::new(b',');
        let mut buf = BytesMut::from(r#"{"a":1},{"b":2},"#);

        assert_eq!(codec.decode(&mut buf).unwrap().unwrap(), r#"{"a":1}"#);
        assert_eq!(codec.decode(&mut buf).unwrap().unwrap(), r#"{"b":2}"#);
        assert_eq!(codec.decode(&mut buf).unwrap(), None);
    }

    #[test]
    fn decode_discards_oversized_frames() {
        let mut codec = CharacterDelimitedDecoder::new_with_max_length(b'\n', 3);
        let mut buf = BytesMut::from("toolong\nok\n");

        assert_eq!(codec.decode(&mut buf).unwrap().unwrap(), "ok");
        assert_eq!(codec.decode(&mut buf).unwrap(), None);
    }

    #[test]
    fn decode_eof_returns_trailing_frame() {
        let mut codec = CharacterDelimitedDecoder::new(b'\n');
        let mut buf = BytesMut::from("a\nrest");

        assert_eq!(codec.decode_eof(&mut buf).unwrap().unwrap(), "a");
        assert_eq!(codec.decode_eof(&mut buf).unwrap().unwrap(), "rest");
        assert_eq!(codec.decode_eof(&mut buf).unwrap(), None);
    }

    #[test]
    fn decode_eof_discards_oversized_remainder() {
        let mut codec = CharacterDelimitedDecoder::new_with_max_length(b'\n', 2);
        let mut buf = BytesMut::from("abc");

        assert_eq!(codec.decode_eof(&mut buf).unwrap(), None);
        assert!(buf.is_empty());
    }

    #[test]
    fn delimiter_must_be_ascii() {
        let result = serde_json::from_str::<CharacterDelimitedDecoderOptions>(r#"{"delimiter":"é"}"#);
        assert!(result.is_err());
    }
}
