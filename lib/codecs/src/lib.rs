//! A collection of codecs that can be used to transform between bytes streams /
//! byte messages, byte frames and structured events.
//!
//! Decoding turns one raw payload into exactly one [`LogEvent`], falling back
//! to a plain-text event tagged `_jsonparsefailure` when the payload is not
//! JSON. Encoding turns an event back into compact JSON.

#![deny(missing_docs)]
#![deny(warnings)]

pub mod decoding;
pub mod encoding;
pub mod event;
pub mod transcode;

pub use decoding::{
    BytesDecoder, BytesDecoderConfig, CharacterDelimitedDecoder, CharacterDelimitedDecoderConfig,
    Decoded, DecoderDiagnostics, Framer, FramingConfig, JsonDecoder, JsonDecoderConfig,
    NewlineDelimitedDecoder, NewlineDelimitedDecoderConfig, StreamDecodingError,
    TracingDiagnostics,
};
pub use encoding::{
    CharacterDelimitedEncoder, EncodeError, EventSink, JsonEncoder, JsonSerializer,
    NewlineDelimitedEncoder,
};
pub use event::{LogEvent, ObjectMap, Value};
pub use transcode::CharsetNormalizer;

