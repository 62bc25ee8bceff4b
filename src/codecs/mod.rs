//! A collection of codecs that can be used to transform between bytes streams /
//! byte messages, byte frames and structured events.

#![deny(missing_docs)]

mod decoding;
mod encoding;

pub use decoding::{Decoder, DecoderError, EmitDiagnostics};
pub use encoding::FramedLines;
