mod decoder;
mod diagnostics;

pub use decoder::{Decoder, DecoderError};
pub use diagnostics::EmitDiagnostics;
