use ::codecs::DecoderDiagnostics;
use encoding_rs::Encoding;

use crate::internal_events::{DecoderBomRemoval, DecoderMalformedReplacement, JsonParseFailure};

/// Reports decoder diagnostics as internal events, so they are both logged
/// and counted.
#[derive(Debug, Clone, Copy, Default)]
pub struct EmitDiagnostics;

impl DecoderDiagnostics for EmitDiagnostics {
    fn parse_failure(&self, error: &serde_json::Error, text: &str) {
        emit!(JsonParseFailure { error, data: text });
    }

    fn malformed_replaced(&self, charset: &'static Encoding, text: &str) {
        emit!(DecoderMalformedReplacement {
            from_encoding: charset.name(),
            data: text,
        });
    }

    fn bom_removed(&self, charset: &'static Encoding) {
        emit!(DecoderBomRemoval {
            from_encoding: charset.name()
        });
    }
}
