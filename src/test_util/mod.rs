#![allow(missing_docs)]
use std::sync::{Arc, Mutex};

use ::codecs::{DecoderDiagnostics, JsonDecoder};
use encoding_rs::Encoding;

/// A diagnostic reported by the decoder, as captured by [`RecordingDiagnostics`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Diagnostic {
    ParseFailure { data: String },
    MalformedReplaced { charset: &'static str, data: String },
    BomRemoved { charset: &'static str },
}

/// Diagnostics sink that remembers everything it was told.
#[derive(Debug, Default)]
pub struct RecordingDiagnostics {
    seen: Mutex<Vec<Diagnostic>>,
}

impl RecordingDiagnostics {
    pub fn new() -> Arc<Self> {
        Arc::default()
    }

    pub fn take(&self) -> Vec<Diagnostic> {
        std::mem::take(&mut *self.lock())
    }

    pub fn parse_failures(&self) -> usize {
        self.lock()
            .iter()
            .filter(|diagnostic| matches!(diagnostic, Diagnostic::ParseFailure { .. }))
            .count()
    }

    fn lock(&self) -> std::sync::MutexGuard<'_, Vec<Diagnostic>> {
        self.seen
            .lock()
            .unwrap_or_else(|poisoned| poisoned.into_inner())
    }

    fn record(&self, diagnostic: Diagnostic) {
        self.lock().push(diagnostic);
    }
}

impl DecoderDiagnostics for RecordingDiagnostics {
    fn parse_failure(&self, _error: &serde_json::Error, data: &str) {
        self.record(Diagnostic::ParseFailure {
            data: data.to_owned(),
        });
    }

    fn malformed_replaced(&self, encoding: &'static Encoding, data: &str) {
        self.record(Diagnostic::MalformedReplaced {
            charset: encoding.name(),
            data: data.to_owned(),
        });
    }

    fn bom_removed(&self, encoding: &'static Encoding) {
        self.record(Diagnostic::BomRemoved {
            charset: encoding.name(),
        });
    }
}

/// Builds a decoder for `charset` that reports into a fresh recorder.
pub fn recording_decoder(charset: &'static Encoding) -> (JsonDecoder, Arc<RecordingDiagnostics>) {
    let diagnostics = RecordingDiagnostics::new();
    let decoder = JsonDecoder::with_diagnostics(charset, diagnostics.clone());
    (decoder, diagnostics)
}
