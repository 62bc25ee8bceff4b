use metrics::counter;

use super::InternalEvent;

#[derive(Debug)]
pub struct DecoderBomRemoval {
    pub from_encoding: &'static str,
}

impl InternalEvent for DecoderBomRemoval {
    fn emit(self) {
        trace!(
            message = "Removing initial BOM bytes from the final output while decoding to utf8.",
            from_encoding = %self.from_encoding,
        );
        counter!("decoder_bom_removals_total").increment(1);
    }
}

#[derive(Debug)]
pub struct DecoderMalformedReplacement<'a> {
    pub from_encoding: &'static str,
    pub data: &'a str,
}

impl InternalEvent for DecoderMalformedReplacement<'_> {
    fn emit(self) {
        warn!(
            message = "Replaced malformed sequences with replacement character while decoding to utf8. The payload may use a different character encoding than configured.",
            expected_charset = %self.from_encoding,
            data = %self.data,
        );
        counter!("decoder_malformed_replacement_warnings_total").increment(1);
    }
}
