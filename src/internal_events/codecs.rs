use metrics::counter;

use super::{error_stage, error_type, InternalEvent};

#[derive(Debug)]
pub struct DecoderFramingError<E> {
    pub error: E,
}

impl<E: std::fmt::Display> InternalEvent for DecoderFramingError<E> {
    fn emit(self) {
        error!(
            message = "Failed framing bytes.",
            error = %self.error,
            error_code = "decoder_frame",
            error_type = error_type::PARSER_FAILED,
            stage = error_stage::PROCESSING,
        );
        counter!(
            "component_errors_total",
            "error_code" => "decoder_frame",
            "error_type" => error_type::PARSER_FAILED,
            "stage" => error_stage::PROCESSING,
        )
        .increment(1);
    }
}

/// A payload was not valid JSON and was kept as plain text.
///
/// This is an expected outcome for mixed input, so it is logged at info.
#[derive(Debug)]
pub struct JsonParseFailure<'a> {
    pub error: &'a serde_json::Error,
    pub data: &'a str,
}

impl InternalEvent for JsonParseFailure<'_> {
    fn emit(self) {
        info!(
            message = "JSON parse failure. Falling back to plain-text.",
            error = %self.error,
            data = %self.data,
            error_code = "json_parse_failure",
            error_type = error_type::PARSER_FAILED,
            stage = error_stage::PROCESSING,
        );
        counter!(
            "component_errors_total",
            "error_code" => "json_parse_failure",
            "error_type" => error_type::PARSER_FAILED,
            "stage" => error_stage::PROCESSING,
        )
        .increment(1);
    }
}

#[derive(Debug)]
pub struct EncoderSerializeError<'a> {
    pub error: &'a ::codecs::EncodeError,
}

impl InternalEvent for EncoderSerializeError<'_> {
    fn emit(self) {
        error!(
            message = "Failed serializing event. Dropping it.",
            error = %self.error,
            error_code = "encoder_serialize",
            error_type = error_type::ENCODER_FAILED,
            stage = error_stage::SENDING,
        );
        counter!(
            "component_errors_total",
            "error_code" => "encoder_serialize",
            "error_type" => error_type::ENCODER_FAILED,
            "stage" => error_stage::SENDING,
        )
        .increment(1);
        counter!("component_discarded_events_total", "intentional" => "false").increment(1);
    }
}

#[derive(Debug)]
pub struct EncoderFramingError<E> {
    pub error: E,
}

impl<E: std::fmt::Display> InternalEvent for EncoderFramingError<E> {
    fn emit(self) {
        error!(
            message = "Failed framing bytes.",
            error = %self.error,
            error_code = "encoder_frame",
            error_type = error_type::ENCODER_FAILED,
            stage = error_stage::SENDING,
        );
        counter!(
            "component_errors_total",
            "error_code" => "encoder_frame",
            "error_type" => error_type::ENCODER_FAILED,
            "stage" => error_stage::SENDING,
        )
        .increment(1);
    }
}

#[derive(Debug)]
pub struct EventsReceived {
    pub count: usize,
    pub byte_size: usize,
}

impl InternalEvent for EventsReceived {
    fn emit(self) {
        trace!(
            message = "Events received.",
            count = self.count,
            byte_size = self.byte_size,
        );
        counter!("component_received_events_total").increment(self.count as u64);
        counter!("component_received_event_bytes_total").increment(self.byte_size as u64);
    }
}

#[derive(Debug)]
pub struct EventsSent {
    pub count: usize,
    pub byte_size: usize,
}

impl InternalEvent for EventsSent {
    fn emit(self) {
        trace!(
            message = "Events sent.",
            count = self.count,
            byte_size = self.byte_size,
        );
        counter!("component_sent_events_total").increment(self.count as u64);
        counter!("component_sent_event_bytes_total").increment(self.byte_size as u64);
    }
}
