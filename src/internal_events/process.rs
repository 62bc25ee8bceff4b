use std::path::Path;

use metrics::counter;

use super::{error_stage, error_type, InternalEvent};

#[derive(Debug)]
pub struct JsonNginxStarted<'a> {
    pub charset: &'static str,
    pub config_path: Option<&'a Path>,
}

impl InternalEvent for JsonNginxStarted<'_> {
    fn emit(self) {
        info!(
            target: "json_nginx",
            message = "Json-nginx has started.",
            charset = self.charset,
            config_path = ?self.config_path,
            version = %crate::get_version(),
        );
        counter!("started_total").increment(1);
    }
}

#[derive(Debug)]
pub struct JsonNginxStopped;

impl InternalEvent for JsonNginxStopped {
    fn emit(self) {
        info!(target: "json_nginx", message = "Json-nginx has stopped.");
        counter!("stopped_total").increment(1);
    }
}

#[derive(Debug)]
pub struct ConfigLoadError<'a> {
    pub error: &'a crate::config::ConfigError,
}

impl InternalEvent for ConfigLoadError<'_> {
    fn emit(self) {
        error!(
            message = "Configuration error.",
            error = %self.error,
            error_code = "config_load",
            error_type = error_type::CONFIGURATION_FAILED,
            stage = error_stage::PROCESSING,
        );
        counter!(
            "component_errors_total",
            "error_code" => "config_load",
            "error_type" => error_type::CONFIGURATION_FAILED,
            "stage" => error_stage::PROCESSING,
        )
        .increment(1);
    }
}

#[derive(Debug)]
pub struct StreamReadError<'a> {
    pub error: &'a std::io::Error,
}

impl InternalEvent for StreamReadError<'_> {
    fn emit(self) {
        error!(
            message = "Error reading input. Stopping.",
            error = %self.error,
            error_code = "reading_input",
            error_type = error_type::IO_FAILED,
            stage = error_stage::RECEIVING,
        );
        counter!(
            "component_errors_total",
            "error_code" => "reading_input",
            "error_type" => error_type::IO_FAILED,
            "stage" => error_stage::RECEIVING,
        )
        .increment(1);
    }
}

#[derive(Debug)]
pub struct StreamWriteError<'a> {
    pub error: &'a std::io::Error,
}

impl InternalEvent for StreamWriteError<'_> {
    fn emit(self) {
        error!(
            message = "Error writing to output. Stopping sink.",
            error = %self.error,
            error_code = "writing_output",
            error_type = error_type::WRITER_FAILED,
            stage = error_stage::SENDING,
        );
        counter!(
            "component_errors_total",
            "error_code" => "writing_output",
            "error_type" => error_type::WRITER_FAILED,
            "stage" => error_stage::SENDING,
        )
        .increment(1);
    }
}
