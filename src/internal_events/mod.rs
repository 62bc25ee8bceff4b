#![allow(missing_docs)]

#[macro_export]
macro_rules! emit {
    ($event:expr) => {
        $crate::internal_events::emit($event)
    };
}

mod codecs;
mod encoding_transcode;
mod process;

pub use self::{codecs::*, encoding_transcode::*, process::*};

/// An observable occurrence inside the application.
///
/// Emitting an event logs it and updates the matching internal metrics.
pub trait InternalEvent: Sized {
    fn emit(self);
}

pub fn emit(event: impl InternalEvent) {
    event.emit();
}

pub mod error_stage {
    pub const RECEIVING: &str = "receiving";
    pub const PROCESSING: &str = "processing";
    pub const SENDING: &str = "sending";
}

pub mod error_type {
    /// The error was caused by the configuration.
    pub const CONFIGURATION_FAILED: &str = "configuration_failed";
    /// The error occurred while serializing or encoding data.
    pub const ENCODER_FAILED: &str = "encoder_failed";
    /// An I/O operation failed.
    pub const IO_FAILED: &str = "io_failed";
    /// The error occurred while parsing data.
    pub const PARSER_FAILED: &str = "parser_failed";
    /// The data could not be written to its destination.
    pub const WRITER_FAILED: &str = "writer_failed";
}
