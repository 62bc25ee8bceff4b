//! The structured event model shared by the decoder and the encoder.

mod log_event;
mod value;

pub use log_event::{LogEvent, JSON_PARSE_FAILURE_TAG, MESSAGE_KEY, TAGS_KEY};
pub use value::{ObjectMap, Value};
