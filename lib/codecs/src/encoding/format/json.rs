use snafu::ResultExt;

use crate::{
    encoding::{EncodeError, SerializeSnafu},
    event::LogEvent,
};

/// Serializer that converts a `LogEvent` to compact JSON.
///
/// Fields are written in the event's insertion order, without insignificant
/// whitespace.
#[derive(Debug, Clone, Copy, Default)]
pub struct JsonSerializer;

impl JsonSerializer {
    /// Creates a new `JsonSerializer`.
    pub const fn new() -> Self {
        Self
    }

    /// Encode event and represent it as a JSON string.
    pub fn to_string(&self, event: &LogEvent) -> Result<String, EncodeError> {
        serde_json::to_string(event).context(SerializeSnafu)
    }
}
