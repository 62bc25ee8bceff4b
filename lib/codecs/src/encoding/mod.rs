//! A collection of support structures that are used in the process of encoding
//! events into bytes.

pub mod format;
pub mod framing;

use snafu::Snafu;

pub use format::JsonSerializer;
pub use framing::{CharacterDelimitedEncoder, NewlineDelimitedEncoder};

use crate::event::LogEvent;

/// An error that occurred while encoding an event.
#[derive(Debug, Snafu)]
#[snafu(visibility(pub(crate)))]
pub enum EncodeError {
    /// The event holds a value JSON cannot represent, such as a non-finite
    /// float or a string that is not valid UTF-8.
    #[snafu(display("failed to serialize event: {source}"))]
    Serialize {
        /// The underlying serializer error.
        source: serde_json::Error,
    },
}

/// Receives every successfully encoded event together with its JSON text.
pub trait EventSink {
    /// Called once per encoded event.
    fn on_event(&mut self, event: &LogEvent, text: &str);
}

impl<F> EventSink for F
where
    F: FnMut(&LogEvent, &str),
{
    fn on_event(&mut self, event: &LogEvent, text: &str) {
        self(event, text)
    }
}

/// Encodes events to compact JSON and hands the result to a sink.
///
/// The sink only sees events that serialized in full. Events that cannot be
/// represented are reported to the caller of [`JsonEncoder::encode`] instead.
#[derive(Debug, Clone)]
pub struct JsonEncoder<S> {
    serializer: JsonSerializer,
    sink: S,
}

impl<S: EventSink> JsonEncoder<S> {
    /// Creates a new `JsonEncoder` writing to `sink`.
    pub const fn new(sink: S) -> Self {
        Self {
            serializer: JsonSerializer::new(),
            sink,
        }
    }

    /// Serializes `event` and passes it on to the sink.
    pub fn encode(&mut self, event: &LogEvent) -> Result<(), EncodeError> {
        let text = self.serializer.to_string(event)?;
        self.sink.on_event(event, &text);
        Ok(())
    }

    /// The sink events are handed to.
    pub const fn sink(&self) -> &S {
        &self.sink
    }

    /// Mutable access to the sink, for draining what it collected.
    pub fn sink_mut(&mut self) -> &mut S {
        &mut self.sink
    }

    /// Consumes the encoder, returning its sink.
    pub fn into_sink(self) -> S {
        self.sink
    }
}
