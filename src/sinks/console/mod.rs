//! Writes encoded events to a standard stream.

mod sink;

pub use sink::WriterSink;
