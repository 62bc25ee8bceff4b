pub mod console;

pub use console::WriterSink;
