use ::codecs::{JsonEncoder, LogEvent};
use tokio::io::{self, AsyncWrite, AsyncWriteExt};

use crate::{
    codecs::FramedLines,
    internal_events::{EncoderSerializeError, EventsSent, StreamWriteError},
};

/// Encodes events as compact JSON lines and writes them to `output`.
#[derive(Debug)]
pub struct WriterSink<T> {
    pub output: T,
    pub encoder: JsonEncoder<FramedLines>,
}

impl<T> WriterSink<T>
where
    T: AsyncWrite + Unpin,
{
    pub fn new(output: T) -> Self {
        Self {
            output,
            encoder: JsonEncoder::new(FramedLines::new()),
        }
    }

    /// Encodes and writes a single event.
    ///
    /// An event that cannot be serialized is dropped and reported, and the
    /// sink keeps going. Write errors are returned: the output is likely gone
    /// for good, so the caller should stop.
    pub async fn send(&mut self, event: &LogEvent) -> io::Result<()> {
        if let Err(error) = self.encoder.encode(event) {
            emit!(EncoderSerializeError { error: &error });
            return Ok(());
        }

        let bytes = self.encoder.sink_mut().take();
        match self.output.write_all(&bytes).await {
            Err(error) => {
                emit!(StreamWriteError { error: &error });
                Err(error)
            }
            Ok(()) => {
                emit!(EventsSent {
                    count: 1,
                    byte_size: bytes.len(),
                });
                Ok(())
            }
        }
    }

    pub async fn flush(&mut self) -> io::Result<()> {
        self.output.flush().await.inspect_err(|error| {
            emit!(StreamWriteError { error });
        })
    }
}
