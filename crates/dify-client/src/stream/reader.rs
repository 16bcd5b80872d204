//! Newline-delimited reader over a chunked byte stream.

use std::fmt::Display;
use std::pin::Pin;

use bytes::{Bytes, BytesMut};
use futures::{Stream, StreamExt};

use crate::error::{Error, Result};

/// Boxed byte stream as produced by `reqwest::Response::bytes_stream`.
pub type ByteStream = Pin<Box<dyn Stream<Item = Result<Bytes>> + Send>>;

/// Box any chunked byte stream into a [`ByteStream`], mapping chunk errors to
/// [`Error::Transport`].
pub fn byte_stream<S, E>(stream: S) -> ByteStream
where
    S: Stream<Item = std::result::Result<Bytes, E>> + Send + 'static,
    E: Display,
{
    Box::pin(stream.map(|chunk| chunk.map_err(|e| Error::Transport(e.to_string()))))
}

/// Pulls `\n`-terminated lines out of a byte stream.
///
/// Chunk boundaries can fall anywhere. The internal buffer grows until a
/// terminator shows up, so lines are never truncated.
pub struct LineReader {
    inner: ByteStream,
    buffer: BytesMut,
    /// Bytes of `buffer` already known to contain no terminator.
    scanned: usize,
    eof: bool,
}

impl LineReader {
    /// Wrap a byte stream.
    pub fn new(inner: ByteStream) -> Self {
        Self {
            inner,
            buffer: BytesMut::new(),
            scanned: 0,
            eof: false,
        }
    }

    /// Return the next line, terminator included.
    ///
    /// Yields `Ok(None)` once the stream is exhausted. Bytes left over after
    /// the last terminator are returned as a final line.
    pub async fn next_line(&mut self) -> Result<Option<Bytes>> {
        loop {
            if let Some(pos) = self.buffer[self.scanned..].iter().position(|b| *b == b'\n') {
                let end = self.scanned + pos + 1;
                self.scanned = 0;
                return Ok(Some(self.buffer.split_to(end).freeze()));
            }
            self.scanned = self.buffer.len();

            if self.eof {
                if self.buffer.is_empty() {
                    return Ok(None);
                }
                self.scanned = 0;
                return Ok(Some(self.buffer.split().freeze()));
            }

            match self.inner.next().await {
                Some(Ok(chunk)) => self.buffer.extend_from_slice(&chunk),
                Some(Err(e)) => return Err(e),
                None => self.eof = true,
            }
        }
    }
}
