use std::collections::VecDeque;
use std::io::{ErrorKind, Read};
use std::sync::Arc;

use bytes::{Buf, BytesMut};
use tracing::{debug, error, trace};

use crate::error::{FrameError, Result};
use crate::grammar::{self, ParseOutcome};
use crate::response::AtResponsePtr;

/// Bytes requested from the host channel per read.
pub const DEFAULT_READ_CHUNK_SIZE: usize = 128;

/// Upper bound on bytes carried over between reads without completing a response.
pub const DEFAULT_MAX_UNCONSUMED: usize = 64 * 1024;

const INITIAL_BUFFER_CAPACITY: usize = 1024;

/// Response reader configuration.
#[derive(Debug, Clone)]
pub struct ReaderConfig {
    /// Size of each read from the host channel.
    pub read_chunk_size: usize,
    /// Carry-over limit; exceeding it is a stream failure.
    pub max_unconsumed: usize,
}

impl Default for ReaderConfig {
    fn default() -> Self {
        Self {
            read_chunk_size: DEFAULT_READ_CHUNK_SIZE,
            max_unconsumed: DEFAULT_MAX_UNCONSUMED,
        }
    }
}

/// Splits a chunked byte stream into complete responses.
///
/// Bytes that do not yet form a complete response are carried over to the
/// next [`decode`](Self::decode) call, so the responses produced never depend
/// on where the stream was cut.
#[derive(Debug)]
pub struct ResponseDecoder {
    unconsumed: BytesMut,
    max_unconsumed: usize,
}

impl Default for ResponseDecoder {
    fn default() -> Self {
        Self::new()
    }
}

impl ResponseDecoder {
    pub fn new() -> Self {
        Self::with_max_unconsumed(DEFAULT_MAX_UNCONSUMED)
    }

    pub fn with_max_unconsumed(max_unconsumed: usize) -> Self {
        Self {
            unconsumed: BytesMut::with_capacity(INITIAL_BUFFER_CAPACITY),
            max_unconsumed,
        }
    }

    /// Append `chunk` and hand every response it completes to `on_response`,
    /// in stream order. Returns how many responses were delivered.
    ///
    /// Line noise (`\r`, `\n`) between responses is skipped. Bytes that can
    /// start no response fail with [`FrameError::Unparseable`]; the carry-over
    /// is discarded in that case since the stream position is lost.
    pub fn decode<F>(&mut self, chunk: &[u8], mut on_response: F) -> Result<usize>
    where
        F: FnMut(AtResponsePtr),
    {
        self.unconsumed.extend_from_slice(chunk);

        let mut pos = 0;
        let mut delivered = 0;
        let mut failure = None;
        {
            let buf = &self.unconsumed[..];
            loop {
                pos += buf[pos..]
                    .iter()
                    .take_while(|&&b| b == b'\r' || b == b'\n')
                    .count();
                if pos == buf.len() {
                    break;
                }

                match grammar::parse(&buf[pos..]) {
                    ParseOutcome::Complete { consumed, response } => {
                        trace!(response = response.what(), consumed, "parsed response");
                        pos += consumed;
                        delivered += 1;
                        on_response(Arc::new(response));
                    }
                    ParseOutcome::Incomplete => break,
                    ParseOutcome::Failed => {
                        failure = Some(grammar::preview(&buf[pos..]).into_owned());
                        break;
                    }
                }
            }
        }

        if let Some(preview) = failure {
            error!(preview = %preview.escape_debug(), "can't parse modem output");
            self.unconsumed.clear();
            return Err(FrameError::Unparseable { preview });
        }

        self.unconsumed.advance(pos);

        let size = self.unconsumed.len();
        if size > self.max_unconsumed {
            error!(size, max = self.max_unconsumed, "unconsumed modem output too large");
            self.unconsumed.clear();
            return Err(FrameError::BufferOverflow {
                size,
                max: self.max_unconsumed,
            });
        }

        Ok(delivered)
    }

    /// Decode `chunk` and collect the completed responses.
    pub fn decode_to_vec(&mut self, chunk: &[u8]) -> Result<Vec<AtResponsePtr>> {
        let mut responses = Vec::new();
        self.decode(chunk, |response| responses.push(response))?;
        Ok(responses)
    }

    /// Bytes waiting for the rest of their response.
    pub fn unconsumed(&self) -> &[u8] {
        &self.unconsumed
    }

    /// Drop the carry-over, e.g. after the channel was reopened.
    pub fn reset(&mut self) {
        self.unconsumed.clear();
    }
}

/// Reads complete responses from any `Read` stream.
pub struct ResponseReader<T> {
    inner: T,
    decoder: ResponseDecoder,
    chunk: Box<[u8]>,
    pending: VecDeque<AtResponsePtr>,
    config: ReaderConfig,
}

impl<T: Read> ResponseReader<T> {
    /// Create a response reader with default configuration.
    pub fn new(inner: T) -> Self {
        Self::with_config(inner, ReaderConfig::default())
    }

    /// Create a response reader with explicit configuration.
    pub fn with_config(inner: T, config: ReaderConfig) -> Self {
        Self {
            inner,
            decoder: ResponseDecoder::with_max_unconsumed(config.max_unconsumed),
            chunk: vec![0u8; config.read_chunk_size.max(1)].into_boxed_slice(),
            pending: VecDeque::new(),
            config,
        }
    }

    /// Perform one read and hand the responses it completes to `on_response`.
    ///
    /// Responses already buffered by [`read_response`](Self::read_response)
    /// are delivered first. Returns `Err(FrameError::ConnectionClosed)` at EOF.
    pub fn read_responses<F>(&mut self, mut on_response: F) -> Result<usize>
    where
        F: FnMut(AtResponsePtr),
    {
        let buffered = self.pending.len();
        for response in self.pending.drain(..) {
            on_response(response);
        }

        let read = self.read_chunk()?;
        let delivered = self.decoder.decode(&self.chunk[..read], on_response)?;
        Ok(buffered + delivered)
    }

    /// Read the next complete response (blocking).
    ///
    /// Returns `Err(FrameError::ConnectionClosed)` when EOF is reached.
    pub fn read_response(&mut self) -> Result<AtResponsePtr> {
        loop {
            if let Some(response) = self.pending.pop_front() {
                return Ok(response);
            }

            let read = self.read_chunk()?;
            let pending = &mut self.pending;
            self.decoder
                .decode(&self.chunk[..read], |response| pending.push_back(response))?;
        }
    }

    fn read_chunk(&mut self) -> Result<usize> {
        loop {
            match self.inner.read(&mut self.chunk) {
                Ok(0) => {
                    debug!(
                        unconsumed = self.decoder.unconsumed().len(),
                        "end of modem stream"
                    );
                    return Err(FrameError::ConnectionClosed);
                }
                Ok(n) => return Ok(n),
                Err(err) if err.kind() == ErrorKind::Interrupted => continue,
                Err(err) => return Err(FrameError::Io(err)),
            }
        }
    }

    /// Bytes received but not yet part of a complete response.
    pub fn unconsumed(&self) -> &[u8] {
        self.decoder.unconsumed()
    }

    /// Borrow the underlying stream.
    pub fn get_ref(&self) -> &T {
        &self.inner
    }

    /// Mutably borrow the underlying stream.
    pub fn get_mut(&mut self) -> &mut T {
        &mut self.inner
    }

    /// Consume the reader and return the inner stream.
    pub fn into_inner(self) -> T {
        self.inner
    }

    /// Current reader configuration.
    pub fn config(&self) -> &ReaderConfig {
        &self.config
    }
}
