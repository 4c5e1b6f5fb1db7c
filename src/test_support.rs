//! Scripted in-memory sources shared by unit tests.

use std::io;
use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use bytes::Bytes;
use futures::StreamExt;
use parking_lot::Mutex;
use tokio_util::io::StreamReader;

use crate::download::{ProgressUpdate, SessionOptions};
use crate::error::{Error, Result};
use crate::provider::{ByteSource, OpenedSource, StreamDescriptor};

/// Initialize tracing for tests with appropriate settings
#[inline]
pub fn init_tracing() {
    let _ = tracing_subscriber::fmt()
        .with_max_level(tracing::Level::DEBUG)
        .with_test_writer()
        .try_init();
}

/// In-memory [`ByteSource`] that serves a fixed payload in fixed-size chunks.
pub struct ScriptedSource {
    data: Bytes,
    chunk: usize,
    delay: Duration,
    seekable: bool,
    fail_after: Option<usize>,
    unavailable: bool,
    opened: Mutex<Vec<u64>>,
}

impl ScriptedSource {
    pub fn new(data: Vec<u8>) -> Self {
        Self {
            data: Bytes::from(data),
            chunk: 16 * 1024,
            delay: Duration::ZERO,
            seekable: false,
            fail_after: None,
            unavailable: false,
            opened: Mutex::new(Vec::new()),
        }
    }

    /// Serve `chunk` bytes per read.
    pub fn chunked(mut self, chunk: usize) -> Self {
        self.chunk = chunk;
        self
    }

    /// Sleep before yielding each chunk.
    pub fn delay(mut self, delay: Duration) -> Self {
        self.delay = delay;
        self
    }

    /// Honor non-zero open offsets.
    pub fn seekable(mut self) -> Self {
        self.seekable = true;
        self
    }

    /// Yield `chunks` chunks, then a connection reset.
    pub fn fail_after(mut self, chunks: usize) -> Self {
        self.fail_after = Some(chunks);
        self
    }

    /// Refuse every open.
    pub fn unavailable(mut self) -> Self {
        self.unavailable = true;
        self
    }

    /// Offsets requested so far, in order.
    pub fn opened_offsets(&self) -> Vec<u64> {
        self.opened.lock().clone()
    }
}

#[async_trait]
impl ByteSource for ScriptedSource {
    async fn open(&self, offset: u64) -> Result<OpenedSource> {
        self.opened.lock().push(offset);

        if self.unavailable {
            return Err(Error::SourceUnavailable("scripted source refused".into()));
        }

        let start = if self.seekable {
            (offset as usize).min(self.data.len())
        } else {
            0
        };

        let mut chunks: Vec<io::Result<Bytes>> = self
            .data
            .slice(start..)
            .chunks(self.chunk)
            .map(|c| Ok(Bytes::copy_from_slice(c)))
            .collect();

        if let Some(n) = self.fail_after {
            chunks.truncate(n);
            chunks.push(Err(io::Error::new(
                io::ErrorKind::ConnectionReset,
                "connection reset by peer",
            )));
        }

        let delay = self.delay;
        let stream = futures::stream::iter(chunks).then(move |chunk| async move {
            if !delay.is_zero() {
                tokio::time::sleep(delay).await;
            }
            chunk
        });

        Ok(OpenedSource {
            reader: Box::new(StreamReader::new(Box::pin(stream))),
            offset: start as u64,
        })
    }
}

/// Payload of `len` bytes with a recognizable pattern.
pub fn payload(len: usize) -> Vec<u8> {
    (0..len).map(|i| (i % 251) as u8).collect()
}

/// Descriptor over a shared scripted source.
pub fn descriptor(source: &Arc<ScriptedSource>, total_bytes: u64) -> StreamDescriptor {
    StreamDescriptor::new("720p", total_bytes, source.clone() as Arc<dyn ByteSource>)
}

/// Default session options with the given chunk size.
pub fn options(chunk_size: usize) -> SessionOptions {
    SessionOptions {
        chunk_size,
        ..SessionOptions::default()
    }
}

/// Observer that records every update it receives.
#[derive(Clone, Default)]
pub struct Recorder {
    updates: Arc<Mutex<Vec<ProgressUpdate>>>,
}

impl Recorder {
    pub fn observer(&self) -> impl Fn(&ProgressUpdate) + Send + Sync + 'static {
        let updates = self.updates.clone();
        move |update: &ProgressUpdate| updates.lock().push(update.clone())
    }

    pub fn updates(&self) -> Vec<ProgressUpdate> {
        self.updates.lock().clone()
    }
}
