//! Stream descriptors and the provider contracts.

use std::fmt;
use std::sync::{Arc, OnceLock};

use async_trait::async_trait;
use regex::Regex;
use tokio::io::AsyncRead;

use crate::error::Result;

/// Container used when a provider does not report one.
pub const DEFAULT_CONTAINER: &str = "mp4";

/// A byte stream opened by a [`ByteSource`].
pub struct OpenedSource {
    /// Reader positioned at `offset`.
    pub reader: Box<dyn AsyncRead + Send + Unpin>,
    /// Offset the source actually honored. Zero when the source cannot seek.
    pub offset: u64,
}

/// Opaque handle that opens the bytes of one stream.
#[async_trait]
pub trait ByteSource: Send + Sync {
    /// Open the stream, starting at `offset` if the source can seek.
    async fn open(&self, offset: u64) -> Result<OpenedSource>;
}

/// One quality-tagged stream of a resolved media item.
#[derive(Clone)]
pub struct StreamDescriptor {
    /// Human-readable quality, e.g. `720p`. May be empty.
    pub quality_label: String,
    /// Declared size in bytes; zero when unknown.
    pub total_bytes: u64,
    /// File extension for the output, without the dot.
    pub container: String,
    /// Handle used to open the byte stream.
    pub source: Arc<dyn ByteSource>,
}

impl StreamDescriptor {
    pub fn new(
        quality_label: impl Into<String>,
        total_bytes: u64,
        source: Arc<dyn ByteSource>,
    ) -> Self {
        Self {
            quality_label: quality_label.into(),
            total_bytes,
            container: DEFAULT_CONTAINER.to_string(),
            source,
        }
    }

    /// Set the output container extension.
    pub fn with_container(mut self, container: impl Into<String>) -> Self {
        self.container = container.into();
        self
    }

    /// Pixel height encoded in the quality label (`1080p60` -> 1080).
    pub fn resolution(&self) -> Option<u32> {
        static LABEL: OnceLock<Regex> = OnceLock::new();
        let pattern =
            LABEL.get_or_init(|| Regex::new(r"^\s*(\d{2,5})[pP]").expect("valid label pattern"));

        pattern
            .captures(&self.quality_label)
            .and_then(|caps| caps.get(1))
            .and_then(|m| m.as_str().parse().ok())
    }

    /// Whether the label is usable for display and selection.
    pub fn has_label(&self) -> bool {
        !self.quality_label.trim().is_empty()
    }
}

impl fmt::Debug for StreamDescriptor {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("StreamDescriptor")
            .field("quality_label", &self.quality_label)
            .field("total_bytes", &self.total_bytes)
            .field("container", &self.container)
            .finish_non_exhaustive()
    }
}

/// Result of resolving a URL.
#[derive(Debug, Clone)]
pub struct ResolvedMedia {
    pub title: String,
    pub streams: Vec<StreamDescriptor>,
}

/// Resolves a source URL into a title and candidate streams.
#[async_trait]
pub trait StreamProvider: Send + Sync {
    /// Fails with `NotFound` for unusable URLs and `NoStreams` when nothing
    /// downloadable is offered.
    async fn resolve(&self, url: &str) -> Result<ResolvedMedia>;
}
