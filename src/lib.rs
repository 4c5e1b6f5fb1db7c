//! StreamVault - download media streams with pause, resume and cancel.
//!
//! This library resolves a media URL into quality-tagged streams and runs
//! each transfer as a [`DownloadSession`] that can be paused, resumed and
//! canceled while it copies bytes to disk.
//!
//! # Features
//!
//! - Chunked transfers with progress notifications
//! - Pause and resume, continuing from the last byte when the source allows it
//! - Cancellation that keeps partial files on disk
//! - A registry of sessions keyed by title
//! - A generic HTTP provider for direct media URLs and JSON stream manifests
//!
//! # Example
//!
//! ```no_run
//! use streamvault::{
//!     order_streams, pick_stream, Config, DownloadSession, HttpStreamProvider, SessionOptions,
//!     StreamProvider,
//! };
//!
//! #[tokio::main]
//! async fn main() -> Result<(), Box<dyn std::error::Error>> {
//!     let config = Config::default();
//!     let provider = HttpStreamProvider::new(&config.network)?;
//!     let media = provider.resolve("https://example.com/clip.mp4").await?;
//!     let streams = order_streams(media.streams);
//!     let stream = pick_stream(&streams, None)?.clone();
//!
//!     let session = DownloadSession::new(
//!         media.title,
//!         stream,
//!         "clip.mp4",
//!         SessionOptions::from(&config),
//!     );
//!     session.start().await?;
//!     session.wait_terminal().await;
//!     Ok(())
//! }
//! ```

pub mod cli;
pub mod config;
pub mod download;
pub mod error;
pub mod fs;
pub mod output;
pub mod provider;

#[cfg(test)]
mod test_support;

// Re-exports for convenience
pub use config::{Config, ResumePolicy};
pub use download::{
    DownloadSession, Progress, ProgressObserver, ProgressUpdate, SessionOptions, SessionRegistry,
    SessionSnapshot, SessionState,
};
pub use error::{Error, Result};
pub use provider::{
    order_streams, pick_stream, ByteSource, HttpStreamProvider, StreamDescriptor, StreamProvider,
};
