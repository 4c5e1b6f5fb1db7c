//! Stream provider module.
//!
//! This module provides:
//! - The `StreamProvider` and `ByteSource` contracts
//! - Stream descriptors
//! - A generic HTTP provider for direct media URLs and stream manifests
//! - Stream ordering and selection

pub mod http;
pub mod select;
pub mod types;

pub use http::{HttpSource, HttpStreamProvider};
pub use select::{order_streams, pick_stream};
pub use types::{
    ByteSource, OpenedSource, ResolvedMedia, StreamDescriptor, StreamProvider,
    DEFAULT_CONTAINER,
};
