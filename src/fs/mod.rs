//! Filesystem module.
//!
//! Provides:
//! - Destination path construction
//! - Filename sanitizing and display shortening

pub mod naming;
pub mod paths;

pub use naming::{display_title, sanitize_extension, sanitize_filename};
pub use paths::destination_path;
