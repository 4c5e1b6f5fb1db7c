//! Path and directory management.

use std::path::{Path, PathBuf};

use crate::fs::naming::{sanitize_extension, sanitize_filename};
use crate::provider::DEFAULT_CONTAINER;

/// Build the destination path `<folder>/<sanitized title>.<container>`.
///
/// A container that is not a plain extension falls back to the default, so
/// the result always stays directly inside `folder`.
pub fn destination_path(folder: &Path, title: &str, container: &str) -> PathBuf {
    let container =
        sanitize_extension(container).unwrap_or_else(|| DEFAULT_CONTAINER.to_string());

    folder.join(format!("{}.{}", sanitize_filename(title), container))
}
