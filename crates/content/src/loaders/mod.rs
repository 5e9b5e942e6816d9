//! Content loaders for reading HTN data from files.
//!
//! Every loader reports failures through [`anyhow`] with the offending path
//! and the parser's message, so a binary can print them as-is.

pub mod config;
pub mod domain;

pub use config::ConfigLoader;
pub use domain::DomainLoader;

use std::path::Path;

/// Common result type for loaders.
pub type LoadResult<T> = anyhow::Result<T>;

/// Helper function to read file contents.
pub(crate) fn read_file(path: &Path) -> LoadResult<String> {
    std::fs::read_to_string(path)
        .map_err(|e| anyhow::anyhow!("Failed to read file {}: {}", path.display(), e))
}
