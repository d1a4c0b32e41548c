//! Publishing error taxonomy.

use std::path::PathBuf;
use thiserror::Error;

/// Errors surfaced by the publishing pipeline.
///
/// `NoHash` is special: URL resolution catches it internally and falls
/// back to the local path, so rendering never breaks because an asset
/// was not published yet. Everything else propagates to the caller.
#[derive(Debug, Error)]
pub enum PublishError {
    /// Path is malformed or empty after canonicalization.
    #[error("invalid asset path: {0}")]
    InvalidPath(String),

    /// Source file does not exist or is not a regular file.
    #[error("not a file: `{0}`")]
    NotFound(PathBuf),

    /// A CDN object name was requested before the asset was published.
    #[error("no hash on record for `{0}` (publish it first)")]
    NoHash(String),

    /// Hash record could not be read or written.
    #[error("hash record IO error at `{0}`")]
    Io(PathBuf, #[source] std::io::Error),

    /// Object store call failed.
    #[error("object store error: {0}")]
    Remote(String),

    /// CDN provider is declared in config but has no implementation.
    #[error("CDN provider `{0}` is not implemented")]
    UnsupportedProvider(String),
}
