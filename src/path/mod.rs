//! Canonical asset path type and filename helpers.
//!
//! - Internal representation: always web-root-relative with a leading `/`
//! - Two raw strings naming the same physical file canonicalize to the
//!   identical `AssetPath`

mod resolver;

pub use resolver::PathResolver;

use crate::core::PublishError;
use regex::Regex;
use std::borrow::Borrow;
use std::path::{Path, PathBuf};
use std::sync::{Arc, LazyLock};

/// Canonical web-root-relative asset path.
///
/// Invariants:
/// - Always starts with `/`
/// - No `.` / `..` / empty segments
/// - No web-root or app-root filesystem prefix
///
/// Constructed only through [`PathResolver::canonicalize`].
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct AssetPath(Arc<str>);

impl AssetPath {
    /// Build from an already-canonical string. Callers guarantee the
    /// invariants hold; only the resolver and tests should need this.
    pub(crate) fn from_canonical(path: String) -> Self {
        Self(Arc::from(path))
    }

    /// The canonical path as a string slice.
    #[inline]
    pub fn as_str(&self) -> &str {
        &self.0
    }

    /// Final path segment (the file name).
    pub fn file_name(&self) -> &str {
        self.0.rsplit('/').next().unwrap_or(&self.0)
    }

    /// Directory part, without trailing slash.
    ///
    /// `/css/site.css` -> `/css`, `/site.css` -> `/`
    pub fn dir(&self) -> &str {
        match self.0.rfind('/') {
            Some(0) | None => "/",
            Some(idx) => &self.0[..idx],
        }
    }
}

impl std::fmt::Display for AssetPath {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl AsRef<str> for AssetPath {
    fn as_ref(&self) -> &str {
        &self.0
    }
}

impl Borrow<str> for AssetPath {
    fn borrow(&self) -> &str {
        &self.0
    }
}

impl PartialEq<str> for AssetPath {
    fn eq(&self, other: &str) -> bool {
        self.0.as_ref() == other
    }
}

impl PartialEq<&str> for AssetPath {
    fn eq(&self, other: &&str) -> bool {
        self.0.as_ref() == *other
    }
}

// ============================================================================
// Filename helpers
// ============================================================================

/// Runs of characters that may not appear in a CDN-facing filename.
static ILLEGAL_CHARS: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"[^0-9A-Za-z_\-.]+").expect("valid filename pattern"));

/// Reduce any path or URL token to a clean `base.ext` filename.
///
/// Takes the basename, drops any `?query` suffix, replaces runs of
/// illegal characters with a single `_`, and trims stray underscores.
/// Fails with `InvalidPath` when either the base or the extension ends
/// up empty.
pub fn clean_filename(name: &str) -> Result<String, PublishError> {
    let base = name.rsplit(['/', '\\']).next().unwrap_or(name);
    let base = base.split('?').next().unwrap_or(base).trim();
    let cleaned = ILLEGAL_CHARS.replace_all(base, "_");
    let cleaned = cleaned.trim_matches('_');

    let (stem, ext) = cleaned
        .rsplit_once('.')
        .ok_or_else(|| PublishError::InvalidPath(format!("no file extension in `{name}`")))?;
    if stem.is_empty() {
        return Err(PublishError::InvalidPath(format!(
            "empty filename base in `{name}`"
        )));
    }
    if ext.is_empty() {
        return Err(PublishError::InvalidPath(format!(
            "empty file extension in `{name}`"
        )));
    }
    Ok(format!("{stem}.{ext}"))
}

/// Split a filename into `(base, ext)` after cleaning it.
///
/// The extension is everything after the last `.`.
pub fn split_extension(name: &str) -> Result<(String, String), PublishError> {
    let cleaned = clean_filename(name)?;
    let (stem, ext) = cleaned
        .rsplit_once('.')
        .expect("clean_filename guarantees an extension");
    Ok((stem.to_string(), ext.to_string()))
}

/// Normalize a file system path to absolute form.
///
/// Tries `canonicalize()` first (resolves symlinks, `.`, `..`), falling
/// back to joining with the current directory for relative paths.
#[inline]
pub fn normalize_path(path: &Path) -> PathBuf {
    path.canonicalize().unwrap_or_else(|_| {
        if path.is_absolute() {
            path.to_path_buf()
        } else {
            std::env::current_dir().map_or_else(|_| path.to_path_buf(), |cwd| cwd.join(path))
        }
    })
}
