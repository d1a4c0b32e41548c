//! Stylesheet asset-reference extraction.
//!
//! Deliberately a narrow text-pattern match over `background` /
//! `background-image` declarations, not a CSS parser: the scope is
//! limited to the URL tokens those declarations carry, and the matching
//! semantics are part of the tool's compatibility surface.

use regex::Regex;
use rustc_hash::FxHashSet;
use std::path::{Path, PathBuf};
use std::sync::LazyLock;

/// Image extensions eligible for republication.
const IMAGE_EXTENSIONS: &[&str] = &["gif", "png", "jpg", "jpeg"];

/// `background[-image]: ... url( <token> )` with optional single or
/// double quotes around the token. Case-insensitive; a declaration does
/// not span lines.
static BACKGROUND_URL: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(
        r#"(?i)\bbackground(?:-image)?\s*:[^(\r\n]*\(\s*(?:'([^']*)'|"([^"]*)"|([^'"\s)][^)]*?))\s*\)"#,
    )
    .expect("valid background-url pattern")
});

/// Extract image references from stylesheet content.
///
/// Tokens come back with any `#fragment` and `?query` stripped: the
/// stripped form is both what resolves to a file and what substitution
/// replaces, so a cache-busting suffix in the stylesheet survives the
/// rewrite. Keeps only known image extensions; deduplicates on the
/// stripped token preserving first-seen order.
pub fn extract_references(content: &str) -> Vec<String> {
    let mut seen = FxHashSet::default();
    let mut refs = Vec::new();

    for caps in BACKGROUND_URL.captures_iter(content) {
        let raw = caps
            .get(1)
            .or_else(|| caps.get(2))
            .or_else(|| caps.get(3))
            .map(|m| m.as_str().trim())
            .unwrap_or_default();
        if raw.is_empty() {
            continue;
        }

        // A fragment acts as a query for stripping purposes
        let cleaned = raw.replace('#', "?");
        let cleaned = cleaned.split('?').next().unwrap_or_default();
        let Some((_, ext)) = cleaned.rsplit_once('.') else {
            continue;
        };
        if !IMAGE_EXTENSIONS.contains(&ext) {
            continue;
        }
        if seen.insert(cleaned.to_string()) {
            refs.push(cleaned.to_string());
        }
    }
    refs
}

/// Resolve a reference token against the stylesheet's canonical
/// directory.
///
/// Absolute tokens pass through; relative tokens are string-joined (any
/// `..` collapsing happens later, when the path is canonicalized for
/// lookup).
pub fn normalize_reference(token: &str, css_dir: &str) -> String {
    if token.starts_with('/') {
        token.to_string()
    } else {
        format!("{}/{}", css_dir.trim_end_matches('/'), token)
    }
}

/// Replace every occurrence of a reference token with its new URL.
///
/// Literal text replacement over the stripped token, so any `?query`
/// or `#fragment` suffix following it in the source stays in place.
pub fn substitute(content: &str, from: &str, to: &str) -> String {
    content.replace(from, to)
}

/// Whether a file takes the stylesheet rewriting path.
pub fn is_stylesheet(path: &Path) -> bool {
    path.extension().and_then(|e| e.to_str()) == Some("css")
}

/// Sibling path for the rewritten variant: `{base}_translated.{ext}`.
pub fn translated_sibling(path: &Path) -> PathBuf {
    let stem = path.file_stem().and_then(|s| s.to_str()).unwrap_or("");
    let ext = path.extension().and_then(|e| e.to_str()).unwrap_or("css");
    path.with_file_name(format!("{stem}_translated.{ext}"))
}
