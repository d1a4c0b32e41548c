//! Path resolution between raw input paths, canonical asset paths, and
//! filesystem locations.

use super::{AssetPath, clean_filename};
use crate::core::PublishError;
use std::path::{Path, PathBuf};

/// Marker directory separating filesystem layout from the public path.
const WEBROOT_MARKER: &str = "webroot/";

/// App-root subdirectories whose contents are served as if at the root.
const APP_MARKERS: &[&str] = &["tmp/", "config/", "Config/"];

/// Resolves raw input paths (absolute filesystem paths, web-root-relative
/// paths, or bare filenames) into canonical [`AssetPath`]s and back into
/// filesystem locations.
#[derive(Debug, Clone)]
pub struct PathResolver {
    webroot: PathBuf,
    app_root: PathBuf,
    /// Literal `from -> to` substitutions applied when flattening a
    /// canonical path into a record stem (symlinked/plugin layouts).
    translations: Vec<(String, String)>,
}

impl PathResolver {
    pub fn new(webroot: PathBuf, app_root: PathBuf, translations: Vec<(String, String)>) -> Self {
        Self {
            webroot,
            app_root,
            translations,
        }
    }

    /// Canonicalize any raw path into its web-root-relative form.
    ///
    /// Strips the configured web-root/app-root filesystem prefixes and
    /// anything up to a `webroot/` marker segment, then collapses `.`
    /// and `..` segments. `..` pops the previously retained segment;
    /// popping past the start, or ending up empty, is `InvalidPath`.
    ///
    /// Idempotent: canonicalizing a canonical path returns it unchanged.
    pub fn canonicalize(&self, raw: &str) -> Result<AssetPath, PublishError> {
        let mut path = raw.trim().replace('\\', "/");

        // Filesystem prefixes: webroot first (it usually nests inside
        // the app root, so it is the longer match).
        if let Some(rest) = strip_root(&path, &self.webroot) {
            path = rest;
        } else if let Some(rest) = strip_root(&path, &self.app_root) {
            path = rest;
            // Contents of tmp/config are served as if at the root.
            let trimmed = path.trim_start_matches('/');
            for marker in APP_MARKERS {
                if let Some(rest) = trimmed.strip_prefix(marker) {
                    path = format!("/{rest}");
                    break;
                }
            }
        }

        // Anything before a webroot marker directory is layout, not URL.
        if let Some(idx) = path.rfind(WEBROOT_MARKER) {
            path = path[idx + WEBROOT_MARKER.len()..].to_string();
        }

        let mut segments: Vec<&str> = Vec::new();
        for segment in path.split('/') {
            match segment {
                "" | "." => {}
                ".." => {
                    if segments.pop().is_none() {
                        return Err(PublishError::InvalidPath(format!(
                            "`..` escapes the web root in `{raw}`"
                        )));
                    }
                }
                segment => segments.push(segment),
            }
        }

        if segments.is_empty() {
            return Err(PublishError::InvalidPath(format!(
                "path is empty after canonicalization: `{raw}`"
            )));
        }
        Ok(AssetPath::from_canonical(format!(
            "/{}",
            segments.join("/")
        )))
    }

    /// Map a canonical asset path back to a filesystem location.
    ///
    /// Tries the web root, app root, app-root/config and app-root/tmp in
    /// order and returns the first candidate that exists. When none
    /// exists, returns the web-root candidate as a best-effort default;
    /// callers must check existence themselves.
    pub fn to_filesystem_path(&self, asset: &AssetPath) -> PathBuf {
        let rel = asset.as_str().trim_start_matches('/');
        let candidates = [
            self.webroot.join(rel),
            self.app_root.join(rel),
            self.app_root.join("config").join(rel),
            self.app_root.join("tmp").join(rel),
        ];
        candidates
            .iter()
            .find(|candidate| candidate.is_file())
            .cloned()
            .unwrap_or_else(|| candidates[0].clone())
    }

    /// Locate a raw input path on disk.
    ///
    /// A path that already names a file is used as-is; anything else is
    /// canonicalized and resolved against the known roots. The returned
    /// path may not exist (best-effort default).
    pub fn locate(&self, raw: &str) -> Result<PathBuf, PublishError> {
        let direct = Path::new(raw);
        if direct.is_file() {
            return Ok(direct.to_path_buf());
        }
        let asset = self.canonicalize(raw)?;
        Ok(self.to_filesystem_path(&asset))
    }

    /// Flatten a canonical path into the stem that keys its hash record.
    ///
    /// Applies configured path translations, then replaces separators
    /// with `_` and cleans the result: `/css/site.css` -> `css_site.css`.
    pub fn record_stem(&self, asset: &AssetPath) -> Result<String, PublishError> {
        let mut path = asset.as_str().to_string();
        for (from, to) in &self.translations {
            path = path.replace(from, to);
        }
        let flat = path.trim_matches('/').replace('/', "_");
        clean_filename(&flat)
    }
}

/// Strip an absolute filesystem root prefix, keeping a leading `/`.
fn strip_root(path: &str, root: &Path) -> Option<String> {
    let prefix = root.to_string_lossy().replace('\\', "/");
    let prefix = prefix.trim_end_matches('/');
    if prefix.is_empty() || prefix == "." {
        return None;
    }
    let rest = path.strip_prefix(prefix)?;
    // Reject partial component matches like /var/www2 against /var/www
    if !rest.is_empty() && !rest.starts_with('/') {
        return None;
    }
    Some(format!("/{}", rest.trim_start_matches('/')))
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::fs;
    use tempfile::TempDir;

    fn resolver(webroot: &Path, app_root: &Path) -> PathResolver {
        PathResolver::new(webroot.to_path_buf(), app_root.to_path_buf(), Vec::new())
    }

    #[test]
    fn test_canonicalize_bare_and_relative() {
        let r = resolver(Path::new("/app/webroot"), Path::new("/app"));
        assert_eq!(r.canonicalize("site.css").unwrap(), "/site.css");
        assert_eq!(r.canonicalize("css/site.css").unwrap(), "/css/site.css");
        assert_eq!(r.canonicalize("/css/site.css").unwrap(), "/css/site.css");
    }

    #[test]
    fn test_canonicalize_strips_roots() {
        let r = resolver(Path::new("/app/webroot"), Path::new("/app"));
        assert_eq!(
            r.canonicalize("/app/webroot/css/site.css").unwrap(),
            "/css/site.css"
        );
        assert_eq!(r.canonicalize("/app/tmp/site.css").unwrap(), "/site.css");
        assert_eq!(
            r.canonicalize("/elsewhere/webroot/img/a.png").unwrap(),
            "/img/a.png"
        );
    }

    #[test]
    fn test_canonicalize_collapses_segments() {
        let r = resolver(Path::new("/app/webroot"), Path::new("/app"));
        assert_eq!(r.canonicalize("/css/../img/a.png").unwrap(), "/img/a.png");
        assert_eq!(r.canonicalize("/css/./a.css").unwrap(), "/css/a.css");
        assert_eq!(r.canonicalize("/a//b.png").unwrap(), "/a/b.png");
    }

    #[test]
    fn test_canonicalize_idempotent() {
        let r = resolver(Path::new("/app/webroot"), Path::new("/app"));
        let inputs = [
            "/app/webroot/css/site.css",
            "css/../img/a.png",
            "site.css",
        ];
        for input in inputs {
            let once = r.canonicalize(input).unwrap();
            let twice = r.canonicalize(once.as_str()).unwrap();
            assert_eq!(once, twice, "not idempotent for `{input}`");
        }
    }

    #[test]
    fn test_canonicalize_errors() {
        let r = resolver(Path::new("/app/webroot"), Path::new("/app"));
        // `..` escaping the root
        assert!(r.canonicalize("/../a.png").is_err());
        // empty after normalization
        assert!(r.canonicalize("/").is_err());
        assert!(r.canonicalize("").is_err());
    }

    #[test]
    fn test_canonicalize_no_partial_root_match() {
        let r = resolver(Path::new("/var/www"), Path::new("/var"));
        // /var/www2 must not be treated as inside /var/www
        assert_eq!(
            r.canonicalize("/var/www2/a.png").unwrap(),
            // /var prefix (app root) still strips
            "/www2/a.png"
        );
    }

    #[test]
    fn test_to_filesystem_path_prefers_existing() {
        let dir = TempDir::new().unwrap();
        let webroot = dir.path().join("webroot");
        let app_root = dir.path().to_path_buf();
        fs::create_dir_all(webroot.join("css")).unwrap();
        fs::create_dir_all(app_root.join("tmp")).unwrap();
        fs::write(webroot.join("css/site.css"), "x").unwrap();
        fs::write(app_root.join("tmp/built.js"), "x").unwrap();

        let r = resolver(&webroot, &app_root);

        let asset = r.canonicalize("/css/site.css").unwrap();
        assert_eq!(r.to_filesystem_path(&asset), webroot.join("css/site.css"));

        let asset = r.canonicalize("/built.js").unwrap();
        assert_eq!(r.to_filesystem_path(&asset), app_root.join("tmp/built.js"));

        // Nothing exists: default to the webroot candidate
        let asset = r.canonicalize("/missing.png").unwrap();
        assert_eq!(r.to_filesystem_path(&asset), webroot.join("missing.png"));
    }

    #[test]
    fn test_locate_direct_file() {
        let dir = TempDir::new().unwrap();
        let file = dir.path().join("direct.css");
        fs::write(&file, "x").unwrap();

        let r = resolver(Path::new("/nowhere"), Path::new("/nowhere"));
        assert_eq!(r.locate(file.to_str().unwrap()).unwrap(), file);
    }

    #[test]
    fn test_record_stem_flattens() {
        let r = resolver(Path::new("/app/webroot"), Path::new("/app"));
        let asset = r.canonicalize("/css/site.css").unwrap();
        assert_eq!(r.record_stem(&asset).unwrap(), "css_site.css");
    }

    #[test]
    fn test_record_stem_applies_translations() {
        let r = PathResolver::new(
            PathBuf::from("/app/webroot"),
            PathBuf::from("/app"),
            vec![("/theme/".to_string(), "/plugins/theme/".to_string())],
        );
        let asset = r.canonicalize("/theme/site.css").unwrap();
        assert_eq!(r.record_stem(&asset).unwrap(), "plugins_theme_site.css");
    }

    #[test]
    fn test_same_file_same_asset_path() {
        let r = resolver(Path::new("/app/webroot"), Path::new("/app"));
        let a = r.canonicalize("/app/webroot/img/logo.png").unwrap();
        let b = r.canonicalize("img/logo.png").unwrap();
        let c = r.canonicalize("/img/./extra/../logo.png").unwrap();
        assert_eq!(a, b);
        assert_eq!(b, c);
    }
}
